//! Conflict mediation.
//!
//! Resolves candidate destinations into a set of unique final paths,
//! comparing case-insensitively to match filesystems that ignore case.

use crate::utils::fs::{path_key, split_name, join_name};
use std::collections::HashSet;
use std::path::PathBuf;

/// One item entering mediation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// The item keeps its path, which is reserved before anything else.
    Fixed(PathBuf),
    /// The item wants `folder/name`.
    Wanted { folder: PathBuf, name: String },
}

/// Resolve candidates, in order, into unique destinations.
///
/// Fixed paths are claimed first. Each wanted path that is already claimed
/// gets a `(n)` suffix before its extension, counting up from 1 until free.
pub fn mediate(candidates: &[Candidate]) -> Vec<PathBuf> {
    let mut claimed: HashSet<String> = candidates
        .iter()
        .filter_map(|c| match c {
            Candidate::Fixed(path) => Some(path_key(path)),
            Candidate::Wanted { .. } => None,
        })
        .collect();

    candidates
        .iter()
        .map(|candidate| match candidate {
            Candidate::Fixed(path) => path.clone(),
            Candidate::Wanted { folder, name } => {
                let mut resolved = folder.join(name);
                let (base, ext) = split_name(name);
                let mut counter = 1u64;
                while claimed.contains(&path_key(&resolved)) {
                    resolved = folder.join(join_name(&format!("{}({})", base, counter), ext));
                    counter += 1;
                }
                if counter > 1 {
                    tracing::debug!("Conflict on {:?}/{}, using {:?}", folder, name, resolved);
                }
                claimed.insert(path_key(&resolved));
                resolved
            }
        })
        .collect()
}
