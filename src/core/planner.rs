//! Plan generation module.
//!
//! Composes the planning stages into one pure function:
//! 1. Resolve a destination folder for every item
//! 2. Generate a candidate name per item, numbering within folder groups
//! 3. Mediate conflicts into unique final paths
//!
//! Deletion jobs skip naming and use the deletion order instead.

use crate::core::conflict::{self, Candidate};
use crate::core::deletion;
use crate::core::destination::{apply_output, resolve_folder};
use crate::core::naming::{generate_name, natural_cmp};
use crate::models::item::{Category, Inventory, SourceItem};
use crate::models::plan::{OperationKind, Plan, PlannedOperation, PLAN_VERSION};
use crate::models::rules::{Job, OutputTarget, RuleSet};
use crate::Result;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Planning state of one item before conflict mediation.
struct Staged<'a> {
    item: &'a SourceItem,
    category: Category,
    /// Destination folder, or `None` when the item keeps its path.
    folder: Option<PathBuf>,
}

/// Whether an item takes part in the job at all.
fn participates(item: &SourceItem, category: Category, rules: &RuleSet) -> bool {
    if item.is_dir() || !rules.is_included(&item.path) {
        return false;
    }
    match &rules.job {
        Job::Organize => true,
        Job::Transform { categories, .. } => categories.contains(&category),
        Job::Delete => true,
    }
}

/// Compute the plan for an inventory under a rule set.
///
/// The result depends only on the inputs: calling this twice with equal
/// arguments yields equal plans. Run metadata is added by [`stamp`].
pub fn plan(inventory: &Inventory, rules: &RuleSet) -> Plan {
    let root = inventory.root.as_path();
    let operations = match rules.job {
        Job::Delete => deletion::plan_deletion(root, &inventory.items, rules),
        _ => plan_moves(inventory, rules),
    };

    Plan {
        version: PLAN_VERSION.to_string(),
        created_at: String::new(),
        run_id: String::new(),
        root: inventory.root.clone(),
        rules: rules.clone(),
        operations,
    }
}

/// Attach a creation time and a fresh run id to a plan.
pub fn stamp(mut plan: Plan) -> Plan {
    plan.created_at = Utc::now().to_rfc3339();
    plan.run_id = Uuid::new_v4().to_string();
    plan
}

fn plan_moves(inventory: &Inventory, rules: &RuleSet) -> Vec<PlannedOperation> {
    let root = inventory.root.as_path();
    let (kind, output) = match &rules.job {
        Job::Transform { output, .. } => (OperationKind::Transform, Some(output)),
        _ => (OperationKind::Move, None),
    };

    // Stage 1: destination folders.
    let staged: Vec<Staged<'_>> = inventory
        .items
        .iter()
        .map(|item| {
            let category = rules.filters.category_of(item);
            let folder = participates(item, category, rules).then(|| {
                let folder = resolve_folder(root, item.folder(), rules.flatten);
                match output {
                    Some(output) => apply_output(&folder, output),
                    None => folder,
                }
            });
            Staged {
                item,
                category,
                folder,
            }
        })
        .collect();

    // Stage 2: ordinals within (folder, category) groups, in natural order.
    let mut groups: BTreeMap<(&Path, Category), Vec<usize>> = BTreeMap::new();
    for (idx, s) in staged.iter().enumerate() {
        if let Some(folder) = &s.folder {
            if rules.numbering.for_category(s.category).is_some() {
                groups.entry((folder.as_path(), s.category)).or_default().push(idx);
            }
        }
    }
    let mut ordinals: HashMap<usize, u64> = HashMap::new();
    for members in groups.values_mut() {
        members.sort_by(|&a, &b| {
            natural_cmp(
                &staged[a].item.path.to_string_lossy(),
                &staged[b].item.path.to_string_lossy(),
            )
        });
        for (ordinal, &idx) in members.iter().enumerate() {
            ordinals.insert(idx, ordinal as u64);
        }
    }

    // Stage 3: conflict mediation in inventory order.
    let candidates: Vec<Candidate> = staged
        .iter()
        .enumerate()
        .map(|(idx, s)| match &s.folder {
            None => Candidate::Fixed(s.item.path.clone()),
            Some(folder) => {
                let ordinal = ordinals.get(&idx).copied().unwrap_or(0);
                let name = generate_name(&s.item.file_name(), s.category, ordinal, rules);
                Candidate::Wanted {
                    folder: folder.clone(),
                    name: name.file_name(),
                }
            }
        })
        .collect();
    let destinations = conflict::mediate(&candidates);

    staged
        .iter()
        .zip(destinations)
        .map(|(s, destination)| PlannedOperation {
            source: s.item.path.clone(),
            destination,
            kind,
            included: rules.is_included(&s.item.path),
            item_kind: s.item.kind,
            category: s.category,
            size: s.item.size,
            staged: s.folder.is_some() && matches!(output, Some(OutputTarget::Overwrite)),
        })
        .collect()
}

/// Save a plan to a JSON file.
pub fn save_plan(plan: &Plan, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;

    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;

    tracing::info!("Plan saved to {:?}", path);
    Ok(())
}

/// Load a plan from a JSON file.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let content = fs::read_to_string(path)?;
    let plan: Plan = serde_json::from_str(&content)
        .map_err(|e| crate::Error::InvalidPlanFile(format!("{}: {}", path.display(), e)))?;
    if plan.version != PLAN_VERSION {
        return Err(crate::Error::InvalidPlanFile(format!(
            "unsupported version {:?}",
            plan.version
        )));
    }
    Ok(plan)
}

/// Get the default plan output path inside the log directory.
pub fn default_plan_path(log_dir: &Path) -> PathBuf {
    let filename = format!("plan_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
    log_dir.join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::SourceItem;
    use crate::models::rules::{FlattenScope, NumberingRule};

    fn inventory() -> Inventory {
        Inventory::new(
            "/r",
            vec![
                SourceItem::directory("/r/a"),
                SourceItem::file("/r/a/a2.jpg", 1, Category::Image),
                SourceItem::file("/r/a/a10.jpg", 1, Category::Image),
                SourceItem::file("/r/a/a1.jpg", 1, Category::Image),
                SourceItem::file("/r/a/clip.mp4", 1, Category::Video),
            ],
        )
    }

    #[test]
    fn test_plan_is_deterministic() {
        let mut rules = RuleSet::default();
        rules.flatten = Some(FlattenScope::RootFirst);
        rules.numbering.image = Some(NumberingRule {
            prefix: "p".into(),
            digits: 3,
            start: 1,
        });
        assert_eq!(plan(&inventory(), &rules), plan(&inventory(), &rules));
    }

    #[test]
    fn test_directories_keep_their_path() {
        let mut rules = RuleSet::default();
        rules.flatten = Some(FlattenScope::RootFirst);
        let p = plan(&inventory(), &rules);
        assert_eq!(p.operations[0].source, p.operations[0].destination);
        assert!(p.operations[0].is_noop());
        assert_eq!(p.operations[1].destination, PathBuf::from("/r/a2.jpg"));
    }

    #[test]
    fn test_transform_only_touches_listed_categories() {
        let rules = RuleSet {
            job: Job::Transform {
                output: OutputTarget::Overwrite,
                categories: vec![Category::Video],
            },
            target_format: Some("mp4".into()),
            ..RuleSet::default()
        };
        let p = plan(&inventory(), &rules);
        let clip = &p.operations[4];
        assert!(clip.staged);
        assert_eq!(clip.kind, OperationKind::Transform);
        assert_eq!(clip.destination, PathBuf::from("/r/a/clip.mp4"));
        assert!(p.operations[1].is_noop());
        assert!(!p.operations[1].staged);
    }

    #[test]
    fn test_stamp_adds_metadata() {
        let p = stamp(plan(&inventory(), &RuleSet::default()));
        assert!(!p.run_id.is_empty());
        assert!(!p.created_at.is_empty());
    }

    #[test]
    fn test_default_plan_path() {
        let path = default_plan_path(Path::new("/tmp/logs"));
        assert!(path.starts_with("/tmp/logs"));
        assert!(path.to_string_lossy().contains("plan_"));
        assert!(path.to_string_lossy().ends_with(".json"));
    }
}
