//! Rule set data model.
//!
//! A [`RuleSet`] is an immutable value describing how a batch is planned:
//! which job runs, how deep folders are flattened, how names are edited and
//! which items the user unchecked. Changing any rule means building a new
//! value and re-planning.

use super::item::{Category, SourceItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default image extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif", "ico",
];

/// Default video extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi", "wmv", "flv", "m4v"];

/// Complete rule configuration for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// What the batch does with each item.
    pub job: Job,
    /// How far nested folders collapse. `None` keeps every folder.
    pub flatten: Option<FlattenScope>,
    /// Sequential numbering per category.
    pub numbering: Numbering,
    /// String added to the base name.
    pub add: Option<AddRule>,
    /// Search-and-delete or search-and-replace on the base name.
    pub search: Option<SearchRule>,
    /// Extension override (lower case, no leading dot).
    pub target_format: Option<String>,
    /// Extensions participating in each category.
    pub filters: CategoryFilters,
    /// Paths the user unchecked.
    pub excluded: BTreeSet<PathBuf>,
}

impl RuleSet {
    /// Rules for a pure delete job.
    pub fn delete() -> Self {
        Self {
            job: Job::Delete,
            ..Self::default()
        }
    }

    pub fn is_included(&self, path: &Path) -> bool {
        !self.excluded.contains(path)
    }

    /// Copy of these rules with `path` unchecked.
    pub fn exclude(&self, path: impl Into<PathBuf>) -> Self {
        let mut rules = self.clone();
        rules.excluded.insert(path.into());
        rules
    }

    /// Copy of these rules with `path` checked again.
    pub fn include(&self, path: &Path) -> Self {
        let mut rules = self.clone();
        rules.excluded.remove(path);
        rules
    }

    /// Normalised extension override, if one is active.
    pub fn target_extension(&self) -> Option<String> {
        self.target_format
            .as_deref()
            .map(|f| f.trim().trim_start_matches('.').to_lowercase())
            .filter(|f| !f.is_empty())
    }
}

/// Job a batch performs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum Job {
    /// Rename and/or flatten by moving files.
    #[default]
    Organize,
    /// Run a content transform for the listed categories.
    Transform {
        output: OutputTarget,
        categories: Vec<Category>,
    },
    /// Remove the whole tree.
    Delete,
}

/// Where transform results are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "path")]
pub enum OutputTarget {
    /// Replace the original in place; originals are staged for rollback.
    #[default]
    Overwrite,
    /// Write into a named subfolder of the item's folder.
    Subfolder(String),
    /// Write into a custom directory.
    Directory(PathBuf),
}

/// Flatten scope policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlattenScope {
    /// Every item lands directly in the root.
    RootFirst,
    /// Items keep only their first folder under the root.
    TopLevelFirst,
    /// Items lose only their first folder under the root.
    SubLevelFirst,
}

/// Numbering rule for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRule {
    pub prefix: String,
    pub digits: usize,
    pub start: u64,
}

impl Default for NumberingRule {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            digits: 3,
            start: 1,
        }
    }
}

/// Per-category numbering rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numbering {
    pub image: Option<NumberingRule>,
    pub video: Option<NumberingRule>,
}

impl Numbering {
    pub fn for_category(&self, category: Category) -> Option<&NumberingRule> {
        match category {
            Category::Image => self.image.as_ref(),
            Category::Video => self.video.as_ref(),
            Category::Other => None,
        }
    }
}

/// Where an added string goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddPosition {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRule {
    pub text: String,
    pub position: AddPosition,
}

/// What happens to search matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchAction {
    Delete,
    Replace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRule {
    pub pattern: String,
    pub action: SearchAction,
}

/// Extensions that participate in the image and video categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilters {
    pub image: BTreeSet<String>,
    pub video: BTreeSet<String>,
}

impl Default for CategoryFilters {
    fn default() -> Self {
        Self::new(IMAGE_EXTENSIONS, VIDEO_EXTENSIONS)
    }
}

impl CategoryFilters {
    pub fn new<S: AsRef<str>>(image: &[S], video: &[S]) -> Self {
        let norm = |exts: &[S]| {
            exts.iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect()
        };
        Self {
            image: norm(image),
            video: norm(video),
        }
    }

    /// Categorise a path by its extension.
    pub fn classify(&self, path: &Path) -> Category {
        let ext = match crate::utils::fs::get_extension(path) {
            Some(ext) => ext,
            None => return Category::Other,
        };
        if self.image.contains(&ext) {
            Category::Image
        } else if self.video.contains(&ext) {
            Category::Video
        } else {
            Category::Other
        }
    }

    /// Category an item participates in under these filters.
    pub fn category_of(&self, item: &SourceItem) -> Category {
        if item.is_dir() {
            return Category::Other;
        }
        self.classify(&item.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_extension_normalised() {
        let mut rules = RuleSet::default();
        assert_eq!(rules.target_extension(), None);
        rules.target_format = Some(".WEBP".to_string());
        assert_eq!(rules.target_extension(), Some("webp".to_string()));
        rules.target_format = Some("  ".to_string());
        assert_eq!(rules.target_extension(), None);
    }

    #[test]
    fn test_exclude_and_include() {
        let rules = RuleSet::default().exclude("/r/a.jpg");
        assert!(!rules.is_included(Path::new("/r/a.jpg")));
        let rules = rules.include(Path::new("/r/a.jpg"));
        assert!(rules.is_included(Path::new("/r/a.jpg")));
    }

    #[test]
    fn test_classify() {
        let filters = CategoryFilters::new(&["jpg"], &[".MP4"]);
        assert_eq!(filters.classify(Path::new("a.JPG")), Category::Image);
        assert_eq!(filters.classify(Path::new("a.mp4")), Category::Video);
        assert_eq!(filters.classify(Path::new("a.png")), Category::Other);
        assert_eq!(filters.classify(Path::new("README")), Category::Other);
    }

    #[test]
    fn test_rules_serialize() {
        let rules = RuleSet {
            job: Job::Transform {
                output: OutputTarget::Subfolder("resized".to_string()),
                categories: vec![Category::Image],
            },
            flatten: Some(FlattenScope::TopLevelFirst),
            ..RuleSet::default()
        };
        let json = serde_json::to_string(&rules).unwrap();
        let back: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }
}
