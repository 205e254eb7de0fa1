//! Command line argument definitions.

use crate::models::item::Category;
use crate::models::rules::{
    AddPosition, AddRule, CategoryFilters, FlattenScope, Job, Numbering, NumberingRule,
    OutputTarget, RuleSet, SearchAction, SearchRule,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Folder Organizer - flatten, rename, convert and delete folder trees safely
#[derive(Parser, Debug)]
#[command(name = "folder-organizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a plan for a folder tree
    Plan {
        /// Root directory to organize
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        #[command(flatten)]
        rules: RuleArgs,

        /// Output path for plan.json
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// List unchanged items in the review table too
        #[arg(long)]
        all: bool,
    },

    /// Execute a plan file
    Execute {
        /// Path to the plan.json file
        #[arg(value_name = "PLAN_FILE")]
        plan_file: PathBuf,

        /// External command for transform jobs, e.g. "ffmpeg -y -i {input} {output}"
        #[arg(long, value_name = "TEMPLATE")]
        command: Option<String>,

        /// Output path for the run journal
        #[arg(short, long, value_name = "JOURNAL")]
        journal: Option<PathBuf>,

        /// Keep staged originals instead of purging them after a clean run
        #[arg(long)]
        keep_staging: bool,
    },

    /// Delete a folder tree, children before parents
    Delete {
        /// Root directory to delete
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Paths to keep
        #[arg(long, value_name = "PATH")]
        exclude: Vec<PathBuf>,

        /// Actually delete; without this only the order is shown
        #[arg(long)]
        yes: bool,
    },

    /// Undo a previous execution from its journal
    Undo {
        /// Path to the journal file
        #[arg(value_name = "JOURNAL")]
        journal_file: PathBuf,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove staging directories left behind by a run
    Purge {
        /// Staging directories to remove
        #[arg(value_name = "DIR", required = true)]
        dirs: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobArg {
    /// Rename and flatten by moving files
    Organize,
    /// Convert files with a transform
    Transform,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlattenArg {
    RootFirst,
    TopLevelFirst,
    SubLevelFirst,
}

impl From<FlattenArg> for FlattenScope {
    fn from(arg: FlattenArg) -> Self {
        match arg {
            FlattenArg::RootFirst => FlattenScope::RootFirst,
            FlattenArg::TopLevelFirst => FlattenScope::TopLevelFirst,
            FlattenArg::SubLevelFirst => FlattenScope::SubLevelFirst,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionArg {
    Prefix,
    Suffix,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryArg {
    Image,
    Video,
}

/// Rule flags of the `plan` command.
#[derive(Args, Debug, Clone)]
pub struct RuleArgs {
    /// Job to plan
    #[arg(long, value_enum, default_value = "organize")]
    pub job: JobArg,

    /// Flatten nested folders
    #[arg(long, value_enum)]
    pub flatten: Option<FlattenArg>,

    /// Number images as <PREFIX><counter>
    #[arg(long, value_name = "PREFIX")]
    pub image_prefix: Option<String>,

    /// Digits of the image counter
    #[arg(long, default_value_t = 3)]
    pub image_digits: usize,

    /// First image counter value
    #[arg(long, default_value_t = 1)]
    pub image_start: u64,

    /// Number videos as <PREFIX><counter>
    #[arg(long, value_name = "PREFIX")]
    pub video_prefix: Option<String>,

    /// Digits of the video counter
    #[arg(long, default_value_t = 3)]
    pub video_digits: usize,

    /// First video counter value
    #[arg(long, default_value_t = 1)]
    pub video_start: u64,

    /// Text added to every name
    #[arg(long, value_name = "TEXT")]
    pub add: Option<String>,

    /// Where the added text goes
    #[arg(long, value_enum, default_value = "suffix")]
    pub add_position: PositionArg,

    /// Text to search for in names
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Replacement for search matches; matches are deleted when absent
    #[arg(long, value_name = "TEXT", requires = "search")]
    pub replace: Option<String>,

    /// Extension to give every output
    #[arg(long, value_name = "EXT")]
    pub format: Option<String>,

    /// Categories converted by a transform job
    #[arg(long, value_enum, value_delimiter = ',', default_value = "image")]
    pub categories: Vec<CategoryArg>,

    /// Write transform output into this subfolder of each folder
    #[arg(long, value_name = "NAME", conflicts_with = "output_dir")]
    pub subfolder: Option<String>,

    /// Write transform output into this directory
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Paths to leave unchecked
    #[arg(long, value_name = "PATH")]
    pub exclude: Vec<PathBuf>,
}

impl RuleArgs {
    /// Build the rule set these flags describe.
    pub fn to_rules(&self, filters: CategoryFilters) -> RuleSet {
        let job = match self.job {
            JobArg::Organize => Job::Organize,
            JobArg::Transform => Job::Transform {
                output: match (&self.subfolder, &self.output_dir) {
                    (Some(name), _) => OutputTarget::Subfolder(name.clone()),
                    (None, Some(dir)) => OutputTarget::Directory(dir.clone()),
                    (None, None) => OutputTarget::Overwrite,
                },
                categories: self
                    .categories
                    .iter()
                    .map(|c| match c {
                        CategoryArg::Image => Category::Image,
                        CategoryArg::Video => Category::Video,
                    })
                    .collect(),
            },
        };

        let numbering_rule = |prefix: &Option<String>, digits: usize, start: u64| {
            prefix.as_ref().map(|prefix| NumberingRule {
                prefix: prefix.clone(),
                digits,
                start,
            })
        };

        RuleSet {
            job,
            flatten: self.flatten.map(FlattenScope::from),
            numbering: Numbering {
                image: numbering_rule(&self.image_prefix, self.image_digits, self.image_start),
                video: numbering_rule(&self.video_prefix, self.video_digits, self.video_start),
            },
            add: self.add.as_ref().map(|text| AddRule {
                text: text.clone(),
                position: match self.add_position {
                    PositionArg::Prefix => AddPosition::Prefix,
                    PositionArg::Suffix => AddPosition::Suffix,
                },
            }),
            search: self.search.as_ref().map(|pattern| SearchRule {
                pattern: pattern.clone(),
                action: match &self.replace {
                    Some(text) => SearchAction::Replace(text.clone()),
                    None => SearchAction::Delete,
                },
            }),
            target_format: self.format.clone(),
            filters,
            excluded: self.exclude.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_flags_to_rules() {
        let cli = Cli::parse_from([
            "folder-organizer",
            "plan",
            "/photos",
            "--flatten",
            "root-first",
            "--image-prefix",
            "p",
            "--search",
            "IMG_",
            "--exclude",
            "/photos/keep.jpg",
        ]);
        let Commands::Plan { root, rules, .. } = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(root, PathBuf::from("/photos"));

        let rules = rules.to_rules(CategoryFilters::default());
        assert_eq!(rules.job, Job::Organize);
        assert_eq!(rules.flatten, Some(FlattenScope::RootFirst));
        assert_eq!(rules.numbering.image.as_ref().unwrap().prefix, "p");
        assert!(rules.numbering.video.is_none());
        assert_eq!(rules.search.as_ref().unwrap().action, SearchAction::Delete);
        assert!(!rules.is_included(std::path::Path::new("/photos/keep.jpg")));
    }

    #[test]
    fn test_transform_flags() {
        let cli = Cli::parse_from([
            "folder-organizer",
            "plan",
            "/photos",
            "--job",
            "transform",
            "--categories",
            "image,video",
            "--subfolder",
            "resized",
            "--format",
            "jpg",
        ]);
        let Commands::Plan { rules, .. } = cli.command else {
            panic!("expected plan command");
        };
        let rules = rules.to_rules(CategoryFilters::default());
        assert_eq!(
            rules.job,
            Job::Transform {
                output: OutputTarget::Subfolder("resized".to_string()),
                categories: vec![Category::Image, Category::Video],
            }
        );
        assert_eq!(rules.target_extension().as_deref(), Some("jpg"));
    }
}
