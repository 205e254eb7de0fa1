//! Integration tests for deletion sequencing and delete runs.

use folder_organizer::core::deletion::{check_root, sequence};
use folder_organizer::core::executor::Executor;
use folder_organizer::core::planner::plan;
use folder_organizer::core::scanner::scan_inventory;
use folder_organizer::core::transform::MoveTransform;
use folder_organizer::models::item::{Category, SourceItem};
use folder_organizer::models::outcome::{OutcomeStatus, TerminalStatus};
use folder_organizer::models::rules::{CategoryFilters, RuleSet};
use folder_organizer::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

fn build_tree(root: &Path) {
    for dir in ["a/b/c", "a/d", "keep/inner", "e"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    for file in ["a/x.txt", "a/b/y.jpg", "a/b/c/z.mp4", "keep/k.txt", "keep/inner/k2.txt", "top.txt"] {
        fs::write(root.join(file), file).unwrap();
    }
}

#[test]
fn test_descendants_come_before_their_directory() {
    let items = vec![
        SourceItem::directory("/r/a"),
        SourceItem::directory("/r/a/b"),
        SourceItem::file("/r/a/b/1.jpg", 1, Category::Image),
        SourceItem::directory("/r/a/b/c"),
        SourceItem::file("/r/a/b/c/2.jpg", 1, Category::Image),
        SourceItem::directory("/r/ab"),
        SourceItem::file("/r/ab/3.jpg", 1, Category::Image),
        SourceItem::file("/r/4.jpg", 1, Category::Image),
    ];
    let order = sequence(Path::new("/r"), &items);

    assert_eq!(order.len(), items.len() + 1);
    assert_eq!(order.last(), Some(&PathBuf::from("/r")));
    for (i, parent) in order.iter().enumerate() {
        for child in &order[i + 1..] {
            assert!(
                !(child.starts_with(parent) && child != parent),
                "{:?} scheduled after its ancestor {:?}",
                child,
                parent
            );
        }
    }
}

#[test]
fn test_files_come_before_any_directory() {
    let items = vec![
        SourceItem::directory("/r/z"),
        SourceItem::file("/r/z/a.txt", 1, Category::Other),
        SourceItem::file("/r/b.txt", 1, Category::Other),
    ];
    let order = sequence(Path::new("/r"), &items);
    assert_eq!(
        order,
        vec![
            PathBuf::from("/r/z/a.txt"),
            PathBuf::from("/r/b.txt"),
            PathBuf::from("/r/z"),
            PathBuf::from("/r"),
        ]
    );
}

#[test]
fn test_delete_run_removes_whole_tree() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("victim");
    build_tree(&root);

    let inventory = scan_inventory(&root, &CategoryFilters::default()).unwrap();
    let plan = plan(&inventory, &RuleSet::delete());
    let mut log = Vec::new();
    let (event, _) = Executor::new().run(&plan, &MoveTransform, &mut log, &AtomicBool::new(false));

    assert_eq!(event.status, TerminalStatus::Completed);
    assert_eq!(event.summary.failed, 0);
    assert_eq!(event.summary.succeeded, plan.len());
    assert!(!root.exists());
    assert!(String::from_utf8(log).unwrap().contains("Deleted: "));
}

#[test]
fn test_delete_run_keeps_unchecked_folder() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("victim");
    build_tree(&root);

    let inventory = scan_inventory(&root, &CategoryFilters::default()).unwrap();
    let rules = RuleSet::delete().exclude(root.join("keep"));
    let plan = plan(&inventory, &rules);
    let (event, _) = Executor::new().run(
        &plan,
        &MoveTransform,
        &mut std::io::sink(),
        &AtomicBool::new(false),
    );

    assert_eq!(event.status, TerminalStatus::Completed);
    assert_eq!(event.summary.failed, 0);
    assert!(root.join("keep/k.txt").exists());
    assert!(root.join("keep/inner/k2.txt").exists());
    assert!(!root.join("a").exists());
    assert!(!root.join("e").exists());
    assert!(!root.join("top.txt").exists());
}

#[test]
fn test_vanished_entries_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("victim");
    build_tree(&root);

    let inventory = scan_inventory(&root, &CategoryFilters::default()).unwrap();
    let plan = plan(&inventory, &RuleSet::delete());
    fs::remove_file(root.join("top.txt")).unwrap();

    let (event, _) = Executor::new().run(
        &plan,
        &MoveTransform,
        &mut std::io::sink(),
        &AtomicBool::new(false),
    );

    assert_eq!(event.status, TerminalStatus::Completed);
    assert_eq!(event.summary.skipped, 1);
    let skipped = event
        .outcomes
        .iter()
        .find(|o| matches!(o.status, OutcomeStatus::Skipped { .. }))
        .unwrap();
    assert_eq!(skipped.source, root.join("top.txt"));
    assert!(!root.exists());
}

#[test]
fn test_check_root_refuses_filesystem_root() {
    assert!(matches!(check_root(Path::new("/")), Err(Error::DangerousRoot(_))));
    assert!(matches!(check_root(Path::new("")), Err(Error::DangerousRoot(_))));

    let tmp = TempDir::new().unwrap();
    assert!(check_root(tmp.path()).is_ok());
}
