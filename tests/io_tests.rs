//! Integration tests for plan and journal files, and undo of real runs.

use folder_organizer::core::executor::Executor;
use folder_organizer::core::planner::{load_plan, plan, save_plan, stamp};
use folder_organizer::core::rollback::{build_journal, load_journal, save_journal, undo};
use folder_organizer::core::scanner::scan_inventory;
use folder_organizer::core::transform::{CopyTransform, MoveTransform, Transform};
use folder_organizer::models::item::{Category, ItemKind};
use folder_organizer::models::outcome::TerminalEvent;
use folder_organizer::models::plan::{OperationKind, Plan, PlannedOperation, PLAN_VERSION};
use folder_organizer::models::rules::{
    CategoryFilters, FlattenScope, Job, NumberingRule, OutputTarget, RuleSet,
};
use folder_organizer::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

fn execute(plan: &Plan, transform: &dyn Transform) -> TerminalEvent {
    let (event, _) = Executor::new().run(
        plan,
        transform,
        &mut std::io::sink(),
        &AtomicBool::new(false),
    );
    event
}

fn scan_and_plan(root: &Path, rules: &RuleSet) -> Plan {
    let inventory = scan_inventory(root, &CategoryFilters::default()).unwrap();
    stamp(plan(&inventory, rules))
}

fn rename_plan(root: &Path, renames: &[(&str, &str)]) -> Plan {
    let operations = renames
        .iter()
        .map(|(from, to)| PlannedOperation {
            source: root.join(from),
            destination: root.join(to),
            kind: OperationKind::Move,
            included: true,
            item_kind: ItemKind::File,
            category: Category::Image,
            size: 1,
            staged: false,
        })
        .collect();
    Plan {
        version: PLAN_VERSION.to_string(),
        root: root.to_path_buf(),
        operations,
        ..Plan::default()
    }
}

#[test]
fn test_plan_file_round_trip() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("photos");
    fs::create_dir_all(root.join("trip")).unwrap();
    fs::write(root.join("trip/b.jpg"), b"b").unwrap();
    fs::write(root.join("trip/a.jpg"), b"a").unwrap();

    let mut rules = RuleSet::default();
    rules.flatten = Some(FlattenScope::RootFirst);
    rules.numbering.image = Some(NumberingRule {
        prefix: "img_".to_string(),
        digits: 4,
        start: 10,
    });
    let plan = scan_and_plan(&root, &rules);
    assert!(!plan.run_id.is_empty());

    let path = tmp.path().join("logs/plan.json");
    save_plan(&plan, &path).unwrap();
    let loaded = load_plan(&path).unwrap();

    assert_eq!(loaded, plan);
    assert_eq!(loaded.operations[1].destination, root.join("img_0010.jpg"));
}

#[test]
fn test_load_plan_rejects_unknown_version() {
    let tmp = TempDir::new().unwrap();
    let mut plan = scan_and_plan(tmp.path(), &RuleSet::default());
    plan.version = "9.9".to_string();
    let path = tmp.path().join("plan.json");
    save_plan(&plan, &path).unwrap();

    assert!(matches!(load_plan(&path), Err(Error::InvalidPlanFile(_))));
}

#[test]
fn test_load_plan_rejects_garbage() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("plan.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(load_plan(&path), Err(Error::InvalidPlanFile(_))));
    assert!(matches!(
        load_plan(&tmp.path().join("missing.json")),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_undo_restores_flattened_tree() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("photos");
    fs::create_dir_all(root.join("a/b")).unwrap();
    fs::write(root.join("a/x.jpg"), b"x").unwrap();
    fs::write(root.join("a/b/y.jpg"), b"y").unwrap();

    let rules = RuleSet {
        flatten: Some(FlattenScope::RootFirst),
        ..RuleSet::default()
    };
    let plan = scan_and_plan(&root, &rules);
    let event = execute(&plan, &MoveTransform);
    assert!(!root.join("a").exists());

    let journal = build_journal(&plan, &event);
    assert_eq!(journal.run_id, plan.run_id);
    assert_eq!(journal.entries.len(), 2);
    let path = tmp.path().join("journal.json");
    save_journal(&journal, &path).unwrap();
    let journal = load_journal(&path).unwrap();

    let preview = undo(&journal, true);
    assert_eq!(preview.planned.len(), 2);
    assert!(root.join("x.jpg").exists());

    let result = undo(&journal, false);
    assert!(result.is_success());
    assert!(result.conflicts.is_empty());
    assert_eq!(result.success_count, 2);
    assert_eq!(fs::read(root.join("a/x.jpg")).unwrap(), b"x");
    assert_eq!(fs::read(root.join("a/b/y.jpg")).unwrap(), b"y");
    assert!(!root.join("x.jpg").exists());
}

#[test]
fn test_undo_restores_staged_originals() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("photos");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.png"), b"png bytes").unwrap();

    let rules = RuleSet {
        job: Job::Transform {
            output: OutputTarget::Overwrite,
            categories: vec![Category::Image],
        },
        target_format: Some("jpg".to_string()),
        ..RuleSet::default()
    };
    let plan = scan_and_plan(&root, &rules);
    let event = execute(&plan, &CopyTransform);
    assert!(root.join("a.jpg").exists());
    assert!(!root.join("a.png").exists());

    let journal = build_journal(&plan, &event);
    assert!(journal.entries[0].backup.is_some());

    let result = undo(&journal, false);
    assert!(result.is_success());
    assert_eq!(fs::read(root.join("a.png")).unwrap(), b"png bytes");
    assert!(!root.join("a.jpg").exists());
}

#[test]
fn test_undo_reports_occupied_original() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("old.jpg"), b"old").unwrap();

    let mut rules = RuleSet::default();
    rules.numbering.image = Some(NumberingRule::default());
    let plan = scan_and_plan(root, &rules);
    let event = execute(&plan, &MoveTransform);
    assert!(root.join("001.jpg").exists());

    fs::write(root.join("old.jpg"), b"newcomer").unwrap();
    let result = undo(&build_journal(&plan, &event), false);

    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.error_count, 1);
    assert!(!result.is_success());
    assert_eq!(fs::read(root.join("old.jpg")).unwrap(), b"newcomer");
    assert!(root.join("001.jpg").exists());
}

#[test]
fn test_load_journal_rejects_unknown_version() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("journal.json");
    fs::write(
        &path,
        r#"{"version":"0.1","run_id":"x","executed_at":"","root":"/r","entries":[]}"#,
    )
    .unwrap();

    assert!(matches!(load_journal(&path), Err(Error::InvalidJournalFile(_))));
}

#[test]
fn test_undo_reverses_swap() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("a.jpg"), b"A").unwrap();
    fs::write(root.join("b.jpg"), b"B").unwrap();

    let plan = rename_plan(root, &[("a.jpg", "b.jpg"), ("b.jpg", "a.jpg")]);
    let event = execute(&plan, &MoveTransform);
    assert_eq!(fs::read(root.join("a.jpg")).unwrap(), b"B");

    let result = undo(&build_journal(&plan, &event), false);

    assert!(result.conflicts.is_empty());
    assert!(result.is_success(), "errors: {:?}", result.errors);
    assert_eq!(result.success_count, 2);
    assert_eq!(fs::read(root.join("a.jpg")).unwrap(), b"A");
    assert_eq!(fs::read(root.join("b.jpg")).unwrap(), b"B");
    assert!(!root.join(".temp").exists());
}

#[test]
fn test_undo_reverses_three_way_cycle() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    for name in ["a", "b", "c"] {
        fs::write(root.join(format!("{}.jpg", name)), name).unwrap();
    }

    let plan = rename_plan(
        root,
        &[("a.jpg", "b.jpg"), ("b.jpg", "c.jpg"), ("c.jpg", "a.jpg")],
    );
    let event = execute(&plan, &MoveTransform);
    assert_eq!(event.summary.succeeded, 3);
    assert_eq!(fs::read_to_string(root.join("b.jpg")).unwrap(), "a");

    let result = undo(&build_journal(&plan, &event), false);

    assert!(result.is_success(), "errors: {:?}", result.errors);
    for name in ["a", "b", "c"] {
        let path: PathBuf = root.join(format!("{}.jpg", name));
        assert_eq!(fs::read_to_string(path).unwrap(), name);
    }
    assert!(!root.join(".temp").exists());
}
