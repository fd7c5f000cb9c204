//! End-to-end behavior of `TodoStore` against a real data directory.

use std::fs;

use pretty_assertions::assert_eq;
use quadrant::io::store_io::{LoadSource, StoreError, read_container};
use quadrant::model::{Priority, StoreConfig, TagColor, TodoData, Task};
use quadrant::ops::import::ImportMode;
use quadrant::ops::ordering::priority_group;
use quadrant::ops::query::TaskQuery;
use quadrant::parse::{decode, encode};
use quadrant::TodoStore;
use tempfile::TempDir;

fn open(tmp: &TempDir) -> TodoStore {
    TodoStore::open(tmp.path(), StoreConfig::default()).unwrap()
}

fn titles(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|t| t.title.clone()).collect()
}

/// Titles of one priority group in display order
fn group_titles(store: &mut TodoStore, priority: Priority) -> Vec<String> {
    let query = TaskQuery {
        priority: Some(priority),
        ..Default::default()
    };
    titles(store.filtered_and_sorted(&query))
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn saved_state_round_trips_through_disk() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    let tag = store.add_tag("errands", TagColor::Orange).unwrap().unwrap();
    let id = store.add_task("Pick up parcel", Priority::Medium).unwrap().unwrap();
    store.update_detail(id, "post office closes at 6").unwrap();
    store.add_tag_to_task(id, tag).unwrap();
    store.toggle_completed(id).unwrap();

    let reopened = open(&tmp);
    assert_eq!(reopened.to_data(), store.to_data());
    assert_eq!(decode(&encode(&store.to_data()).unwrap()).unwrap(), store.to_data());
}

#[test]
fn writes_rotate_primary_and_backup() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    let paths = store.paths().clone();

    store.add_task("one", Priority::None).unwrap();
    assert!(paths.primary.exists());
    assert!(!paths.backup.exists());
    let after_first = store.to_data();

    store.add_task("two", Priority::None).unwrap();
    assert_eq!(read_container(&paths.primary).unwrap().0, store.to_data());
    assert_eq!(read_container(&paths.backup).unwrap().0, after_first);
    assert!(!paths.temp.exists());

    let after_second = store.to_data();
    store.add_task("three", Priority::None).unwrap();
    assert_eq!(read_container(&paths.backup).unwrap().0, after_second);
    assert!(!paths.temp.exists());
}

#[test]
fn corrupt_primary_recovers_from_backup_and_heals() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    store.add_task("kept", Priority::None).unwrap();
    store.add_task("lost in corruption", Priority::None).unwrap();
    let paths = store.paths().clone();
    let backup = read_container(&paths.backup).unwrap().0;
    drop(store);

    fs::write(&paths.primary, "{\"version\": 1, \"todos\": [tru").unwrap();

    let mut store = open(&tmp);
    assert_eq!(store.to_data(), backup);
    assert_eq!(titles(store.tasks()), vec!["kept"]);
    // The primary was rewritten and is readable again
    assert_eq!(read_container(&paths.primary).unwrap().0, backup);
    assert_eq!(store.load(), LoadSource::Primary);
}

#[test]
fn missing_primary_recovers_from_backup() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    store.add_task("a", Priority::None).unwrap();
    store.add_task("b", Priority::None).unwrap();
    let paths = store.paths().clone();
    drop(store);

    fs::remove_file(&paths.primary).unwrap();
    let store = open(&tmp);
    assert_eq!(titles(store.tasks()), vec!["a"]);
    assert!(paths.primary.exists());
}

#[test]
fn nothing_readable_loads_empty() {
    let tmp = TempDir::new().unwrap();
    let paths = open(&tmp).paths().clone();
    fs::write(&paths.primary, "garbage").unwrap();
    fs::write(&paths.backup, "more garbage").unwrap();

    let mut store = open(&tmp);
    assert!(store.tasks().is_empty());
    assert!(store.tags().is_empty());
    assert_eq!(store.load(), LoadSource::Empty);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn title_validation_boundary() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    assert_eq!(store.add_task("", Priority::None).unwrap(), None);
    assert_eq!(store.add_task(" \t ", Priority::None).unwrap(), None);
    assert_eq!(store.add_task(&"x".repeat(201), Priority::None).unwrap(), None);
    assert!(store.tasks().is_empty());

    let id = store.add_task(&"x".repeat(200), Priority::None).unwrap();
    assert!(id.is_some());
    assert_eq!(store.tasks().len(), 1);
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Medium tasks A, B, C in that order, keys ten apart, built through the public API
fn abc_store(tmp: &TempDir) -> TodoStore {
    let mut store = open(tmp);
    for title in ["C", "B", "A"] {
        store.add_task(title, Priority::Medium).unwrap();
    }
    // Keys are now -3, -2, -1; spread them out via moves to the end
    for title in ["A", "B", "C"] {
        let id = store.tasks().iter().find(|t| t.title == title).unwrap().id;
        store.move_task(id, 2).unwrap();
    }
    store
}

#[test]
fn move_into_interior_uses_midpoint() {
    let tmp = TempDir::new().unwrap();
    let mut store = abc_store(&tmp);
    assert_eq!(group_titles(&mut store, Priority::Medium), vec!["A", "B", "C"]);

    let find = |store: &TodoStore, title: &str| {
        store.tasks().iter().find(|t| t.title == title).unwrap().clone()
    };
    let (a, b) = (find(&store, "A"), find(&store, "B"));
    let c = find(&store, "C");

    assert!(store.move_task(c.id, 1).unwrap());
    let moved = find(&store, "C");
    assert!(moved.sort_order > a.sort_order && moved.sort_order < b.sort_order);
    assert_eq!(group_titles(&mut store, Priority::Medium), vec!["A", "C", "B"]);
}

#[test]
fn repeated_moves_into_tight_gap_renormalize() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    for title in ["D", "C", "B", "A"] {
        store.add_task(title, Priority::Low).unwrap();
    }

    for _ in 0..70 {
        let view = priority_group(store.tasks(), Priority::Low);
        let last = *view.last().unwrap();
        assert!(store.move_task(last, 1).unwrap());
    }

    let view = priority_group(store.tasks(), Priority::Low);
    let keys: Vec<i64> = view
        .iter()
        .map(|id| store.task(*id).unwrap().sort_order)
        .collect();
    // However often the gap runs out, keys stay distinct and ascending in display order
    assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys: {:?}", keys);
}

#[test]
fn renormalized_keys_are_multiples_of_gap() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    for title in ["C", "B", "A"] {
        store.add_task(title, Priority::High).unwrap();
    }
    // Keys -3, -2, -1: moving C between A and B finds no free key
    let c = store.tasks().iter().find(|t| t.title == "C").unwrap().id;
    assert!(store.move_task(c, 1).unwrap());
    assert_eq!(group_titles(&mut store, Priority::High), vec!["A", "C", "B"]);

    let view = priority_group(store.tasks(), Priority::High);
    let keys: Vec<i64> = view
        .iter()
        .map(|id| store.task(*id).unwrap().sort_order)
        .collect();
    assert_eq!(keys, vec![0, 10, 20]);
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn new_edit_after_undo_discards_redo() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    let s0 = store.to_data();

    store.add_task("E1", Priority::None).unwrap();
    assert!(store.undo().unwrap());
    assert_eq!(store.to_data(), s0);

    store.add_task("E2", Priority::None).unwrap();
    let after_e2 = store.to_data();
    assert!(!store.can_redo());
    assert!(!store.redo().unwrap());
    assert_eq!(store.to_data(), after_e2);

    assert!(store.undo().unwrap());
    assert_eq!(store.to_data(), s0);
    assert!(!store.can_undo());
}

#[test]
fn undo_and_redo_are_persisted() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    store.add_task("first", Priority::None).unwrap();
    store.add_task("second", Priority::None).unwrap();

    store.undo().unwrap();
    assert_eq!(titles(open(&tmp).tasks()), vec!["first"]);
    store.redo().unwrap();
    assert_eq!(titles(open(&tmp).tasks()), vec!["second", "first"]);
}

#[test]
fn history_limit_comes_from_config() {
    let tmp = TempDir::new().unwrap();
    let mut config = StoreConfig::default();
    config.history.limit = 3;
    let mut store = TodoStore::open(tmp.path(), config).unwrap();
    for i in 0..5 {
        store.add_task(&format!("t{}", i), Priority::None).unwrap();
    }
    assert!(store.undo().unwrap());
    assert!(store.undo().unwrap());
    assert!(!store.undo().unwrap());
    assert_eq!(store.tasks().len(), 3);
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[test]
fn merge_import_adds_only_new_ids() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    store.add_task("existing", Priority::None).unwrap();
    let existing = store.tasks()[0].clone();

    let fresh = Task::new("fresh".into(), Priority::Low, 0);
    let file = encode(&TodoData::new(vec![existing, fresh], Vec::new())).unwrap();

    let summary = store.import(&file, ImportMode::Merge).unwrap();
    assert_eq!((summary.added, summary.skipped), (1, 1));
    assert_eq!(titles(store.tasks()), vec!["fresh", "existing"]);
    assert!(store.can_undo());
}

#[test]
fn replace_import_swaps_task_list() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    store.add_task("old one", Priority::None).unwrap();
    store.add_task("old two", Priority::None).unwrap();

    let imported = vec![
        Task::new("new one".into(), Priority::High, 5),
        Task::new("new two".into(), Priority::None, 7),
    ];
    let file = encode(&TodoData::new(imported.clone(), Vec::new())).unwrap();
    let summary = store.import(&file, ImportMode::Replace).unwrap();

    assert_eq!(summary.added, 2);
    assert_eq!(store.tasks(), imported.as_slice());
    assert_eq!(open(&tmp).tasks(), imported.as_slice());
}

#[test]
fn malformed_import_is_rejected_without_effect() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    store.add_task("safe", Priority::None).unwrap();
    let before = store.to_data();

    let result = store.import(b"[1, 2, 3]", ImportMode::Merge);
    assert!(matches!(result, Err(StoreError::MalformedImport(_))));
    assert_eq!(store.to_data(), before);
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[test]
fn deleting_tag_cascades_to_tasks() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    let tag = store.add_tag("project-x", TagColor::Pink).unwrap().unwrap();
    let other = store.add_tag("other", TagColor::Gray).unwrap().unwrap();
    let t1 = store.add_task("one", Priority::None).unwrap().unwrap();
    let t2 = store.add_task("two", Priority::None).unwrap().unwrap();
    store.set_task_tags(t1, &[tag, other]).unwrap();
    store.add_tag_to_task(t2, tag).unwrap();

    assert!(store.delete_tag(tag).unwrap());
    assert!(store.tag(tag).is_none());
    assert!(!store.task(t1).unwrap().tag_ids.contains(&tag));
    assert!(!store.task(t2).unwrap().tag_ids.contains(&tag));
    assert!(store.task(t1).unwrap().tag_ids.contains(&other));

    let reopened = open(&tmp);
    assert_eq!(reopened.tags().len(), 1);
    assert!(reopened.tasks().iter().all(|t| !t.tag_ids.contains(&tag)));
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn filters_combine_and_sort_for_display() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    let home = store.add_tag("home", TagColor::Green).unwrap().unwrap();
    store.add_task("Fix the sink", Priority::High).unwrap();
    let vacuum = store.add_task("vacuum", Priority::Low).unwrap().unwrap();
    let sink2 = store.add_task("Buy SINK plug", Priority::Low).unwrap().unwrap();
    store.add_tag_to_task(vacuum, home).unwrap();
    store.add_tag_to_task(sink2, home).unwrap();

    assert_eq!(
        titles(store.filtered_and_sorted(&TaskQuery::search("sink"))),
        vec!["Fix the sink", "Buy SINK plug"]
    );
    let tagged = TaskQuery {
        tag: Some(home),
        ..Default::default()
    };
    assert_eq!(
        titles(store.filtered_and_sorted(&tagged)),
        vec!["Buy SINK plug", "vacuum"]
    );
}

#[test]
fn quadrants_follow_priority_and_due_date() {
    let tmp = TempDir::new().unwrap();
    let mut store = open(&tmp);
    let overdue = store.add_task("overdue report", Priority::High).unwrap().unwrap();
    store.add_task("plan roadmap", Priority::Medium).unwrap();
    let call = store.add_task("return call", Priority::Low).unwrap().unwrap();
    store.add_task("someday", Priority::None).unwrap();
    let yesterday = chrono::Utc::now() - chrono::Duration::days(1);
    store.set_due_date_many(&[overdue, call], Some(yesterday)).unwrap();

    let groups = store.quadrants(&TaskQuery::default());
    let names: Vec<Vec<String>> = groups.iter().map(|(_, tasks)| titles(tasks)).collect();
    assert_eq!(
        names,
        vec![
            vec!["overdue report".to_string()],
            vec!["plan roadmap".to_string()],
            vec!["return call".to_string()],
            vec!["someday".to_string()],
        ]
    );
}
