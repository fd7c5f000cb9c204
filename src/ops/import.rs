use std::collections::HashSet;

use uuid::Uuid;

use crate::model::data::TodoData;
use crate::model::tag::Tag;
use crate::model::task::Task;

/// How imported tasks combine with the existing list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// The imported task list replaces the current one
    #[default]
    Replace,
    /// Tasks with unseen ids are added; the rest are skipped
    Merge,
}

/// Counts reported by an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
    /// Imported tags that were not already present
    pub tags_added: usize,
}

/// Combine `incoming` into the current lists.
pub fn apply_import(
    todos: &mut Vec<Task>,
    tags: &mut Vec<Tag>,
    incoming: TodoData,
    mode: ImportMode,
) -> ImportSummary {
    let (added, skipped) = match mode {
        ImportMode::Replace => {
            let count = incoming.todos.len();
            *todos = incoming.todos;
            (count, 0)
        }
        ImportMode::Merge => merge_tasks(todos, incoming.todos),
    };
    let tags_added = merge_tags(tags, incoming.tags);
    ImportSummary {
        added,
        skipped,
        tags_added,
    }
}

/// Insert tasks with new ids at the front, in their imported order.
/// Returns (added, skipped).
fn merge_tasks(todos: &mut Vec<Task>, incoming: Vec<Task>) -> (usize, usize) {
    let mut seen: HashSet<Uuid> = todos.iter().map(|t| t.id).collect();
    let total = incoming.len();
    let fresh: Vec<Task> = incoming
        .into_iter()
        .filter(|t| seen.insert(t.id))
        .collect();
    let added = fresh.len();
    todos.splice(0..0, fresh);
    (added, total - added)
}

/// Append tags whose ids are not yet present. Returns how many were appended.
fn merge_tags(tags: &mut Vec<Tag>, incoming: Vec<Tag>) -> usize {
    let mut seen: HashSet<Uuid> = tags.iter().map(|t| t.id).collect();
    let before = tags.len();
    tags.extend(incoming.into_iter().filter(|t| seen.insert(t.id)));
    tags.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tag::TagColor;
    use crate::model::task::Priority;

    fn task(title: &str) -> Task {
        Task::new(title.to_string(), Priority::None, 0)
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn merge_adds_new_and_skips_known() {
        let existing = task("existing");
        let mut todos = vec![existing.clone()];
        let mut tags = Vec::new();

        let incoming = TodoData::new(vec![existing.clone(), task("fresh")], Vec::new());
        let summary = apply_import(&mut todos, &mut tags, incoming, ImportMode::Merge);

        assert_eq!(summary.added, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(titles(&todos), vec!["fresh", "existing"]);
    }

    #[test]
    fn merge_keeps_relative_order_at_front() {
        let mut todos = vec![task("old")];
        let mut tags = Vec::new();
        let incoming = TodoData::new(vec![task("n1"), task("n2"), task("n3")], Vec::new());
        apply_import(&mut todos, &mut tags, incoming, ImportMode::Merge);
        assert_eq!(titles(&todos), vec!["n1", "n2", "n3", "old"]);
    }

    #[test]
    fn merge_skips_ids_duplicated_within_the_import() {
        let dup = task("twice");
        let mut todos = Vec::new();
        let mut tags = Vec::new();
        let incoming = TodoData::new(vec![dup.clone(), dup], Vec::new());
        let summary = apply_import(&mut todos, &mut tags, incoming, ImportMode::Merge);
        assert_eq!((summary.added, summary.skipped), (1, 1));
        assert_eq!(todos.len(), 1);
    }

    #[test]
    fn replace_swaps_task_list() {
        let mut todos = vec![task("a"), task("b")];
        let mut tags = Vec::new();
        let imported = vec![task("x")];
        let summary = apply_import(
            &mut todos,
            &mut tags,
            TodoData::new(imported.clone(), Vec::new()),
            ImportMode::Replace,
        );
        assert_eq!(todos, imported);
        assert_eq!((summary.added, summary.skipped), (1, 0));
    }

    #[test]
    fn tags_are_unioned_by_id_in_both_modes() {
        let home = Tag::new("home".into(), TagColor::Green);
        let work = Tag::new("work".into(), TagColor::Blue);

        for mode in [ImportMode::Replace, ImportMode::Merge] {
            let mut todos = Vec::new();
            let mut tags = vec![home.clone()];
            let incoming = TodoData::new(Vec::new(), vec![home.clone(), work.clone()]);
            let summary = apply_import(&mut todos, &mut tags, incoming, mode);
            assert_eq!(summary.tags_added, 1);
            assert_eq!(tags, vec![home.clone(), work.clone()]);
        }
    }
}
