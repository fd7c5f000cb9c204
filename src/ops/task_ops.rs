use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use uuid::Uuid;

use crate::model::task::{Priority, Task};
use crate::ops::ordering;
use crate::util::unicode::char_count;

/// Maximum title length, in characters, after trimming
pub const TITLE_MAX: usize = 200;
/// Maximum detail length, in characters, after trimming
pub const DETAIL_MAX: usize = 2000;

/// Error type for task operations.
///
/// These never cross the store boundary: the store logs them and treats the
/// call as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("rejected {0}: empty or too long")]
    ValidationRejected(&'static str),
    #[error("task not found: {0}")]
    NotFound(Uuid),
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Trim and bound a title. Empty titles are rejected.
pub fn validate_title(title: &str) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() || char_count(trimmed) > TITLE_MAX {
        return Err(TaskError::ValidationRejected("title"));
    }
    Ok(trimmed.to_string())
}

/// Trim and bound detail text. Empty detail is allowed (it clears the field).
pub fn validate_detail(detail: &str) -> Result<String, TaskError> {
    let trimmed = detail.trim();
    if char_count(trimmed) > DETAIL_MAX {
        return Err(TaskError::ValidationRejected("detail"));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_task<'a>(tasks: &'a [Task], id: Uuid) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == id)
}

pub fn find_task_mut(tasks: &mut [Task], id: Uuid) -> Result<&mut Task, TaskError> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(TaskError::NotFound(id))
}

/// Apply `f` to every task whose id is in `ids`. Returns how many matched.
fn for_each_matching(tasks: &mut [Task], ids: &[Uuid], mut f: impl FnMut(&mut Task)) -> usize {
    let wanted: HashSet<Uuid> = ids.iter().copied().collect();
    let mut matched = 0;
    for task in tasks.iter_mut().filter(|t| wanted.contains(&t.id)) {
        f(task);
        task.touch();
        matched += 1;
    }
    matched
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Ordering key for a new task: one below the current minimum, so it sorts first.
/// `None` when the minimum is already `i64::MIN`.
pub fn next_sort_order(tasks: &[Task]) -> Option<i64> {
    tasks.iter().map(|t| t.sort_order).min().unwrap_or(0).checked_sub(1)
}

/// Validate and insert a new task at the front of the list. Returns its id.
///
/// Keys are renumbered first when there is no room below the minimum.
pub fn add_task(tasks: &mut Vec<Task>, title: &str, priority: Priority) -> Result<Uuid, TaskError> {
    let title = validate_title(title)?;
    let sort_order = match next_sort_order(tasks) {
        Some(key) => key,
        None => {
            ordering::renormalize(tasks);
            -1
        }
    };
    let task = Task::new(title, priority, sort_order);
    let id = task.id;
    tasks.insert(0, task);
    Ok(id)
}

/// Flip the completion flag of each listed task. Returns how many changed.
pub fn toggle_completed(tasks: &mut [Task], ids: &[Uuid]) -> usize {
    for_each_matching(tasks, ids, |t| t.set_completed(!t.is_completed))
}

/// Force the completion flag of each listed task. Returns how many matched.
pub fn set_completed(tasks: &mut [Task], ids: &[Uuid], completed: bool) -> usize {
    for_each_matching(tasks, ids, |t| t.set_completed(completed))
}

/// Remove each listed task. Returns how many were removed.
pub fn delete_tasks(tasks: &mut Vec<Task>, ids: &[Uuid]) -> usize {
    let wanted: HashSet<Uuid> = ids.iter().copied().collect();
    let before = tasks.len();
    tasks.retain(|t| !wanted.contains(&t.id));
    before - tasks.len()
}

/// Remove every completed task. Returns how many were removed.
pub fn clear_completed(tasks: &mut Vec<Task>) -> usize {
    let before = tasks.len();
    tasks.retain(|t| !t.is_completed);
    before - tasks.len()
}

pub fn edit_title(tasks: &mut [Task], id: Uuid, title: &str) -> Result<(), TaskError> {
    let title = validate_title(title)?;
    let task = find_task_mut(tasks, id)?;
    task.title = title;
    task.touch();
    Ok(())
}

pub fn edit_detail(tasks: &mut [Task], id: Uuid, detail: &str) -> Result<(), TaskError> {
    let detail = validate_detail(detail)?;
    let task = find_task_mut(tasks, id)?;
    task.detail = detail;
    task.touch();
    Ok(())
}

pub fn set_priority(tasks: &mut [Task], ids: &[Uuid], priority: Priority) -> usize {
    for_each_matching(tasks, ids, |t| t.priority = priority)
}

pub fn set_due_date(tasks: &mut [Task], ids: &[Uuid], due: Option<DateTime<Utc>>) -> usize {
    for_each_matching(tasks, ids, |t| t.due_date = due)
}

// ---------------------------------------------------------------------------
// Tag references
// ---------------------------------------------------------------------------

/// Replace a task's tag set. Duplicates collapse, first occurrence wins.
pub fn set_tags(tasks: &mut [Task], id: Uuid, tag_ids: &[Uuid]) -> Result<(), TaskError> {
    let task = find_task_mut(tasks, id)?;
    task.tag_ids = tag_ids.iter().copied().collect::<IndexSet<_>>();
    task.touch();
    Ok(())
}

/// Append a tag to a task. Returns false if it was already present.
pub fn add_tag(tasks: &mut [Task], id: Uuid, tag_id: Uuid) -> Result<bool, TaskError> {
    let task = find_task_mut(tasks, id)?;
    if !task.tag_ids.insert(tag_id) {
        return Ok(false);
    }
    task.touch();
    Ok(true)
}

/// Remove a tag from a task, keeping the order of the rest. Returns false if absent.
pub fn remove_tag(tasks: &mut [Task], id: Uuid, tag_id: Uuid) -> Result<bool, TaskError> {
    let task = find_task_mut(tasks, id)?;
    if !task.tag_ids.shift_remove(&tag_id) {
        return Ok(false);
    }
    task.touch();
    Ok(true)
}
