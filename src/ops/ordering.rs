use std::cmp::Ordering;

use uuid::Uuid;

use crate::model::config::OrderingConfig;
use crate::model::task::{Priority, Task};

/// Spacing between keys after a renumbering, and the step used for edge placements
pub const GAP: i64 = 10;

/// Error type for move operations. Absorbed by the store like `TaskError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("task not found: {0}")]
    NotFound(Uuid),
    #[error("task {0} is not part of the displayed section")]
    NotInView(Uuid),
    #[error("cannot move a task across priority groups")]
    CrossPriority,
    #[error("nothing to move relative to")]
    NothingToMove,
}

/// What a successful move did to the keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Only the moved task's key changed
    Rekeyed(i64),
    /// Every key was renumbered to `index * GAP`
    Renormalized,
}

/// Display order: priority rank, then ordering key, then newest first.
pub fn display_cmp(a: &Task, b: &Task) -> Ordering {
    a.priority
        .sort_rank()
        .cmp(&b.priority.sort_rank())
        .then(a.sort_order.cmp(&b.sort_order))
        .then(b.created_at.cmp(&a.created_at))
}

/// Indices into `tasks` in display order
pub fn display_indices(tasks: &[Task]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..tasks.len()).collect();
    idx.sort_by(|&a, &b| display_cmp(&tasks[a], &tasks[b]));
    idx
}

/// Ids of one priority group, in display order
pub fn priority_group(tasks: &[Task], priority: Priority) -> Vec<Uuid> {
    display_indices(tasks)
        .into_iter()
        .filter(|&i| tasks[i].priority == priority)
        .map(|i| tasks[i].id)
        .collect()
}

/// Renumber every key to `index * GAP` in display order.
pub fn renormalize(tasks: &mut [Task]) {
    let order = display_indices(tasks);
    assign_keys(tasks, &order);
}

fn assign_keys(tasks: &mut [Task], order: &[usize]) {
    for (pos, &i) in order.iter().enumerate() {
        tasks[i].sort_order = pos as i64 * GAP;
    }
}

/// True when keys have drifted far enough that a renumbering is due
pub fn needs_renormalize(tasks: &[Task], limits: &OrderingConfig) -> bool {
    let (Some(min), Some(max)) = (
        tasks.iter().map(|t| t.sort_order).min(),
        tasks.iter().map(|t| t.sort_order).max(),
    ) else {
        return false;
    };
    let span = max as i128 - min as i128;
    let magnitude = (min as i128).abs().max((max as i128).abs());
    span > limits.span_limit as i128 || magnitude > limits.magnitude_limit as i128
}

/// Move `task_id` to position `to` within `view`, the caller's displayed
/// subsequence of its priority group.
///
/// `to` is the index in `view` once the moved task has been taken out, and is
/// clamped to the end. Ids in `view` that no longer exist are ignored.
pub fn move_task(
    tasks: &mut [Task],
    view: &[Uuid],
    task_id: Uuid,
    to: usize,
    limits: &OrderingConfig,
) -> Result<MoveOutcome, MoveError> {
    let moved_at = tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or(MoveError::NotFound(task_id))?;
    if !view.contains(&task_id) {
        return Err(MoveError::NotInView(task_id));
    }
    let priority = tasks[moved_at].priority;

    // (id, key, priority) of the rest of the view, in view order
    let remaining: Vec<(Uuid, i64, Priority)> = view
        .iter()
        .filter(|&&id| id != task_id)
        .filter_map(|&id| tasks.iter().find(|t| t.id == id))
        .map(|t| (t.id, t.sort_order, t.priority))
        .collect();
    if remaining.is_empty() {
        return Err(MoveError::NothingToMove);
    }
    let to = to.min(remaining.len());

    let before = to.checked_sub(1).map(|i| remaining[i]);
    let after = remaining.get(to).copied();
    if [before, after]
        .into_iter()
        .flatten()
        .any(|(_, _, p)| p != priority)
    {
        return Err(MoveError::CrossPriority);
    }

    let new_key = match (before, after) {
        (None, Some((anchor, _, _))) => {
            let min = remaining.iter().map(|r| r.1).min().unwrap_or(0);
            let Some(key) = min.checked_sub(GAP) else {
                renormalize_with_move(tasks, moved_at, Slot::Before(anchor));
                return Ok(MoveOutcome::Renormalized);
            };
            key
        }
        (Some((anchor, _, _)), None) => {
            let max = remaining.iter().map(|r| r.1).max().unwrap_or(0);
            let Some(key) = max.checked_add(GAP) else {
                renormalize_with_move(tasks, moved_at, Slot::After(anchor));
                return Ok(MoveOutcome::Renormalized);
            };
            key
        }
        (Some((_, lo, _)), Some((anchor, hi, _))) => {
            let mid = (lo as i128 + hi as i128).div_euclid(2) as i64;
            if mid == lo || mid == hi {
                renormalize_with_move(tasks, moved_at, Slot::Before(anchor));
                return Ok(MoveOutcome::Renormalized);
            }
            mid
        }
        // `remaining` is non-empty, so at least one neighbour exists
        (None, None) => return Err(MoveError::NothingToMove),
    };

    let moved = &mut tasks[moved_at];
    moved.sort_order = new_key;
    moved.touch();

    if needs_renormalize(tasks, limits) {
        renormalize(tasks);
        return Ok(MoveOutcome::Renormalized);
    }
    Ok(MoveOutcome::Rekeyed(new_key))
}

/// Where the moved task lands relative to a neighbour when keys are renumbered
#[derive(Debug, Clone, Copy)]
enum Slot {
    Before(Uuid),
    After(Uuid),
}

/// Renumber all keys with the moved task placed next to its neighbour.
fn renormalize_with_move(tasks: &mut [Task], moved_at: usize, slot: Slot) {
    let mut order: Vec<usize> = display_indices(tasks)
        .into_iter()
        .filter(|&i| i != moved_at)
        .collect();
    let find = |anchor: Uuid| order.iter().position(|&i| tasks[i].id == anchor);
    let at = match slot {
        Slot::Before(anchor) => find(anchor),
        Slot::After(anchor) => find(anchor).map(|p| p + 1),
    }
    .unwrap_or(order.len());
    order.insert(at, moved_at);
    assign_keys(tasks, &order);
    tasks[moved_at].touch();
}
