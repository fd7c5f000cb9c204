use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use uuid::Uuid;

use crate::model::quadrant::Quadrant;
use crate::model::task::{Priority, Task};
use crate::ops::ordering::display_cmp;

/// Filter parameters for a task listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaskQuery {
    /// Case-insensitive substring of the title. Blank means no filter.
    pub search: String,
    pub priority: Option<Priority>,
    /// Only tasks carrying this tag id
    pub tag: Option<Uuid>,
}

impl TaskQuery {
    pub fn search(text: impl Into<String>) -> Self {
        TaskQuery {
            search: text.into(),
            ..Default::default()
        }
    }
}

/// Build a case-insensitive literal matcher for the search text.
fn title_matcher(search: &str) -> Option<Regex> {
    let search = search.trim();
    if search.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(search))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Apply the filters in order (title, priority, tag) and sort for display.
pub fn filter_and_sort(tasks: &[Task], query: &TaskQuery) -> Vec<Task> {
    let matcher = title_matcher(&query.search);
    let needle = query.search.trim().to_lowercase();

    let mut result: Vec<Task> = tasks
        .iter()
        .filter(|t| match &matcher {
            Some(re) => re.is_match(&t.title),
            // Oversized patterns fall back to a plain lowercase comparison
            None => needle.is_empty() || t.title.to_lowercase().contains(&needle),
        })
        .filter(|t| query.priority.is_none_or(|p| t.priority == p))
        .filter(|t| query.tag.is_none_or(|id| t.tag_ids.contains(&id)))
        .cloned()
        .collect();
    result.sort_by(display_cmp);
    result
}

/// Group already-sorted tasks by quadrant, in grid order. Empty quadrants are kept.
pub fn group_by_quadrant(tasks: &[Task], today: NaiveDate) -> Vec<(Quadrant, Vec<Task>)> {
    Quadrant::GRID_ORDER
        .into_iter()
        .map(|q| {
            let members = tasks
                .iter()
                .filter(|t| t.quadrant_on(today) == q)
                .cloned()
                .collect();
            (q, members)
        })
        .collect()
}

#[derive(Debug)]
struct CacheEntry {
    query: TaskQuery,
    /// The canonical list the result was computed from
    source: Vec<Task>,
    result: Vec<Task>,
}

/// Single-entry cache in front of `filter_and_sort`.
///
/// A hit needs a clean flag, the same query, and a task list equal by content
/// to the one the entry was computed from, so in-place edits that keep the
/// length unchanged still miss.
#[derive(Debug, Default)]
pub struct QueryCache {
    entry: Option<CacheEntry>,
    dirty: bool,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the cached result stale. Called on every store mutation.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn get(&mut self, tasks: &[Task], query: &TaskQuery) -> &[Task] {
        let fresh = !self.dirty
            && self
                .entry
                .as_ref()
                .is_some_and(|e| e.query == *query && e.source == tasks);
        if fresh {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.entry = Some(CacheEntry {
                query: query.clone(),
                source: tasks.to_vec(),
                result: filter_and_sort(tasks, query),
            });
            self.dirty = false;
        }
        match &self.entry {
            Some(entry) => &entry.result,
            None => &[],
        }
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
