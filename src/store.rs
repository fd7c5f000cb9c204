use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, SubsecRound, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::io::store_io::{self, DataPaths, LoadSource, StoreError};
use crate::model::config::StoreConfig;
use crate::model::data::{Snapshot, TodoData};
use crate::model::quadrant::Quadrant;
use crate::model::tag::{Tag, TagColor};
use crate::model::task::{Priority, Task};
use crate::ops::history::History;
use crate::ops::import::{self, ImportMode, ImportSummary};
use crate::ops::ordering::{self, MoveError};
use crate::ops::query::{self, QueryCache, TaskQuery};
use crate::ops::tag_ops;
use crate::ops::task_ops::{self, TaskError};
use crate::parse;

/// Handle returned by `subscribe`
pub type SubscriptionId = u64;

type Observer = Box<dyn FnMut(&[Task], &[Tag]) + Send>;

/// The single owner of the task and tag lists for one data directory.
///
/// Every accepted mutation runs as one unit: apply in memory, save, push a
/// history snapshot, invalidate the query cache, notify subscribers. Rejected
/// input and unknown ids are no-ops that return `Ok(false)` and leave all of
/// that untouched. A failed save is returned as an error, but the in-memory
/// change stands.
pub struct TodoStore {
    paths: DataPaths,
    config: StoreConfig,
    todos: Vec<Task>,
    tags: Vec<Tag>,
    history: History,
    cache: QueryCache,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: SubscriptionId,
}

impl TodoStore {
    /// Open the store in `dir`, creating the directory if needed, and load it.
    pub fn open(dir: &Path, config: StoreConfig) -> Result<TodoStore, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let empty = Snapshot {
            todos: Vec::new(),
            tags: Vec::new(),
        };
        let mut store = TodoStore {
            paths: DataPaths::new(dir),
            history: History::new(empty, config.history.limit),
            config,
            todos: Vec::new(),
            tags: Vec::new(),
            cache: QueryCache::new(),
            observers: Vec::new(),
            next_subscription: 0,
        };
        store.load();
        Ok(store)
    }

    /// Reload from disk, falling back to the backup and then to empty.
    /// History restarts from the loaded state.
    pub fn load(&mut self) -> LoadSource {
        let loaded = store_io::load_with_fallback(&self.paths);
        if !loaded.report.is_clean() {
            for (field, count) in loaded.report.fields() {
                debug!(field, count, "defaulted missing field on load");
            }
        }
        self.todos = loaded.data.todos;
        self.tags = loaded.data.tags;
        self.history.reset(self.snapshot());
        self.cache.invalidate();
        self.notify();
        loaded.source
    }

    /// Write the current lists to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        store_io::write_container(&self.paths, &self.to_data())
    }

    // -----------------------------------------------------------------------
    // Task mutations
    // -----------------------------------------------------------------------

    /// Add a task at the front of its priority group. `Ok(None)` when the
    /// title is rejected.
    pub fn add_task(&mut self, title: &str, priority: Priority) -> Result<Option<Uuid>, StoreError> {
        match task_ops::add_task(&mut self.todos, title, priority) {
            Ok(id) => {
                self.commit()?;
                Ok(Some(id))
            }
            Err(e) => {
                debug!(op = "add_task", error = %e, "ignored");
                Ok(None)
            }
        }
    }

    pub fn toggle_completed(&mut self, id: Uuid) -> Result<bool, StoreError> {
        self.toggle_completed_many(&[id])
    }

    pub fn toggle_completed_many(&mut self, ids: &[Uuid]) -> Result<bool, StoreError> {
        let changed = task_ops::toggle_completed(&mut self.todos, ids);
        self.finish_count("toggle_completed", changed)
    }

    pub fn set_completed_many(&mut self, ids: &[Uuid], completed: bool) -> Result<bool, StoreError> {
        let changed = task_ops::set_completed(&mut self.todos, ids, completed);
        self.finish_count("set_completed", changed)
    }

    pub fn delete_task(&mut self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_tasks(&[id])
    }

    pub fn delete_tasks(&mut self, ids: &[Uuid]) -> Result<bool, StoreError> {
        let removed = task_ops::delete_tasks(&mut self.todos, ids);
        self.finish_count("delete_tasks", removed)
    }

    pub fn clear_completed(&mut self) -> Result<bool, StoreError> {
        let removed = task_ops::clear_completed(&mut self.todos);
        self.finish_count("clear_completed", removed)
    }

    pub fn update_title(&mut self, id: Uuid, title: &str) -> Result<bool, StoreError> {
        let outcome = task_ops::edit_title(&mut self.todos, id, title);
        self.finish("update_title", outcome)
    }

    pub fn update_detail(&mut self, id: Uuid, detail: &str) -> Result<bool, StoreError> {
        let outcome = task_ops::edit_detail(&mut self.todos, id, detail);
        self.finish("update_detail", outcome)
    }

    pub fn set_priority(&mut self, id: Uuid, priority: Priority) -> Result<bool, StoreError> {
        self.set_priority_many(&[id], priority)
    }

    pub fn set_priority_many(&mut self, ids: &[Uuid], priority: Priority) -> Result<bool, StoreError> {
        let changed = task_ops::set_priority(&mut self.todos, ids, priority);
        self.finish_count("set_priority", changed)
    }

    pub fn set_due_date(&mut self, id: Uuid, due: Option<DateTime<Utc>>) -> Result<bool, StoreError> {
        self.set_due_date_many(&[id], due)
    }

    pub fn set_due_date_many(
        &mut self,
        ids: &[Uuid],
        due: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let due = due.map(|d| d.trunc_subsecs(3));
        let changed = task_ops::set_due_date(&mut self.todos, ids, due);
        self.finish_count("set_due_date", changed)
    }

    /// Replace a task's tags. Ids of tags that do not exist are dropped.
    pub fn set_task_tags(&mut self, id: Uuid, tag_ids: &[Uuid]) -> Result<bool, StoreError> {
        let known: Vec<Uuid> = tag_ids
            .iter()
            .copied()
            .filter(|t| tag_ops::find_tag(&self.tags, *t).is_some())
            .collect();
        let outcome = task_ops::set_tags(&mut self.todos, id, &known);
        self.finish("set_task_tags", outcome)
    }

    pub fn add_tag_to_task(&mut self, id: Uuid, tag_id: Uuid) -> Result<bool, StoreError> {
        if tag_ops::find_tag(&self.tags, tag_id).is_none() {
            debug!(op = "add_tag_to_task", tag = %tag_id, "unknown tag");
            return Ok(false);
        }
        let outcome = task_ops::add_tag(&mut self.todos, id, tag_id);
        self.finish_changed("add_tag_to_task", outcome)
    }

    pub fn remove_tag_from_task(&mut self, id: Uuid, tag_id: Uuid) -> Result<bool, StoreError> {
        let outcome = task_ops::remove_tag(&mut self.todos, id, tag_id);
        self.finish_changed("remove_tag_from_task", outcome)
    }

    // -----------------------------------------------------------------------
    // Tag mutations
    // -----------------------------------------------------------------------

    pub fn add_tag(&mut self, name: &str, color: TagColor) -> Result<Option<Uuid>, StoreError> {
        match tag_ops::add_tag(&mut self.tags, name, color) {
            Ok(id) => {
                self.commit()?;
                Ok(Some(id))
            }
            Err(e) => {
                debug!(op = "add_tag", error = %e, "ignored");
                Ok(None)
            }
        }
    }

    pub fn update_tag(
        &mut self,
        id: Uuid,
        name: Option<&str>,
        color: Option<TagColor>,
    ) -> Result<bool, StoreError> {
        let outcome = tag_ops::update_tag(&mut self.tags, id, name, color);
        self.finish_changed("update_tag", outcome)
    }

    /// Delete a tag and strip it from every task
    pub fn delete_tag(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let outcome = tag_ops::delete_tag(&mut self.tags, &mut self.todos, id).map(|stripped| {
            debug!(tag = %id, tasks = stripped, "tag deleted");
        });
        self.finish("delete_tag", outcome)
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    /// Move a task to `to` within its whole priority group
    pub fn move_task(&mut self, id: Uuid, to: usize) -> Result<bool, StoreError> {
        let Some(task) = task_ops::find_task(&self.todos, id) else {
            debug!(op = "move_task", error = %MoveError::NotFound(id), "ignored");
            return Ok(false);
        };
        let view = ordering::priority_group(&self.todos, task.priority);
        self.move_task_in_view(id, &view, to)
    }

    /// Move a task to `to` within `view`, the ids as the caller displays them
    pub fn move_task_in_view(&mut self, id: Uuid, view: &[Uuid], to: usize) -> Result<bool, StoreError> {
        match ordering::move_task(&mut self.todos, view, id, to, &self.config.ordering) {
            Ok(outcome) => {
                debug!(task = %id, ?outcome, "moved");
                self.commit()?;
                Ok(true)
            }
            Err(e) => {
                debug!(op = "move_task", error = %e, "ignored");
                Ok(false)
            }
        }
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous snapshot. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, StoreError> {
        let Some(snapshot) = self.history.undo().cloned() else {
            return Ok(false);
        };
        self.restore(snapshot)?;
        Ok(true)
    }

    /// Re-apply the next snapshot. `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, StoreError> {
        let Some(snapshot) = self.history.redo().cloned() else {
            return Ok(false);
        };
        self.restore(snapshot)?;
        Ok(true)
    }

    fn restore(&mut self, snapshot: Snapshot) -> Result<(), StoreError> {
        self.todos = snapshot.todos;
        self.tags = snapshot.tags;
        self.cache.invalidate();
        self.notify();
        self.save()
    }

    // -----------------------------------------------------------------------
    // Import / export
    // -----------------------------------------------------------------------

    /// Import an encoded container. Nothing changes if it does not decode.
    pub fn import(&mut self, bytes: &[u8], mode: ImportMode) -> Result<ImportSummary, StoreError> {
        let incoming = parse::decode(bytes).map_err(StoreError::MalformedImport)?;
        let summary = import::apply_import(&mut self.todos, &mut self.tags, incoming, mode);
        info!(
            ?mode,
            added = summary.added,
            skipped = summary.skipped,
            tags_added = summary.tags_added,
            "import applied"
        );
        self.commit()?;
        Ok(summary)
    }

    /// The persisted primary file as-is. Before the first save, the encoded
    /// in-memory state.
    pub fn export_bytes(&self) -> Result<Vec<u8>, StoreError> {
        if !self.paths.primary.exists() {
            return Ok(parse::encode(&self.to_data())?);
        }
        store_io::read_primary_bytes(&self.paths)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        &self.todos
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        task_ops::find_task(&self.todos, id)
    }

    pub fn tag(&self, id: Uuid) -> Option<&Tag> {
        tag_ops::find_tag(&self.tags, id)
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Filtered tasks in display order, served from the query cache when fresh
    pub fn filtered_and_sorted(&mut self, query: &TaskQuery) -> &[Task] {
        self.cache.get(&self.todos, query)
    }

    /// The filtered view grouped by quadrant, in grid order
    pub fn quadrants(&mut self, filter: &TaskQuery) -> Vec<(Quadrant, Vec<Task>)> {
        let today = Local::now().date_naive();
        query::group_by_quadrant(self.filtered_and_sorted(filter), today)
    }

    /// Query cache (hits, misses)
    pub fn cache_stats(&self) -> (u64, u64) {
        self.cache.stats()
    }

    /// The current lists as a persistable container
    pub fn to_data(&self) -> TodoData {
        TodoData::new(self.todos.clone(), self.tags.clone())
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Register a callback run after every commit, undo, redo, import and load
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&[Task], &[Tag]) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns false for an unknown id.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        for (_, callback) in self.observers.iter_mut() {
            callback(&self.todos, &self.tags);
        }
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            todos: self.todos.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Save, snapshot, invalidate, notify. The save result is returned last so
    /// a failed write still leaves history and observers in step with memory.
    fn commit(&mut self) -> Result<(), StoreError> {
        let saved = self.save();
        if let Err(e) = &saved {
            warn!(error = %e, "save failed; keeping in-memory state");
        }
        self.history.push(self.snapshot());
        self.cache.invalidate();
        self.notify();
        saved
    }

    fn finish(&mut self, op: &'static str, outcome: Result<(), TaskError>) -> Result<bool, StoreError> {
        match outcome {
            Ok(()) => {
                self.commit()?;
                Ok(true)
            }
            Err(e) => {
                debug!(op, error = %e, "ignored");
                Ok(false)
            }
        }
    }

    fn finish_changed(
        &mut self,
        op: &'static str,
        outcome: Result<bool, TaskError>,
    ) -> Result<bool, StoreError> {
        match outcome {
            Ok(false) => {
                debug!(op, "no change");
                Ok(false)
            }
            Ok(true) => self.finish(op, Ok(())),
            Err(e) => self.finish(op, Err(e)),
        }
    }

    fn finish_count(&mut self, op: &'static str, matched: usize) -> Result<bool, StoreError> {
        if matched == 0 {
            debug!(op, "no matching tasks");
            return Ok(false);
        }
        self.finish(op, Ok(()))
    }
}
