use crate::model::tag::Tag;
use crate::model::task::Task;

/// Current container format version
pub const DATA_VERSION: u32 = 1;

/// The persisted container: everything written to `data.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoData {
    pub version: u32,
    pub todos: Vec<Task>,
    pub tags: Vec<Tag>,
}

impl TodoData {
    pub fn new(todos: Vec<Task>, tags: Vec<Tag>) -> Self {
        TodoData {
            version: DATA_VERSION,
            todos,
            tags,
        }
    }

    pub fn empty() -> Self {
        TodoData::new(Vec::new(), Vec::new())
    }
}

/// A full copy of the store's lists at one point in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub todos: Vec<Task>,
    pub tags: Vec<Tag>,
}
