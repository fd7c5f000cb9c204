pub mod history;
pub mod import;
pub mod ordering;
pub mod query;
pub mod tag_ops;
pub mod task_ops;
