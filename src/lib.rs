pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod store;
pub mod util;

pub use store::{SubscriptionId, TodoStore};
