pub mod config;
pub mod data;
pub mod quadrant;
pub mod tag;
pub mod task;

pub use config::*;
pub use data::*;
pub use quadrant::*;
pub use tag::*;
pub use task::*;
