pub mod config_io;
pub mod lock;
pub mod store_io;
