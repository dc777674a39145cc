pub mod atomic;
pub mod config_io;
pub mod identity;
pub mod json_store;
pub mod lock;
pub mod memory_store;
pub mod store;
pub mod watcher;
