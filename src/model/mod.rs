pub mod config;
pub mod query;
pub mod task;
pub mod user;

pub use config::*;
pub use query::*;
pub use task::*;
pub use user::*;
