//! Task list service built on the rest toolkit.
//!
//! Serves a small in-memory task list under a versioned prefix, with one
//! endpoint guarded by HTTP Basic auth and deletion guarded by Basic auth
//! combined with a `User-Agent` allow-list.

pub mod agent;
pub mod config;
pub mod routes;
pub mod store;

pub use agent::AllowedAgent;
pub use config::ServerConfig;
pub use routes::build_api;
pub use store::{EmptyTask, Task, TaskNotFound, TaskStore};
