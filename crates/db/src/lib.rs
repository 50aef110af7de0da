//! `db` crate: pure persistence layer.
//!
//! Provides a connection pool, typed row structs, and the repository
//! functions the engine uses to read a workflow graph. No business logic
//! lives here.

pub mod error;
pub mod pool;
pub mod repository;
pub mod models;

pub use pool::DbPool;
pub use error::DbError;
