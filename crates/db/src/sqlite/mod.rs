//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod events;
pub mod pool;
pub mod queue;

pub use pool::SqliteDb;
