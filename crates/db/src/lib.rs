//! redeliste-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern bereit: Trait-Definitionen
//! fuer Veranstaltungen und Wortmeldungen plus die SQLite-Implementierung
//! mit eingebetteten Migrationen.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{DatabaseConfig, DbResult, EventRepository, QueueRepository};
pub use sqlite::SqliteDb;
