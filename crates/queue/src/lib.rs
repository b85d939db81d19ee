//! redeliste-queue – Redeliste, Positionsordnung und Sprecher-Timer
//!
//! Dieses Crate implementiert:
//! - WarteschlangenService: Beitritt, Entfernen, Neuordnung, Wiedereinreihung
//! - Sprecher-Uebergaenge: starten, verlaengern, abschliessen, naechster Sprecher
//! - Restzeit-Berechnung als reine Funktion ueber `started_at` und Budget
//! - Zusammengesetzte Sichten fuer Host-Ansicht und Teilnehmer-Overlay
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use redeliste_db::SqliteDb;
//! use redeliste_queue::WarteschlangenService;
//!
//! #[tokio::main]
//! async fn main() {
//!     // DB-Verbindung
//!     let db = Arc::new(SqliteDb::in_memory().await.unwrap());
//!
//!     // WarteschlangenService
//!     let warteschlange = WarteschlangenService::neu(db.clone(), db.clone());
//!
//!     // Beitritt mit dem Share-Code einer Veranstaltung
//!     let wortmeldung = warteschlange.beitreten("SHARECODE", "Anna").await;
//! }
//! ```

pub mod countdown;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use countdown::{restzeit_berechnen, TimerStand};
pub use error::{QueueError, QueueResult};
pub use service::WarteschlangenService;
pub use types::{
    SprecherStand, SprecherWechsel, TimerAnsicht, WarteschlangenUebersicht, Wortmeldung,
    WortmeldungsStatus,
};
