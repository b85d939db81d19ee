//! redeliste-event – Veranstaltungs-Lebenszyklus
//!
//! Dieses Crate implementiert:
//! - Erstellen von Veranstaltungen mit Host- und Share-Code
//! - Zugangscode-Generierung mit Kollisionspruefung
//! - Laden ueber einen der beiden Codes samt Rollenerkennung
//! - Aktualisierung (Name, Beschreibung, Redezeit, Status) nur per Host-Code
//! - Vorwaertsgerichteter Status-Lebenszyklus (preparing -> active -> finished)

pub mod error;
pub mod service;

// Bequeme Re-Exporte
pub use error::{EventError, EventResult};
pub use service::{VeranstaltungsAnsicht, VeranstaltungsService};
