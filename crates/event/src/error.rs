//! Fehlertypen fuer das Veranstaltungs-Crate

use thiserror::Error;

/// Veranstaltungs-Fehlertypen
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Veranstaltung nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Keine Berechtigung: {0}")]
    KeineBerechtigung(String),

    #[error("Statuswechsel von '{von}' nach '{nach}' nicht erlaubt")]
    UngueltigerStatuswechsel {
        von: &'static str,
        nach: &'static str,
    },

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Zugangscode-Erzeugung nach {0} Versuchen aufgegeben")]
    CodeErzeugung(usize),

    #[error("Datenbank-Fehler: {0}")]
    DatenbankFehler(#[from] redeliste_db::DbError),
}

pub type EventResult<T> = Result<T, EventError>;
