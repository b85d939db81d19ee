//! Fehlertypen fuer den Warteschlangen-Service

use thiserror::Error;

/// Fehler im Warteschlangen-Service
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Veranstaltung nicht gefunden: {0}")]
    VeranstaltungNichtGefunden(String),

    #[error("Wortmeldung nicht gefunden: {0}")]
    WortmeldungNichtGefunden(String),

    #[error("Unbekannter Eintrag in der Zielreihenfolge: {0}")]
    UnbekannterEintrag(String),

    #[error("Veranstaltung ist bereits beendet")]
    VeranstaltungBeendet,

    #[error("Veranstaltung ist nicht aktiv (Status: {0})")]
    VeranstaltungNichtAktiv(&'static str),

    #[error("Es spricht bereits: {0}")]
    SprecherBereitsAktiv(String),

    #[error("Teilnehmer steht bereits auf der Liste: {0}")]
    DoppelteWortmeldung(String),

    #[error("Wortmeldung ist {tatsaechlich}, erwartet wird {erwartet}")]
    UngueltigerZustand {
        erwartet: &'static str,
        tatsaechlich: &'static str,
    },

    #[error("Keine Berechtigung: {0}")]
    KeineBerechtigung(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Konflikt bei gleichzeitigen Aenderungen: {0}")]
    Konflikt(String),

    #[error("Datenbankfehler: {0}")]
    DatenbankFehler(#[from] redeliste_db::DbError),
}

/// Result-Alias fuer Warteschlangen-Operationen
pub type QueueResult<T> = Result<T, QueueError>;
