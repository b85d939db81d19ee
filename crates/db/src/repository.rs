//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Die SQLite-Implementierungen liegen unter
//! `sqlite/`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{
    NeueVeranstaltung, NeueWortmeldung, VeranstaltungRecord, VeranstaltungUpdate,
    WortmeldungRecord,
};

/// Result-Alias fuer alle Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://redeliste.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://redeliste.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Veranstaltungs-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait EventRepository: Send + Sync {
    /// Legt eine neue Veranstaltung an (Status `preparing`)
    async fn create(&self, data: NeueVeranstaltung<'_>) -> DbResult<VeranstaltungRecord>;

    /// Laedt eine Veranstaltung anhand ihrer ID
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<VeranstaltungRecord>>;

    /// Laedt eine Veranstaltung anhand eines Zugangscodes (Host oder Share)
    async fn get_by_code(&self, code: &str) -> DbResult<Option<VeranstaltungRecord>>;

    /// Prueft ob einer der beiden Codes bereits vergeben ist
    async fn code_exists(&self, host_code: &str, share_code: &str) -> DbResult<bool>;

    /// Aktualisiert eine Veranstaltung (nur gesetzte Felder)
    async fn update(&self, id: Uuid, data: VeranstaltungUpdate) -> DbResult<VeranstaltungRecord>;
}

/// Repository fuer Wortmeldungs-Datenzugriffe
///
/// Alle mehrschrittigen Mutationen laufen in einer einzelnen Transaktion,
/// damit kein Leser je eine verletzte Positionsdichte beobachtet.
#[allow(async_fn_in_trait)]
pub trait QueueRepository: Send + Sync {
    /// Haengt eine neue Wortmeldung ans Ende an (Position = max + 1)
    async fn join(&self, data: NeueWortmeldung<'_>) -> DbResult<WortmeldungRecord>;

    /// Laedt eine Wortmeldung anhand ihrer ID
    async fn get(&self, id: Uuid) -> DbResult<Option<WortmeldungRecord>>;

    /// Alle nicht entfernten Wortmeldungen einer Veranstaltung, nach Position sortiert
    async fn list_active(&self, event_id: Uuid) -> DbResult<Vec<WortmeldungRecord>>;

    /// Sucht eine aktive Wortmeldung (waiting/speaking) eines Teilnehmers
    async fn find_participant(
        &self,
        event_id: Uuid,
        participant: &str,
    ) -> DbResult<Option<WortmeldungRecord>>;

    /// Der aktuell sprechende Eintrag einer Veranstaltung, falls vorhanden
    async fn current_speaker(&self, event_id: Uuid) -> DbResult<Option<WortmeldungRecord>>;

    /// Der wartende Eintrag mit der niedrigsten Position, optional unter
    /// Ausschluss einer ID
    async fn next_waiting(
        &self,
        event_id: Uuid,
        exclude: Option<Uuid>,
    ) -> DbResult<Option<WortmeldungRecord>>;

    /// Soft-Delete plus Schliessen der Positionsluecke in einer Transaktion
    async fn remove(&self, id: Uuid) -> DbResult<()>;

    /// Setzt die Zielreihenfolge der wartenden Eintraege um (zweiphasig)
    /// und gibt die aktualisierte Gesamtliste zurueck
    async fn reorder(&self, event_id: Uuid, entry_ids: &[Uuid]) -> DbResult<Vec<WortmeldungRecord>>;

    /// Markiert einen Eintrag als sprechend und setzt `started_at`
    async fn start_speaking(
        &self,
        id: Uuid,
        started_at: DateTime<Utc>,
    ) -> DbResult<WortmeldungRecord>;

    /// Markiert einen Eintrag als abgeschlossen (`started_at` bleibt erhalten)
    async fn complete(&self, id: Uuid) -> DbResult<WortmeldungRecord>;

    /// Erhoeht die Zusatzzeit eines Eintrags
    async fn extend(&self, id: Uuid, additional_seconds: i64) -> DbResult<WortmeldungRecord>;

    /// Stellt einen abgeschlossenen Eintrag hinten wieder ein
    /// (Position = max + 1, `started_at` geloescht, Zusatzzeit 0)
    async fn requeue(&self, id: Uuid) -> DbResult<WortmeldungRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_standard() {
        let cfg = DatabaseConfig::default();
        assert!(cfg.url.starts_with("sqlite://"));
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
    }
}
