//! Oeffentliche Typen fuer den Warteschlangen-Service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use redeliste_core::{EntryId, EventId};
use redeliste_db::models::VeranstaltungRecord;

use crate::countdown::TimerStand;

/// Status einer Wortmeldung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WortmeldungsStatus {
    Waiting,
    Speaking,
    Completed,
    Removed,
}

/// Eine Wortmeldung (Domain-Typ, nicht DB-Record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wortmeldung {
    pub id: EntryId,
    pub event_id: EventId,
    pub participant: String,
    /// 1-basierte, lueckenlose Position unter den nicht entfernten Eintraegen
    pub position: i64,
    pub status: WortmeldungsStatus,
    pub joined_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Vom Host gewaehrte Zusatzzeit in Sekunden
    pub extended_time: i64,
}

/// Der aktive Sprecher samt abgeleitetem Timer-Stand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprecherStand {
    pub wortmeldung: Wortmeldung,
    pub timer: TimerStand,
}

/// Ergebnis eines Sprecherwechsels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprecherWechsel {
    /// Der soeben abgeschlossene Redebeitrag, falls jemand sprach
    pub abgeschlossen: Option<Wortmeldung>,
    /// Der neu befoerderte Sprecher, None bei leerer Liste
    pub sprechend: Option<Wortmeldung>,
}

/// Leichte Timer-Sicht fuer das Teilnehmer-Overlay
#[derive(Debug, Clone)]
pub struct TimerAnsicht {
    /// Redezeit-Budget der Veranstaltung in Sekunden
    pub speak_time: i64,
    pub sprecher: Option<SprecherStand>,
    pub naechster: Option<Wortmeldung>,
}

/// Zusammengesetzte Sicht auf eine Veranstaltung und ihre Warteschlange
#[derive(Debug, Clone)]
pub struct WarteschlangenUebersicht {
    pub veranstaltung: VeranstaltungRecord,
    /// true wenn die Sicht mit dem Host-Code angefragt wurde
    pub ist_host: bool,
    /// Alle nicht entfernten Eintraege, nach Position sortiert
    pub eintraege: Vec<Wortmeldung>,
    pub sprecher: Option<SprecherStand>,
    /// Wartender Eintrag mit der niedrigsten Position
    pub naechster: Option<Wortmeldung>,
}
