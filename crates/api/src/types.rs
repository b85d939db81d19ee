//! Antwort-Typen der REST-Schicht
//!
//! Die Veranstaltungs-Antwort blendet den Host-Code fuer Teilnehmer aus;
//! welcher Code vorgelegt wurde, entscheidet also ueber die Sicht.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use redeliste_db::models::{VeranstaltungRecord, VeranstaltungsStatus};
use redeliste_queue::{
    SprecherWechsel, TimerAnsicht, TimerStand, WarteschlangenUebersicht, Wortmeldung,
};

/// Veranstaltung mit rollenabhaengig ausgeblendetem Host-Code
#[derive(Debug, Clone, Serialize)]
pub struct VeranstaltungAntwort {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub speak_time: i64,
    pub status: VeranstaltungsStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_code: Option<String>,
    pub share_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VeranstaltungAntwort {
    pub fn aus(v: VeranstaltungRecord, ist_host: bool) -> Self {
        Self {
            id: v.id,
            name: v.name,
            description: v.description,
            speak_time: v.speak_time,
            status: v.status,
            host_code: ist_host.then_some(v.host_code),
            share_code: v.share_code,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// Gesamtsicht einer Veranstaltung fuer Host-Ansicht und Overlay
#[derive(Debug, Clone, Serialize)]
pub struct UebersichtAntwort {
    pub event: VeranstaltungAntwort,
    pub is_host: bool,
    pub entries: Vec<Wortmeldung>,
    pub speaker: Option<Wortmeldung>,
    pub countdown: Option<TimerStand>,
    pub next_in_line: Option<Wortmeldung>,
}

impl UebersichtAntwort {
    pub fn aus(uebersicht: WarteschlangenUebersicht) -> Self {
        let (speaker, countdown) = match uebersicht.sprecher {
            Some(stand) => (Some(stand.wortmeldung), Some(stand.timer)),
            None => (None, None),
        };
        Self {
            event: VeranstaltungAntwort::aus(uebersicht.veranstaltung, uebersicht.ist_host),
            is_host: uebersicht.ist_host,
            entries: uebersicht.eintraege,
            speaker,
            countdown,
            next_in_line: uebersicht.naechster,
        }
    }
}

/// Schlanke Timer-Antwort fuer das Polling
#[derive(Debug, Clone, Serialize)]
pub struct TimerAntwort {
    pub speak_time: i64,
    pub current: Option<Wortmeldung>,
    pub countdown: Option<TimerStand>,
    pub next_in_line: Option<Wortmeldung>,
}

impl TimerAntwort {
    pub fn aus(ansicht: TimerAnsicht) -> Self {
        let (current, countdown) = match ansicht.sprecher {
            Some(stand) => (Some(stand.wortmeldung), Some(stand.timer)),
            None => (None, None),
        };
        Self {
            speak_time: ansicht.speak_time,
            current,
            countdown,
            next_in_line: ansicht.naechster,
        }
    }
}

/// Ergebnis eines Sprecherwechsels
#[derive(Debug, Clone, Serialize)]
pub struct NaechsterAntwort {
    pub completed: Option<Wortmeldung>,
    pub speaking: Option<Wortmeldung>,
}

impl NaechsterAntwort {
    pub fn aus(wechsel: SprecherWechsel) -> Self {
        Self {
            completed: wechsel.abgeschlossen,
            speaking: wechsel.sprechend,
        }
    }
}
