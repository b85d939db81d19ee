//! Restzeit-Berechnung fuer den aktiven Sprecher
//!
//! Die Restzeit wird nie gespeichert, sondern bei jeder Anfrage aus
//! `started_at`, dem Redezeit-Budget und der gewaehrten Zusatzzeit
//! abgeleitet. Dieselben Eingaben ergeben damit auf jedem Rechner
//! denselben Stand. Bei Restzeit 0 passiert nichts automatisch, der
//! Uebergang zum naechsten Sprecher bleibt eine Host-Aktion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Abgeleiteter Timer-Stand eines Sprechers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStand {
    /// Gesamtbudget in Sekunden (Redezeit plus Zusatzzeit)
    pub total_budget: i64,
    /// Verstrichene Sekunden seit Redebeginn (abgerundet)
    pub elapsed: i64,
    /// Verbleibende Sekunden, nie negativ
    pub remaining: i64,
    /// true solange noch Restzeit uebrig ist
    pub is_active: bool,
}

/// Berechnet den Timer-Stand eines Sprechers zum Zeitpunkt `jetzt`
pub fn restzeit_berechnen(
    speak_time: i64,
    extended_time: i64,
    started_at: DateTime<Utc>,
    jetzt: DateTime<Utc>,
) -> TimerStand {
    let total_budget = speak_time + extended_time;
    // Abgerundete volle Sekunden; eine Startzeit in der Zukunft
    // (Uhrenversatz) zaehlt als noch nicht verstrichen
    let elapsed = (jetzt - started_at).num_seconds().max(0);
    let remaining = (total_budget - elapsed).max(0);

    TimerStand {
        total_budget,
        elapsed,
        remaining,
        is_active: remaining > 0,
    }
}
