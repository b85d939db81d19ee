//! Datenbankmodelle fuer Redeliste
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Domain-Typen getrennt und dienen als reine Datenuebertragungsobjekte.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Veranstaltungen
// ---------------------------------------------------------------------------

/// Status einer Veranstaltung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VeranstaltungsStatus {
    Preparing,
    Active,
    Finished,
}

impl VeranstaltungsStatus {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }

    /// Ordnung im Lebenszyklus: preparing < active < finished
    pub fn rang(&self) -> u8 {
        match self {
            Self::Preparing => 0,
            Self::Active => 1,
            Self::Finished => 2,
        }
    }
}

impl std::str::FromStr for VeranstaltungsStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preparing" => Ok(Self::Preparing),
            "active" => Ok(Self::Active),
            "finished" => Ok(Self::Finished),
            other => Err(format!("Unbekannter Veranstaltungs-Status: {other}")),
        }
    }
}

/// Veranstaltungs-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeranstaltungRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Redezeit-Budget pro Sprecher in Sekunden
    pub speak_time: i64,
    pub host_code: String,
    pub share_code: String,
    pub status: VeranstaltungsStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Daten zum Erstellen einer neuen Veranstaltung
#[derive(Debug, Clone)]
pub struct NeueVeranstaltung<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub speak_time: i64,
    pub host_code: &'a str,
    pub share_code: &'a str,
}

/// Daten zum Aktualisieren einer Veranstaltung
#[derive(Debug, Clone, Default)]
pub struct VeranstaltungUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub speak_time: Option<i64>,
    pub status: Option<VeranstaltungsStatus>,
}

// ---------------------------------------------------------------------------
// Wortmeldungen (Warteschlangen-Eintraege)
// ---------------------------------------------------------------------------

/// Status einer Wortmeldung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WortmeldungsStatus {
    Waiting,
    Speaking,
    Completed,
    Removed,
}

impl WortmeldungsStatus {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Speaking => "speaking",
            Self::Completed => "completed",
            Self::Removed => "removed",
        }
    }
}

impl std::str::FromStr for WortmeldungsStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "speaking" => Ok(Self::Speaking),
            "completed" => Ok(Self::Completed),
            "removed" => Ok(Self::Removed),
            other => Err(format!("Unbekannter Wortmeldungs-Status: {other}")),
        }
    }
}

/// Wortmeldungs-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WortmeldungRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    /// Frei gewaehlter Teilnehmer-Name
    pub participant: String,
    /// 1-basierte, lueckenlose Position unter den nicht entfernten Eintraegen
    pub position: i64,
    pub status: WortmeldungsStatus,
    pub joined_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Vom Host gewaehrte Zusatzzeit in Sekunden
    pub extended_time: i64,
}

/// Daten zum Erstellen einer neuen Wortmeldung
#[derive(Debug, Clone)]
pub struct NeueWortmeldung<'a> {
    pub event_id: Uuid,
    pub participant: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_roundtrip() {
        for s in ["preparing", "active", "finished"] {
            let parsed = VeranstaltungsStatus::from_str(s).unwrap();
            assert_eq!(parsed.als_str(), s);
        }
        for s in ["waiting", "speaking", "completed", "removed"] {
            let parsed = WortmeldungsStatus::from_str(s).unwrap();
            assert_eq!(parsed.als_str(), s);
        }
    }

    #[test]
    fn status_unbekannt() {
        assert!(VeranstaltungsStatus::from_str("paused").is_err());
        assert!(WortmeldungsStatus::from_str("gone").is_err());
    }

    #[test]
    fn status_rang_ordnung() {
        assert!(VeranstaltungsStatus::Preparing.rang() < VeranstaltungsStatus::Active.rang());
        assert!(VeranstaltungsStatus::Active.rang() < VeranstaltungsStatus::Finished.rang());
    }

    #[test]
    fn status_serde_lowercase() {
        let json = serde_json::to_string(&WortmeldungsStatus::Waiting).unwrap();
        assert_eq!(json, "\"waiting\"");
    }
}
