//! VeranstaltungsService – Lebenszyklus und Zugangscodes
//!
//! Eine Veranstaltung besitzt zwei unabhaengige Zugangscodes: der Host-Code
//! erlaubt alle Aktionen, der Share-Code nur Beitritt und Lesen. Beide
//! werden bei der Erstellung zufaellig erzeugt und kollisionsgeprueft.

use std::sync::Arc;

use rand::RngCore;

use redeliste_db::{
    models::{NeueVeranstaltung, VeranstaltungRecord, VeranstaltungUpdate},
    EventRepository,
};

use crate::error::{EventError, EventResult};

/// Laenge der generierten Zugangscodes (Zeichen)
const ZUGANGSCODE_LAENGE: usize = 8;

/// Maximale Anzahl Wuerfelversuche bei Code-Kollisionen
const MAX_CODE_VERSUCHE: usize = 10;

/// Eine geladene Veranstaltung samt Rolle des Aufrufers
#[derive(Debug, Clone)]
pub struct VeranstaltungsAnsicht {
    pub veranstaltung: VeranstaltungRecord,
    /// true wenn der vorgelegte Code der Host-Code war
    pub ist_host: bool,
}

/// VeranstaltungsService – Erstellen, Laden und Aktualisieren von
/// Veranstaltungen
pub struct VeranstaltungsService<E: EventRepository> {
    repo: Arc<E>,
}

impl<E: EventRepository> VeranstaltungsService<E> {
    /// Erstellt einen neuen VeranstaltungsService
    pub fn neu(repo: Arc<E>) -> Arc<Self> {
        Arc::new(Self { repo })
    }

    /// Legt eine neue Veranstaltung mit frischem Code-Paar an
    pub async fn erstellen(
        &self,
        name: &str,
        description: Option<&str>,
        speak_time: i64,
    ) -> EventResult<VeranstaltungRecord> {
        if name.trim().is_empty() {
            return Err(EventError::UngueltigeEingabe(
                "Name darf nicht leer sein".into(),
            ));
        }
        if speak_time <= 0 {
            return Err(EventError::UngueltigeEingabe(
                "Redezeit muss positiv sein".into(),
            ));
        }

        for _ in 0..MAX_CODE_VERSUCHE {
            let host_code = zugangscode_generieren();
            let share_code = zugangscode_generieren();
            if host_code == share_code {
                continue;
            }
            if self.repo.code_exists(&host_code, &share_code).await? {
                continue;
            }

            match self
                .repo
                .create(NeueVeranstaltung {
                    name,
                    description,
                    speak_time,
                    host_code: &host_code,
                    share_code: &share_code,
                })
                .await
            {
                Ok(record) => {
                    tracing::info!(
                        event_id = %record.id,
                        name = %record.name,
                        speak_time = record.speak_time,
                        "Veranstaltung erstellt"
                    );
                    return Ok(record);
                }
                // Zwischen code_exists und create kann ein anderer Aufrufer
                // denselben Code belegen: dann neu wuerfeln
                Err(e) if e.ist_eindeutigkeit() => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(EventError::CodeErzeugung(MAX_CODE_VERSUCHE))
    }

    /// Laedt eine Veranstaltung anhand eines der beiden Zugangscodes
    pub async fn laden(&self, code: &str) -> EventResult<VeranstaltungsAnsicht> {
        let veranstaltung = self
            .repo
            .get_by_code(code)
            .await?
            .ok_or_else(|| EventError::NichtGefunden(format!("Code {code}")))?;

        let ist_host = veranstaltung.host_code == code;
        Ok(VeranstaltungsAnsicht {
            veranstaltung,
            ist_host,
        })
    }

    /// Aktualisiert eine Veranstaltung; nur mit Host-Code erlaubt
    ///
    /// Der Status wandert dabei ausschliesslich vorwaerts
    /// (preparing -> active -> finished, Ueberspringen erlaubt).
    pub async fn aktualisieren(
        &self,
        code: &str,
        aenderung: VeranstaltungUpdate,
    ) -> EventResult<VeranstaltungRecord> {
        let ansicht = self.laden(code).await?;
        if !ansicht.ist_host {
            return Err(EventError::KeineBerechtigung(
                "Nur der Host-Code erlaubt Aenderungen".into(),
            ));
        }
        let aktuell = ansicht.veranstaltung;

        if let Some(ref name) = aenderung.name {
            if name.trim().is_empty() {
                return Err(EventError::UngueltigeEingabe(
                    "Name darf nicht leer sein".into(),
                ));
            }
        }
        if let Some(speak_time) = aenderung.speak_time {
            if speak_time <= 0 {
                return Err(EventError::UngueltigeEingabe(
                    "Redezeit muss positiv sein".into(),
                ));
            }
        }
        if let Some(neuer_status) = aenderung.status {
            if neuer_status.rang() < aktuell.status.rang() {
                return Err(EventError::UngueltigerStatuswechsel {
                    von: aktuell.status.als_str(),
                    nach: neuer_status.als_str(),
                });
            }
        }

        let vorher = aktuell.status;
        let record = self.repo.update(aktuell.id, aenderung).await?;

        if record.status != vorher {
            tracing::info!(
                event_id = %record.id,
                von = vorher.als_str(),
                nach = record.status.als_str(),
                "Veranstaltungs-Status geaendert"
            );
        }

        Ok(record)
    }
}

/// Generiert einen zufaelligen Zugangscode (Grossbuchstaben und Ziffern,
/// ohne leicht verwechselbare Zeichen)
fn zugangscode_generieren() -> String {
    const ZEICHEN: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let mut bytes = vec![0u8; ZUGANGSCODE_LAENGE];
    rng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| ZEICHEN[(*b as usize) % ZEICHEN.len()] as char)
        .collect()
}
