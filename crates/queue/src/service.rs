//! WarteschlangenService – Ordnung der Redeliste und Sprecher-Uebergaenge
//!
//! Alle schreibenden Operationen einer Veranstaltung laufen durch eine
//! gemeinsame Sperre je Veranstaltung. Die mehrschrittigen
//! Repository-Operationen arbeiten zusaetzlich transaktional, sodass kein
//! Leser je eine Luecke oder doppelte Position beobachtet. Beitritte
//! werden bei Positionskollisionen (etwa durch einen zweiten Prozess auf
//! derselben Datenbank) begrenzt wiederholt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use redeliste_core::{EntryId, EventId};
use redeliste_db::{
    models::{
        NeueWortmeldung, VeranstaltungRecord, VeranstaltungsStatus, WortmeldungRecord,
        WortmeldungsStatus as DbWortmeldungsStatus,
    },
    DbError, EventRepository, QueueRepository,
};

use crate::{
    countdown::restzeit_berechnen,
    error::{QueueError, QueueResult},
    types::{
        SprecherStand, SprecherWechsel, TimerAnsicht, WarteschlangenUebersicht, Wortmeldung,
        WortmeldungsStatus,
    },
};

/// Maximale Wiederholungen eines Beitritts bei Positionskollisionen
const MAX_BEITRITTS_VERSUCHE: usize = 3;

/// Maximale Laenge eines Teilnehmer-Namens
const MAX_NAME_LAENGE: usize = 100;

/// WarteschlangenService verwaltet die Redeliste einer Veranstaltung
pub struct WarteschlangenService<E: EventRepository, Q: QueueRepository> {
    event_repo: Arc<E>,
    queue_repo: Arc<Q>,
    /// Eine Sperre je Veranstaltung fuer schreibende Operationen
    sperren: DashMap<EventId, Arc<Mutex<()>>>,
}

impl<E: EventRepository, Q: QueueRepository> WarteschlangenService<E, Q> {
    /// Erstellt einen neuen WarteschlangenService
    pub fn neu(event_repo: Arc<E>, queue_repo: Arc<Q>) -> Arc<Self> {
        Arc::new(Self {
            event_repo,
            queue_repo,
            sperren: DashMap::new(),
        })
    }

    /// Teilnehmer reiht sich selbst hinten in die Liste ein
    ///
    /// Funktioniert mit beiden Zugangscodes, solange die Veranstaltung
    /// nicht beendet ist.
    pub async fn beitreten(&self, code: &str, participant: &str) -> QueueResult<Wortmeldung> {
        let name = participant.trim();
        if name.is_empty() {
            return Err(QueueError::UngueltigeEingabe(
                "Teilnehmer-Name darf nicht leer sein".into(),
            ));
        }
        if name.len() > MAX_NAME_LAENGE {
            return Err(QueueError::UngueltigeEingabe(format!(
                "Teilnehmer-Name zu lang: {} Zeichen (Maximum: {MAX_NAME_LAENGE})",
                name.len()
            )));
        }

        let (veranstaltung, _) = self.veranstaltung_laden(code).await?;
        if veranstaltung.status == VeranstaltungsStatus::Finished {
            return Err(QueueError::VeranstaltungBeendet);
        }

        let sperre = self.sperre_fuer(EventId(veranstaltung.id));
        let _wache = sperre.lock().await;

        if let Some(vorhanden) = self
            .queue_repo
            .find_participant(veranstaltung.id, name)
            .await?
        {
            return Err(QueueError::DoppelteWortmeldung(vorhanden.participant));
        }

        // Zwei Prozesse auf derselben Datenbank koennen sich um dieselbe
        // Endposition streiten; der partielle Unique-Index faengt das ab
        // und der Beitritt wird neu versucht
        for _ in 0..MAX_BEITRITTS_VERSUCHE {
            match self
                .queue_repo
                .join(NeueWortmeldung {
                    event_id: veranstaltung.id,
                    participant: name,
                })
                .await
            {
                Ok(record) => {
                    tracing::info!(
                        event_id = %record.event_id,
                        entry_id = %record.id,
                        participant = %record.participant,
                        position = record.position,
                        "Wortmeldung eingereiht"
                    );
                    return Ok(record_to_wortmeldung(record));
                }
                Err(e) if e.ist_eindeutigkeit() => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(QueueError::Konflikt(format!(
            "Beitritt nach {MAX_BEITRITTS_VERSUCHE} Versuchen aufgegeben"
        )))
    }

    /// Entfernt eine Wortmeldung endgueltig aus der Liste (nur Host)
    ///
    /// Alle Eintraege mit hoeherer Position ruecken um eins auf.
    pub async fn entfernen(&self, code: &str, entry_id: EntryId) -> QueueResult<()> {
        let veranstaltung = self.host_veranstaltung(code).await?;
        let sperre = self.sperre_fuer(EventId(veranstaltung.id));
        let _wache = sperre.lock().await;

        let eintrag = self.eintrag_laden(&veranstaltung, entry_id).await?;
        self.queue_repo.remove(eintrag.id).await?;

        tracing::info!(
            event_id = %veranstaltung.id,
            entry_id = %eintrag.id,
            participant = %eintrag.participant,
            position = eintrag.position,
            "Wortmeldung entfernt"
        );
        Ok(())
    }

    /// Setzt die vollstaendige Zielreihenfolge der wartenden Eintraege um
    /// (nur Host) und gibt die aktualisierte Gesamtliste zurueck
    ///
    /// Sprechende und abgeschlossene Eintraege behalten ihre relative
    /// Reihenfolge und ruecken hinter den wartenden Block.
    pub async fn neu_ordnen(
        &self,
        code: &str,
        entry_ids: &[EntryId],
    ) -> QueueResult<Vec<Wortmeldung>> {
        let veranstaltung = self.host_veranstaltung(code).await?;
        let sperre = self.sperre_fuer(EventId(veranstaltung.id));
        let _wache = sperre.lock().await;

        let ids: Vec<Uuid> = entry_ids.iter().map(|id| id.inner()).collect();
        let records = self
            .queue_repo
            .reorder(veranstaltung.id, &ids)
            .await
            .map_err(|e| match e {
                DbError::NichtGefunden(was) => QueueError::UnbekannterEintrag(was),
                DbError::UngueltigeDaten(was) => QueueError::UngueltigeEingabe(was),
                andere => QueueError::DatenbankFehler(andere),
            })?;

        tracing::info!(
            event_id = %veranstaltung.id,
            anzahl = records.len(),
            "Warteschlange neu geordnet"
        );
        Ok(records.into_iter().map(record_to_wortmeldung).collect())
    }

    /// Befoerdert eine wartende Wortmeldung zum aktiven Sprecher (nur Host)
    ///
    /// Verlangt eine aktive Veranstaltung und dass gerade niemand spricht.
    pub async fn sprecher_starten(
        &self,
        code: &str,
        entry_id: EntryId,
    ) -> QueueResult<Wortmeldung> {
        let veranstaltung = self.host_veranstaltung(code).await?;
        if veranstaltung.status != VeranstaltungsStatus::Active {
            return Err(QueueError::VeranstaltungNichtAktiv(
                veranstaltung.status.als_str(),
            ));
        }

        let sperre = self.sperre_fuer(EventId(veranstaltung.id));
        let _wache = sperre.lock().await;

        if let Some(aktiv) = self.queue_repo.current_speaker(veranstaltung.id).await? {
            return Err(QueueError::SprecherBereitsAktiv(aktiv.participant));
        }

        let eintrag = self.eintrag_laden(&veranstaltung, entry_id).await?;
        if eintrag.status != DbWortmeldungsStatus::Waiting {
            return Err(QueueError::UngueltigerZustand {
                erwartet: "waiting",
                tatsaechlich: eintrag.status.als_str(),
            });
        }

        let record = self.queue_repo.start_speaking(eintrag.id, Utc::now()).await?;
        tracing::info!(
            event_id = %record.event_id,
            entry_id = %record.id,
            participant = %record.participant,
            "Sprecher gestartet"
        );
        Ok(record_to_wortmeldung(record))
    }

    /// Gewaehrt dem aktiven Sprecher Zusatzzeit (nur Host)
    pub async fn verlaengern(
        &self,
        code: &str,
        entry_id: EntryId,
        zusatz_sekunden: i64,
    ) -> QueueResult<Wortmeldung> {
        if zusatz_sekunden <= 0 {
            return Err(QueueError::UngueltigeEingabe(
                "Zusatzzeit muss positiv sein".into(),
            ));
        }

        let veranstaltung = self.host_veranstaltung(code).await?;
        let sperre = self.sperre_fuer(EventId(veranstaltung.id));
        let _wache = sperre.lock().await;

        let eintrag = self.eintrag_laden(&veranstaltung, entry_id).await?;
        if eintrag.status != DbWortmeldungsStatus::Speaking {
            return Err(QueueError::UngueltigerZustand {
                erwartet: "speaking",
                tatsaechlich: eintrag.status.als_str(),
            });
        }

        let record = self.queue_repo.extend(eintrag.id, zusatz_sekunden).await?;
        tracing::info!(
            event_id = %record.event_id,
            entry_id = %record.id,
            zusatz_sekunden,
            extended_time = record.extended_time,
            "Redezeit verlaengert"
        );
        Ok(record_to_wortmeldung(record))
    }

    /// Beendet den Redebeitrag des aktiven Sprechers (nur Host)
    ///
    /// `started_at` bleibt fuer die Historie erhalten.
    pub async fn abschliessen(&self, code: &str, entry_id: EntryId) -> QueueResult<Wortmeldung> {
        let veranstaltung = self.host_veranstaltung(code).await?;
        let sperre = self.sperre_fuer(EventId(veranstaltung.id));
        let _wache = sperre.lock().await;

        let eintrag = self.eintrag_laden(&veranstaltung, entry_id).await?;
        if eintrag.status != DbWortmeldungsStatus::Speaking {
            return Err(QueueError::UngueltigerZustand {
                erwartet: "speaking",
                tatsaechlich: eintrag.status.als_str(),
            });
        }

        let record = self.queue_repo.complete(eintrag.id).await?;
        tracing::info!(
            event_id = %record.event_id,
            entry_id = %record.id,
            participant = %record.participant,
            "Redebeitrag abgeschlossen"
        );
        Ok(record_to_wortmeldung(record))
    }

    /// Stellt einen abgeschlossenen Eintrag hinten wieder ein (nur Host)
    ///
    /// Redebeginn und Zusatzzeit werden dabei zurueckgesetzt.
    pub async fn wieder_einreihen(
        &self,
        code: &str,
        entry_id: EntryId,
    ) -> QueueResult<Wortmeldung> {
        let veranstaltung = self.host_veranstaltung(code).await?;
        let sperre = self.sperre_fuer(EventId(veranstaltung.id));
        let _wache = sperre.lock().await;

        let eintrag = self.eintrag_laden(&veranstaltung, entry_id).await?;
        if eintrag.status != DbWortmeldungsStatus::Completed {
            return Err(QueueError::UngueltigerZustand {
                erwartet: "completed",
                tatsaechlich: eintrag.status.als_str(),
            });
        }

        let record = self.queue_repo.requeue(eintrag.id).await?;
        tracing::info!(
            event_id = %record.event_id,
            entry_id = %record.id,
            participant = %record.participant,
            position = record.position,
            "Wortmeldung wieder eingereiht"
        );
        Ok(record_to_wortmeldung(record))
    }

    /// Schliesst den aktiven Sprecher ab und befoerdert den wartenden
    /// Eintrag mit der niedrigsten Position, falls vorhanden (nur Host)
    ///
    /// Bei leerer Liste spricht danach niemand; ein Fehler ist das nicht.
    /// Der soeben abgeschlossene Eintrag wird nie direkt wieder befoerdert.
    pub async fn naechster_sprecher(&self, code: &str) -> QueueResult<SprecherWechsel> {
        let veranstaltung = self.host_veranstaltung(code).await?;
        if veranstaltung.status != VeranstaltungsStatus::Active {
            return Err(QueueError::VeranstaltungNichtAktiv(
                veranstaltung.status.als_str(),
            ));
        }

        let sperre = self.sperre_fuer(EventId(veranstaltung.id));
        let _wache = sperre.lock().await;

        let bisheriger = self.queue_repo.current_speaker(veranstaltung.id).await?;
        let abgeschlossen = match bisheriger {
            Some(aktiv) => Some(self.queue_repo.complete(aktiv.id).await?),
            None => None,
        };
        let ausgeschlossen = abgeschlossen.as_ref().map(|a| a.id);

        let naechster = self
            .queue_repo
            .next_waiting(veranstaltung.id, ausgeschlossen)
            .await?;
        let sprechend = match naechster {
            Some(wartend) => {
                Some(self.queue_repo.start_speaking(wartend.id, Utc::now()).await?)
            }
            None => None,
        };

        match &sprechend {
            Some(record) => tracing::info!(
                event_id = %veranstaltung.id,
                vorheriger = ?abgeschlossen.as_ref().map(|a| &a.participant),
                participant = %record.participant,
                "Naechster Sprecher"
            ),
            None => tracing::info!(
                event_id = %veranstaltung.id,
                vorheriger = ?abgeschlossen.as_ref().map(|a| &a.participant),
                "Redeliste leer, kein naechster Sprecher"
            ),
        }

        Ok(SprecherWechsel {
            abgeschlossen: abgeschlossen.map(record_to_wortmeldung),
            sprechend: sprechend.map(record_to_wortmeldung),
        })
    }

    /// Zusammengesetzte Sicht fuer Host-Ansicht und Teilnehmer-Overlay
    pub async fn uebersicht(&self, code: &str) -> QueueResult<WarteschlangenUebersicht> {
        let (veranstaltung, ist_host) = self.veranstaltung_laden(code).await?;
        let records = self.queue_repo.list_active(veranstaltung.id).await?;
        let (sprecher, naechster) = sprecher_und_naechster(&veranstaltung, &records, Utc::now());

        Ok(WarteschlangenUebersicht {
            ist_host,
            eintraege: records.into_iter().map(record_to_wortmeldung).collect(),
            sprecher,
            naechster,
            veranstaltung,
        })
    }

    /// Leichte Timer-Sicht fuer das Polling der Teilnehmer
    ///
    /// Enthaelt keinen Sprecher, wenn gerade niemand spricht.
    pub async fn timer(&self, code: &str) -> QueueResult<TimerAnsicht> {
        let (veranstaltung, _) = self.veranstaltung_laden(code).await?;
        let records = self.queue_repo.list_active(veranstaltung.id).await?;
        let (sprecher, naechster) = sprecher_und_naechster(&veranstaltung, &records, Utc::now());

        Ok(TimerAnsicht {
            speak_time: veranstaltung.speak_time,
            sprecher,
            naechster,
        })
    }

    // -- interne Helfer --

    async fn veranstaltung_laden(&self, code: &str) -> QueueResult<(VeranstaltungRecord, bool)> {
        let veranstaltung = self
            .event_repo
            .get_by_code(code)
            .await?
            .ok_or_else(|| QueueError::VeranstaltungNichtGefunden(format!("Code {code}")))?;
        let ist_host = veranstaltung.host_code == code;
        Ok((veranstaltung, ist_host))
    }

    /// Laedt die Veranstaltung und verlangt den Host-Code
    async fn host_veranstaltung(&self, code: &str) -> QueueResult<VeranstaltungRecord> {
        let (veranstaltung, ist_host) = self.veranstaltung_laden(code).await?;
        if !ist_host {
            return Err(QueueError::KeineBerechtigung(
                "Nur der Host-Code erlaubt diese Aktion".into(),
            ));
        }
        Ok(veranstaltung)
    }

    /// Laedt eine nicht entfernte Wortmeldung dieser Veranstaltung
    async fn eintrag_laden(
        &self,
        veranstaltung: &VeranstaltungRecord,
        entry_id: EntryId,
    ) -> QueueResult<WortmeldungRecord> {
        let eintrag = self
            .queue_repo
            .get(entry_id.inner())
            .await?
            .filter(|e| e.event_id == veranstaltung.id)
            .filter(|e| e.status != DbWortmeldungsStatus::Removed)
            .ok_or_else(|| QueueError::WortmeldungNichtGefunden(entry_id.to_string()))?;
        Ok(eintrag)
    }

    fn sperre_fuer(&self, event_id: EventId) -> Arc<Mutex<()>> {
        self.sperren
            .entry(event_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Konvertiert einen DB-Record in den Domain-Typ
fn record_to_wortmeldung(record: WortmeldungRecord) -> Wortmeldung {
    let status = match record.status {
        DbWortmeldungsStatus::Waiting => WortmeldungsStatus::Waiting,
        DbWortmeldungsStatus::Speaking => WortmeldungsStatus::Speaking,
        DbWortmeldungsStatus::Completed => WortmeldungsStatus::Completed,
        DbWortmeldungsStatus::Removed => WortmeldungsStatus::Removed,
    };

    Wortmeldung {
        id: EntryId(record.id),
        event_id: EventId(record.event_id),
        participant: record.participant,
        position: record.position,
        status,
        joined_at: record.joined_at,
        started_at: record.started_at,
        extended_time: record.extended_time,
    }
}

/// Sucht in einer geladenen Liste den aktiven Sprecher und den wartenden
/// Eintrag mit der niedrigsten Position
fn sprecher_und_naechster(
    veranstaltung: &VeranstaltungRecord,
    records: &[WortmeldungRecord],
    jetzt: DateTime<Utc>,
) -> (Option<SprecherStand>, Option<Wortmeldung>) {
    let sprecher = records
        .iter()
        .find(|r| r.status == DbWortmeldungsStatus::Speaking)
        .and_then(|r| sprecher_stand(veranstaltung, r, jetzt));
    let naechster = records
        .iter()
        .filter(|r| r.status == DbWortmeldungsStatus::Waiting)
        .min_by_key(|r| r.position)
        .cloned()
        .map(record_to_wortmeldung);
    (sprecher, naechster)
}

/// Baut den Sprecher-Stand samt Timer, sofern ein Redebeginn vorliegt
fn sprecher_stand(
    veranstaltung: &VeranstaltungRecord,
    record: &WortmeldungRecord,
    jetzt: DateTime<Utc>,
) -> Option<SprecherStand> {
    let started_at = record.started_at?;
    Some(SprecherStand {
        timer: restzeit_berechnen(
            veranstaltung.speak_time,
            record.extended_time,
            started_at,
            jetzt,
        ),
        wortmeldung: record_to_wortmeldung(record.clone()),
    })
}
