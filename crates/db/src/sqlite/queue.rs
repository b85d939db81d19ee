//! SQLite-Implementierung des QueueRepository
//!
//! Positionen sind je Veranstaltung lueckenlos 1..N ueber alle nicht
//! entfernten Eintraege. Jede mehrschrittige Mutation laeuft in einer
//! Transaktion; der partielle UNIQUE-Index auf (event_id, position)
//! bleibt dabei an jedem Zwischenschritt erfuellt.

use chrono::{DateTime, Utc};
use sqlx::Row;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NeueWortmeldung, WortmeldungRecord, WortmeldungsStatus};
use crate::repository::{DbResult, QueueRepository};
use crate::sqlite::events::{parse_datetime, parse_opt_datetime};
use crate::sqlite::pool::SqliteDb;

/// Ausweichbereich fuer die zweiphasige Neuvergabe von Positionen,
/// weit oberhalb jeder realen Warteschlangenlaenge
const TEMP_POSITION_BASIS: i64 = 1_000_000;

impl QueueRepository for SqliteDb {
    async fn join(&self, data: NeueWortmeldung<'_>) -> DbResult<WortmeldungRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT COALESCE(MAX(position), 0) AS max_position
             FROM queue_entries WHERE event_id = ? AND status != 'removed'",
        )
        .bind(data.event_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
        let max_position: i64 = row.try_get("max_position")?;
        let position = max_position + 1;

        sqlx::query(
            "INSERT INTO queue_entries
               (id, event_id, participant, position, status, joined_at, started_at, extended_time)
             VALUES (?, ?, ?, ?, 'waiting', ?, NULL, 0)",
        )
        .bind(id.to_string())
        .bind(data.event_id.to_string())
        .bind(data.participant)
        .bind(position)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!("Position {position} bereits vergeben"))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        tx.commit().await?;

        Ok(WortmeldungRecord {
            id,
            event_id: data.event_id,
            participant: data.participant.to_string(),
            position,
            status: WortmeldungsStatus::Waiting,
            joined_at: now,
            started_at: None,
            extended_time: 0,
        })
    }

    async fn get(&self, id: Uuid) -> DbResult<Option<WortmeldungRecord>> {
        let row = sqlx::query(
            "SELECT id, event_id, participant, position, status, joined_at, started_at, extended_time
             FROM queue_entries WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_wortmeldung(&r)).transpose()
    }

    async fn list_active(&self, event_id: Uuid) -> DbResult<Vec<WortmeldungRecord>> {
        let rows = sqlx::query(
            "SELECT id, event_id, participant, position, status, joined_at, started_at, extended_time
             FROM queue_entries
             WHERE event_id = ? AND status != 'removed'
             ORDER BY position ASC",
        )
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_wortmeldung).collect()
    }

    async fn find_participant(
        &self,
        event_id: Uuid,
        participant: &str,
    ) -> DbResult<Option<WortmeldungRecord>> {
        let row = sqlx::query(
            "SELECT id, event_id, participant, position, status, joined_at, started_at, extended_time
             FROM queue_entries
             WHERE event_id = ? AND participant = ? AND status IN ('waiting', 'speaking')
             LIMIT 1",
        )
        .bind(event_id.to_string())
        .bind(participant)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_wortmeldung(&r)).transpose()
    }

    async fn current_speaker(&self, event_id: Uuid) -> DbResult<Option<WortmeldungRecord>> {
        let row = sqlx::query(
            "SELECT id, event_id, participant, position, status, joined_at, started_at, extended_time
             FROM queue_entries
             WHERE event_id = ? AND status = 'speaking'
             LIMIT 1",
        )
        .bind(event_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_wortmeldung(&r)).transpose()
    }

    async fn next_waiting(
        &self,
        event_id: Uuid,
        exclude: Option<Uuid>,
    ) -> DbResult<Option<WortmeldungRecord>> {
        let row = if let Some(ausgeschlossen) = exclude {
            sqlx::query(
                "SELECT id, event_id, participant, position, status, joined_at, started_at, extended_time
                 FROM queue_entries
                 WHERE event_id = ? AND status = 'waiting' AND id != ?
                 ORDER BY position ASC LIMIT 1",
            )
            .bind(event_id.to_string())
            .bind(ausgeschlossen.to_string())
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT id, event_id, participant, position, status, joined_at, started_at, extended_time
                 FROM queue_entries
                 WHERE event_id = ? AND status = 'waiting'
                 ORDER BY position ASC LIMIT 1",
            )
            .bind(event_id.to_string())
            .fetch_optional(&self.pool)
            .await?
        };

        row.map(|r| row_to_wortmeldung(&r)).transpose()
    }

    async fn remove(&self, id: Uuid) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT event_id, position FROM queue_entries WHERE id = ? AND status != 'removed'",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            None => {
                tx.rollback().await?;
                return Err(DbError::nicht_gefunden(format!("Wortmeldung {id}")));
            }
            Some(r) => r,
        };

        let event_id: String = row.try_get("event_id")?;
        let position: i64 = row.try_get("position")?;

        sqlx::query("UPDATE queue_entries SET status = 'removed' WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        // Luecke schliessen: aufsteigend nachziehen, sonst kollidiert eine
        // Zwischenposition mit dem UNIQUE-Index
        let betroffene = sqlx::query(
            "SELECT id FROM queue_entries
             WHERE event_id = ? AND status != 'removed' AND position > ?
             ORDER BY position ASC",
        )
        .bind(&event_id)
        .bind(position)
        .fetch_all(&mut *tx)
        .await?;

        for r in &betroffene {
            let betroffen_id: String = r.try_get("id")?;
            sqlx::query("UPDATE queue_entries SET position = position - 1 WHERE id = ?")
                .bind(&betroffen_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn reorder(&self, event_id: Uuid, entry_ids: &[Uuid]) -> DbResult<Vec<WortmeldungRecord>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "SELECT id, status FROM queue_entries
             WHERE event_id = ? AND status != 'removed'
             ORDER BY position ASC",
        )
        .bind(event_id.to_string())
        .fetch_all(&mut *tx)
        .await?;

        let mut wartende: Vec<Uuid> = Vec::new();
        let mut uebrige: Vec<Uuid> = Vec::new();
        for r in &rows {
            let id_str: String = r.try_get("id")?;
            let id = Uuid::parse_str(&id_str)
                .map_err(|e| DbError::intern(format!("Ungueltige Entry-UUID '{id_str}': {e}")))?;
            let status_str: String = r.try_get("status")?;
            if status_str == "waiting" {
                wartende.push(id);
            } else {
                uebrige.push(id);
            }
        }

        let mut gesehen = HashSet::new();
        for id in entry_ids {
            if !wartende.contains(id) {
                tx.rollback().await?;
                return Err(DbError::nicht_gefunden(format!(
                    "Wortmeldung {id} nicht unter den wartenden Eintraegen"
                )));
            }
            if !gesehen.insert(*id) {
                tx.rollback().await?;
                return Err(DbError::UngueltigeDaten(format!(
                    "Wortmeldung {id} mehrfach in der Zielreihenfolge"
                )));
            }
        }
        if entry_ids.len() != wartende.len() {
            tx.rollback().await?;
            return Err(DbError::UngueltigeDaten(
                "Zielreihenfolge muss alle wartenden Eintraege genau einmal enthalten".into(),
            ));
        }

        // Wartende in Zielreihenfolge nach vorn, sprechende und abgeschlossene
        // Eintraege in bisheriger Reihenfolge dahinter
        let mut reihenfolge: Vec<Uuid> = entry_ids.to_vec();
        reihenfolge.extend(uebrige);

        // Phase 1: alle betroffenen Eintraege in den Ausweichbereich
        for (i, id) in reihenfolge.iter().enumerate() {
            sqlx::query("UPDATE queue_entries SET position = ? WHERE id = ?")
                .bind(TEMP_POSITION_BASIS + i as i64)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        // Phase 2: endgueltige Positionen 1..N
        for (i, id) in reihenfolge.iter().enumerate() {
            sqlx::query("UPDATE queue_entries SET position = ? WHERE id = ?")
                .bind(i as i64 + 1)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.list_active(event_id).await
    }

    async fn start_speaking(
        &self,
        id: Uuid,
        started_at: DateTime<Utc>,
    ) -> DbResult<WortmeldungRecord> {
        let affected = sqlx::query(
            "UPDATE queue_entries SET status = 'speaking', started_at = ?
             WHERE id = ? AND status = 'waiting'",
        )
        .bind(started_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Wartende Wortmeldung {id}")));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Wortmeldung {id}")))
    }

    async fn complete(&self, id: Uuid) -> DbResult<WortmeldungRecord> {
        // started_at bleibt als Historie erhalten
        let affected = sqlx::query(
            "UPDATE queue_entries SET status = 'completed'
             WHERE id = ? AND status = 'speaking'",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Sprechende Wortmeldung {id}")));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Wortmeldung {id}")))
    }

    async fn extend(&self, id: Uuid, additional_seconds: i64) -> DbResult<WortmeldungRecord> {
        let affected = sqlx::query(
            "UPDATE queue_entries SET extended_time = extended_time + ?
             WHERE id = ? AND status = 'speaking'",
        )
        .bind(additional_seconds)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Sprechende Wortmeldung {id}")));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Wortmeldung {id}")))
    }

    async fn requeue(&self, id: Uuid) -> DbResult<WortmeldungRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT event_id, position FROM queue_entries WHERE id = ? AND status = 'completed'",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            None => {
                tx.rollback().await?;
                return Err(DbError::nicht_gefunden(format!(
                    "Abgeschlossene Wortmeldung {id}"
                )));
            }
            Some(r) => r,
        };

        let event_id: String = row.try_get("event_id")?;
        let position: i64 = row.try_get("position")?;

        // Eintrag zunaechst in den Ausweichbereich, damit das Schliessen
        // der alten Luecke keine Zwischenkollision erzeugt
        sqlx::query(
            "UPDATE queue_entries
             SET status = 'waiting', position = ?, started_at = NULL, extended_time = 0
             WHERE id = ?",
        )
        .bind(TEMP_POSITION_BASIS)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        let betroffene = sqlx::query(
            "SELECT id FROM queue_entries
             WHERE event_id = ? AND status != 'removed' AND position > ? AND position < ?
             ORDER BY position ASC",
        )
        .bind(&event_id)
        .bind(position)
        .bind(TEMP_POSITION_BASIS)
        .fetch_all(&mut *tx)
        .await?;

        for r in &betroffene {
            let betroffen_id: String = r.try_get("id")?;
            sqlx::query("UPDATE queue_entries SET position = position - 1 WHERE id = ?")
                .bind(&betroffen_id)
                .execute(&mut *tx)
                .await?;
        }

        // Ans Ende anhaengen: Position = Anzahl nicht entfernter Eintraege
        let row = sqlx::query(
            "SELECT COUNT(*) AS anzahl FROM queue_entries
             WHERE event_id = ? AND status != 'removed'",
        )
        .bind(&event_id)
        .fetch_one(&mut *tx)
        .await?;
        let anzahl: i64 = row.try_get("anzahl")?;

        sqlx::query("UPDATE queue_entries SET position = ? WHERE id = ?")
            .bind(anzahl)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Wortmeldung {id}")))
    }
}

fn row_to_wortmeldung(row: &sqlx::sqlite::SqliteRow) -> DbResult<WortmeldungRecord> {
    let id_str: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige Entry-UUID '{id_str}': {e}")))?;

    let event_id_str: String = row.try_get("event_id")?;
    let event_id = Uuid::parse_str(&event_id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige Event-UUID '{event_id_str}': {e}")))?;

    let status_str: String = row.try_get("status")?;
    let status = status_str
        .parse()
        .map_err(|e| DbError::intern(format!("Status: {e}")))?;

    Ok(WortmeldungRecord {
        id,
        event_id,
        participant: row.try_get("participant")?,
        position: row.try_get("position")?,
        status,
        joined_at: parse_datetime(row, "joined_at")?,
        started_at: parse_opt_datetime(row, "started_at")?,
        extended_time: row.try_get("extended_time")?,
    })
}
