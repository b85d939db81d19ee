//! SQLite-Implementierung des EventRepository

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NeueVeranstaltung, VeranstaltungRecord, VeranstaltungUpdate};
use crate::repository::{DbResult, EventRepository};
use crate::sqlite::pool::SqliteDb;

impl EventRepository for SqliteDb {
    async fn create(&self, data: NeueVeranstaltung<'_>) -> DbResult<VeranstaltungRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        sqlx::query(
            "INSERT INTO events
               (id, name, description, speak_time, host_code, share_code, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 'preparing', ?, ?)",
        )
        .bind(&id_str)
        .bind(data.name)
        .bind(data.description)
        .bind(data.speak_time)
        .bind(data.host_code)
        .bind(data.share_code)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit("Zugangscode bereits vergeben".into())
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(VeranstaltungRecord {
            id,
            name: data.name.to_string(),
            description: data.description.map(|s| s.to_string()),
            speak_time: data.speak_time,
            host_code: data.host_code.to_string(),
            share_code: data.share_code.to_string(),
            status: crate::models::VeranstaltungsStatus::Preparing,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<VeranstaltungRecord>> {
        let row = sqlx::query(
            "SELECT id, name, description, speak_time, host_code, share_code, status,
                    created_at, updated_at
             FROM events WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_veranstaltung(&r)).transpose()
    }

    async fn get_by_code(&self, code: &str) -> DbResult<Option<VeranstaltungRecord>> {
        let row = sqlx::query(
            "SELECT id, name, description, speak_time, host_code, share_code, status,
                    created_at, updated_at
             FROM events WHERE host_code = ? OR share_code = ?",
        )
        .bind(code)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_veranstaltung(&r)).transpose()
    }

    async fn code_exists(&self, host_code: &str, share_code: &str) -> DbResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS anzahl FROM events
             WHERE host_code IN (?, ?) OR share_code IN (?, ?)",
        )
        .bind(host_code)
        .bind(share_code)
        .bind(host_code)
        .bind(share_code)
        .fetch_one(&self.pool)
        .await?;

        let anzahl: i64 = row.try_get("anzahl")?;
        Ok(anzahl > 0)
    }

    async fn update(&self, id: Uuid, data: VeranstaltungUpdate) -> DbResult<VeranstaltungRecord> {
        // Dynamisches UPDATE – nur gesetzte Felder aendern
        let mut sets: Vec<&str> = Vec::new();
        if data.name.is_some() {
            sets.push("name = ?");
        }
        if data.description.is_some() {
            sets.push("description = ?");
        }
        if data.speak_time.is_some() {
            sets.push("speak_time = ?");
        }
        if data.status.is_some() {
            sets.push("status = ?");
        }

        if sets.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("Veranstaltung {id}")));
        }

        sets.push("updated_at = ?");
        let sql = format!("UPDATE events SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.name {
            q = q.bind(v);
        }
        if let Some(ref v) = data.description {
            q = q.bind(v.as_deref());
        }
        if let Some(v) = data.speak_time {
            q = q.bind(v);
        }
        if let Some(v) = data.status {
            q = q.bind(v.als_str());
        }
        q = q.bind(Utc::now().to_rfc3339());
        q = q.bind(id.to_string());

        let affected = q.execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Veranstaltung {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Veranstaltung {id}")))
    }
}

pub(crate) fn row_to_veranstaltung(row: &sqlx::sqlite::SqliteRow) -> DbResult<VeranstaltungRecord> {
    let id_str: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige Event-UUID '{id_str}': {e}")))?;

    let status_str: String = row.try_get("status")?;
    let status = status_str
        .parse()
        .map_err(|e| DbError::intern(format!("Status: {e}")))?;

    Ok(VeranstaltungRecord {
        id,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        speak_time: row.try_get("speak_time")?,
        host_code: row.try_get("host_code")?,
        share_code: row.try_get("share_code")?,
        status,
        created_at: parse_datetime(row, "created_at")?,
        updated_at: parse_datetime(row, "updated_at")?,
    })
}

pub(crate) fn parse_datetime(
    row: &sqlx::sqlite::SqliteRow,
    col: &str,
) -> DbResult<chrono::DateTime<Utc>> {
    let s: String = row.try_get(col)?;
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige DateTime in '{col}': {e}")))
}

pub(crate) fn parse_opt_datetime(
    row: &sqlx::sqlite::SqliteRow,
    col: &str,
) -> DbResult<Option<chrono::DateTime<Utc>>> {
    let s: Option<String> = row.try_get(col)?;
    s.as_deref()
        .map(|v| {
            chrono::DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::intern(format!("Ungueltige DateTime in '{col}': {e}")))
        })
        .transpose()
}
