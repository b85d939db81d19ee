//! Gemeinsamer Zustand der REST-Handler

use std::sync::Arc;

use redeliste_db::SqliteDb;
use redeliste_event::VeranstaltungsService;
use redeliste_queue::WarteschlangenService;

/// Von allen Handlern geteilte Dienste
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<VeranstaltungsService<SqliteDb>>,
    pub warteschlange: Arc<WarteschlangenService<SqliteDb, SqliteDb>>,
}

impl AppState {
    /// Baut den Zustand ueber einer geoeffneten Datenbank auf
    pub fn neu(db: Arc<SqliteDb>) -> Self {
        Self {
            events: VeranstaltungsService::neu(db.clone()),
            warteschlange: WarteschlangenService::neu(db.clone(), db),
        }
    }
}
