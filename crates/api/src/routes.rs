//! Routen der REST-Schicht (Version 1)

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{events, queue};
use crate::state::AppState;

/// Baut den Router mit allen /v1-Routen
pub fn v1_router() -> Router<AppState> {
    Router::new()
        // Veranstaltungen
        .route("/v1/events", post(events::erstellen))
        .route(
            "/v1/events/:code",
            get(events::uebersicht).patch(events::aktualisieren),
        )
        .route("/v1/events/:code/next", post(events::naechster_sprecher))
        .route("/v1/events/:code/timer", get(events::timer))
        // Warteschlange
        .route("/v1/queue/join", post(queue::beitreten))
        .route("/v1/queue/reorder", put(queue::neu_ordnen))
        .route("/v1/queue/:id", delete(queue::entfernen))
        .route("/v1/queue/:id/start", post(queue::sprecher_starten))
        .route("/v1/queue/:id/extend", post(queue::verlaengern))
        .route("/v1/queue/:id/complete", post(queue::abschliessen))
        .route("/v1/queue/:id/requeue", post(queue::wieder_einreihen))
}
