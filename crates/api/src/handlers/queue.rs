//! Handler fuer Beitritt, Reihenfolge und Eintrags-Aktionen

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use redeliste_core::EntryId;
use redeliste_observability::globale_metriken;
use redeliste_queue::Wortmeldung;

use crate::error::ApiError;
use crate::state::AppState;

/// Zugangscode als Query-Parameter der Eintrags-Aktionen
#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    pub code: String,
}

/// Body fuer POST /v1/queue/join
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Beitritt {
    pub code: String,
    pub participant: String,
}

/// POST /v1/queue/join
pub async fn beitreten(
    State(state): State<AppState>,
    Json(body): Json<Beitritt>,
) -> Result<(StatusCode, Json<Wortmeldung>), ApiError> {
    let wortmeldung = state
        .warteschlange
        .beitreten(&body.code, &body.participant)
        .await?;
    globale_metriken().queue_joins_total.inc();
    Ok((StatusCode::CREATED, Json(wortmeldung)))
}

/// Body fuer PUT /v1/queue/reorder
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Neuordnung {
    pub code: String,
    pub entry_ids: Vec<EntryId>,
}

/// PUT /v1/queue/reorder (nur Host)
///
/// Erwartet die vollstaendige Zielreihenfolge der wartenden Eintraege
/// und antwortet mit der aktualisierten Gesamtliste.
pub async fn neu_ordnen(
    State(state): State<AppState>,
    Json(body): Json<Neuordnung>,
) -> Result<Json<Vec<Wortmeldung>>, ApiError> {
    let eintraege = state
        .warteschlange
        .neu_ordnen(&body.code, &body.entry_ids)
        .await?;
    Ok(Json(eintraege))
}

/// DELETE /v1/queue/:id (nur Host)
pub async fn entfernen(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
    Query(query): Query<CodeQuery>,
) -> Result<StatusCode, ApiError> {
    state.warteschlange.entfernen(&query.code, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/queue/:id/start (nur Host)
pub async fn sprecher_starten(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<Wortmeldung>, ApiError> {
    let wortmeldung = state.warteschlange.sprecher_starten(&query.code, id).await?;
    Ok(Json(wortmeldung))
}

/// Body fuer POST /v1/queue/:id/extend
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Verlaengerung {
    pub additional_seconds: i64,
}

/// POST /v1/queue/:id/extend (nur Host)
pub async fn verlaengern(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
    Query(query): Query<CodeQuery>,
    Json(body): Json<Verlaengerung>,
) -> Result<Json<Wortmeldung>, ApiError> {
    let wortmeldung = state
        .warteschlange
        .verlaengern(&query.code, id, body.additional_seconds)
        .await?;
    globale_metriken().time_extensions_total.inc();
    Ok(Json(wortmeldung))
}

/// POST /v1/queue/:id/complete (nur Host)
pub async fn abschliessen(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<Wortmeldung>, ApiError> {
    let wortmeldung = state.warteschlange.abschliessen(&query.code, id).await?;
    Ok(Json(wortmeldung))
}

/// POST /v1/queue/:id/requeue (nur Host)
pub async fn wieder_einreihen(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<Wortmeldung>, ApiError> {
    let wortmeldung = state
        .warteschlange
        .wieder_einreihen(&query.code, id)
        .await?;
    Ok(Json(wortmeldung))
}
