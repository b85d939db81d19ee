//! Handler fuer Veranstaltungen, Sprecherwechsel und Timer

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use redeliste_db::models::{VeranstaltungUpdate, VeranstaltungsStatus};
use redeliste_observability::globale_metriken;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{NaechsterAntwort, TimerAntwort, UebersichtAntwort, VeranstaltungAntwort};

/// Body fuer POST /v1/events
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VeranstaltungErstellen {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub speak_time: i64,
}

/// POST /v1/events
///
/// Legt eine Veranstaltung an; die Antwort enthaelt beide Zugangscodes.
pub async fn erstellen(
    State(state): State<AppState>,
    Json(body): Json<VeranstaltungErstellen>,
) -> Result<(StatusCode, Json<VeranstaltungAntwort>), ApiError> {
    let veranstaltung = state
        .events
        .erstellen(&body.name, body.description.as_deref(), body.speak_time)
        .await?;
    globale_metriken().events_created_total.inc();
    Ok((
        StatusCode::CREATED,
        Json(VeranstaltungAntwort::aus(veranstaltung, true)),
    ))
}

/// GET /v1/events/:code
pub async fn uebersicht(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<UebersichtAntwort>, ApiError> {
    let uebersicht = state.warteschlange.uebersicht(&code).await?;
    Ok(Json(UebersichtAntwort::aus(uebersicht)))
}

/// Body fuer PATCH /v1/events/:code
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VeranstaltungBearbeiten {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub speak_time: Option<i64>,
    #[serde(default)]
    pub status: Option<VeranstaltungsStatus>,
}

/// PATCH /v1/events/:code (nur Host)
pub async fn aktualisieren(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<VeranstaltungBearbeiten>,
) -> Result<Json<VeranstaltungAntwort>, ApiError> {
    let aenderung = VeranstaltungUpdate {
        name: body.name,
        description: body.description.map(Some),
        speak_time: body.speak_time,
        status: body.status,
    };
    let veranstaltung = state.events.aktualisieren(&code, aenderung).await?;
    Ok(Json(VeranstaltungAntwort::aus(veranstaltung, true)))
}

/// POST /v1/events/:code/next (nur Host)
pub async fn naechster_sprecher(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<NaechsterAntwort>, ApiError> {
    let wechsel = state.warteschlange.naechster_sprecher(&code).await?;
    globale_metriken().speaker_changes_total.inc();
    Ok(Json(NaechsterAntwort::aus(wechsel)))
}

/// GET /v1/events/:code/timer
pub async fn timer(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<TimerAntwort>, ApiError> {
    let ansicht = state.warteschlange.timer(&code).await?;
    Ok(Json(TimerAntwort::aus(ansicht)))
}
