//! Fehlerabbildung der REST-Schicht
//!
//! Jeder Dienst-Fehler wird auf einen HTTP-Status und einen stabilen
//! Fehlergrund abgebildet. Interne Fehler verlassen den Server nur als
//! generische Meldung; die Details landen im Log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use redeliste_event::EventError;
use redeliste_queue::QueueError;

/// Fehler der REST-Schicht, gespeist aus den Dienst-Crates
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ApiError {
    /// HTTP-Status der Antwort
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Event(e) => match e {
                EventError::NichtGefunden(_) => StatusCode::NOT_FOUND,
                EventError::KeineBerechtigung(_) => StatusCode::FORBIDDEN,
                EventError::UngueltigerStatuswechsel { .. } => StatusCode::CONFLICT,
                EventError::UngueltigeEingabe(_) => StatusCode::BAD_REQUEST,
                EventError::CodeErzeugung(_) | EventError::DatenbankFehler(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Queue(e) => match e {
                QueueError::VeranstaltungNichtGefunden(_)
                | QueueError::WortmeldungNichtGefunden(_)
                | QueueError::UnbekannterEintrag(_) => StatusCode::NOT_FOUND,
                QueueError::KeineBerechtigung(_) => StatusCode::FORBIDDEN,
                QueueError::VeranstaltungBeendet
                | QueueError::VeranstaltungNichtAktiv(_)
                | QueueError::SprecherBereitsAktiv(_)
                | QueueError::DoppelteWortmeldung(_)
                | QueueError::UngueltigerZustand { .. } => StatusCode::CONFLICT,
                QueueError::UngueltigeEingabe(_) => StatusCode::BAD_REQUEST,
                QueueError::Konflikt(_) => StatusCode::SERVICE_UNAVAILABLE,
                QueueError::DatenbankFehler(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Stabiler Fehlergrund fuer Clients
    pub fn grund(&self) -> &'static str {
        match self.status() {
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::FORBIDDEN => "not_authorized",
            StatusCode::CONFLICT => "invalid_state",
            StatusCode::BAD_REQUEST => "validation_error",
            StatusCode::SERVICE_UNAVAILABLE => "conflict",
            _ => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let nachricht = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(fehler = %self, "Interner Fehler in der REST-Schicht");
            "Interner Serverfehler".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": {
                "code": self.grund(),
                "message": nachricht,
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statusabbildung_der_dienstfehler() {
        let faelle: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                ApiError::Queue(QueueError::VeranstaltungNichtGefunden("Code X".into())),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                ApiError::Queue(QueueError::UnbekannterEintrag("abc".into())),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                ApiError::Queue(QueueError::KeineBerechtigung("nur Host".into())),
                StatusCode::FORBIDDEN,
                "not_authorized",
            ),
            (
                ApiError::Queue(QueueError::DoppelteWortmeldung("anna".into())),
                StatusCode::CONFLICT,
                "invalid_state",
            ),
            (
                ApiError::Queue(QueueError::VeranstaltungBeendet),
                StatusCode::CONFLICT,
                "invalid_state",
            ),
            (
                ApiError::Queue(QueueError::UngueltigeEingabe("leer".into())),
                StatusCode::BAD_REQUEST,
                "validation_error",
            ),
            (
                ApiError::Queue(QueueError::Konflikt("aufgegeben".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                "conflict",
            ),
            (
                ApiError::Event(EventError::CodeErzeugung(10)),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
            ),
            (
                ApiError::Event(EventError::UngueltigerStatuswechsel {
                    von: "finished",
                    nach: "active",
                }),
                StatusCode::CONFLICT,
                "invalid_state",
            ),
        ];

        for (fehler, status, grund) in faelle {
            assert_eq!(fehler.status(), status, "Status fuer {fehler}");
            assert_eq!(fehler.grund(), grund, "Grund fuer {fehler}");
        }
    }

    #[test]
    fn meldung_kommt_vom_dienstfehler() {
        let fehler = ApiError::Queue(QueueError::VeranstaltungBeendet);
        assert_eq!(fehler.to_string(), "Veranstaltung ist bereits beendet");
    }
}
