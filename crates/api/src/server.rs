//! REST-Server: CORS, Request-Tracing, Metriken und Rate-Limiting
//!
//! Schichtung von aussen nach innen: CORS, Trace, Rate-Limit, Timing,
//! Router. Die Timing-Middleware haengt als `route_layer`, damit sie auf
//! das Routen-Muster zugreifen kann.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json,
};
use tower_http::cors::CorsLayer;

use redeliste_observability::{request_timing_layer, timing_middleware};

use crate::rate_limit::RateLimiter;
use crate::routes::v1_router;
use crate::state::AppState;

/// Konfiguration des REST-Servers
#[derive(Debug, Clone)]
pub struct RestServerKonfig {
    pub bind_addr: SocketAddr,
    /// Erlaubte CORS-Origins; eine leere Liste erlaubt alle
    pub cors_origins: Vec<String>,
    pub lese_limit_pro_minute: u32,
    pub schreib_limit_pro_minute: u32,
}

/// Zustand der Rate-Limit-Middleware
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
}

/// REST-Server der Redeliste
pub struct RestServer {
    konfig: RestServerKonfig,
    state: AppState,
}

impl RestServer {
    pub fn neu(konfig: RestServerKonfig, state: AppState) -> Self {
        Self { konfig, state }
    }

    /// Bindet die Adresse und bedient Anfragen bis zum Beenden
    pub async fn starten(self) -> anyhow::Result<()> {
        let limiter = Arc::new(RateLimiter::neu(
            self.konfig.lese_limit_pro_minute,
            self.konfig.schreib_limit_pro_minute,
        ));

        // Verwaiste Buckets regelmaessig entsorgen
        let aufraeumer = limiter.clone();
        tokio::spawn(async move {
            let mut takt = tokio::time::interval(Duration::from_secs(60));
            loop {
                takt.tick().await;
                aufraeumer.aufraeumen();
            }
        });

        let cors = cors_layer(&self.konfig.cors_origins);
        let app = v1_router()
            .route_layer(middleware::from_fn(timing_middleware))
            .layer(middleware::from_fn_with_state(
                RateLimitState { limiter },
                rate_limit_middleware,
            ))
            .layer(request_timing_layer())
            .layer(cors)
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.konfig.bind_addr).await?;
        tracing::info!(adresse = %self.konfig.bind_addr, "REST-API hoert");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// CORS-Schicht aus der Origin-Liste
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let erlaubte: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(erlaubte)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

/// Ordnet jede Anfrage einem Lese- oder Schreib-Budget zu
async fn rate_limit_middleware(
    State(rls): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(request.headers());
    let ergebnis = if ist_lesend(request.method()) {
        rls.limiter.lesen_pruefen(&client)
    } else {
        rls.limiter.schreiben_pruefen(&client)
    };

    match ergebnis {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(
                client = %client,
                methode = %request.method(),
                pfad = %request.uri().path(),
                retry_after,
                "Rate-Limit erreicht"
            );
            let body = serde_json::json!({
                "error": {
                    "code": "rate_limited",
                    "message": "Zu viele Anfragen",
                    "retry_after_secs": retry_after,
                }
            });
            (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
        }
    }
}

fn ist_lesend(methode: &Method) -> bool {
    matches!(*methode, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Client-IP aus X-Forwarded-For, erster Eintrag der Liste
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|wert| wert.to_str().ok())
        .and_then(|wert| wert.split(',').next())
        .map(|wert| wert.trim().to_string())
        .unwrap_or_else(|| "unbekannt".to_string())
}
