//! # redeliste-observability
//!
//! Observability-Crate fuer Redeliste:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Strukturiertes Logging via tracing-subscriber
//! - Request-Timing-Middleware fuer die REST-Schicht

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_router, HealthResponse, HealthState, HealthStatus};
pub use logging::logging_initialisieren;
pub use metrics::{globale_metriken, metrics_router, RedelisteMetrics};
pub use middleware::{request_timing_layer, timing_middleware};

use std::net::SocketAddr;

use anyhow::Result;

/// Startet den Observability-HTTP-Server (Metriken + Health)
///
/// Endpunkte:
/// - `GET /metrics`: Prometheus-Scrape-Format
/// - `GET /health`: Health-Check JSON
pub async fn observability_server_starten(
    bind_addr: SocketAddr,
    health_state: HealthState,
) -> Result<()> {
    use axum::Router;

    let app = Router::new()
        .merge(metrics_router())
        .merge(health_router(health_state));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(adresse = %bind_addr, "Observability-Server gestartet");

    axum::serve(listener, app).await?;
    Ok(())
}
