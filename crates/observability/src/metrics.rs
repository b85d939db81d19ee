//! Prometheus-kompatible Metriken fuer Redeliste
//!
//! Registrierte Metriken:
//! - `redeliste_events_created_total`: Counter, angelegte Veranstaltungen
//! - `redeliste_queue_joins_total`: Counter, eingereihte Wortmeldungen
//! - `redeliste_speaker_changes_total`: Counter, Sprecherwechsel
//! - `redeliste_time_extensions_total`: Counter, Redezeit-Verlaengerungen
//! - `redeliste_http_requests_total`: Counter, HTTP-Anfragen (method, path, status)
//! - `redeliste_http_request_duration_seconds`: Histogram, HTTP-Antwortzeit
//!
//! Die Domaenen-Zaehler werden von den REST-Handlern gepflegt, die
//! HTTP-Metriken von der Timing-Middleware.

use std::sync::Arc;
use std::sync::OnceLock;

use anyhow::Result;
use axum::{response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Alle Redeliste-Prometheus-Metriken
#[derive(Clone)]
pub struct RedelisteMetrics {
    pub registry: Arc<Registry>,

    // Domaenen-Metriken
    pub events_created_total: IntCounter,
    pub queue_joins_total: IntCounter,
    pub speaker_changes_total: IntCounter,
    pub time_extensions_total: IntCounter,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl RedelisteMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Domaenen-Metriken ---
        let events_created_total = IntCounter::with_opts(Opts::new(
            "redeliste_events_created_total",
            "Gesamtanzahl angelegter Veranstaltungen",
        ))?;
        registry.register(Box::new(events_created_total.clone()))?;

        let queue_joins_total = IntCounter::with_opts(Opts::new(
            "redeliste_queue_joins_total",
            "Gesamtanzahl eingereihter Wortmeldungen",
        ))?;
        registry.register(Box::new(queue_joins_total.clone()))?;

        let speaker_changes_total = IntCounter::with_opts(Opts::new(
            "redeliste_speaker_changes_total",
            "Gesamtanzahl der Sprecherwechsel",
        ))?;
        registry.register(Box::new(speaker_changes_total.clone()))?;

        let time_extensions_total = IntCounter::with_opts(Opts::new(
            "redeliste_time_extensions_total",
            "Gesamtanzahl gewaehrter Redezeit-Verlaengerungen",
        ))?;
        registry.register(Box::new(time_extensions_total.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "redeliste_http_requests_total",
                "Gesamtanzahl HTTP-Anfragen",
            ),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "redeliste_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            events_created_total,
            queue_joins_total,
            speaker_changes_total,
            time_extensions_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Prozessweite Metrik-Instanz, geteilt von Handlern und Middleware
pub fn globale_metriken() -> &'static RedelisteMetrics {
    static METRIKEN: OnceLock<RedelisteMetrics> = OnceLock::new();
    METRIKEN
        .get_or_init(|| RedelisteMetrics::neu().expect("Metriken-Initialisierung fehlgeschlagen"))
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(globale_metriken().clone())
}

async fn metrics_handler(
    axum::extract::State(metriken): axum::extract::State<RedelisteMetrics>,
) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
