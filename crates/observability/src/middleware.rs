//! Request-Timing Middleware fuer Axum
//!
//! Misst die Antwortzeit jeder HTTP-Anfrage, protokolliert sie als
//! strukturiertes Log-Event und pflegt die Prometheus-HTTP-Metriken.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, Response},
    middleware::Next,
};

use crate::metrics::globale_metriken;

/// Axum-Middleware-Layer fuer Request-Spans.
///
/// Ergaenzt die Timing-Middleware um Span-Kontext auf Debug-Level.
pub fn request_timing_layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
> {
    use tower_http::trace::TraceLayer;
    TraceLayer::new_for_http()
}

/// Misst die Antwortzeit, loggt sie und fuettert die HTTP-Metriken.
///
/// Als `route_layer` eingehaengt, damit `MatchedPath` das Routen-Muster
/// statt des konkreten Pfads liefert und die Label-Kardinalitaet
/// begrenzt bleibt:
/// ```ignore
/// Router::new()
///     .route("/", get(handler))
///     .route_layer(axum::middleware::from_fn(timing_middleware))
/// ```
pub async fn timing_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let methode = req.method().to_string();
    let pfad = req.uri().path().to_string();
    let muster = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| pfad.clone());
    let start = Instant::now();

    let response = next.run(req).await;

    let dauer = start.elapsed();
    let status = response.status().as_u16();

    let metriken = globale_metriken();
    metriken
        .http_requests_total
        .with_label_values(&[&methode, &muster, &status.to_string()])
        .inc();
    metriken
        .http_request_duration_seconds
        .with_label_values(&[&methode, &muster])
        .observe(dauer.as_secs_f64());

    tracing::info!(
        method = %methode,
        path = %pfad,
        status = status,
        duration_ms = dauer.as_millis(),
        "HTTP-Anfrage abgeschlossen"
    );

    response
}
