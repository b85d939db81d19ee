//! Strukturiertes Logging via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `RL_LOG_LEVEL`: Log-Level (trace/debug/info/warn/error), Standard: info
//! - `RL_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Die Umgebung hat Vorrang vor den uebergebenen Konfigurationswerten.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialisiert das Logging-System.
///
/// Liest `RL_LOG_LEVEL` und `RL_LOG_FORMAT` aus der Umgebung und faellt
/// auf die uebergebenen Werte zurueck, zuletzt auf `info` / `text`.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env("RL_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_env = std::env::var("RL_LOG_FORMAT").unwrap_or_else(|_| format.to_string());

    match format_env.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Log-Level aus der Umgebung, Fallback "info"
pub fn log_level_aus_env() -> String {
    std::env::var("RL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// Log-Format aus der Umgebung, Fallback "text"
pub fn log_format_aus_env() -> String {
    std::env::var("RL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string())
}

/// Prueft ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Prueft ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
