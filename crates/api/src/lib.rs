//! redeliste-api – REST-Schicht der Redeliste
//!
//! Baut die /v1-Routen, bildet Dienst-Fehler auf HTTP-Antworten ab und
//! begrenzt Anfragen je Client-IP. Die Handler bleiben duenn; Validierung
//! und Ablaufregeln liegen in den Dienst-Crates.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;

// Bequeme Re-Exporte
pub use error::ApiError;
pub use routes::v1_router;
pub use server::{RestServer, RestServerKonfig};
pub use state::AppState;
