//! REST-Handler, gruppiert nach Ressource

pub mod events;
pub mod queue;
