//! Unit-Tests fuer das Warteschlangen-Crate

mod sprecher_tests;
mod warteschlangen_service_tests;
