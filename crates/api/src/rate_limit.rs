//! Token-Bucket-Begrenzung je Client-IP
//!
//! Lese- und Schreibzugriffe haben getrennte Budgets: das Polling der
//! Teilnehmer-Overlays darf deutlich haeufiger anfragen als die
//! schreibenden Host-Aktionen. Buckets fuellen sich kontinuierlich mit
//! ihrem Minutenbudget wieder auf.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Unbenutzte Buckets werden nach dieser Zeit entsorgt
const BUCKET_VERFALL: Duration = Duration::from_secs(300);

/// Token-Bucket fuer einen einzelnen Client
struct TokenBucket {
    token: f64,
    max_token: f64,
    /// Nachschub in Token pro Sekunde
    fuellrate: f64,
    letzte_auffuellung: Instant,
}

impl TokenBucket {
    fn neu(max_token: f64) -> Self {
        Self {
            token: max_token,
            max_token,
            fuellrate: max_token / 60.0,
            letzte_auffuellung: Instant::now(),
        }
    }

    fn auffuellen(&mut self) {
        let jetzt = Instant::now();
        let vergangen = jetzt.duration_since(self.letzte_auffuellung).as_secs_f64();
        self.token = (self.token + vergangen * self.fuellrate).min(self.max_token);
        self.letzte_auffuellung = jetzt;
    }

    fn verbrauchen(&mut self) -> bool {
        self.auffuellen();
        if self.token >= 1.0 {
            self.token -= 1.0;
            true
        } else {
            false
        }
    }

    /// Sekunden bis wieder ein ganzer Token verfuegbar ist
    fn retry_after_secs(&self) -> u64 {
        ((1.0 - self.token) / self.fuellrate).ceil() as u64
    }
}

/// Begrenzung aller Clients mit getrennten Lese- und Schreib-Budgets
pub struct RateLimiter {
    lese_budget: f64,
    schreib_budget: f64,
    lesen: Mutex<HashMap<String, TokenBucket>>,
    schreiben: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    /// Erstellt einen RateLimiter mit Budgets in Anfragen pro Minute
    pub fn neu(lese_pro_minute: u32, schreib_pro_minute: u32) -> Self {
        Self {
            lese_budget: f64::from(lese_pro_minute),
            schreib_budget: f64::from(schreib_pro_minute),
            lesen: Mutex::new(HashMap::new()),
            schreiben: Mutex::new(HashMap::new()),
        }
    }

    /// Prueft einen Lesezugriff; Err nennt die Wartezeit in Sekunden
    pub fn lesen_pruefen(&self, client: &str) -> Result<(), u64> {
        Self::pruefen(&self.lesen, client, self.lese_budget)
    }

    /// Prueft einen Schreibzugriff; Err nennt die Wartezeit in Sekunden
    pub fn schreiben_pruefen(&self, client: &str) -> Result<(), u64> {
        Self::pruefen(&self.schreiben, client, self.schreib_budget)
    }

    fn pruefen(
        buckets: &Mutex<HashMap<String, TokenBucket>>,
        client: &str,
        budget: f64,
    ) -> Result<(), u64> {
        let mut buckets = buckets.lock();
        let bucket = buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::neu(budget));
        if bucket.verbrauchen() {
            Ok(())
        } else {
            Err(bucket.retry_after_secs())
        }
    }

    /// Entfernt Buckets, die laenger als fuenf Minuten unbenutzt sind
    pub fn aufraeumen(&self) {
        self.lesen
            .lock()
            .retain(|_, b| b.letzte_auffuellung.elapsed() < BUCKET_VERFALL);
        self.schreiben
            .lock()
            .retain(|_, b| b.letzte_auffuellung.elapsed() < BUCKET_VERFALL);
    }
}
