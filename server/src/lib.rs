//! redeliste-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Dienste, REST-API und Observability zu einem
//! lauffaehigen Server.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use redeliste_api::{AppState, RestServer, RestServerKonfig};
use redeliste_db::{DatabaseConfig, SqliteDb};
use redeliste_observability::{observability_server_starten, HealthState};

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen und migrieren
    /// 2. Observability-Server starten (falls aktiviert)
    /// 3. REST-API starten
    /// 4. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            api = %self.config.api_bind_adresse(),
            "Server startet"
        );

        let db_config = DatabaseConfig {
            url: self.config.datenbank.url.clone(),
            max_verbindungen: self.config.datenbank.max_verbindungen,
            sqlite_wal: self.config.datenbank.wal,
        };
        let db = Arc::new(
            SqliteDb::oeffnen(&db_config)
                .await
                .context("Datenbank konnte nicht geoeffnet werden")?,
        );

        let health = HealthState::neu();

        // Regelmaessiger Ping haelt den Health-Status aktuell
        {
            let db = db.clone();
            let health = health.clone();
            tokio::spawn(async move {
                let mut takt = tokio::time::interval(Duration::from_secs(30));
                loop {
                    takt.tick().await;
                    health.db_status_setzen(db.ping().await.is_ok());
                }
            });
        }

        if self.config.observability.aktiviert {
            let adresse = self
                .config
                .observability_bind_adresse()
                .parse()
                .context("Ungueltige Observability-Adresse")?;
            let health = health.clone();
            tokio::spawn(async move {
                if let Err(e) = observability_server_starten(adresse, health).await {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            });
        }

        let api_konfig = RestServerKonfig {
            bind_addr: self
                .config
                .api_bind_adresse()
                .parse()
                .context("Ungueltige API-Adresse")?,
            cors_origins: self.config.api.cors_origins.clone(),
            lese_limit_pro_minute: self.config.api.lese_limit_pro_minute,
            schreib_limit_pro_minute: self.config.api.schreib_limit_pro_minute,
        };
        let rest = RestServer::neu(api_konfig, AppState::neu(db));
        let mut rest_task = tokio::spawn(rest.starten());

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::select! {
            ergebnis = &mut rest_task => match ergebnis {
                Ok(Ok(())) => tracing::warn!("REST-API hat sich beendet"),
                Ok(Err(e)) => return Err(e.context("REST-API fehlgeschlagen")),
                Err(e) => return Err(anyhow::anyhow!("REST-API-Task abgestuerzt: {e}")),
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            }
        }

        Ok(())
    }
}
