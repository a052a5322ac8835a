//! config/campaign_config.rs
//! Configuración global del servicio (servidor, sesión de WhatsApp, campañas).
//! Los valores salen del entorno (.env vía dotenv) con defaults razonables.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub server_workers: usize,

    /// URL base de la API de sesión de WhatsApp (sin "/" final)
    pub whatsapp_api_url: String,
    pub whatsapp_session_id: String,
    pub whatsapp_timeout_secs: u64,

    /// Delays por defecto si el request no trae delayMin/delayMax (ms)
    pub default_delay_min_ms: u64,
    pub default_delay_max_ms: u64,

    /// Capacidad del canal de broadcast de eventos
    pub event_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            server_host: "0.0.0.0".to_string(),
            server_port: 5022,
            server_workers: 1,
            whatsapp_api_url: "http://localhost:3000".to_string(),
            whatsapp_session_id: "default".to_string(),
            whatsapp_timeout_secs: 30,
            default_delay_min_ms: 3_000,
            default_delay_max_ms: 8_000,
            event_buffer: 256,
        }
    }
}

impl AppConfig {
    /// Lee la configuración del entorno. Variables ausentes usan el default;
    /// variables presentes pero inválidas hacen fallar el arranque.
    pub fn from_env() -> Result<Self> {
        let defaults = AppConfig::default();

        let config = AppConfig {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            server_workers: parse_var("SERVER_WORKERS", defaults.server_workers)?,
            whatsapp_api_url: env::var("WHATSAPP_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.whatsapp_api_url),
            whatsapp_session_id: env::var("WHATSAPP_API_SESSION_ID")
                .unwrap_or(defaults.whatsapp_session_id),
            whatsapp_timeout_secs: parse_var(
                "WHATSAPP_REQUEST_TIMEOUT_SECS",
                defaults.whatsapp_timeout_secs,
            )?,
            default_delay_min_ms: parse_var(
                "CAMPAIGN_DEFAULT_DELAY_MIN_MS",
                defaults.default_delay_min_ms,
            )?,
            default_delay_max_ms: parse_var(
                "CAMPAIGN_DEFAULT_DELAY_MAX_MS",
                defaults.default_delay_max_ms,
            )?,
            event_buffer: parse_var("CAMPAIGN_EVENT_BUFFER", defaults.event_buffer)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_delay_min_ms > self.default_delay_max_ms {
            return Err(anyhow!(
                "CAMPAIGN_DEFAULT_DELAY_MIN_MS ({}) es mayor que CAMPAIGN_DEFAULT_DELAY_MAX_MS ({})",
                self.default_delay_min_ms,
                self.default_delay_max_ms
            ));
        }
        if self.event_buffer == 0 {
            return Err(anyhow!("CAMPAIGN_EVENT_BUFFER debe ser mayor que 0"));
        }
        if self.server_workers == 0 {
            return Err(anyhow!("SERVER_WORKERS debe ser mayor que 0"));
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Valor inválido para {}: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
