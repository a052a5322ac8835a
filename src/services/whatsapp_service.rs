//! services/whatsapp_service.rs
//! Transporte de mensajes: la API HTTP de sesión de WhatsApp.
//!
//! El motor de campañas sólo conoce el trait `MessageTransport`; cualquier
//! serialización de la conexión física es responsabilidad de la implementación
//! (acá, el pool de conexiones de reqwest).

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::campaign_config::AppConfig;
use crate::models::campaign_model::MediaDescriptor;

#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// ¿La sesión está conectada y lista para enviar?
    async fn is_ready(&self) -> bool;

    /// Envía un mensaje (texto y/o adjunto) a un destino.
    async fn send(&self, target: &str, text: &str, media: Option<&MediaDescriptor>) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct WhatsAppTransport {
    http_client: Client,
    base_url: String,
    session_id: String,
}

impl WhatsAppTransport {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.whatsapp_timeout_secs))
            .build()
            .context("No se pudo crear el cliente HTTP para WhatsApp")?;

        Ok(WhatsAppTransport {
            http_client,
            base_url: config.whatsapp_api_url.clone(),
            session_id: config.whatsapp_session_id.clone(),
        })
    }

    fn status_url(&self) -> String {
        format!("{}/session/status/{}", self.base_url, self.session_id)
    }

    fn send_url(&self) -> String {
        format!("{}/client/sendMessage/{}", self.base_url, self.session_id)
    }

    async fn session_state(&self) -> Result<String> {
        let resp = self
            .http_client
            .get(self.status_url())
            .send()
            .await
            .context("Fallo al hacer GET session/status")?;

        if !resp.status().is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Error consultando sesión: {}", body_txt));
        }

        let json_val = resp.json::<Value>().await?;
        Ok(json_val
            .get("state")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

/// Arma el payload de /client/sendMessage.
pub fn build_send_payload(target: &str, text: &str, media: Option<&MediaDescriptor>) -> Value {
    match media {
        Some(m) => {
            let mut payload = json!({
                "chatId": target,
                "contentType": "MessageMedia",
                "content": {
                    "mimetype": m.mime_type,
                    "data": base64::encode(&m.payload),
                    "filename": m.filename
                }
            });
            if !text.trim().is_empty() {
                payload["options"] = json!({ "caption": text });
            }
            payload
        }
        None => json!({
            "chatId": target,
            "contentType": "string",
            "content": text
        }),
    }
}

#[async_trait]
impl MessageTransport for WhatsAppTransport {
    async fn is_ready(&self) -> bool {
        match self.session_state().await {
            Ok(state) => {
                log::info!("(is_ready) Estado de la sesión WhatsApp: {}", state);
                state == "CONNECTED"
            }
            Err(e) => {
                log::error!("(is_ready) No se pudo consultar la sesión: {:?}", e);
                false
            }
        }
    }

    async fn send(&self, target: &str, text: &str, media: Option<&MediaDescriptor>) -> Result<()> {
        let payload = build_send_payload(target, text, media);

        let r = self
            .http_client
            .post(self.send_url())
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Fallo al POST sendMessage para '{}'", target))?;

        let status = r.status();
        if !status.is_success() {
            let e = r.text().await.unwrap_or_default();
            return Err(anyhow!("WhatsApp respondió {}: {}", status, e));
        }
        Ok(())
    }
}
