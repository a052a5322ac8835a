//! models/campaign_model.rs
//! Tipos de dominio de una campaña: destinatarios, mensaje, resultados, estado.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignState {
    Running,
    Paused,
    Stopped,
    Completed,
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignState::Running => "running",
            CampaignState::Paused => "paused",
            CampaignState::Stopped => "stopped",
            CampaignState::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    Individual,
    Group,
}

/// Un destino de envío. `target` es la dirección opaca del transporte
/// (p.e. "5491122334455@c.us" o "123456-789@g.us").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub target: String,
    pub kind: RecipientKind,
}

impl Recipient {
    pub fn individual(target: impl Into<String>) -> Self {
        Recipient {
            target: target.into(),
            kind: RecipientKind::Individual,
        }
    }

    pub fn group(target: impl Into<String>) -> Self {
        Recipient {
            target: target.into(),
            kind: RecipientKind::Group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub mime_type: String,
    #[serde(
        serialize_with = "serialize_base64",
        deserialize_with = "deserialize_base64"
    )]
    pub payload: Vec<u8>,
    pub filename: String,
}

pub(crate) fn serialize_base64<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&base64::encode(data))
}

pub(crate) fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    base64::decode(s.trim()).map_err(serde::de::Error::custom)
}

/// Contenido compartido por todos los destinatarios de la campaña.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignMessage {
    pub text: String,
    pub media: Option<MediaDescriptor>,
}

impl CampaignMessage {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        CampaignMessage {
            text: text.into(),
            media: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.media.is_none()
    }
}

/// Rango del delay aleatorio entre envíos, en milisegundos (ambos inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayBounds {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayBounds {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        DelayBounds { min_ms, max_ms }
    }

    pub fn is_valid(&self) -> bool {
        self.min_ms <= self.max_ms
    }

    /// Sortea un delay uniforme en [min, max].
    pub fn draw(&self) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientOutcome {
    Sent,
    Failed,
}

/// Resultado de un envío. `error` sólo existe si `outcome == Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientResult {
    pub target: String,
    pub kind: RecipientKind,
    pub outcome: RecipientOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RecipientResult {
    pub fn sent(recipient: &Recipient) -> Self {
        RecipientResult {
            target: recipient.target.clone(),
            kind: recipient.kind,
            outcome: RecipientOutcome::Sent,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(recipient: &Recipient, error: impl Into<String>) -> Self {
        RecipientResult {
            target: recipient.target.clone(),
            kind: recipient.kind,
            outcome: RecipientOutcome::Failed,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.outcome == RecipientOutcome::Sent
    }
}

/// Lo que pide el Control API para crear una campaña (ya normalizado).
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub recipients: Vec<Recipient>,
    pub message: CampaignMessage,
    pub delay: DelayBounds,
}

/// Foto de una campaña para UI / inspección.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSnapshot {
    pub id: String,
    pub state: CampaignState,
    pub cursor: usize,
    pub total: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub delay: DelayBounds,
    pub has_media: bool,
    pub results: Vec<RecipientResult>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_stays_within_bounds() {
        let bounds = DelayBounds::new(10, 20);
        for _ in 0..200 {
            let d = bounds.draw().as_millis() as u64;
            assert!((10..=20).contains(&d), "delay fuera de rango: {}", d);
        }
        assert_eq!(DelayBounds::new(0, 0).draw(), Duration::ZERO);
    }

    #[test]
    fn failed_result_carries_error() {
        let r = Recipient::group("abc@g.us");
        let res = RecipientResult::failed(&r, "boom");
        assert_eq!(res.outcome, RecipientOutcome::Failed);
        assert_eq!(res.error.as_deref(), Some("boom"));
        assert!(RecipientResult::sent(&r).error.is_none());
    }

    #[test]
    fn media_payload_travels_as_base64() {
        let media = MediaDescriptor {
            mime_type: "image/png".to_string(),
            payload: vec![1, 2, 3],
            filename: "a.png".to_string(),
        };
        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["payload"], "AQID");
        assert_eq!(json["mimeType"], "image/png");
    }
}
