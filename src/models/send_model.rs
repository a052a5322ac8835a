//! models/send_model.rs
//! Request de POST /send y su normalización a `NewCampaign`.
//!
//! La UI manda campos sueltos: `numbers` puede venir como string o como array,
//! los delays como número o como string. Todo eso se resuelve acá, una sola vez;
//! el dispatch loop sólo ve una lista de `Recipient` ya validada.

use serde::{Deserialize, Serialize};

use crate::errors::{CampaignError, CampaignResult};
use crate::models::campaign_model::{
    CampaignMessage, DelayBounds, MediaDescriptor, NewCampaign, Recipient,
};

/// Un valor que puede llegar solo o como lista.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Número que puede llegar como `1500` o como `"1500"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(u64),
    Text(String),
}

impl LooseNumber {
    /// Teléfonos que llegan como número JSON se tratan como texto.
    fn into_text(self) -> String {
        match self {
            LooseNumber::Number(n) => n.to_string(),
            LooseNumber::Text(s) => s,
        }
    }

    fn to_millis(&self, field: &str) -> CampaignResult<u64> {
        match self {
            LooseNumber::Number(n) => Ok(*n),
            LooseNumber::Text(s) => s.trim().parse::<u64>().map_err(|_| {
                CampaignError::InvalidInput(format!("{} must be a non-negative integer", field))
            }),
        }
    }
}

/// Adjunto tal como llega de la UI.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPayload {
    pub mimetype: String,
    /// base64
    pub data: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCampaignRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub delay_min: Option<LooseNumber>,
    #[serde(default)]
    pub delay_max: Option<LooseNumber>,
    #[serde(default)]
    pub numbers: OneOrMany<LooseNumber>,
    #[serde(default)]
    pub groups: OneOrMany<String>,
    #[serde(default)]
    pub media: Option<MediaPayload>,
}

impl SendCampaignRequest {
    /// Normaliza el request. `default_delay` se usa para los bordes ausentes.
    pub fn into_new_campaign(self, default_delay: DelayBounds) -> CampaignResult<NewCampaign> {
        let delay = DelayBounds::new(
            match &self.delay_min {
                Some(v) => v.to_millis("delayMin")?,
                None => default_delay.min_ms,
            },
            match &self.delay_max {
                Some(v) => v.to_millis("delayMax")?,
                None => default_delay.max_ms,
            },
        );

        let mut recipients: Vec<Recipient> = self
            .numbers
            .into_vec()
            .into_iter()
            .map(LooseNumber::into_text)
            .filter_map(|n| normalize_number(&n))
            .map(Recipient::individual)
            .collect();
        recipients.extend(
            self.groups
                .into_vec()
                .iter()
                .filter_map(|g| normalize_group(g))
                .map(Recipient::group),
        );

        let media = match self.media {
            Some(m) => Some(decode_media(m)?),
            None => None,
        };

        let message = CampaignMessage {
            text: self.message.unwrap_or_default(),
            media,
        };

        Ok(NewCampaign {
            recipients,
            message,
            delay,
        })
    }
}

/// "+54 9 11 2233-4455" -> "5491122334455@c.us". Si ya trae "@" se respeta.
pub fn normalize_number(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.contains('@') {
        return Some(raw.to_string());
    }
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(format!("{}@c.us", digits))
    }
}

pub fn normalize_group(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else if raw.contains('@') {
        Some(raw.to_string())
    } else {
        Some(format!("{}@g.us", raw))
    }
}

fn decode_media(m: MediaPayload) -> CampaignResult<MediaDescriptor> {
    // Algunos clientes mandan el data URL completo ("data:image/png;base64,....")
    let data = match m.data.split_once("base64,") {
        Some((_, rest)) => rest,
        None => m.data.as_str(),
    };
    let payload = base64::decode(data.trim())
        .map_err(|e| CampaignError::InvalidInput(format!("media.data is not valid base64: {}", e)))?;
    if m.mimetype.trim().is_empty() {
        return Err(CampaignError::InvalidInput(
            "media.mimetype is required".to_string(),
        ));
    }
    Ok(MediaDescriptor {
        mime_type: m.mimetype,
        payload,
        filename: m.filename.unwrap_or_else(|| "file".to_string()),
    })
}

/// Respuesta de POST /send
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCampaignResponse {
    pub success: bool,
    pub campaign_id: String,
}
