//! models/event_model.rs
//! Eventos que se empujan a los observadores (UI) por el push channel.

use serde::Serialize;

use crate::models::campaign_model::{CampaignSnapshot, RecipientResult};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CampaignEvent {
    #[serde(rename_all = "camelCase")]
    CampaignProgress {
        campaign_id: String,
        current_index: usize,
        total: usize,
        result: RecipientResult,
    },
    #[serde(rename_all = "camelCase")]
    CampaignPaused { campaign_id: String },
    #[serde(rename_all = "camelCase")]
    CampaignResumed { campaign_id: String },
    #[serde(rename_all = "camelCase")]
    CampaignStopped { campaign_id: String },
    #[serde(rename_all = "camelCase")]
    CampaignCompleted { campaign_id: String },
    /// Sólo se manda a un observador recién conectado; nunca por broadcast.
    CampaignSnapshot { campaign: CampaignSnapshot },
}

impl CampaignEvent {
    /// Nombre del evento tal como lo espera la UI.
    pub fn name(&self) -> &'static str {
        match self {
            CampaignEvent::CampaignProgress { .. } => "campaignProgress",
            CampaignEvent::CampaignPaused { .. } => "campaignPaused",
            CampaignEvent::CampaignResumed { .. } => "campaignResumed",
            CampaignEvent::CampaignStopped { .. } => "campaignStopped",
            CampaignEvent::CampaignCompleted { .. } => "campaignCompleted",
            CampaignEvent::CampaignSnapshot { .. } => "campaignSnapshot",
        }
    }

    pub fn campaign_id(&self) -> &str {
        match self {
            CampaignEvent::CampaignProgress { campaign_id, .. }
            | CampaignEvent::CampaignPaused { campaign_id }
            | CampaignEvent::CampaignResumed { campaign_id }
            | CampaignEvent::CampaignStopped { campaign_id }
            | CampaignEvent::CampaignCompleted { campaign_id } => campaign_id,
            CampaignEvent::CampaignSnapshot { campaign } => &campaign.id,
        }
    }

    /// Frame SSE: `event: <nombre>\ndata: <json>\n\n`
    pub fn to_sse_frame(&self) -> serde_json::Result<String> {
        let data = serde_json::to_string(self)?;
        Ok(format!("event: {}\ndata: {}\n\n", self.name(), data))
    }
}
