//! services/campaign_service.rs
//! Control API de campañas: start / pause / resume / stop.
//!
//! Las transiciones inválidas siempre devuelven error explícito; nunca se
//! ignoran en silencio, así el estado de la UI y el del motor no se separan.

use std::sync::Arc;

use crate::errors::{CampaignError, CampaignResult};
use crate::models::campaign_model::{CampaignSnapshot, CampaignState, NewCampaign};
use crate::services::campaign_registry::CampaignRegistry;
use crate::services::dispatch_loop;
use crate::services::whatsapp_service::MessageTransport;

#[derive(Clone)]
pub struct CampaignService {
    registry: CampaignRegistry,
    transport: Arc<dyn MessageTransport>,
}

impl CampaignService {
    pub fn new(registry: CampaignRegistry, transport: Arc<dyn MessageTransport>) -> Self {
        CampaignService {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &CampaignRegistry {
        &self.registry
    }

    /// Crea la campaña y lanza su dispatch loop. No espera ningún envío:
    /// los resultados se ven por eventos y por `get`.
    pub async fn start(&self, new: NewCampaign) -> CampaignResult<String> {
        CampaignRegistry::validate(&new)?;

        if !self.transport.is_ready().await {
            log::error!("(start) La sesión de WhatsApp no está lista; no se crea la campaña");
            return Err(CampaignError::TransportNotReady);
        }

        let id = self.registry.create(new)?;
        let entry = self.registry.claim_dispatch(&id)?;

        tokio::spawn(dispatch_loop::run_campaign(
            self.registry.clone(),
            self.transport.clone(),
            entry,
        ));

        log::info!("(start) Campaña {} lanzada", id);
        Ok(id)
    }

    pub fn pause(&self, id: &str) -> CampaignResult<()> {
        self.registry.transition(
            id,
            &[CampaignState::Running],
            CampaignState::Paused,
            "pause",
        )?;
        log::info!("(pause) Campaña {} pausada", id);
        Ok(())
    }

    pub fn resume(&self, id: &str) -> CampaignResult<()> {
        self.registry.transition(
            id,
            &[CampaignState::Paused],
            CampaignState::Running,
            "resume",
        )?;
        log::info!("(resume) Campaña {} reanudada", id);
        Ok(())
    }

    pub fn stop(&self, id: &str) -> CampaignResult<()> {
        let from = self.registry.transition(
            id,
            &[CampaignState::Running, CampaignState::Paused],
            CampaignState::Stopped,
            "stop",
        )?;
        log::info!("(stop) Campaña {} detenida (estaba {})", id, from);
        Ok(())
    }

    pub fn get(&self, id: &str) -> CampaignResult<CampaignSnapshot> {
        self.registry.get(id)
    }

    pub fn list(&self) -> Vec<CampaignSnapshot> {
        self.registry.list()
    }

    pub async fn transport_ready(&self) -> bool {
        self.transport.is_ready().await
    }
}
