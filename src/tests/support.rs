//! tests/support.rs
//! Transporte falso y helpers compartidos por los tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::models::campaign_model::{
    CampaignMessage, DelayBounds, MediaDescriptor, NewCampaign, Recipient,
};
use crate::models::event_model::CampaignEvent;
use crate::services::broadcaster::ProgressBroadcaster;
use crate::services::campaign_registry::CampaignRegistry;
use crate::services::campaign_service::CampaignService;
use crate::services::whatsapp_service::MessageTransport;

#[derive(Default)]
pub struct MockTransport {
    not_ready: AtomicBool,
    failing: Mutex<HashSet<String>>,
    attempts: Mutex<Vec<String>>,
    latency: Duration,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(MockTransport::default())
    }

    pub fn failing_for(targets: &[&str]) -> Arc<Self> {
        let t = MockTransport::default();
        t.failing
            .lock()
            .extend(targets.iter().map(|s| s.to_string()));
        Arc::new(t)
    }

    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(MockTransport {
            latency,
            ..MockTransport::default()
        })
    }

    pub fn set_ready(&self, ready: bool) {
        self.not_ready.store(!ready, Ordering::SeqCst);
    }

    /// Destinos a los que se intentó enviar, en orden.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn is_ready(&self) -> bool {
        !self.not_ready.load(Ordering::SeqCst)
    }

    async fn send(&self, target: &str, _text: &str, _media: Option<&MediaDescriptor>) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.attempts.lock().push(target.to_string());
        if self.failing.lock().contains(target) {
            return Err(anyhow!("simulated failure for {}", target));
        }
        Ok(())
    }
}

pub fn service_with(transport: Arc<MockTransport>) -> CampaignService {
    let registry = CampaignRegistry::new(ProgressBroadcaster::new(256));
    CampaignService::new(registry, transport)
}

pub fn campaign(targets: &[&str], min_ms: u64, max_ms: u64) -> NewCampaign {
    NewCampaign {
        recipients: targets.iter().map(|t| Recipient::individual(*t)).collect(),
        message: CampaignMessage::text("Hola! Tenemos novedades para vos"),
        delay: DelayBounds::new(min_ms, max_ms),
    }
}

/// Próximo evento, o panic si no llega en 5s.
pub async fn next_event(rx: &mut broadcast::Receiver<CampaignEvent>) -> CampaignEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no llegó ningún evento a tiempo")
        .expect("canal de eventos cerrado")
}

/// Verifica que no llegue ningún evento durante `window`.
pub async fn assert_quiet(rx: &mut broadcast::Receiver<CampaignEvent>, window: Duration) {
    if let Ok(event) = tokio::time::timeout(window, rx.recv()).await {
        panic!("se esperaba silencio pero llegó {:?}", event);
    }
}

/// Junta eventos hasta el primero terminal (completed / stopped), inclusive.
pub async fn events_until_terminal(
    rx: &mut broadcast::Receiver<CampaignEvent>,
) -> Vec<CampaignEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(rx).await;
        let terminal = matches!(
            event,
            CampaignEvent::CampaignCompleted { .. } | CampaignEvent::CampaignStopped { .. }
        );
        events.push(event);
        if terminal {
            return events;
        }
    }
}
