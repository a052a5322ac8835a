//! services/broadcaster.rs
//! Publica eventos de campaña a los observadores suscriptos en ese momento.
//! No hay replay: quien se suscribe tarde sólo ve lo que se publique después.

use tokio::sync::broadcast;

use crate::models::event_model::CampaignEvent;

#[derive(Clone, Debug)]
pub struct ProgressBroadcaster {
    tx: broadcast::Sender<CampaignEvent>,
}

impl ProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ProgressBroadcaster { tx }
    }

    /// Entrega el evento a todos los suscriptos actuales.
    /// Devuelve a cuántos observadores llegó (0 si no hay nadie escuchando).
    pub fn publish(&self, event: CampaignEvent) -> usize {
        log::debug!(
            "(publish) {} campaign={}",
            event.name(),
            event.campaign_id()
        );
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CampaignEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
