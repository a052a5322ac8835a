//! services/dispatch_loop.rs
//! El loop que envía una campaña destinatario por destinatario.
//!
//! Hay un loop por campaña (lo garantiza `CampaignRegistry::claim_dispatch`).
//! Las dos esperas del loop (la pausa y el delay entre envíos) son
//! interrumpibles: compiten contra el canal de estado de la campaña, así un
//! stop o un resume se ven en el momento y no cuando vence el timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::models::campaign_model::{CampaignState, RecipientResult};
use crate::services::campaign_registry::{CampaignEntry, CampaignRegistry};
use crate::services::whatsapp_service::MessageTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Se cumplió el delay completo.
    Elapsed,
    /// La campaña se pausó durante la espera.
    Paused,
    /// La campaña se paró durante la espera.
    Stopped,
}

/// Duerme `delay` salvo que la campaña deje de estar Running antes.
pub async fn cancellable_wait(
    state_rx: &mut watch::Receiver<CampaignState>,
    delay: Duration,
) -> WaitOutcome {
    tokio::select! {
        changed = state_rx.wait_for(|s| *s != CampaignState::Running) => {
            match changed.map(|s| *s) {
                Ok(CampaignState::Paused) => WaitOutcome::Paused,
                // Completed no puede aparecer acá: sólo este loop lo setea
                Ok(_) | Err(_) => WaitOutcome::Stopped,
            }
        }
        _ = tokio::time::sleep(delay) => WaitOutcome::Elapsed,
    }
}

/// Bloquea mientras la campaña esté Paused. Devuelve el estado al despertar.
pub async fn wait_while_paused(state_rx: &mut watch::Receiver<CampaignState>) -> CampaignState {
    match state_rx.wait_for(|s| *s != CampaignState::Paused).await {
        Ok(state) => *state,
        Err(_) => CampaignState::Stopped,
    }
}

/// Corre la campaña hasta Completed o Stopped. Los fallos por destinatario se
/// registran como `Failed` y el loop sigue con el siguiente.
pub async fn run_campaign(
    registry: CampaignRegistry,
    transport: Arc<dyn MessageTransport>,
    entry: Arc<CampaignEntry>,
) {
    let id = entry.id().to_string();
    let total = entry.recipients().len();
    let message = entry.message();
    let mut state_rx = entry.watch_state();
    // Delay sorteado que todavía hay que esperar antes del próximo envío
    let mut pending_delay: Option<Duration> = None;

    log::info!(
        "(dispatch) campaign={} Iniciando envío a {} destinatarios (delay {}-{} ms, texto={} chars, media={})",
        id,
        total,
        entry.delay().min_ms,
        entry.delay().max_ms,
        message.text.chars().count(),
        message.media.is_some()
    );

    loop {
        match wait_while_paused(&mut state_rx).await {
            CampaignState::Running => {}
            CampaignState::Stopped => {
                log::info!(
                    "(dispatch) campaign={} Detenida en {}/{}",
                    id,
                    entry.cursor(),
                    total
                );
                return;
            }
            other => {
                log::warn!("(dispatch) campaign={} Estado inesperado {}", id, other);
                return;
            }
        }

        if let Some(delay) = pending_delay {
            match cancellable_wait(&mut state_rx, delay).await {
                WaitOutcome::Elapsed => pending_delay = None,
                // El delay vuelve a correr entero después del resume
                WaitOutcome::Paused => {
                    log::info!("(dispatch) campaign={} Pausada durante el delay", id);
                }
                WaitOutcome::Stopped => {}
            }
            continue;
        }

        let cursor = entry.cursor();
        if cursor >= total {
            match registry.compare_and_set_state(
                &id,
                CampaignState::Running,
                CampaignState::Completed,
            ) {
                Ok(true) => {
                    let snapshot = entry.snapshot();
                    log::info!(
                        "(dispatch) campaign={} Completada: {} enviados, {} fallidos",
                        id,
                        snapshot.sent_count,
                        snapshot.failed_count
                    );
                    return;
                }
                // Se pausó o se paró entre el último envío y acá
                Ok(false) => continue,
                Err(e) => {
                    log::error!("(dispatch) campaign={} No se pudo completar: {}", id, e);
                    return;
                }
            }
        }

        let recipient = &entry.recipients()[cursor];
        let result = match transport
            .send(&recipient.target, &message.text, message.media.as_ref())
            .await
        {
            Ok(()) => {
                log::info!(
                    "(dispatch) campaign={} [{}/{}] Enviado a '{}'",
                    id,
                    cursor + 1,
                    total,
                    recipient.target
                );
                RecipientResult::sent(recipient)
            }
            Err(e) => {
                log::warn!(
                    "(dispatch) campaign={} [{}/{}] Fallo al enviar a '{}': {:#}",
                    id,
                    cursor + 1,
                    total,
                    recipient.target,
                    e
                );
                RecipientResult::failed(recipient, format!("{:#}", e))
            }
        };

        match registry.record_result(&id, result) {
            Ok(new_cursor) if new_cursor < total => pending_delay = Some(entry.delay().draw()),
            Ok(_) => {}
            Err(e) => {
                log::error!(
                    "(dispatch) campaign={} No se pudo registrar el resultado: {}",
                    id,
                    e
                );
                return;
            }
        }
    }
}
