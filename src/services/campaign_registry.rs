//! services/campaign_registry.rs
//! Registro en memoria de campañas, indexado por ID.
//!
//! Cada entrada tiene su propio lock: estado, cursor y resultados de una campaña
//! se mutan siempre bajo ese lock, y los eventos que esas mutaciones generan se
//! publican también dentro de él, así el orden de eventos de una campaña es el
//! mismo orden en que cambió su estado. Campañas distintas no comparten lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::{CampaignError, CampaignResult};
use crate::models::campaign_model::{
    CampaignMessage, CampaignSnapshot, CampaignState, DelayBounds, NewCampaign, Recipient,
    RecipientResult,
};
use crate::models::event_model::CampaignEvent;
use crate::services::broadcaster::ProgressBroadcaster;

#[derive(Debug)]
struct CampaignProgress {
    state: CampaignState,
    cursor: usize,
    results: Vec<RecipientResult>,
}

impl CampaignProgress {
    fn append_result(&mut self, result: RecipientResult) {
        self.results.push(result);
    }

    fn advance_cursor(&mut self) {
        self.cursor += 1;
        debug_assert_eq!(self.cursor, self.results.len());
    }
}

#[derive(Debug)]
pub struct CampaignEntry {
    id: String,
    recipients: Vec<Recipient>,
    message: CampaignMessage,
    delay: DelayBounds,
    created_at: DateTime<Utc>,
    progress: Mutex<CampaignProgress>,
    // Copia del estado para despertar esperas del dispatch loop.
    // Se actualiza siempre con `progress` tomado.
    signal: watch::Sender<CampaignState>,
    dispatch_claimed: AtomicBool,
}

impl CampaignEntry {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn message(&self) -> &CampaignMessage {
        &self.message
    }

    pub fn delay(&self) -> DelayBounds {
        self.delay
    }

    pub fn cursor(&self) -> usize {
        self.progress.lock().cursor
    }

    /// Receptor que ve cada cambio de estado (pausa, resume, stop).
    pub fn watch_state(&self) -> watch::Receiver<CampaignState> {
        self.signal.subscribe()
    }

    pub fn snapshot(&self) -> CampaignSnapshot {
        let progress = self.progress.lock();
        let sent_count = progress.results.iter().filter(|r| r.is_sent()).count();
        CampaignSnapshot {
            id: self.id.clone(),
            state: progress.state,
            cursor: progress.cursor,
            total: self.recipients.len(),
            sent_count,
            failed_count: progress.results.len() - sent_count,
            delay: self.delay,
            has_media: self.message.media.is_some(),
            results: progress.results.clone(),
            created_at: self.created_at,
        }
    }

    /// Aplica `to` si el estado actual está en `allowed`.
    /// Ok(estado anterior) o Err(estado actual) si no correspondía.
    fn transition(
        &self,
        allowed: &[CampaignState],
        to: CampaignState,
        broadcaster: &ProgressBroadcaster,
    ) -> Result<CampaignState, CampaignState> {
        let mut progress = self.progress.lock();
        let from = progress.state;
        if !allowed.contains(&from) {
            return Err(from);
        }
        progress.state = to;
        self.signal.send_replace(to);

        if let Some(event) = self.transition_event(from, to) {
            broadcaster.publish(event);
        }
        Ok(from)
    }

    fn transition_event(&self, from: CampaignState, to: CampaignState) -> Option<CampaignEvent> {
        let campaign_id = self.id.clone();
        match (from, to) {
            (_, CampaignState::Paused) => Some(CampaignEvent::CampaignPaused { campaign_id }),
            (CampaignState::Paused, CampaignState::Running) => {
                Some(CampaignEvent::CampaignResumed { campaign_id })
            }
            (_, CampaignState::Stopped) => Some(CampaignEvent::CampaignStopped { campaign_id }),
            (_, CampaignState::Completed) => {
                Some(CampaignEvent::CampaignCompleted { campaign_id })
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CampaignRegistry {
    campaigns: Arc<RwLock<HashMap<String, Arc<CampaignEntry>>>>,
    broadcaster: ProgressBroadcaster,
}

impl CampaignRegistry {
    pub fn new(broadcaster: ProgressBroadcaster) -> Self {
        CampaignRegistry {
            campaigns: Arc::new(RwLock::new(HashMap::new())),
            broadcaster,
        }
    }

    pub fn broadcaster(&self) -> &ProgressBroadcaster {
        &self.broadcaster
    }

    /// Chequea lo mismo que `create` sin tocar el registro.
    pub fn validate(new: &NewCampaign) -> CampaignResult<()> {
        if new.recipients.is_empty() {
            return Err(CampaignError::InvalidInput(
                "at least one recipient (numbers or groups) is required".to_string(),
            ));
        }
        if !new.delay.is_valid() {
            return Err(CampaignError::InvalidInput(format!(
                "delayMin ({}) must not be greater than delayMax ({})",
                new.delay.min_ms, new.delay.max_ms
            )));
        }
        if new.message.is_empty() {
            return Err(CampaignError::InvalidInput(
                "a message text or a media attachment is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Crea la campaña en estado Running con cursor 0.
    pub fn create(&self, new: NewCampaign) -> CampaignResult<String> {
        Self::validate(&new)?;

        let id = Uuid::new_v4().to_string();
        let (signal, _) = watch::channel(CampaignState::Running);
        let entry = CampaignEntry {
            id: id.clone(),
            progress: Mutex::new(CampaignProgress {
                state: CampaignState::Running,
                cursor: 0,
                results: Vec::with_capacity(new.recipients.len()),
            }),
            recipients: new.recipients,
            message: new.message,
            delay: new.delay,
            created_at: Utc::now(),
            signal,
            dispatch_claimed: AtomicBool::new(false),
        };

        let in_memory = {
            let mut campaigns = self.campaigns.write();
            campaigns.insert(id.clone(), Arc::new(entry));
            campaigns.len()
        };
        log::info!(
            "(create) Campaña {} registrada ({} campañas en memoria)",
            id,
            in_memory
        );
        Ok(id)
    }

    pub fn entry(&self, id: &str) -> CampaignResult<Arc<CampaignEntry>> {
        self.campaigns
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CampaignError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> CampaignResult<CampaignSnapshot> {
        Ok(self.entry(id)?.snapshot())
    }

    /// Todas las campañas, la más nueva primero.
    pub fn list(&self) -> Vec<CampaignSnapshot> {
        let entries: Vec<Arc<CampaignEntry>> = self.campaigns.read().values().cloned().collect();
        let mut snapshots: Vec<CampaignSnapshot> = entries.iter().map(|e| e.snapshot()).collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshots
    }

    /// Reclama la campaña para un dispatch loop. Sólo la primera llamada gana.
    pub fn claim_dispatch(&self, id: &str) -> CampaignResult<Arc<CampaignEntry>> {
        let entry = self.entry(id)?;
        if entry
            .dispatch_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CampaignError::AlreadyDispatching(id.to_string()));
        }
        Ok(entry)
    }

    /// Transición atómica `expected -> new`. Devuelve false si el estado
    /// actual no era `expected` (y no cambia nada).
    pub fn compare_and_set_state(
        &self,
        id: &str,
        expected: CampaignState,
        new: CampaignState,
    ) -> CampaignResult<bool> {
        let entry = self.entry(id)?;
        Ok(entry.transition(&[expected], new, &self.broadcaster).is_ok())
    }

    /// Como `compare_and_set_state` pero aceptando varios estados de origen,
    /// y fallando con InvalidTransition si no corresponde.
    pub fn transition(
        &self,
        id: &str,
        allowed: &[CampaignState],
        new: CampaignState,
        action: &'static str,
    ) -> CampaignResult<CampaignState> {
        let entry = self.entry(id)?;
        entry
            .transition(allowed, new, &self.broadcaster)
            .map_err(|from| CampaignError::InvalidTransition {
                id: id.to_string(),
                from,
                action,
            })
    }

    /// Agrega el resultado del destinatario actual y avanza el cursor, en una
    /// sola sección crítica. Publica `campaignProgress` salvo que la campaña ya
    /// esté Stopped. Devuelve el cursor nuevo.
    pub fn record_result(&self, id: &str, result: RecipientResult) -> CampaignResult<usize> {
        let entry = self.entry(id)?;
        let total = entry.recipients.len();

        let mut progress = entry.progress.lock();
        if progress.cursor >= total {
            return Err(CampaignError::Internal(format!(
                "campaign {} already has {} results",
                id, total
            )));
        }
        if progress.state == CampaignState::Completed {
            return Err(CampaignError::Internal(format!(
                "campaign {} is already completed",
                id
            )));
        }

        progress.append_result(result.clone());
        progress.advance_cursor();
        let cursor = progress.cursor;

        if progress.state != CampaignState::Stopped {
            self.broadcaster.publish(CampaignEvent::CampaignProgress {
                campaign_id: entry.id.clone(),
                current_index: cursor,
                total,
                result,
            });
        }
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::campaign_model::CampaignMessage;

    fn registry() -> CampaignRegistry {
        CampaignRegistry::new(ProgressBroadcaster::new(16))
    }

    fn new_campaign(n: usize) -> NewCampaign {
        NewCampaign {
            recipients: (0..n)
                .map(|i| Recipient::individual(format!("{}@c.us", i)))
                .collect(),
            message: CampaignMessage::text("hola"),
            delay: DelayBounds::new(0, 0),
        }
    }

    #[test]
    fn create_rejects_empty_recipients_and_inverted_delays() {
        let reg = registry();
        assert!(matches!(
            reg.create(new_campaign(0)),
            Err(CampaignError::InvalidInput(_))
        ));

        let mut bad = new_campaign(1);
        bad.delay = DelayBounds::new(5, 1);
        assert!(matches!(reg.create(bad), Err(CampaignError::InvalidInput(_))));

        let mut empty_msg = new_campaign(1);
        empty_msg.message = CampaignMessage::text("   ");
        assert!(matches!(
            reg.create(empty_msg),
            Err(CampaignError::InvalidInput(_))
        ));

        assert!(reg.list().is_empty());
    }

    #[test]
    fn new_campaign_starts_running_at_zero() {
        let reg = registry();
        let id = reg.create(new_campaign(2)).unwrap();
        let snap = reg.get(&id).unwrap();
        assert_eq!(snap.state, CampaignState::Running);
        assert_eq!(snap.cursor, 0);
        assert_eq!(snap.total, 2);
        assert!(snap.results.is_empty());
        assert!(matches!(reg.get("nope"), Err(CampaignError::NotFound(_))));
    }

    #[test]
    fn compare_and_set_only_applies_from_expected_state() {
        let reg = registry();
        let id = reg.create(new_campaign(1)).unwrap();

        assert!(!reg
            .compare_and_set_state(&id, CampaignState::Paused, CampaignState::Running)
            .unwrap());
        assert!(reg
            .compare_and_set_state(&id, CampaignState::Running, CampaignState::Stopped)
            .unwrap());
        // Stopped es terminal: el loop ya no puede marcar Completed
        assert!(!reg
            .compare_and_set_state(&id, CampaignState::Running, CampaignState::Completed)
            .unwrap());
        assert_eq!(reg.get(&id).unwrap().state, CampaignState::Stopped);
    }

    #[test]
    fn record_result_keeps_cursor_and_results_in_step() {
        let reg = registry();
        let id = reg.create(new_campaign(2)).unwrap();
        let entry = reg.entry(&id).unwrap();

        let first = RecipientResult::sent(&entry.recipients()[0]);
        assert_eq!(reg.record_result(&id, first).unwrap(), 1);
        let second = RecipientResult::failed(&entry.recipients()[1], "x");
        assert_eq!(reg.record_result(&id, second).unwrap(), 2);

        let snap = reg.get(&id).unwrap();
        assert_eq!(snap.cursor, snap.results.len());
        assert_eq!(snap.sent_count, 1);
        assert_eq!(snap.failed_count, 1);

        let extra = RecipientResult::sent(&entry.recipients()[0]);
        assert!(matches!(
            reg.record_result(&id, extra),
            Err(CampaignError::Internal(_))
        ));
        assert_eq!(reg.get(&id).unwrap().cursor, 2);
    }

    #[test]
    fn no_progress_event_after_stop() {
        let reg = registry();
        let mut rx = reg.broadcaster().subscribe();
        let id = reg.create(new_campaign(2)).unwrap();
        let entry = reg.entry(&id).unwrap();

        reg.transition(
            &id,
            &[CampaignState::Running, CampaignState::Paused],
            CampaignState::Stopped,
            "stop",
        )
        .unwrap();
        reg.record_result(&id, RecipientResult::sent(&entry.recipients()[0]))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().name(), "campaignStopped");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dispatch_can_be_claimed_once() {
        let reg = registry();
        let id = reg.create(new_campaign(1)).unwrap();
        assert!(reg.claim_dispatch(&id).is_ok());
        assert!(matches!(
            reg.claim_dispatch(&id),
            Err(CampaignError::AlreadyDispatching(_))
        ));
    }

    #[test]
    fn invalid_transition_reports_current_state() {
        let reg = registry();
        let id = reg.create(new_campaign(1)).unwrap();
        let err = reg
            .transition(&id, &[CampaignState::Paused], CampaignState::Running, "resume")
            .unwrap_err();
        assert_eq!(
            err,
            CampaignError::InvalidTransition {
                id: id.clone(),
                from: CampaignState::Running,
                action: "resume",
            }
        );
    }
}
