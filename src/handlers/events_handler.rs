//! handlers/events_handler.rs
//! Push channel para la UI, como Server-Sent Events.
//!
//! Al conectarse, el observador recibe una foto de cada campaña conocida y
//! después sólo eventos en vivo. No hay replay de historia.
//!
//! La suscripción se hace antes de la foto, así que un evento publicado entre
//! ambas puede estar en la foto y llegar además en vivo. Los `campaignProgress`
//! ya cubiertos por el cursor de la foto se descartan; los cambios de estado
//! pueden repetirse y la UI los trata como idempotentes.

use std::collections::HashMap;
use std::convert::Infallible;

use actix_web::{web, HttpResponse};
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::models::campaign_model::CampaignSnapshot;
use crate::models::event_model::CampaignEvent;
use crate::services::campaign_service::CampaignService;

/// Cursor de cada campaña al momento de la foto inicial.
struct SnapshotCursors(HashMap<String, usize>);

impl SnapshotCursors {
    fn from_snapshots(snapshots: &[CampaignSnapshot]) -> Self {
        SnapshotCursors(
            snapshots
                .iter()
                .map(|c| (c.id.clone(), c.cursor))
                .collect(),
        )
    }

    /// true si el evento ya está reflejado en la foto que recibió el observador
    fn covers(&self, event: &CampaignEvent) -> bool {
        match event {
            CampaignEvent::CampaignProgress {
                campaign_id,
                current_index,
                ..
            } => self
                .0
                .get(campaign_id)
                .map_or(false, |cursor| *current_index <= *cursor),
            _ => false,
        }
    }
}

/// GET /events
pub async fn campaign_events_endpoint(
    campaign_service: web::Data<CampaignService>,
) -> HttpResponse {
    // Suscribirse antes de sacar la foto: lo que pase entre medio llega igual
    let rx = campaign_service.registry().broadcaster().subscribe();

    let campaigns = campaign_service.list();
    let cursors = SnapshotCursors::from_snapshots(&campaigns);

    let snapshots: Vec<Result<Bytes, Infallible>> = campaigns
        .into_iter()
        .filter_map(|campaign| CampaignEvent::CampaignSnapshot { campaign }.to_sse_frame().ok())
        .map(|frame| Ok(Bytes::from(frame)))
        .collect();

    log::info!(
        "(campaign_events_endpoint) Nuevo observador ({} conectados); {} campañas en la foto inicial",
        campaign_service.registry().broadcaster().subscriber_count(),
        snapshots.len()
    );

    let live = stream::unfold((rx, cursors), |(mut rx, cursors)| async move {
        loop {
            match rx.recv().await {
                Ok(event) if cursors.covers(&event) => {
                    log::debug!(
                        "(campaign_events_endpoint) campaign={} Progreso ya incluido en la foto",
                        event.campaign_id()
                    );
                }
                Ok(event) => match event.to_sse_frame() {
                    Ok(frame) => {
                        return Some((Ok::<Bytes, Infallible>(Bytes::from(frame)), (rx, cursors)))
                    }
                    Err(e) => {
                        log::error!("(campaign_events_endpoint) No se pudo serializar evento: {}", e);
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "(campaign_events_endpoint) Observador atrasado, se saltean {} eventos",
                        skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(Box::pin(stream::iter(snapshots).chain(live)))
}
