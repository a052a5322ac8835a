//! handlers/campaign_handler.rs
//! Endpoints de control de campañas.

use actix_web::{web, HttpResponse, ResponseError};
use serde_json::json;

use crate::config::campaign_config::AppConfig;
use crate::models::campaign_model::DelayBounds;
use crate::models::send_model::{SendCampaignRequest, StartCampaignResponse};
use crate::services::campaign_service::CampaignService;

/// POST /send
pub async fn send_campaign_endpoint(
    campaign_service: web::Data<CampaignService>,
    config: web::Data<AppConfig>,
    body: web::Json<SendCampaignRequest>,
) -> HttpResponse {
    let default_delay = DelayBounds::new(config.default_delay_min_ms, config.default_delay_max_ms);

    let new_campaign = match body.into_inner().into_new_campaign(default_delay) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("(send_campaign_endpoint) Request inválido: {}", e);
            return e.error_response();
        }
    };

    match campaign_service.start(new_campaign).await {
        Ok(campaign_id) => HttpResponse::Ok().json(StartCampaignResponse {
            success: true,
            campaign_id,
        }),
        Err(e) => {
            log::error!("(send_campaign_endpoint) No se pudo iniciar la campaña: {}", e);
            e.error_response()
        }
    }
}

/// POST /campaign/{id}/pause
pub async fn pause_campaign_endpoint(
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> HttpResponse {
    control_response(campaign_service.pause(&path.into_inner()))
}

/// POST /campaign/{id}/resume
pub async fn resume_campaign_endpoint(
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> HttpResponse {
    control_response(campaign_service.resume(&path.into_inner()))
}

/// POST /campaign/{id}/stop
pub async fn stop_campaign_endpoint(
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> HttpResponse {
    control_response(campaign_service.stop(&path.into_inner()))
}

fn control_response(result: crate::errors::CampaignResult<()>) -> HttpResponse {
    match result {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => e.error_response(),
    }
}

/// GET /campaign/{id}
pub async fn get_campaign_endpoint(
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> HttpResponse {
    match campaign_service.get(&path.into_inner()) {
        Ok(campaign) => HttpResponse::Ok().json(json!({
            "success": true,
            "campaign": campaign
        })),
        Err(e) => e.error_response(),
    }
}

/// GET /campaigns
pub async fn list_campaigns_endpoint(campaign_service: web::Data<CampaignService>) -> HttpResponse {
    let campaigns = campaign_service.list();
    HttpResponse::Ok().json(json!({
        "success": true,
        "total": campaigns.len(),
        "campaigns": campaigns
    }))
}

/// GET /status
pub async fn transport_status_endpoint(
    campaign_service: web::Data<CampaignService>,
) -> HttpResponse {
    let ready = campaign_service.transport_ready().await;
    HttpResponse::Ok().json(json!({
        "success": true,
        "ready": ready
    }))
}
