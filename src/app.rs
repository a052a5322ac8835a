//! app.rs
use crate::handlers::{campaign_handler, events_handler};
use actix_web::{error::InternalError, web, HttpResponse};
use serde_json::json;

/// Los adjuntos llegan en base64 dentro del JSON
const JSON_LIMIT_BYTES: usize = 32 * 1024 * 1024;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/send", web::post().to(campaign_handler::send_campaign_endpoint))
        .route(
            "/campaigns",
            web::get().to(campaign_handler::list_campaigns_endpoint),
        )
        .route(
            "/events",
            web::get().to(events_handler::campaign_events_endpoint),
        )
        .route(
            "/status",
            web::get().to(campaign_handler::transport_status_endpoint),
        )
        .service(
            web::scope("/campaign/{id}")
                .route("", web::get().to(campaign_handler::get_campaign_endpoint))
                .route(
                    "/pause",
                    web::post().to(campaign_handler::pause_campaign_endpoint),
                )
                .route(
                    "/resume",
                    web::post().to(campaign_handler::resume_campaign_endpoint),
                )
                .route(
                    "/stop",
                    web::post().to(campaign_handler::stop_campaign_endpoint),
                ),
        );
}

/// Errores de parseo de JSON con el mismo formato que el resto de la API.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| {
            let message = format!("invalid input: {}", err);
            log::warn!("(json_config) {}", message);
            InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(json!({
                    "success": false,
                    "error": message
                })),
            )
            .into()
        })
}
