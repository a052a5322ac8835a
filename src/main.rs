use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

use crate::config::campaign_config::AppConfig;
use crate::logger::init_logger;
use crate::services::broadcaster::ProgressBroadcaster;
use crate::services::campaign_registry::CampaignRegistry;
use crate::services::campaign_service::CampaignService;
use crate::services::whatsapp_service::{MessageTransport, WhatsAppTransport};

mod app;
mod config;
mod errors;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Configuración inválida: {:?}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let transport: Arc<dyn MessageTransport> = Arc::new(
        WhatsAppTransport::new(&config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );
    log::info!(
        "Transporte WhatsApp en {} (sesión '{}')",
        config.whatsapp_api_url,
        config.whatsapp_session_id
    );

    // Registro en memoria + broadcaster compartidos por todos los workers
    let broadcaster = ProgressBroadcaster::new(config.event_buffer);
    let registry = CampaignRegistry::new(broadcaster);
    let campaign_service = CampaignService::new(registry, transport);

    let bind = (config.server_host.clone(), config.server_port);
    let workers = config.server_workers;

    log::info!("Levantando servidor en {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(campaign_service.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(app::init_app)
    })
    .workers(workers)
    .bind(bind)?
    .run()
    .await
}
