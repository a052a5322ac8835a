//! logger.rs
//! Configuración del logger usando env_logger.

/// Inicializa el logger global. RUST_LOG manda
/// (p.e. "info,campaign_service::services::dispatch_loop=debug"); sin él, info.
///
/// Timestamps en milisegundos: los delays entre envíos se leen mejor así.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_target(false)
        .init();
}
