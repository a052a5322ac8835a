//! handlers/mod.rs
//! Módulo que agrupa los handlers HTTP (control de campañas, push channel).
pub mod campaign_handler;
pub mod events_handler;
