//! services/mod.rs
//! Módulo que agrupa las capas de negocio: registro, dispatch, eventos, transporte.

pub mod broadcaster;
pub mod campaign_registry;
pub mod campaign_service;
pub mod dispatch_loop;
pub mod whatsapp_service;
