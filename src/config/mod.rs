//! config/mod.rs
pub mod campaign_config;
