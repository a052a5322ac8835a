//! tests/mod.rs
pub mod support;
