// src/services/mod.rs
pub mod allocation;
pub mod analysis;
pub mod bands;
pub mod cache;
pub mod calculations;
pub mod price_source;
pub mod projection;
pub mod refresh;
pub mod risk;
pub mod saved_config;
pub mod store;
pub mod update_policy;
pub mod yahoo;
