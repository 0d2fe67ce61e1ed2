// src/handlers/mod.rs
pub mod configs;
pub mod error;
pub mod funds;
pub mod history;
pub mod portfolio;
