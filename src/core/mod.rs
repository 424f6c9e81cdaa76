pub mod alerts;
pub mod config;
pub mod control;
pub mod coordinator;
pub mod download_manager;
pub mod error;
pub mod monitor;
pub mod subsystem;
pub mod transfer;
