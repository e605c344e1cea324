pub mod config;
pub mod crypto;
pub mod fetch;
pub mod infra;
pub mod reconcile;
pub mod services;
pub mod settings;
pub mod webhook;
