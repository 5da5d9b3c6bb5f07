// UniBro client - Library root for testing

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
