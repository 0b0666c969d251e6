//! Session Gate Library
//!
//! Server-supervised sessions over signed bearer tokens: one live session per
//! principal, transparent renewal on expiry and immediate revocation.

pub mod auth;
pub mod config;
pub mod middleware;
pub mod server;

pub use config::SessionConfig;
