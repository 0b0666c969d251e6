//! Authentication Module
//! Mission: Server-supervised sessions on top of signed bearer tokens

pub mod api;
pub mod clock;
pub mod errors;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod persistence;
pub mod registry;
pub mod token_service;
pub mod user_store;

pub use api::AuthState;
pub use errors::SessionError;
pub use identity::IdentityProvider;
pub use jwt::ClaimsCodec;
pub use middleware::{require_active, require_admin, CurrentSession};
pub use registry::SessionRegistry;
pub use token_service::TokenService;
pub use user_store::UserStore;
