//! Identity lookup consumed by the login and admin endpoints.
//!
//! The session core never sees passwords; it only receives a `Principal`
//! from whatever store implements this trait.

use crate::auth::models::Principal;
use anyhow::Result;

pub trait IdentityProvider: Send + Sync {
    /// Resolve credentials to a principal. `Ok(None)` means the credentials
    /// did not match.
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Principal>>;

    fn find_by_id(&self, id: &str) -> Result<Option<Principal>>;
}
