//! Session Registry
//! Mission: Server-side source of truth for the one valid session per principal

use crate::auth::models::Claims;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serializable copy of the registry contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RegistrySnapshot {
    pub sessions: HashMap<String, Claims>,
}

/// Outcome of a compare-and-set on one entry.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced,
    /// The entry held something else; carries what was found.
    Conflict(Option<Claims>),
}

/// Principal id → claims of the current session.
///
/// Every operation takes the lock for the map access only; signing and
/// logging happen outside of it.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Claims>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `claims` as the session of `id`, superseding any previous one.
    pub fn set(&self, id: &str, claims: Claims) {
        self.sessions.lock().insert(id.to_string(), claims);
    }

    pub fn get(&self, id: &str) -> Option<Claims> {
        self.sessions.lock().get(id).cloned()
    }

    /// Remove the session of `id`. Returns whether one existed.
    pub fn delete(&self, id: &str) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    /// Store `new` only if the current entry is still the same session as
    /// `expected`.
    pub fn replace_if(&self, id: &str, expected: &Claims, new: Claims) -> ReplaceOutcome {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(id) {
            Some(current) if current.same_session(expected) => {
                *current = new;
                ReplaceOutcome::Replaced
            }
            Some(current) => ReplaceOutcome::Conflict(Some(current.clone())),
            None => ReplaceOutcome::Conflict(None),
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            sessions: self.sessions.lock().clone(),
        }
    }

    /// Replace the whole registry with `snapshot`.
    pub fn restore(&self, snapshot: RegistrySnapshot) {
        *self.sessions.lock() = snapshot.sessions;
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
