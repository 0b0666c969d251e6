//! Session snapshot persistence
//! Mission: Carry live sessions across a graceful restart
//!
//! Only called at startup and shutdown, never on the request path.

use crate::auth::registry::{RegistrySnapshot, SessionRegistry};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    saved_at: String,
    sessions: RegistrySnapshot,
}

/// Write the registry contents to `path`.
///
/// The file is written next to its destination and renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
pub fn save_snapshot(registry: &SessionRegistry, path: &Path) -> Result<usize> {
    let sessions = registry.snapshot();
    let count = sessions.sessions.len();
    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now().to_rfc3339(),
        sessions,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create snapshot directory {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(&file).context("Failed to serialize session snapshot")?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)
        .with_context(|| format!("Failed to write session snapshot to {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move session snapshot to {}", path.display()))?;

    info!(sessions = count, path = %path.display(), "Session snapshot saved");
    Ok(count)
}

fn read_snapshot(path: &Path) -> Result<RegistrySnapshot> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file: SnapshotFile =
        serde_json::from_slice(&raw).context("Session snapshot is not valid JSON")?;
    if file.version != SNAPSHOT_VERSION {
        bail!(
            "unsupported snapshot version {} (expected {})",
            file.version,
            SNAPSHOT_VERSION
        );
    }
    Ok(file.sessions)
}

/// Populate `registry` from `path`. Returns the number of sessions restored.
///
/// A missing or unusable snapshot is not an error: the registry starts empty
/// and every client simply logs in again.
pub fn load_snapshot(registry: &SessionRegistry, path: &Path) -> usize {
    if !path.exists() {
        info!(path = %path.display(), "No session snapshot found, starting empty");
        return 0;
    }

    match read_snapshot(path) {
        Ok(snapshot) => {
            let count = snapshot.sessions.len();
            registry.restore(snapshot);
            info!(sessions = count, path = %path.display(), "Session snapshot restored");
            count
        }
        Err(e) => {
            warn!(
                error = %format!("{e:#}"),
                path = %path.display(),
                "Ignoring unusable session snapshot, starting empty"
            );
            registry.restore(RegistrySnapshot::default());
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{Claims, Role};
    use tempfile::tempdir;

    fn claims_for(id: &str) -> Claims {
        Claims {
            sub: id.to_string(),
            role: Role::User,
            active: true,
            iat: 1_700_000_000,
            exp: 1_700_000_900,
            iss: "session-gate".to_string(),
            jti: format!("jti-{id}"),
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        let registry = SessionRegistry::new();
        registry.set("a", claims_for("a"));
        registry.set("b", claims_for("b"));
        assert_eq!(save_snapshot(&registry, &path).unwrap(), 2);

        let restored = SessionRegistry::new();
        assert_eq!(load_snapshot(&restored, &path), 2);
        assert_eq!(restored.snapshot(), registry.snapshot());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("sessions.json");

        let registry = SessionRegistry::new();
        registry.set("a", claims_for("a"));
        save_snapshot(&registry, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_snapshot_starts_empty() {
        let dir = tempdir().unwrap();
        let registry = SessionRegistry::new();
        assert_eq!(load_snapshot(&registry, &dir.path().join("absent.json")), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        fs::write(&path, b"{ not json").unwrap();

        let registry = SessionRegistry::new();
        registry.set("stale", claims_for("stale"));
        assert_eq!(load_snapshot(&registry, &path), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_version_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        fs::write(
            &path,
            br#"{"version": 99, "saved_at": "2025-01-01T00:00:00Z", "sessions": {}}"#,
        )
        .unwrap();

        let registry = SessionRegistry::new();
        assert_eq!(load_snapshot(&registry, &path), 0);
    }
}
