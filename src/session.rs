//! Bearer-token persistence.
//!
//! The token returned by `auth/login/` outlives the process: it is written to a
//! small JSON file and read back on the next start. A 401 from the backend
//! clears it (see `api::http`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// A logged-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, username: Option<String>) -> Self {
        Self {
            token: token.into(),
            username,
        }
    }
}

/// Where the session lives between requests.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Option<Session>;
    fn save(&self, session: &Session) -> ApiResult<()>;
    fn clear(&self) -> ApiResult<()>;

    fn token(&self) -> Option<String> {
        self.load().map(|s| s.token)
    }
}

/// Session kept in a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read session file");
                return None;
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(session) if !session.token.is_empty() => Some(session),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt session file");
                None
            }
        }
    }

    fn save(&self, session: &Session) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ApiError::Session {
                    message: format!("failed to create {}: {e}", parent.display()),
                })?;
            }
        }

        let body = serde_json::to_string_pretty(session).map_err(|e| ApiError::Session {
            message: format!("failed to encode session: {e}"),
        })?;
        write_private(&self.path, body.as_bytes()).map_err(|e| ApiError::Session {
            message: format!("failed to write {}: {e}", self.path.display()),
        })?;

        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Session {
                message: format!("failed to remove {}: {e}", self.path.display()),
            }),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on create; tighten a file that already existed
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}

/// Session kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.inner.lock().ok()?.clone()
    }

    fn save(&self, session: &Session) -> ApiResult<()> {
        let mut guard = self.inner.lock().map_err(|_| ApiError::Session {
            message: "session lock poisoned".into(),
        })?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        let mut guard = self.inner.lock().map_err(|_| ApiError::Session {
            message: "session lock poisoned".into(),
        })?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load(), None);

        let session = Session::new("abc123", Some("alice".into()));
        store.save(&session).unwrap();
        assert_eq!(store.load(), Some(session));
        assert_eq!(store.token().as_deref(), Some("abc123"));

        store.clear().unwrap();
        assert_eq!(store.load(), None);
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_or_empty_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        fs::write(&path, "not json").unwrap();
        assert_eq!(FileSessionStore::new(&path).load(), None);

        fs::write(&path, r#"{"token": ""}"#).unwrap();
        assert_eq!(FileSessionStore::new(&path).load(), None);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileSessionStore::new(&path)
            .save(&Session::new("t", None))
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn existing_world_readable_file_is_tightened_on_save() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionStore::new(&path);
        store.save(&Session::new("secret-token", None)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.token().as_deref(), Some("secret-token"));
    }

    #[test]
    fn memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.token().is_none());
        store.save(&Session::new("t1", None)).unwrap();
        assert_eq!(store.token().as_deref(), Some("t1"));
        store.clear().unwrap();
        assert!(store.load().is_none());
    }
}
