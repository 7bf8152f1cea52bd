//! Session credential and identity storage.
//!
//! Outbound requests read the token on every call, a session-token 401
//! clears it, and a successful login writes it. Stores are shared across
//! in-flight requests as `Arc<dyn SessionState>`, so a clear made while
//! handling one failure is visible to every request resolved after it.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use crate::model::UserIdentity;
use crate::options::SecretString;

/// Process-wide session store.
pub trait SessionState: Send + Sync {
    /// Current session token, if logged in.
    fn token(&self) -> Option<SecretString>;

    fn set_token(&self, token: SecretString) -> Result<(), ClientError>;

    /// Cached identity of the logged-in user.
    fn user(&self) -> Option<UserIdentity>;

    fn set_user(&self, user: UserIdentity) -> Result<(), ClientError>;

    /// Remove both the token and the cached identity.
    fn clear(&self) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    token: Option<String>,
    user: Option<UserIdentity>,
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySession {
    data: RwLock<SessionData>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a token.
    pub fn with_token(token: impl Into<SecretString>) -> Self {
        let token: SecretString = token.into();
        Self {
            data: RwLock::new(SessionData {
                token: Some(token.expose_secret().to_string()),
                user: None,
            }),
        }
    }
}

impl SessionState for MemorySession {
    fn token(&self) -> Option<SecretString> {
        read(&self.data).token.map(SecretString::new)
    }

    fn set_token(&self, token: SecretString) -> Result<(), ClientError> {
        write(&self.data, |d| d.token = Some(token.expose_secret().to_string()));
        Ok(())
    }

    fn user(&self) -> Option<UserIdentity> {
        read(&self.data).user
    }

    fn set_user(&self, user: UserIdentity) -> Result<(), ClientError> {
        write(&self.data, |d| d.user = Some(user));
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        write(&self.data, |d| *d = SessionData::default());
        Ok(())
    }
}

/// Session store persisted as a JSON file.
///
/// The file is loaded once on open and rewritten on every mutation. A
/// missing file is an empty session. A mutation that cannot be written
/// leaves both the file and the in-memory state unchanged.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    data: RwLock<SessionData>,
}

impl FileSession {
    /// Open the store at `path`, loading any existing session.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let data = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => SessionData::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionData::default(),
            Err(e) => {
                return Err(ClientError::Session(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &SessionData) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::Session(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        std::fs::write(&self.path, bytes).map_err(|e| {
            ClientError::Session(format!("failed to write {}: {}", self.path.display(), e))
        })
    }

    /// Apply `f` to a copy, persist it, and only then replace the in-memory data.
    fn update(&self, f: impl FnOnce(&mut SessionData)) -> Result<(), ClientError> {
        write(&self.data, |d| -> Result<(), ClientError> {
            let mut next = d.clone();
            f(&mut next);
            self.persist(&next)?;
            *d = next;
            Ok(())
        })
    }
}

impl SessionState for FileSession {
    fn token(&self) -> Option<SecretString> {
        read(&self.data).token.map(SecretString::new)
    }

    fn set_token(&self, token: SecretString) -> Result<(), ClientError> {
        self.update(|d| d.token = Some(token.expose_secret().to_string()))
    }

    fn user(&self) -> Option<UserIdentity> {
        read(&self.data).user
    }

    fn set_user(&self, user: UserIdentity) -> Result<(), ClientError> {
        self.update(|d| d.user = Some(user))
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.update(|d| *d = SessionData::default())
    }
}

// A poisoned lock still holds usable session data.
fn read(lock: &RwLock<SessionData>) -> SessionData {
    match lock.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn write<R>(lock: &RwLock<SessionData>, f: impl FnOnce(&mut SessionData) -> R) -> R {
    match lock.write() {
        Ok(mut guard) => f(&mut guard),
        Err(poisoned) => f(&mut poisoned.into_inner()),
    }
}
