use std::fs;
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::SessionStoreError;
use crate::schema::{SavedSession, SessionFile, StoredCookie, SESSION_FILE_VERSION};

/// On-disk store of saved login sessions, newest first.
pub struct SessionStore {
    path: PathBuf,
    file: SessionFile,
}

impl SessionStore {
    /// Loads an existing session file. Fails if the file does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionStoreError> {
        let path = path.into();
        let raw = fs::read_to_string(&path)
            .map_err(|source| SessionStoreError::io("reading", &path, source))?;
        let file: SessionFile = serde_json::from_str(&raw)
            .map_err(|source| SessionStoreError::json_parse(&path, source))?;
        if file.version != SESSION_FILE_VERSION {
            return Err(SessionStoreError::UnsupportedVersion {
                path,
                found: file.version,
                expected: SESSION_FILE_VERSION,
            });
        }
        Ok(Self { path, file })
    }

    /// Loads the session file, or starts an empty store when it is missing.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self, SessionStoreError> {
        let path = path.into();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self {
                path,
                file: SessionFile::default(),
            })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sessions(&self) -> &[SavedSession] {
        &self.file.sessions
    }

    /// Inserts a freshly verified session at the front (most recent first).
    pub fn insert_front(
        &mut self,
        username: Option<String>,
        cookies: Vec<StoredCookie>,
    ) -> Result<(), SessionStoreError> {
        let saved_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(SessionStoreError::ClockFormat)?;
        self.file.sessions.insert(
            0,
            SavedSession {
                username,
                saved_at,
                cookies,
            },
        );
        Ok(())
    }

    /// Replaces the stored session list, dropping sessions that no longer
    /// resolve to an account.
    pub fn retain_sessions(&mut self, sessions: Vec<SavedSession>) {
        self.file.sessions = sessions;
    }

    /// Writes the store back to its file as pretty-printed JSON.
    pub fn save(&self) -> Result<(), SessionStoreError> {
        let body = serde_json::to_string_pretty(&self.file)
            .map_err(|source| SessionStoreError::json_serialize(&self.path, source))?;
        fs::write(&self.path, body)
            .map_err(|source| SessionStoreError::io("writing", &self.path, source))
    }
}
