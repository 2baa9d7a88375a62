//! JSON-file-backed session history repository.
//!
//! Stores one JSON document per user under a base directory:
//!
//! ```text
//! base_dir/
//! ├── alice.json
//! └── bob.json
//! ```
//!
//! I/O is fully async via `tokio::fs`. An unknown user loads as an empty
//! history; an append is a read-modify-write of the whole document.

use async_trait::async_trait;
use atelier_core::error::{AtelierError, Result};
use atelier_core::session::{HistoryRepository, SessionHistory, Volley};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem implementation of [`HistoryRepository`].
pub struct JsonHistoryRepository {
    base_dir: PathBuf,
}

impl JsonHistoryRepository {
    /// Creates a repository rooted at `base_dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Creates a repository at the default location
    /// (`<config_dir>/atelier/history`).
    pub fn default_location() -> Result<Self> {
        let dir = crate::paths::AtelierPaths::history_dir()
            .map_err(|e| AtelierError::config(e.to_string()))?;
        Self::new(dir)
    }

    fn history_file_path(&self, user_id: &str) -> PathBuf {
        self.base_dir.join(format!("{user_id}.json"))
    }
}

/// Rejects user IDs that are empty, untrimmed, or could escape the base
/// directory.
fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() || user_id != user_id.trim() {
        return Err(AtelierError::validation(format!(
            "invalid user id: '{user_id}'"
        )));
    }
    if user_id.contains('/') || user_id.contains('\\') || user_id.contains("..") {
        return Err(AtelierError::validation(format!(
            "user id must not contain path separators: '{user_id}'"
        )));
    }
    Ok(())
}

#[async_trait]
impl HistoryRepository for JsonHistoryRepository {
    async fn load(&self, user_id: &str) -> Result<SessionHistory> {
        validate_user_id(user_id)?;
        let path = self.history_file_path(user_id);

        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionHistory::new());
            }
            Err(err) => return Err(err.into()),
        };

        let history: SessionHistory = serde_json::from_str(&json)?;
        Ok(history)
    }

    async fn append(&self, user_id: &str, volley: &Volley) -> Result<()> {
        validate_user_id(user_id)?;

        let mut history = self.load(user_id).await?;
        history.push(volley.clone());

        let path = self.history_file_path(user_id);
        let json = serde_json::to_string_pretty(&history)?;
        fs::write(&path, json).await?;

        tracing::debug!(
            target: "atelier::history",
            user_id,
            volleys = history.len(),
            "history saved"
        );
        Ok(())
    }
}
