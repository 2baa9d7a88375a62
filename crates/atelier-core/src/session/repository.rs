//! Session history repository trait.
//!
//! Defines the interface for history persistence, decoupling the turn
//! pipeline from the specific storage mechanism (directory of JSON files, a
//! database, a remote store).

use super::model::{SessionHistory, Volley};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for per-user session histories.
///
/// # Implementation Notes
///
/// The turn pipeline reads a history once at the start of a turn and appends
/// once at the end; it holds no lock in between. Implementations are not
/// required to guard that read-modify-write window — callers must serialize
/// turns per user.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Loads the history for a user.
    ///
    /// # Returns
    ///
    /// - `Ok(SessionHistory)`: the stored history, empty for an unknown user
    /// - `Err(_)`: storage access failed or the user ID is invalid
    async fn load(&self, user_id: &str) -> Result<SessionHistory>;

    /// Appends one volley to a user's history and persists it.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: volley durably appended
    /// - `Err(_)`: storage write failed or the user ID is invalid
    async fn append(&self, user_id: &str, volley: &Volley) -> Result<()>;
}
