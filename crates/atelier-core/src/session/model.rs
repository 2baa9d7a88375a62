//! Session history model.
//!
//! A session is the ordered list of volleys one user has exchanged with the
//! engine. Volleys are immutable once appended; the only mutation a history
//! ever sees is a push at the end.

use crate::detection::Detection;
use crate::params::ParameterState;
use serde::{Deserialize, Serialize};

/// The immutable record of one user-input/system-response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volley {
    /// True when this volley opened the session.
    pub is_new_session: bool,
    /// UTC timestamp (RFC 3339) of when the turn completed.
    pub timestamp: String,
    pub user_input: String,
    pub system_response: String,
    /// Parameter state the turn started from.
    pub start_state: ParameterState,
    /// Parameter state after this turn's adjustments.
    pub end_state: ParameterState,
    /// Typed detections that drove the adjustments, kept for audit.
    pub detections: Vec<Detection>,
}

/// Per-user ordered sequence of volleys, most recent last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionHistory {
    pub volleys: Vec<Volley>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.volleys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.volleys.len()
    }

    /// The state the next turn should start from, if any turn has completed.
    pub fn last_state(&self) -> Option<&ParameterState> {
        self.volleys.last().map(|v| &v.end_state)
    }

    pub fn push(&mut self, volley: Volley) {
        self.volleys.push(volley);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AtelierConfig;

    fn volley(steps: u32) -> Volley {
        let config = AtelierConfig::default();
        let start = ParameterState::initial(&config);
        let mut end = start.clone();
        end.steps = steps;

        Volley {
            is_new_session: false,
            timestamp: "2025-06-01T12:00:00Z".to_string(),
            user_input: "make it sharper".to_string(),
            system_response: "Here's the new take".to_string(),
            start_state: start,
            end_state: end,
            detections: Vec::new(),
        }
    }

    #[test]
    fn test_last_state_tracks_most_recent_volley() {
        let mut history = SessionHistory::new();
        assert!(history.last_state().is_none());

        history.push(volley(40));
        history.push(volley(50));

        assert_eq!(history.last_state().unwrap().steps, 50);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_history_serialization_round_trip() {
        let mut history = SessionHistory::new();
        history.push(volley(40));

        let json = serde_json::to_string(&history).unwrap();
        let loaded: SessionHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded, history);
    }
}
