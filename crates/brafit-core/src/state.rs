//! UI-agnostic chat state types
//!
//! These are the values the chat store publishes to its subscribers. They
//! don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

use crate::client::Recommendation;
use crate::error::FittingError;

/// A single row of the conversation transcript.
///
/// Entries are immutable once appended to a [`ChatSnapshot`]'s transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub is_user: bool,
    pub reasoning: Option<String>,
    pub fit_tips: Option<String>,
    pub issues: Option<Vec<String>>,
    pub confidence: Option<f64>,
    pub sister_sizes: Option<Vec<String>>,
}

impl TranscriptEntry {
    /// Entry echoing what the user typed
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            reasoning: None,
            fit_tips: None,
            issues: None,
            confidence: None,
            sister_sizes: None,
        }
    }

    /// Entry describing a recommendation returned by the service
    pub fn recommendation(rec: Recommendation) -> Self {
        Self {
            text: format!("Recommended Size: {}", rec.recommendation),
            is_user: false,
            reasoning: rec.reasoning,
            fit_tips: rec.fit_tips,
            issues: rec.identified_issues,
            confidence: rec.confidence,
            sister_sizes: rec.sister_sizes,
        }
    }
}

/// Everything a renderer needs to draw the conversation.
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    pub transcript: Vec<TranscriptEntry>,
    pub is_loading: bool,
    pub error: Option<FittingError>,
}

impl ChatSnapshot {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(FittingError::message)
    }
}
