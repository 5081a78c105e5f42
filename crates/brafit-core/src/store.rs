//! The chat store: owner of the transcript, the loading flag and the current
//! error.
//!
//! State changes are published through a [`tokio::sync::watch`] channel, so a
//! UI subscribes once and redraws whenever a new snapshot arrives. Only the
//! store mutates the state: when a submission starts, and when the single
//! outstanding request settles.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::FittingClient;
use crate::state::{ChatSnapshot, TranscriptEntry};

#[derive(Clone)]
pub struct ChatStore {
    client: FittingClient,
    state: Arc<watch::Sender<ChatSnapshot>>,
}

impl ChatStore {
    pub fn new(client: FittingClient) -> Self {
        let (tx, _rx) = watch::channel(ChatSnapshot::default());
        Self {
            client,
            state: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Start a submission in the background and return immediately.
    ///
    /// Observers see `is_loading` flip before this returns. Returns `None`
    /// (and changes nothing) while another submission is still in flight.
    ///
    /// The request runs on its own task, so dropping the returned handle
    /// never leaves the store stuck in loading.
    pub fn submit(&self, input: impl Into<String>) -> Option<JoinHandle<()>> {
        let input = input.into();
        if !self.begin() {
            tracing::warn!("Submission rejected: a request is already in flight");
            return None;
        }

        let store = self.clone();
        Some(tokio::spawn(async move { store.settle(&input).await }))
    }

    /// Atomically move from idle to submitting.
    fn begin(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_loading {
                return false;
            }
            state.is_loading = true;
            state.error = None;
            true
        })
    }

    async fn settle(&self, input: &str) {
        tracing::debug!(base_url = self.client.base_url(), "Requesting recommendation");
        let result = self.client.recommend(input).await;

        self.state.send_modify(|state| {
            match result {
                Ok(recommendation) => {
                    tracing::info!(size = %recommendation.recommendation, "Received recommendation");
                    state.transcript.push(TranscriptEntry::user(input));
                    state.transcript.push(TranscriptEntry::recommendation(recommendation));
                    state.error = None;
                }
                Err(err) => {
                    tracing::warn!(status = ?err.status(), error = %err, "Recommendation request failed");
                    state.error = Some(err);
                }
            }
            state.is_loading = false;
        });
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new(FittingClient::default())
    }
}
