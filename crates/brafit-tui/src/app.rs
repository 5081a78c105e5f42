use ratatui::layout::Rect;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use brafit_core::{ChatSnapshot, ChatStore, FittingClient, FittingError, HealthStatus};

/// What the startup health probe found out about the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Checking,
    Healthy,
    Degraded(String),
    Unreachable,
}

impl ServiceStatus {
    pub fn label(&self) -> &str {
        match self {
            ServiceStatus::Checking => "checking",
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Degraded(status) => status.as_str(),
            ServiceStatus::Unreachable => "unreachable",
        }
    }
}

pub struct App {
    pub should_quit: bool,

    // Input line
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Latest state published by the store
    pub chat: ChatSnapshot,

    // Transcript viewport
    pub chat_scroll: u16,
    pub follow_tail: bool,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Service
    pub base_url: String,
    pub service: ServiceStatus,
    pub health_task: Option<JoinHandle<Result<HealthStatus, FittingError>>>,

    store: ChatStore,
}

impl App {
    pub fn new(store: ChatStore, base_url: impl Into<String>) -> Self {
        let chat = store.snapshot();
        Self {
            should_quit: false,
            input: String::new(),
            cursor: 0,
            chat,
            chat_scroll: 0,
            follow_tail: true,
            chat_area: None,
            animation_frame: 0,
            base_url: base_url.into(),
            service: ServiceStatus::Checking,
            health_task: None,
            store,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.store.subscribe()
    }

    /// Submit control state: nothing to send, or a request still in flight
    pub fn can_submit(&self) -> bool {
        !self.input.is_empty() && !self.chat.is_loading
    }

    /// Hand the current input to the store and clear the input line.
    pub fn submit_input(&mut self) {
        if !self.can_submit() {
            return;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor = 0;
        if self.store.submit(text).is_some() {
            // The store flips to loading synchronously
            self.apply_snapshot(self.store.snapshot());
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: ChatSnapshot) {
        let grew = snapshot.transcript.len() > self.chat.transcript.len();
        if grew || snapshot.is_loading {
            self.follow_tail = true;
        }
        if !snapshot.is_loading {
            self.animation_frame = 0;
        }
        self.chat = snapshot;
    }

    pub fn start_health_probe(&mut self, client: FittingClient) {
        self.service = ServiceStatus::Checking;
        self.health_task = Some(tokio::spawn(async move { client.health().await }));
    }

    /// Collect the health probe result once it has finished
    pub async fn poll_health(&mut self) {
        let finished = self.health_task.as_ref().map(|t| t.is_finished()).unwrap_or(false);
        if !finished {
            return;
        }

        let Some(task) = self.health_task.take() else {
            return;
        };

        self.service = match task.await {
            Ok(Ok(health)) if health.is_healthy() => ServiceStatus::Healthy,
            Ok(Ok(health)) => ServiceStatus::Degraded(health.status),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Health check failed");
                ServiceStatus::Unreachable
            }
            Err(err) => {
                tracing::error!(error = %err, "Health check task panicked");
                ServiceStatus::Unreachable
            }
        };
        tracing::info!(status = self.service.label(), "Service health");
    }

    /// Whether the event loop should keep ticking: the busy indicator is
    /// animating or the health probe hasn't been collected yet
    pub fn needs_tick(&self) -> bool {
        self.chat.is_loading || self.health_task.is_some()
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        // The renderer clamps and re-enables tail following at the bottom
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }
}
