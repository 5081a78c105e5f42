use std::io::{self, Stderr};
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use brafit_core::ChatSnapshot;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Busy indicator frame rate
const TICK_RATE: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    /// The store published a new snapshot
    Chat(ChatSnapshot),
    Tick,
}

/// Everything the main loop waits on: terminal input, store updates, and a
/// tick that only runs while something on screen is animating.
pub struct EventSource<S = EventStream> {
    terminal: S,
    chat: watch::Receiver<ChatSnapshot>,
    ticker: Interval,
}

impl EventSource {
    pub fn new(chat: watch::Receiver<ChatSnapshot>) -> Self {
        Self::with_stream(EventStream::new(), chat)
    }
}

impl<S> EventSource<S>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    pub fn with_stream(terminal: S, chat: watch::Receiver<ChatSnapshot>) -> Self {
        let mut ticker = tokio::time::interval(TICK_RATE);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { terminal, chat, ticker }
    }

    /// Wait for the next event. `ticking` enables the animation tick.
    /// Returns `None` once the terminal or the store goes away.
    pub async fn next(&mut self, ticking: bool) -> Option<AppEvent> {
        loop {
            tokio::select! {
                evt = self.terminal.next() => match evt {
                    // Only handle key press events, not release
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        return Some(AppEvent::Key(key));
                    }
                    Some(Ok(Event::Mouse(mouse))) => return Some(AppEvent::Mouse(mouse)),
                    Some(Ok(Event::Resize(..))) => return Some(AppEvent::Resize),
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "Terminal event stream failed");
                        return None;
                    }
                    None => return None,
                },
                changed = self.chat.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                    return Some(AppEvent::Chat(self.chat.borrow_and_update().clone()));
                }
                _ = self.ticker.tick(), if ticking => return Some(AppEvent::Tick),
            }
        }
    }
}

/// Raw mode plus alternate screen for as long as the session lives.
pub struct TerminalSession {
    terminal: Tui,
}

impl TerminalSession {
    pub fn enter() -> Result<Self> {
        install_panic_hook();
        enable_raw_mode()?;
        execute!(io::stderr(), EnterAlternateScreen, crossterm::event::EnableMouseCapture)?;

        let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = restore() {
            tracing::error!(error = %err, "Failed to restore terminal");
        }
    }
}

fn restore() -> Result<()> {
    execute!(io::stderr(), crossterm::event::DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use futures_util::stream;

    fn chat_channel() -> (watch::Sender<ChatSnapshot>, watch::Receiver<ChatSnapshot>) {
        watch::channel(ChatSnapshot::default())
    }

    #[tokio::test]
    async fn test_store_update_becomes_chat_event() {
        let (tx, rx) = chat_channel();
        let mut source = EventSource::with_stream(stream::pending(), rx);

        tx.send_modify(|chat| chat.is_loading = true);
        match source.next(false).await {
            Some(AppEvent::Chat(chat)) => assert!(chat.is_loading),
            other => panic!("expected chat update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tick_only_when_requested() {
        let (_tx, rx) = chat_channel();
        let mut source = EventSource::with_stream(stream::pending(), rx);

        let idle = tokio::time::timeout(TICK_RATE * 2, source.next(false)).await;
        assert!(idle.is_err());

        assert!(matches!(source.next(true).await, Some(AppEvent::Tick)));
    }

    #[tokio::test]
    async fn test_key_release_is_skipped() {
        let (_tx, rx) = chat_channel();
        let keys: Vec<io::Result<Event>> = vec![
            Ok(Event::Key(KeyEvent::new_with_kind(
                KeyCode::Char('a'),
                KeyModifiers::NONE,
                KeyEventKind::Release,
            ))),
            Ok(Event::Key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::NONE))),
        ];
        let mut source = EventSource::with_stream(stream::iter(keys), rx);

        match source.next(false).await {
            Some(AppEvent::Key(key)) => assert_eq!(key.code, KeyCode::Char('b')),
            other => panic!("expected key press, got {:?}", other),
        }
        // Terminal stream closed
        assert!(source.next(false).await.is_none());
    }
}
