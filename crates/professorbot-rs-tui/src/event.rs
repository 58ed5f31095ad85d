//! TUI event types for input and dialogue results.

use crossterm::event::KeyEvent;
use professorbot_rs_core::{SessionId, TurnOutcome};

/// Application event emitted by input handlers or spawned dialogue calls.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Periodic tick event.
    Tick,
    /// Scroll event in the chat view.
    Scroll(i16),
    /// A submitted turn returned from the driver.
    TurnFinished {
        session_id: SessionId,
        result: Result<TurnOutcome, String>,
    },
    /// A summary request returned from the driver.
    SummaryFinished {
        session_id: SessionId,
        result: Result<String, String>,
    },
}
