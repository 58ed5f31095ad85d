//! Library entry point for the ProfessorBot TUI.
//!
//! Provides a reusable [`run`] function that launches the Ratatui terminal UI
//! against a pre-configured [`DialogueDriver`]. One run hosts one session at a
//! time; `/new` discards it and opens a fresh one.

mod app;
mod event;
mod markdown;
mod ui;

use anyhow::anyhow;
use app::{App, Busy};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use event::AppEvent;
use log::{debug, info, warn};
use professorbot_rs_core::{CoreError, DialogueDriver, DialogueState, SessionId, TurnOutcome};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

const ENV_USER: &str = "USER";
const ENV_USERNAME: &str = "USERNAME";

const TRANSCRIPT_LOCKED: &str = "Transcript download is available after approval.";
const NO_SUMMARY: &str = "This topic does not offer a summary.";

/// Supported slash commands in the TUI input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlashCommand {
    New,
    Save,
    Summary,
    Help,
}

/// Configuration for a ProfessorBot TUI run.
#[derive(Debug, Clone, Default)]
pub struct TuiConfig {
    /// Directory transcripts are written into.
    pub transcript_dir: PathBuf,
    /// Display name for the student.
    pub user_name: Option<String>,
}

/// Launch the TUI against a pre-configured driver.
///
/// The caller is responsible for initializing logging before calling `run`.
///
/// # Errors
/// Returns an error if terminal setup or the event loop fails.
pub async fn run(driver: DialogueDriver, config: TuiConfig) -> anyhow::Result<()> {
    let mut app = new_app(&driver);
    let user_name = config.user_name.clone().unwrap_or_else(resolve_user_name);
    app.set_user_name(user_name);

    let session_id = driver.start_session();
    app.sync_session(&driver.session(session_id)?);
    if !driver.has_generator() {
        warn!(
            "running without a generator (credential={})",
            driver.settings().credential_name
        );
        app.push_status(format!("missing {}", driver.settings().credential_name));
    }

    let mut terminal = setup_terminal()?;
    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());

    let result = loop {
        if let Err(err) = terminal.draw(|frame| ui::draw(frame, &mut app)) {
            break Err(err.into());
        }
        let Some(event) = rx.recv().await else {
            break Err(anyhow!("event channel closed unexpectedly"));
        };
        match handle_app_event(event, &driver, &config, &mut app, tx.clone()) {
            Ok(true) => break Ok(()),
            Ok(false) => {}
            Err(err) => break Err(err),
        }
    };

    restore_terminal(&mut terminal)?;
    result
}

fn new_app(driver: &DialogueDriver) -> App {
    let topic = driver.topic();
    let model = driver.model().unwrap_or("no model").to_string();
    let mut app = App::new(
        topic.title.clone(),
        topic.welcome.clone(),
        model,
        driver.settings().max_turns,
    );
    app.summary_enabled = topic.summary_instruction.is_some();
    app
}

/// Dispatch a UI event and return true when the app should exit.
fn handle_app_event(
    event: AppEvent,
    driver: &DialogueDriver,
    config: &TuiConfig,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    match event {
        AppEvent::Input(key) => handle_input(key, driver, config, app, sender),
        AppEvent::TurnFinished { session_id, result } => {
            if app.session_id != Some(session_id) {
                debug!("dropping turn for replaced session (session_id={})", session_id);
                return Ok(false);
            }
            finish_turn(driver, app, session_id, result)?;
            Ok(false)
        }
        AppEvent::SummaryFinished { session_id, result } => {
            if app.session_id != Some(session_id) {
                return Ok(false);
            }
            app.finish_call();
            match result {
                Ok(summary) => {
                    app.push_summary(summary);
                    app.push_status("summary ready");
                }
                Err(err) => {
                    app.push_system_message_colored(
                        format!("summary failed: {err}"),
                        app::error_color(),
                    );
                    app.push_status("idle");
                }
            }
            Ok(false)
        }
        AppEvent::Scroll(delta) => {
            if delta < 0 {
                app.scroll_up(delta.unsigned_abs());
            } else if delta > 0 {
                app.scroll_down(delta as u16);
            }
            Ok(false)
        }
        AppEvent::Tick => {
            app.tick();
            Ok(false)
        }
    }
}

/// Mirror a finished turn into the view.
fn finish_turn(
    driver: &DialogueDriver,
    app: &mut App,
    session_id: SessionId,
    result: Result<TurnOutcome, String>,
) -> anyhow::Result<()> {
    app.finish_call();
    match result {
        Ok(outcome) => {
            app.sync_session(&driver.session(session_id)?);
            let status = if outcome.state == DialogueState::Completed {
                "approved: Ctrl+S saves the transcript"
            } else if outcome.warning.is_some() {
                "warning"
            } else {
                "idle"
            };
            app.push_status(status);
            if outcome.forced_close {
                app.push_system_message("The turn limit was reached, so the conversation was closed.");
            }
        }
        Err(err) => {
            app.push_system_message_colored(err, app::error_color());
            app.push_status("idle");
        }
    }
    Ok(())
}

/// Handle keyboard input and dispatch actions.
fn handle_input(
    key: KeyEvent,
    driver: &DialogueDriver,
    config: &TuiConfig,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }
    if key.code == KeyCode::Esc {
        if app.show_slash_commands {
            app.show_slash_commands = false;
            app.input.clear();
            return Ok(false);
        }
        return Ok(true);
    }
    handle_default_input(key, driver, config, app, sender)
}

/// Handle keyboard input in the chat view.
fn handle_default_input(
    key: KeyEvent,
    driver: &DialogueDriver,
    config: &TuiConfig,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    match key.code {
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            save_transcript(driver, config, app);
        }
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            reset_session(driver, app)?;
        }
        KeyCode::Char('g') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            request_summary(driver, app, sender);
        }
        KeyCode::PageUp => app.scroll_up(5),
        KeyCode::PageDown => app.scroll_down(5),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.enable_auto_scroll(),
        KeyCode::Enter => {
            app.show_slash_commands = false;
            if app.input.trim().is_empty() {
                return Ok(false);
            }
            if app.input.trim_start().starts_with('/') {
                let command = std::mem::take(&mut app.input);
                if let Err(err) = handle_slash_command(driver, config, app, sender, &command) {
                    app.push_system_message(err);
                }
            } else {
                send_message(driver, app, sender);
            }
        }
        KeyCode::Backspace => {
            app.input.pop();
            app.show_slash_commands = app.input.trim_start().starts_with('/');
        }
        KeyCode::Char(ch) => {
            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                app.input.push(ch);
                app.show_slash_commands = app.input.trim_start().starts_with('/');
            }
        }
        _ => {}
    }
    Ok(false)
}

/// Handle slash commands entered in the input box.
fn handle_slash_command(
    driver: &DialogueDriver,
    config: &TuiConfig,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
    input: &str,
) -> Result<(), String> {
    let Some(command) = parse_slash_command(input)? else {
        return Ok(());
    };
    debug!("handling slash command (command={:?})", command);
    match command {
        SlashCommand::New => reset_session(driver, app).map_err(|err| err.to_string())?,
        SlashCommand::Save => save_transcript(driver, config, app),
        SlashCommand::Summary => request_summary(driver, app, sender),
        SlashCommand::Help => app.push_system_message(help_text(app.summary_enabled)),
    }
    Ok(())
}

/// Parse a slash command from the input line.
fn parse_slash_command(input: &str) -> Result<Option<SlashCommand>, String> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Ok(None);
    }
    let mut parts = trimmed.trim_start_matches('/').split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    let parsed = match command.to_lowercase().as_str() {
        "new" | "reset" => SlashCommand::New,
        "save" | "transcript" => SlashCommand::Save,
        "summary" => SlashCommand::Summary,
        "help" => SlashCommand::Help,
        _ => return Err(format!("unknown command: {command}")),
    };
    if parts.next().is_some() {
        return Err(format!("/{command} takes no arguments"));
    }
    Ok(Some(parsed))
}

fn help_text(summary_enabled: bool) -> String {
    let mut lines: Vec<String> = ui::SLASH_COMMANDS
        .iter()
        .filter(|(command, _)| summary_enabled || *command != "/summary")
        .map(|(command, description)| format!("{command:<10} {description}"))
        .collect();
    lines.push("Enter sends, Ctrl+S saves, Ctrl+N starts over, Ctrl+C quits.".to_string());
    if summary_enabled {
        lines.push("Ctrl+G asks for the summary.".to_string());
    }
    lines.join("\n")
}

/// Send the input buffer as the next turn.
fn send_message(driver: &DialogueDriver, app: &mut App, sender: mpsc::Sender<AppEvent>) {
    let Some(session_id) = app.session_id else {
        app.push_status("no active session");
        return;
    };
    if app.is_completed() {
        app.push_system_message("This conversation is complete. Ctrl+S saves the transcript.");
        return;
    }
    if app.busy.is_some() {
        app.push_status("waiting for reply");
        return;
    }
    let prompt = std::mem::take(&mut app.input);
    info!(
        "sending message (session_id={}, prompt_len={})",
        session_id,
        prompt.len()
    );
    app.begin_turn(prompt.clone());
    spawn_turn(driver.clone(), session_id, prompt, sender);
}

/// Write the transcript of a completed session to the configured directory.
fn save_transcript(driver: &DialogueDriver, config: &TuiConfig, app: &mut App) {
    let Some(session_id) = app.session_id else {
        app.push_status("no active session");
        return;
    };
    let transcript = match driver.transcript(session_id) {
        Ok(transcript) => transcript,
        Err(CoreError::TranscriptUnavailable(_)) => {
            app.push_system_message(TRANSCRIPT_LOCKED);
            return;
        }
        Err(err) => {
            app.push_system_message_colored(err.to_string(), app::error_color());
            return;
        }
    };
    match transcript.write_to(&config.transcript_dir) {
        Ok(path) => {
            app.push_system_message_colored(
                format!("transcript saved to {}", path.display()),
                app::success_color(),
            );
            app.push_status("transcript saved");
        }
        Err(err) => {
            warn!("failed to write transcript (err={})", err);
            app.push_system_message_colored(
                format!("failed to save transcript: {err}"),
                app::error_color(),
            );
        }
    }
}

/// Discard the current session and open a fresh one.
fn reset_session(driver: &DialogueDriver, app: &mut App) -> anyhow::Result<()> {
    let session_id = match app.session_id {
        Some(current) => driver.reset(current)?,
        None => driver.start_session(),
    };
    app.sync_session(&driver.session(session_id)?);
    app.input.clear();
    app.push_status("new conversation");
    Ok(())
}

/// Ask for the submission-ready summary in the background.
fn request_summary(driver: &DialogueDriver, app: &mut App, sender: mpsc::Sender<AppEvent>) {
    if !app.summary_enabled {
        app.push_system_message(NO_SUMMARY);
        return;
    }
    let Some(session_id) = app.session_id else {
        app.push_status("no active session");
        return;
    };
    if app.busy.is_some() {
        app.push_status("waiting for reply");
        return;
    }
    app.busy = Some(Busy::Summary);
    app.push_status("running");
    let driver = driver.clone();
    tokio::spawn(async move {
        let result = driver
            .summarize(session_id)
            .await
            .map_err(|err| err.to_string());
        let _ = sender
            .send(AppEvent::SummaryFinished { session_id, result })
            .await;
    });
}

/// Spawn a task that submits one turn and reports back.
fn spawn_turn(
    driver: DialogueDriver,
    session_id: SessionId,
    prompt: String,
    sender: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = driver
            .submit(session_id, &prompt)
            .await
            .map_err(|err| err.to_string());
        let _ = sender
            .send(AppEvent::TurnFinished { session_id, result })
            .await;
    });
}

/// Spawn a task to poll for input events.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        const MOUSE_SCROLL_LINES: i16 = 3;
        loop {
            if matches!(crossterm::event::poll(Duration::from_millis(30)), Ok(true)) {
                while matches!(crossterm::event::poll(Duration::from_millis(0)), Ok(true)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    match event {
                        CrosstermEvent::Key(key) => {
                            let _ = sender.send(AppEvent::Input(key)).await;
                        }
                        CrosstermEvent::Mouse(mouse) => {
                            let lines = if mouse.modifiers.contains(KeyModifiers::SHIFT) {
                                MOUSE_SCROLL_LINES.saturating_mul(2)
                            } else {
                                MOUSE_SCROLL_LINES
                            };
                            match mouse.kind {
                                MouseEventKind::ScrollUp => {
                                    let _ = sender.send(AppEvent::Scroll(-lines)).await;
                                }
                                MouseEventKind::ScrollDown => {
                                    let _ = sender.send(AppEvent::Scroll(lines)).await;
                                }
                                _ => {}
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}

/// Spawn a periodic tick event generator.
fn spawn_tick(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            let _ = sender.send(AppEvent::Tick).await;
        }
    });
}

fn resolve_user_name() -> String {
    std::env::var(ENV_USER)
        .or_else(|_| std::env::var(ENV_USERNAME))
        .unwrap_or_else(|_| "student".to_string())
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
