//! Application state for the ProfessorBot TUI.

use crate::markdown::render_markdown;
use log::{debug, info};
use professorbot_rs_core::{DialogueState, Role, Session, SessionId, Stage};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::cmp::min;

const SPINNER: [&str; 4] = ["·", "··", "···", "··"];
const WARNING_PREFIX: &str = "⚠️";

/// Chat roles displayed in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    /// Local notice; never part of the conversation.
    System,
    /// Submission-ready summary.
    Summary,
}

/// Single chat entry rendered in the chat view.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
    pub color: Option<Color>,
    /// Shown before the driver has recorded it.
    pub pending: bool,
}

/// Outstanding driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Busy {
    Turn,
    Summary,
}

/// Top-level application state for the TUI.
pub struct App {
    /// Topic title shown in the header.
    pub title: String,
    /// Markdown rendered above the conversation.
    pub welcome: String,
    /// Model label shown in the header.
    pub model: String,
    pub user_name: String,
    pub session_id: Option<SessionId>,
    pub state: DialogueState,
    pub user_turn_count: u32,
    /// Advisory turn ceiling for the topic.
    pub max_turns: u32,
    pub stage: Option<Stage>,
    /// Whether the topic offers a submission-ready summary.
    pub summary_enabled: bool,
    /// Chat entries: the conversation plus local notices.
    pub messages: Vec<ChatEntry>,
    pub input: String,
    pub show_slash_commands: bool,
    /// Status line text.
    pub status: String,
    pub busy: Option<Busy>,
    pub scroll: u16,
    pub auto_scroll: bool,
    pub chat_max_scroll: u16,
    /// Conversation messages already mirrored into `messages`.
    synced: usize,
    spinner: usize,
}

impl App {
    pub fn new(
        title: impl Into<String>,
        welcome: impl Into<String>,
        model: impl Into<String>,
        max_turns: u32,
    ) -> Self {
        Self {
            title: title.into(),
            welcome: welcome.into(),
            model: model.into(),
            user_name: "student".to_string(),
            session_id: None,
            state: DialogueState::AwaitingFirstPrompt,
            user_turn_count: 0,
            max_turns,
            stage: None,
            summary_enabled: false,
            messages: Vec::new(),
            input: String::new(),
            show_slash_commands: false,
            status: "idle".to_string(),
            busy: None,
            scroll: 0,
            auto_scroll: true,
            chat_max_scroll: 0,
            synced: 0,
            spinner: 0,
        }
    }

    pub fn set_user_name(&mut self, user_name: String) {
        self.user_name = user_name;
    }

    /// Mirror a driver snapshot into the chat view.
    ///
    /// A different session id replaces the view; the same id appends only the
    /// messages recorded since the last sync. Pending entries are dropped in
    /// favour of the recorded ones.
    pub fn sync_session(&mut self, session: &Session) {
        if self.session_id != Some(session.id) {
            info!("active session set (session_id={})", session.id);
            self.session_id = Some(session.id);
            self.messages.clear();
            self.synced = 0;
            self.scroll = 0;
            self.auto_scroll = true;
            self.chat_max_scroll = 0;
            self.busy = None;
        }
        self.messages.retain(|entry| !entry.pending);
        let fresh = session.messages.iter().skip(self.synced);
        let before = self.messages.len();
        self.messages.extend(fresh.map(|message| {
            let color = (message.role == Role::Assistant
                && message.content.starts_with(WARNING_PREFIX))
            .then(warning_color);
            ChatEntry {
                role: chat_role_for(message.role),
                content: message.content.clone(),
                color,
                pending: false,
            }
        }));
        debug!(
            "synced session (session_id={}, new_entries={})",
            session.id,
            self.messages.len() - before
        );
        self.synced = session.messages.len();
        self.state = session.state;
        self.user_turn_count = session.user_turn_count;
        self.stage = session.stage;
        self.maybe_enable_auto_scroll();
    }

    pub fn is_completed(&self) -> bool {
        self.state == DialogueState::Completed
    }

    /// True when a new message may be sent.
    pub fn accepts_input(&self) -> bool {
        self.busy.is_none() && !self.is_completed() && self.session_id.is_some()
    }

    /// Show the student's message right away and mark a turn outstanding.
    pub fn begin_turn(&mut self, content: String) {
        self.messages.push(ChatEntry {
            role: ChatRole::User,
            content,
            color: None,
            pending: true,
        });
        self.busy = Some(Busy::Turn);
        self.push_status("running");
        self.enable_auto_scroll();
    }

    /// Clear the outstanding call after the driver answered or failed.
    pub fn finish_call(&mut self) {
        self.busy = None;
        self.messages.retain(|entry| !entry.pending);
    }

    /// Set the status line.
    pub fn push_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Append a local notice to the chat view.
    pub fn push_system_message(&mut self, content: impl Into<String>) {
        self.push_entry(ChatRole::System, content.into(), None);
    }

    pub fn push_system_message_colored(&mut self, content: impl Into<String>, color: Color) {
        self.push_entry(ChatRole::System, content.into(), Some(color));
    }

    pub fn push_summary(&mut self, content: String) {
        self.push_entry(ChatRole::Summary, content, None);
    }

    fn push_entry(&mut self, role: ChatRole, content: String, color: Option<Color>) {
        self.messages.push(ChatEntry {
            role,
            content,
            color,
            pending: false,
        });
        self.maybe_enable_auto_scroll();
    }

    /// Advance the typing indicator.
    pub fn tick(&mut self) {
        if self.busy.is_some() {
            self.spinner = (self.spinner + 1) % SPINNER.len();
        }
    }

    /// Scroll the chat view upward by a number of lines.
    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll the chat view downward by a number of lines.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = min(self.scroll.saturating_add(lines), self.chat_max_scroll);
        if self.scroll >= self.chat_max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll = 0;
    }

    pub fn enable_auto_scroll(&mut self) {
        self.auto_scroll = true;
        self.scroll = self.chat_max_scroll;
    }

    /// Update scroll bounds after layout changes.
    ///
    /// Snaps to the new bottom only when `auto_scroll` is on or the view was
    /// already pinned to the bottom.
    pub fn update_scroll_bounds(&mut self, max_scroll: u16) {
        let was_at_bottom = self.scroll >= self.chat_max_scroll;
        self.chat_max_scroll = max_scroll;
        if self.auto_scroll || was_at_bottom {
            self.scroll = max_scroll;
            self.auto_scroll = true;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }

    fn maybe_enable_auto_scroll(&mut self) {
        if self.auto_scroll {
            self.scroll = self.chat_max_scroll;
        }
    }

    /// Typing indicator text, when a call is outstanding.
    pub fn typing_indicator(&self) -> Option<String> {
        match self.busy? {
            Busy::Turn => Some(format!("ProfessorBot is typing{}", SPINNER[self.spinner])),
            Busy::Summary => Some(format!("Preparing your summary{}", SPINNER[self.spinner])),
        }
    }

    /// Render welcome text, chat entries and the typing indicator.
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let muted = Style::default().fg(Color::Rgb(128, 128, 128));

        if !self.welcome.trim().is_empty() {
            lines.extend(render_markdown(
                &self.welcome,
                Style::default().fg(Color::Rgb(200, 200, 200)),
            ));
            lines.push(Line::from(Span::styled(" ─".to_string() + &"─".repeat(40), muted)));
            lines.push(Line::from(Span::raw("")));
        }

        if self.messages.is_empty() {
            lines.push(Line::from(Span::styled(
                " No messages yet. Type a message below to start.",
                muted,
            )));
            return lines;
        }

        for (idx, entry) in self.messages.iter().enumerate() {
            let (prefix, badge) = match entry.role {
                ChatRole::User => (format!(" {} ", self.user_name), Color::Rgb(107, 161, 230)),
                ChatRole::Assistant => (" ProfessorBot ".to_string(), Color::Rgb(238, 121, 72)),
                ChatRole::System => (" system ".to_string(), Color::Rgb(60, 60, 60)),
                ChatRole::Summary => (" summary ".to_string(), Color::Rgb(120, 220, 140)),
            };
            let prefix_style = Style::default()
                .fg(Color::Rgb(10, 10, 10))
                .bg(badge)
                .add_modifier(Modifier::BOLD);
            let content_style = match entry.color {
                Some(color) => Style::default().fg(color),
                None => match entry.role {
                    ChatRole::System => muted,
                    _ => Style::default().fg(Color::Rgb(238, 238, 238)),
                },
            };

            lines.push(Line::from(vec![Span::styled(prefix, prefix_style)]));
            match entry.role {
                ChatRole::Assistant | ChatRole::Summary => {
                    lines.extend(render_markdown(&entry.content, content_style));
                }
                ChatRole::User | ChatRole::System => {
                    for line in entry.content.lines() {
                        lines.push(Line::from(Span::styled(format!(" {line}"), content_style)));
                    }
                }
            }

            if idx + 1 < self.messages.len() {
                lines.push(Line::from(Span::raw("")));
            }
        }

        if let Some(indicator) = self.typing_indicator() {
            lines.push(Line::from(Span::raw("")));
            lines.push(Line::from(Span::styled(
                format!(" {indicator}"),
                muted.add_modifier(Modifier::ITALIC),
            )));
        }

        // Trailing padding keeps the last wrapped line reachable.
        lines.push(Line::from(Span::raw("")));

        lines
    }
}

fn chat_role_for(role: Role) -> ChatRole {
    match role {
        Role::Assistant => ChatRole::Assistant,
        Role::User => ChatRole::User,
        Role::System => ChatRole::System,
    }
}

pub fn warning_color() -> Color {
    Color::Rgb(229, 192, 123)
}

pub fn success_color() -> Color {
    Color::Rgb(120, 220, 140)
}

pub fn error_color() -> Color {
    Color::Rgb(255, 110, 110)
}

#[cfg(test)]
mod tests {
    use super::{App, Busy, ChatRole};
    use pretty_assertions::assert_eq;
    use professorbot_rs_core::{DialogueState, Message, Session};

    fn session_with(messages: &[Message]) -> Session {
        let mut session = Session::new("mind-1", false);
        session.open("What is your Penn ID ?");
        session.messages.extend(messages.iter().cloned());
        session
    }

    fn roles(app: &App) -> Vec<ChatRole> {
        app.messages.iter().map(|entry| entry.role).collect()
    }

    #[test]
    fn sync_appends_only_new_messages() {
        let mut app = App::new("Mind 1", "", "gpt-4.1", 15);
        let mut session = session_with(&[]);
        app.sync_session(&session);
        assert_eq!(roles(&app), vec![ChatRole::Assistant]);
        assert_eq!(app.state, DialogueState::Active);

        app.push_system_message("saved");
        app.begin_turn("12345678".to_string());
        assert_eq!(app.busy, Some(Busy::Turn));
        assert!(!app.accepts_input());

        session.begin_turn("12345678").expect("turn");
        session.record_reply("Which decision?", "MARKER");
        app.sync_session(&session);
        app.finish_call();
        assert_eq!(
            roles(&app),
            vec![
                ChatRole::Assistant,
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant
            ]
        );
        assert_eq!(app.user_turn_count, 1);
        assert!(app.accepts_input());
    }

    #[test]
    fn new_session_replaces_view() {
        let mut app = App::new("Mind 1", "", "gpt-4.1", 15);
        app.sync_session(&session_with(&[Message::user("hi"), Message::assistant("hey")]));
        assert_eq!(app.messages.len(), 3);

        app.sync_session(&session_with(&[]));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.user_turn_count, 0);
    }

    #[test]
    fn warnings_are_highlighted() {
        let mut app = App::new("Mind 1", "", "gpt-4.1", 15);
        app.sync_session(&session_with(&[
            Message::user("hi"),
            Message::assistant("⚠️ Could not reach the model (timeout). Please send your message again."),
        ]));
        assert_eq!(app.messages[2].color, Some(super::warning_color()));
        assert_eq!(app.messages[0].color, None);
    }

    #[test]
    fn completed_session_blocks_input() {
        let mut app = App::new("Mind 1", "", "gpt-4.1", 15);
        let mut session = session_with(&[]);
        session.state = DialogueState::Completed;
        app.sync_session(&session);
        assert!(app.is_completed());
        assert!(!app.accepts_input());
    }

    #[test]
    fn failed_call_drops_pending_entry() {
        let mut app = App::new("Mind 1", "", "gpt-4.1", 15);
        app.sync_session(&session_with(&[]));
        app.begin_turn("hello".to_string());
        assert_eq!(app.messages.len(), 2);
        app.finish_call();
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.busy, None);
    }

    #[test]
    fn typing_indicator_shows_while_busy() {
        let mut app = App::new("Mind 1", "", "gpt-4.1", 15);
        app.sync_session(&session_with(&[]));
        assert_eq!(app.typing_indicator(), None);
        app.begin_turn("hello".to_string());
        let rendered: Vec<String> = app
            .render_lines()
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect();
        assert!(
            rendered
                .iter()
                .any(|line| line.starts_with(" ProfessorBot is typing"))
        );
    }

    #[test]
    fn scroll_bounds_follow_bottom_until_user_scrolls() {
        let mut app = App::new("Mind 1", "", "gpt-4.1", 15);
        app.update_scroll_bounds(10);
        assert_eq!(app.scroll, 10);
        app.scroll_up(3);
        app.update_scroll_bounds(12);
        assert_eq!(app.scroll, 7);
        assert!(!app.auto_scroll);
        app.scroll_down(10);
        assert_eq!(app.scroll, 12);
        assert!(app.auto_scroll);
    }
}
