//! Rendering routines for the ProfessorBot TUI.

use crate::app::App;
use professorbot_rs_core::DialogueState;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};

const PRIMARY: Color = Color::Rgb(236, 91, 43);
const SECONDARY: Color = Color::Rgb(238, 121, 72);
const TEXT: Color = Color::Rgb(238, 238, 238);
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128);
const BORDER: Color = Color::Rgb(60, 60, 60);
const BORDER_ACTIVE: Color = Color::Rgb(238, 121, 72);
const YELLOW: Color = Color::Rgb(229, 192, 123);
const GREEN: Color = Color::Rgb(120, 220, 140);
const RED: Color = Color::Rgb(255, 110, 110);

const SLASH_PALETTE_HEIGHT: u16 = 10;
const HEADER_HEIGHT: u16 = 6; // 4 inner lines + 2 border lines
const PROGRESS_WIDGET_WIDTH: u16 = 24;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Slash commands with their palette descriptions.
pub const SLASH_COMMANDS: [(&str, &str); 4] = [
    ("/new", "Start over with a fresh conversation"),
    ("/save", "Save the transcript (after approval)"),
    ("/summary", "Ask for a submission-ready summary"),
    ("/help", "Show commands and shortcuts"),
];

/// Status bar key hints; Ctrl+G only shows for topics with a summary.
const SHORTCUTS: [(&str, &str); 6] = [
    ("Ctrl+C", "quit"),
    ("Ctrl+S", "save"),
    ("Ctrl+N", "new"),
    ("Ctrl+G", "summary"),
    ("/", "commands"),
    ("PgUp/PgDn", "scroll"),
];

/// Rounded block with the given borders and border colour.
fn panel(borders: Borders, color: Color) -> Block<'static> {
    Block::default()
        .borders(borders)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // header bar
            Constraint::Min(0),                // chat
            Constraint::Length(3),             // input
            Constraint::Length(1),             // status bar
        ])
        .split(frame.area());

    draw_header(frame, app, root[0]);
    draw_chat(frame, app, root[1]);
    if app.show_slash_commands {
        draw_slash_palette(frame, root[1]);
    }
    draw_input(frame, app, root[2]);
    draw_status_bar(frame, app, root[3]);
}

/// Draw topic, model and session details with the turn gauge on the right.
fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let session = app
        .session_id
        .map(|id| {
            let s = id.to_string();
            s[..8.min(s.len())].to_string()
        })
        .unwrap_or_else(|| "none".to_string());

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(PROGRESS_WIDGET_WIDTH)])
        .split(area);

    let left_block = panel(Borders::TOP | Borders::LEFT | Borders::BOTTOM, BORDER);
    let inner = left_block.inner(cols[0]);
    frame.render_widget(left_block, cols[0]);

    let label_style = Style::default().fg(TEXT_MUTED);
    let value_style = Style::default().fg(TEXT);

    let mut session_spans = vec![
        Span::styled("  session ", label_style),
        Span::styled(session, value_style),
        Span::styled("  state ", label_style),
        Span::styled(
            app.state.as_str(),
            Style::default().fg(state_color(app.state)),
        ),
    ];
    if let Some(stage) = app.stage {
        session_spans.push(Span::styled("  stage ", label_style));
        session_spans.push(Span::styled(stage.label().to_string(), value_style));
    }

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("  {}", app.title),
                Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  v{VERSION}"), label_style),
        ]),
        Line::from(vec![
            Span::styled("  student ", label_style),
            Span::styled(app.user_name.as_str(), value_style),
            Span::styled("  model ", label_style),
            Span::styled(app.model.as_str(), value_style),
        ]),
        Line::from(session_spans),
    ];

    let line_count = lines.len() as u16;
    let pad_top = inner.height.saturating_sub(line_count) / 2;
    let centered_area = Rect {
        x: inner.x,
        y: inner.y + pad_top,
        width: inner.width,
        height: inner.height.saturating_sub(pad_top),
    };
    frame.render_widget(Paragraph::new(lines), centered_area);

    draw_progress_widget(frame, app, cols[1]);
}

/// Draw the turn count against the advisory ceiling as a bar gauge.
fn draw_progress_widget(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let ratio = if app.max_turns == 0 {
        1.0
    } else {
        (app.user_turn_count as f32 / app.max_turns as f32).min(1.0)
    };
    let color = if app.state == DialogueState::Completed {
        GREEN
    } else if ratio < 0.6 {
        SECONDARY
    } else if ratio < 0.9 {
        YELLOW
    } else {
        RED
    };

    let block = panel(Borders::TOP | Borders::RIGHT | Borders::BOTTOM, BORDER)
        .title(Span::styled(" Turns ", Style::default().fg(TEXT_MUTED)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let bar_width = inner.width.saturating_sub(2);
    let filled = (ratio * bar_width as f32).round() as u16;
    let empty = bar_width.saturating_sub(filled);

    let lines = vec![
        Line::from(Span::styled(
            format!(" {}/{}", app.user_turn_count, app.max_turns),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(" ", Style::default()),
            Span::styled("█".repeat(filled as usize), Style::default().fg(color)),
            Span::styled("░".repeat(empty as usize), Style::default().fg(BORDER)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Draw the chat view with border and scrollbar.
fn draw_chat(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let lines = app.render_lines();

    let block = panel(Borders::ALL, BORDER)
        .title(Span::styled(" Conversation ", Style::default().fg(TEXT_MUTED)));

    let inner = block.inner(area);
    let content_width = inner.width.saturating_sub(1); // -1 for scrollbar
    let content_height = inner.height as usize;

    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);

    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_scroll_bounds(max_scroll);
    let scroll = app.scroll;

    let chat_inner = Rect {
        width: content_width,
        ..inner
    };
    let chat = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, area);
    frame.render_widget(chat, chat_inner);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total_lines)
            .position(scroll as usize)
            .viewport_content_length(content_height);
        let scrollbar_area = Rect {
            x: inner.x + inner.width.saturating_sub(1),
            y: inner.y,
            width: 1,
            height: inner.height,
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(BORDER))
                .thumb_style(Style::default().fg(TEXT_MUTED)),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

/// Draw the input box; it is greyed out while a call is outstanding or once completed.
fn draw_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let is_active = app.accepts_input() || app.input.trim_start().starts_with('/');
    let border_color = if is_active { BORDER_ACTIVE } else { BORDER };
    let (title, placeholder) = if app.is_completed() {
        (
            " Conversation complete ",
            "Ctrl+S saves the transcript, Ctrl+N starts over",
        )
    } else if app.busy.is_some() {
        (" Waiting for reply ", "ProfessorBot is typing...")
    } else {
        (" Your answer ", "Type your answer...")
    };

    let block = panel(Borders::ALL, border_color)
        .title(Span::styled(
            title,
            Style::default().fg(if is_active { SECONDARY } else { TEXT_MUTED }),
        ));
    let inner = block.inner(area);

    let prompt_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let body = if app.input.is_empty() {
        Span::styled(placeholder, Style::default().fg(TEXT_MUTED))
    } else {
        Span::styled(app.input.as_str(), Style::default().fg(TEXT))
    };
    let input_text = Line::from(vec![Span::styled(" ", prompt_style), body]);

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(input_text), inner);

    if is_active {
        let typed = app.input.chars().count() as u16;
        frame.set_cursor_position((inner.x + 1 + typed, inner.y));
    }
}

/// Draw the status bar at the bottom.
fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status_color = match app.status.as_str() {
        "running" => PRIMARY,
        "idle" => TEXT_MUTED,
        _ => YELLOW,
    };

    let shortcuts: Vec<Span<'_>> = SHORTCUTS
        .iter()
        .filter(|(key, _)| app.summary_enabled || *key != "Ctrl+G")
        .flat_map(|(key, label)| {
            [
                Span::styled(format!("  {key}"), Style::default().fg(TEXT_MUTED)),
                Span::styled(format!(" {label}"), Style::default().fg(BORDER)),
            ]
        })
        .collect();

    let right_text = format!(" {} ", app.status);
    let right_len = right_text.chars().count() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len.min(area.width),
        ..area
    };

    frame.render_widget(Paragraph::new(Line::from(shortcuts)), left_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            right_text,
            Style::default().fg(status_color),
        ))),
        right_area,
    );
}

fn draw_slash_palette(frame: &mut Frame<'_>, area: Rect) {
    let cmd_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(TEXT_MUTED);
    let hint_style = Style::default()
        .fg(TEXT_MUTED)
        .add_modifier(Modifier::ITALIC);

    let mut lines = vec![Line::from(vec![])];
    for (command, description) in SLASH_COMMANDS {
        lines.push(Line::from(vec![
            Span::styled(format!("  {command:<12}"), cmd_style),
            Span::styled(description, desc_style),
        ]));
    }
    lines.push(Line::from(vec![]));
    lines.push(Line::from(Span::styled("  Esc to close", hint_style)));

    let height = SLASH_PALETTE_HEIGHT
        .min(area.height)
        .min(lines.len() as u16 + 2); // +2 for border

    let palette_area = Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(height),
        width: area.width.saturating_sub(2).min(56),
        height,
    };

    let block = panel(Borders::ALL, PRIMARY)
        .title(Span::styled(
            " Commands ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));

    frame.render_widget(Paragraph::new(lines).block(block), palette_area);
}

fn state_color(state: DialogueState) -> Color {
    match state {
        DialogueState::AwaitingFirstPrompt => TEXT_MUTED,
        DialogueState::Active => SECONDARY,
        DialogueState::Completed => GREEN,
    }
}
