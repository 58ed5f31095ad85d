//! Markdown rendering for welcome text and assistant replies.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::mem;

const HEADING: Color = Color::Rgb(236, 91, 43);
const BULLET: Color = Color::Rgb(238, 121, 72);
const CODE: Color = Color::Rgb(229, 192, 123);
const RULE: Color = Color::Rgb(60, 60, 60);

/// Render markdown into padded lines styled on top of `base`.
pub fn render_markdown(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut writer = LineWriter::new(base);
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        writer.handle(event);
    }
    writer.finish()
}

struct LineWriter {
    styles: Vec<Style>,
    /// Open lists; `Some(n)` is the next ordinal of an ordered list.
    lists: Vec<Option<u64>>,
    current: Vec<Span<'static>>,
    lines: Vec<Line<'static>>,
    in_code_block: bool,
}

impl LineWriter {
    fn new(base: Style) -> Self {
        Self {
            styles: vec![base],
            lists: Vec::new(),
            current: Vec::new(),
            lines: Vec::new(),
            in_code_block: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.in_code_block => {
                for line in text.lines() {
                    self.current
                        .push(Span::styled(format!("  {line}"), Style::default().fg(CODE)));
                    self.flush();
                }
            }
            Event::Text(text) => {
                let style = self.style();
                self.current.push(Span::styled(text.into_string(), style));
            }
            Event::Code(code) => {
                self.current
                    .push(Span::styled(code.into_string(), Style::default().fg(CODE)));
            }
            Event::SoftBreak => {
                let style = self.style();
                self.current.push(Span::styled(" ", style));
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.current
                    .push(Span::styled("─".repeat(24), Style::default().fg(RULE)));
                self.flush();
                self.blank();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let style = self.style();
        match tag {
            Tag::Heading { .. } => {
                self.flush();
                self.styles
                    .push(style.fg(HEADING).add_modifier(Modifier::BOLD));
            }
            Tag::Strong => self.styles.push(style.add_modifier(Modifier::BOLD)),
            Tag::Emphasis => self.styles.push(style.add_modifier(Modifier::ITALIC)),
            Tag::Strikethrough => self.styles.push(style.add_modifier(Modifier::CROSSED_OUT)),
            Tag::List(first) => {
                self.flush();
                self.lists.push(first);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(ordinal)) => {
                        let marker = format!("{ordinal}. ");
                        *ordinal += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::styled(
                    format!("{}{marker}", "  ".repeat(depth)),
                    Style::default().fg(BULLET),
                ));
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.flush();
                self.blank();
            }
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Item => self.flush(),
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank();
            }
            _ => {}
        }
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = vec![Span::raw(" ")];
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|line| line.spans.is_empty()) || self.lines.is_empty() {
            return;
        }
        self.lines.push(Line::default());
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        mem::take(&mut self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::render_markdown;
    use pretty_assertions::assert_eq;
    use ratatui::style::{Modifier, Style};
    use ratatui::text::Line;

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn strong_text_is_bold() {
        let lines = render_markdown("Hello **world**", Style::default());
        assert_eq!(text(&lines), vec![" Hello world"]);
        let bold = lines[0]
            .spans
            .iter()
            .find(|span| span.content == "world")
            .expect("bold span");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn paragraphs_are_separated_and_soft_breaks_joined() {
        let lines = render_markdown("First\nline\n\nSecond", Style::default());
        assert_eq!(text(&lines), vec![" First line", "", " Second"]);
    }

    #[test]
    fn lists_get_markers() {
        let lines = render_markdown("- one\n- two\n\n1. a\n2. b", Style::default());
        assert_eq!(
            text(&lines),
            vec![" • one", " • two", "", " 1. a", " 2. b"]
        );
    }

    #[test]
    fn headings_are_followed_by_a_blank_line() {
        let lines = render_markdown("## Goal\nReflect on a decision.", Style::default());
        assert_eq!(text(&lines), vec![" Goal", "", " Reflect on a decision."]);
        assert!(lines[1].spans.is_empty());
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(render_markdown("", Style::default()).is_empty());
    }
}
