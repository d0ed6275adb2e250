//! Markdown to styled terminal lines
//!
//! Walks pulldown-cmark events so inline styles carry across line breaks and
//! nested lists keep their depth. Line breaks inside a paragraph are kept, the
//! assistant uses them for layout.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

fn code_style() -> Style {
    Style::default().fg(Color::Green)
}

fn marker_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn heading_style(base: Style, level: HeadingLevel) -> Style {
    let style = base.add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style.fg(Color::Cyan),
        _ => style,
    }
}

/// Render a whole message. `base` is applied under every span.
pub fn render_markdown(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(base);
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        renderer.event(event);
    }
    renderer.finish()
}

struct Renderer {
    base: Style,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// One entry per open list: next number for ordered lists
    lists: Vec<Option<u64>>,
    item_indent: usize,
    quote_depth: usize,
    in_code_block: bool,
    link_dest: Option<String>,
}

impl Renderer {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            current: Vec::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            item_indent: 0,
            quote_depth: 0,
            in_code_block: false,
            link_dest: None,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, modifier: Modifier) {
        let style = self.style().add_modifier(modifier);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    /// Append to the current line, merging with the previous span when the
    /// style matches.
    fn push_span(&mut self, content: String, style: Style) {
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }

        match self.current.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(&content),
            _ => self.current.push(Span::styled(content, style)),
        }
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn line_break(&mut self) {
        self.flush_line();
        if !self.lists.is_empty() && self.item_indent > 0 {
            let indent = " ".repeat(self.item_indent);
            self.push_span(indent, self.base);
        }
    }

    /// Close a block. Top-level blocks are separated by a blank line.
    fn end_block(&mut self) {
        self.flush_line();
        if self.lists.is_empty()
            && self.quote_depth == 0
            && self.lines.last().is_some_and(|line| !line.spans.is_empty())
        {
            self.lines.push(Line::default());
        }
    }

    fn event(&mut self, event: Event) {
        if self.in_code_block {
            match event {
                Event::Text(code) => {
                    let style = self.base.patch(code_style());
                    for line in code.lines() {
                        self.push_span(format!("  {}", line), style);
                        self.flush_line();
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    self.in_code_block = false;
                    self.end_block();
                }
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                let style = self.style();
                self.push_span(text.to_string(), style);
            }
            Event::Code(code) => {
                let style = self.style().patch(code_style());
                self.push_span(code.to_string(), style);
            }
            Event::SoftBreak | Event::HardBreak => self.line_break(),
            Event::Rule => {
                self.flush_line();
                self.push_span("─".repeat(24), Style::default().fg(Color::DarkGray));
                self.end_block();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let style = heading_style(self.base, level);
                self.styles.push(style);
            }
            Tag::BlockQuote => {
                self.flush_line();
                self.quote_depth += 1;
                self.push_style(Modifier::ITALIC);
            }
            Tag::CodeBlock(_) => {
                self.flush_line();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush_line();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{}. ", number);
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                let indent = "  ".repeat(depth);
                self.item_indent = indent.len() + marker.chars().count();
                if !indent.is_empty() {
                    self.push_span(indent, self.base);
                }
                self.push_span(marker, marker_style());
            }
            Tag::Emphasis => self.push_style(Modifier::ITALIC),
            Tag::Strong => self.push_style(Modifier::BOLD),
            Tag::Strikethrough => self.push_style(Modifier::CROSSED_OUT),
            Tag::Link { dest_url, .. } => {
                let style = self.style().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
                self.styles.push(style);
                self.link_dest = Some(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading(_) => {
                self.pop_style();
                self.end_block();
            }
            TagEnd::BlockQuote => {
                self.pop_style();
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.end_block();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
                self.end_block();
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_dest.take() {
                    self.push_span(format!(" ({})", url), Style::default().fg(Color::DarkGray));
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}
