use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use soia_core::ChatRole;
use crate::app::App;
use crate::markdown::render_markdown;
use crate::welcome::{ASSISTANT_NAME, ASSISTANT_TAGLINE, AUDIENCE, EXAMPLES, GREETING, INTRO, TOPICS};

const WELCOME_WIDTH: u16 = 76;
const EXAMPLE_HEIGHT: u16 = 4;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_rows = app.input.height(area.width.saturating_sub(2));

    // Main layout: header, body, input, footer
    let [header_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.session.is_empty() {
        render_welcome(app, frame, body_area);
    } else {
        render_messages(app, frame, body_area);
    }

    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = match app.service_online {
        Some(true) => Span::styled(" ● online ", Style::default().fg(Color::Green)),
        Some(false) => Span::styled(" ● offline ", Style::default().fg(Color::Red)),
        None => Span::styled(" ○ connecting ", Style::default().fg(Color::Gray)),
    };

    let title = Line::from(vec![
        Span::styled(format!(" {} ", ASSISTANT_NAME), Style::default().fg(Color::Cyan).bold()),
        Span::styled(ASSISTANT_TAGLINE, Style::default().fg(Color::White)),
        status,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let arrows_label = if app.session.is_empty() && app.input.is_blank() {
        " examples "
    } else {
        " scroll "
    };

    // Without disambiguated key codes most terminals send Shift+Enter as Enter
    let newline_key = if app.keyboard_enhanced {
        " Shift+Enter "
    } else {
        " Alt+Enter "
    };

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(newline_key, key_style),
        Span::styled(" newline ", label_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(arrows_label, label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl+N ", key_style),
        Span::styled(" new chat ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_welcome(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = None;

    let width = area.width.min(WELCOME_WIDTH);
    let column = Rect::new(area.x + (area.width - width) / 2, area.y, width, area.height);

    let mut constraints = vec![Constraint::Length(5), Constraint::Length(1)];
    constraints.extend(EXAMPLES.iter().map(|_| Constraint::Length(EXAMPLE_HEIGHT)));
    constraints.extend([Constraint::Length(3), Constraint::Min(0)]);
    let rows = Layout::vertical(constraints).split(column);

    let intro = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled(
            GREETING,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(INTRO),
        Line::from(Span::styled(AUDIENCE, Style::default().fg(Color::Magenta))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(intro, rows[0]);

    let prompt_label = Paragraph::new(Span::styled(
        "Example questions:",
        Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(prompt_label, rows[1]);

    app.example_areas.clear();
    for (i, example) in EXAMPLES.iter().enumerate() {
        let example_area = rows[2 + i];
        let selected = i == app.selected_example;

        let border_color = if selected { Color::Yellow } else { Color::DarkGray };
        let title_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let card = Paragraph::new(vec![
            Line::from(Span::styled(example.title, title_style)),
            Line::from(Span::styled(example.question, Style::default().fg(Color::Gray))),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        )
        .wrap(Wrap { trim: true });

        frame.render_widget(card, example_area);
        app.example_areas.push(example_area);
    }

    let topics = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled("I can help you with:", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(TOPICS.join(" · "), Style::default().fg(Color::DarkGray))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(topics, rows[2 + EXAMPLES.len()]);
}

fn render_messages(app: &mut App, frame: &mut Frame, area: Rect) {
    app.example_areas.clear();
    app.chat_area = Some(area);

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    app.chat_height = inner_height;

    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.session.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.extend(render_markdown(&msg.content, Style::default().fg(Color::Cyan)));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    format!("{}:", ASSISTANT_NAME),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(render_markdown(&msg.content, Style::default()));
            }
        }
        lines.push(Line::default());
    }

    if app.session.is_pending() {
        lines.push(Line::from(Span::styled(
            format!("{}:", ASSISTANT_NAME),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });

    // Counted before the block is attached so borders are not included
    let total = chat.line_count(inner_width).min(u16::MAX as usize) as u16;
    app.max_scroll = total.saturating_sub(inner_height);
    app.chat_scroll = if app.follow_output {
        app.max_scroll
    } else {
        app.chat_scroll.min(app.max_scroll)
    };

    let title = if app.chat_scroll < app.max_scroll {
        " Conversation (more below, PgDn) "
    } else {
        " Conversation "
    };

    let chat = chat
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        )
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.session.is_pending();

    let (border_color, title) = if pending {
        (Color::DarkGray, " Waiting for reply... ")
    } else {
        (Color::Yellow, " Message ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let (cursor_row, cursor_col) = app.input.cursor_visual(inner_width);

    // Scroll so the cursor row stays visible once the box stops growing
    let offset = cursor_row.saturating_sub(inner_height.saturating_sub(1));

    let text = if app.input.text().is_empty() {
        Text::from(Span::styled(
            "Type your question here...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let rows: Vec<Line> = app
            .input
            .visual_lines(inner_width)
            .into_iter()
            .skip(offset as usize)
            .map(Line::from)
            .collect();
        Text::from(rows)
    };

    let text_style = if pending {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };

    frame.render_widget(Paragraph::new(text).style(text_style).block(input_block), area);

    if !pending {
        frame.set_cursor_position((
            area.x + 1 + cursor_col,
            area.y + 1 + cursor_row - offset,
        ));
    }
}
