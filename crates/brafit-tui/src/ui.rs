use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use brafit_core::{ChatSnapshot, TranscriptEntry};
use crate::app::{App, ServiceStatus};

pub const PLACEHOLDER: &str = "Enter your measurements and fit issues...";
const SUBMIT_LABEL: &str = "Get Recommendation";
const LOADING_LABEL: &str = "Loading...";
const SISTER_SIZE_SEPARATOR: &str = ", ";
const MAX_ERROR_LINES: usize = 4;

/// Wrap text to fit within a given width, returning multiple lines
/// Uses word boundaries for wrapping; a word wider than the line is split
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(width) {
            let piece_len = piece.len();

            if current_len == 0 {
                current_line = piece.iter().collect();
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= width {
                current_line.push(' ');
                current_line.extend(piece);
                current_len += 1 + piece_len;
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = piece.iter().collect();
                current_len = piece_len;
            }
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Push `label` + `body` wrapped to `width`, keeping the label styled on the
/// first line. Embedded newlines in `body` start new lines.
fn push_wrapped(
    lines: &mut Vec<Line<'static>>,
    label: Option<(&str, Style)>,
    body: &str,
    body_style: Style,
    width: usize,
) {
    let mut first = true;
    for raw_line in body.lines() {
        let prefix = match (first, label) {
            (true, Some((label, _))) => format!("{} ", label),
            _ => String::new(),
        };

        for wrapped in wrap_text_to_width(&format!("{}{}", prefix, raw_line), width) {
            match (first, label) {
                (true, Some((label, label_style))) if wrapped.starts_with(label) => {
                    let rest = wrapped[label.len()..].to_string();
                    lines.push(Line::from(vec![
                        Span::styled(label.to_string(), label_style),
                        Span::styled(rest, body_style),
                    ]));
                }
                _ => lines.push(Line::from(Span::styled(wrapped, body_style))),
            }
            first = false;
        }
    }
}

fn push_entry(lines: &mut Vec<Line<'static>>, entry: &TranscriptEntry, width: usize) {
    if entry.is_user {
        lines.push(Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        push_wrapped(lines, None, &entry.text, Style::default(), width);
        lines.push(Line::default());
        return;
    }

    let label_style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD);

    lines.push(Line::from(Span::styled(
        "Fitter:",
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
    )));
    push_wrapped(
        lines,
        None,
        &entry.text,
        Style::default().add_modifier(Modifier::BOLD),
        width,
    );

    if let Some(reasoning) = entry.reasoning.as_deref().filter(|s| !s.is_empty()) {
        push_wrapped(lines, Some(("Why:", label_style)), reasoning, Style::default(), width);
    }
    if let Some(tips) = entry.fit_tips.as_deref().filter(|s| !s.is_empty()) {
        push_wrapped(lines, Some(("Fit tips:", label_style)), tips, Style::default(), width);
    }
    if let Some(sizes) = entry.sister_sizes.as_ref().filter(|s| !s.is_empty()) {
        push_wrapped(
            lines,
            Some(("Sister sizes:", label_style)),
            &sizes.join(SISTER_SIZE_SEPARATOR),
            Style::default().fg(Color::Yellow),
            width,
        );
    }
    lines.push(Line::default());
}

/// Lines for the transcript region. Depends only on its arguments.
pub fn transcript_lines(chat: &ChatSnapshot, animation_frame: u8, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    if chat.transcript.is_empty() && !chat.is_loading {
        push_wrapped(
            &mut lines,
            None,
            "Tell me your band and bust measurements, plus anything that doesn't fit right.",
            Style::default().fg(Color::DarkGray),
            width,
        );
        return lines;
    }

    for entry in &chat.transcript {
        push_entry(&mut lines, entry, width);
    }

    if chat.is_loading {
        lines.push(Line::from(Span::styled(
            "Fitter:",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize % 3) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Wrapped here once so the region is exactly as tall as what it draws
    let error_lines: Vec<String> = app
        .chat
        .error_message()
        .map(|message| {
            let inner_width = area.width.saturating_sub(2) as usize;
            let mut lines = wrap_text_to_width(&message, inner_width);
            lines.truncate(MAX_ERROR_LINES);
            lines
        })
        .unwrap_or_default();
    let error_height = if error_lines.is_empty() {
        0
    } else {
        error_lines.len() as u16 + 2
    };

    let [header_area, chat_area, error_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(error_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    if !error_lines.is_empty() {
        render_error(error_lines, frame, error_area);
    }
    render_input(app, frame, input_area);
    render_footer(frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status_color = match app.service {
        ServiceStatus::Checking => Color::Gray,
        ServiceStatus::Healthy => Color::Green,
        ServiceStatus::Degraded(_) => Color::Yellow,
        ServiceStatus::Unreachable => Color::Red,
    };

    let title = Line::from(vec![
        Span::styled(" brafit ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(app.base_url.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(format!("[{}]", app.service.label()), Style::default().fg(status_color)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing
    app.chat_area = Some(area);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2);

    let lines = transcript_lines(&app.chat, app.animation_frame, inner_width);
    let total_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_scroll = total_lines.saturating_sub(inner_height);

    if app.follow_tail || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.follow_tail = true;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Fitting Room ");

    let chat = Paragraph::new(lines)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_error(lines: Vec<String>, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ");

    let lines: Vec<Line> = lines.into_iter().map(Line::from).collect();
    let error = Paragraph::new(lines)
        .style(Style::default().fg(Color::Red))
        .block(block);

    frame.render_widget(error, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let button_width = SUBMIT_LABEL.chars().count() as u16 + 4;
    let [input_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(button_width),
    ])
    .areas(area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Measurements ");

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        let visible_text: String = app.input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), input_area);

    // No room inside the borders: leave the cursor hidden
    if inner_width > 0 {
        let cursor_x = (cursor_pos - scroll_offset).min(inner_width - 1) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }

    let (label, button_style, border_style) = if app.can_submit() {
        (
            SUBMIT_LABEL,
            Style::default().fg(Color::Black).bg(Color::Magenta).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Magenta),
        )
    } else {
        let label = if app.chat.is_loading { LOADING_LABEL } else { SUBMIT_LABEL };
        (
            label,
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };

    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(button_style)
        .block(Block::default().borders(Borders::ALL).border_style(border_style));

    frame.render_widget(button, button_area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = [
        ("Enter", "send"),
        ("PgUp/PgDn", "scroll"),
        ("Ctrl+End", "latest"),
        ("Esc", "quit"),
    ];

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
