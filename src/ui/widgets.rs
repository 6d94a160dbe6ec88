use std::time::Instant;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::markdown::{self, RenderSegment};
use crate::app::App;
use crate::models::{Turn, TurnRole};

const PLACEHOLDER: &str = "Message Enigma";
const INSTRUCTIONS: &str = "A s k   w h a t e v e r   y o u   w a n t";

pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let title = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            "Enigma",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ),
    ]));
    frame.render_widget(title, inner);

    let logo = Paragraph::new(Span::styled("◈ ", Style::default().fg(Color::Cyan)))
        .alignment(Alignment::Right);
    frame.render_widget(logo, inner);
}

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            "Enigma - Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Chat:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Enter         - Send message"),
        Line::from("  Shift/Alt+Enter - New line"),
        Line::from(""),
        Line::from(Span::styled("Code blocks:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+K/Ctrl+J - Select previous/next"),
        Line::from("  Ctrl+Y        - Copy selected (or latest)"),
        Line::from(""),
        Line::from(Span::styled("Navigation:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down       - Scroll history"),
        Line::from("  PgUp/PgDn     - Scroll history"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled("General:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+Q        - Quit"),
        Line::from("  Ctrl+C twice  - Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup_width = 50;
    let popup_height = 24;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width.min(area.width),
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel".to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if let Some(notice) = &app.notice {
        (notice.clone(), Style::default().fg(Color::Yellow))
    } else {
        (
            format!(
                "{} | Enter: Send | Ctrl+Y: Copy code | Ctrl+H: Help | Ctrl+Q: Quit",
                app.model
            ),
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}

/// The pulsing "Loading..." row shown while a request is outstanding.
pub fn render_loading(frame: &mut Frame, app: &App, area: Rect, now: Instant) {
    if !app.conversation.is_loading() {
        return;
    }
    let bright = (now.saturating_duration_since(app.started_at).as_millis() / 600) % 2 == 0;
    let style = if bright {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(Paragraph::new(Span::styled("  Loading...", style)), area);
}

fn role_header(turn: &Turn, app: &App) -> Line<'static> {
    let (label, color) = match turn.role() {
        TurnRole::Question => ("You", app.theme.question),
        TurnRole::Answer => ("Enigma", app.theme.answer),
        TurnRole::Error => ("Error", Color::Red),
    };
    Line::from(Span::styled(
        format!("▌ {label}"),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Build every transcript line. Code blocks are numbered in display order,
/// which is the numbering the copy keys use.
pub fn transcript_lines(app: &App, now: Instant) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut block_index = 0;

    for turn in app.conversation.turns() {
        lines.push(Line::from(""));
        lines.push(role_header(turn, app));

        if turn.role() == TurnRole::Error {
            for error_line in markdown::sanitize(turn.text()).lines() {
                lines.push(Line::from(Span::styled(
                    error_line.to_string(),
                    Style::default().fg(Color::Red),
                )));
            }
            continue;
        }

        for segment in markdown::render(turn.text()) {
            match segment {
                RenderSegment::Text(text) => {
                    lines.extend(markdown::render_markdown_to_lines(&text));
                }
                RenderSegment::Code { language, code } => {
                    lines.extend(markdown::render_code_block(
                        language.as_deref(),
                        &code,
                        app.copy_indicator.is_copied(block_index, now),
                        app.selected_block == Some(block_index),
                    ));
                    block_index += 1;
                }
            }
        }
    }

    lines
}

pub fn render_chat_history(frame: &mut Frame, app: &mut App, area: Rect, now: Instant) {
    if app.show_instructions() {
        let height = 1;
        let y_pos = area.y + area.height / 3;
        let instructions_area = Rect {
            x: area.x,
            y: y_pos.min(area.y + area.height.saturating_sub(height)),
            width: area.width,
            height: height.min(area.height),
        };
        let instructions = Paragraph::new(Span::styled(
            INSTRUCTIONS,
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(instructions, instructions_area);
        return;
    }

    let lines = transcript_lines(app, now);

    // Visual height after wrapping decides how far we can scroll
    let available_width = usize::from(area.width).max(1);
    let total_visual_lines: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum();

    let visible_height = usize::from(area.height);
    let max_scroll = total_visual_lines.saturating_sub(visible_height);
    let actual_scroll = app.scroll_offset.min(max_scroll);

    if app.scroll_offset != actual_scroll {
        app.scroll_offset = actual_scroll;
    }

    let chat_history = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(chat_history, area);
}

/// Split the draft into display rows exactly as `input::content_rows` counts them.
fn draft_rows(draft: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in draft.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
        }
        for chunk in chars.chunks(width) {
            rows.push(chunk.iter().collect());
        }
    }
    rows
}

pub fn render_input_field(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let draft = app.input.current_draft();
    if draft.is_empty() {
        let placeholder = Paragraph::new(PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        frame.set_cursor_position((inner.x, inner.y));
        return;
    }

    let rows = draft_rows(draft, usize::from(inner.width));
    // Keep the row being typed in view once the box stops growing
    let first_visible = rows.len().saturating_sub(app.input.visible_lines());
    let cursor_row = rows.len() - 1 - first_visible;
    let cursor_col = rows.last().map_or(0, |row| row.chars().count());

    let lines: Vec<Line> = rows
        .into_iter()
        .skip(first_visible)
        .map(Line::from)
        .collect();
    let input = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(block);
    frame.render_widget(input, area);

    let cursor_x = u16::try_from(cursor_col)
        .unwrap_or(u16::MAX)
        .min(inner.width.saturating_sub(1));
    let cursor_y = u16::try_from(cursor_row).unwrap_or(0);
    frame.set_cursor_position((inner.x + cursor_x, inner.y + cursor_y));
}
