pub mod markdown;
pub mod particles;
pub mod widgets;

use std::time::Instant;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App, now: Instant) {
    // Text columns inside the input border
    app.input
        .set_width(usize::from(frame.area().width.saturating_sub(2)));

    // visible_lines is already clamped to 1..=3; +2 for the border
    #[allow(clippy::cast_possible_truncation)]
    let input_height = (app.input.visible_lines() + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),            // Header
            Constraint::Min(0),               // Transcript (particles behind it)
            Constraint::Length(1),            // Loading line
            Constraint::Length(input_height), // Input field (grows to 3 lines)
            Constraint::Length(1),            // Bottom keymap bar
        ])
        .split(frame.area());

    widgets::render_header(frame, app, chunks[0]);

    app.resize_background(chunks[1].width, chunks[1].height, &mut rand::thread_rng());
    particles::render_particles(frame, &app.particles, app.theme.particle, chunks[1]);
    widgets::render_chat_history(frame, app, chunks[1], now);

    widgets::render_loading(frame, app, chunks[2], now);
    widgets::render_input_field(frame, app, chunks[3]);
    widgets::render_bottom_bar(frame, app, chunks[4]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}
