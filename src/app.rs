use std::time::{Duration, Instant};

use rand::Rng;
use ratatui::style::Color;
use tracing::{info, warn};

use crate::clipboard::{Clipboard, CopyIndicator};
use crate::conversation::{Conversation, TurnTicket};
use crate::events::AppEvent;
use crate::input::InputController;
use crate::models::{AppConfig, ThemeConfig};
use crate::ui::markdown::{self, RenderSegment};
use crate::ui::particles::ParticleField;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub question: Color,
    pub answer: Color,
    pub border: Color,
    pub particle: Color,
}

fn parse_color(name: &str, fallback: Color) -> Color {
    name.parse().unwrap_or(fallback)
}

impl From<&ThemeConfig> for Theme {
    fn from(config: &ThemeConfig) -> Self {
        Self {
            question: parse_color(&config.question_color, Color::Blue),
            answer: parse_color(&config.answer_color, Color::Gray),
            border: parse_color(&config.border_color, Color::DarkGray),
            particle: parse_color(&config.particle_color, Color::White),
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub exit_pending: bool,
    pub show_help: bool,
    pub conversation: Conversation,
    pub input: InputController,
    pub copy_indicator: CopyIndicator,
    /// Code block addressed by the copy keys, by transcript position.
    pub selected_block: Option<usize>,
    pub scroll_offset: usize,
    pub particles: ParticleField,
    pub theme: Theme,
    pub model: String,
    pub started_at: Instant,
    /// Last status message worth showing in the key bar (e.g. clipboard errors).
    pub notice: Option<String>,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            should_quit: false,
            exit_pending: false,
            show_help: false,
            conversation: Conversation::new(),
            input: InputController::new(),
            copy_indicator: CopyIndicator::default(),
            selected_block: None,
            scroll_offset: 0,
            particles: ParticleField::default(),
            theme: Theme::from(&config.theme),
            model: config.model.clone(),
            started_at: Instant::now(),
            notice: None,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// "Ask whatever you want" until the first question goes out.
    pub fn show_instructions(&self) -> bool {
        self.conversation.is_empty()
    }

    /// Queue the draft as a question.
    ///
    /// Refused while a request is in flight, leaving the draft untouched.
    pub fn submit(&mut self) -> Option<(TurnTicket, String)> {
        if self.conversation.is_loading() {
            return None;
        }
        let question = self.input.on_submit()?;
        let ticket = self.conversation.start_turn(question.clone())?;

        self.notice = None;
        self.scroll_to_bottom();
        Some((ticket, question))
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Answer { ticket, text } => {
                if self.conversation.complete_turn(ticket, text) {
                    info!(seq = ticket.seq(), "answer received");
                }
            }
            AppEvent::Failed { ticket, error } => {
                self.conversation.fail_turn(ticket, &error);
            }
        }
        self.scroll_to_bottom();
    }

    /// Every fenced block in the transcript, in display order.
    pub fn code_blocks(&self) -> Vec<String> {
        self.conversation
            .turns()
            .iter()
            .flat_map(|turn| markdown::render(turn.text()))
            .filter_map(|segment| match segment {
                RenderSegment::Code { code, .. } => Some(code),
                RenderSegment::Text(_) => None,
            })
            .collect()
    }

    /// The explicitly selected block, else the most recent one.
    pub fn target_block(&self, block_count: usize) -> Option<usize> {
        match self.selected_block {
            Some(index) if index < block_count => Some(index),
            _ => block_count.checked_sub(1),
        }
    }

    pub fn select_previous_block(&mut self) {
        let count = self.code_blocks().len();
        self.selected_block = self
            .target_block(count)
            .map(|current| current.saturating_sub(usize::from(self.selected_block.is_some())));
    }

    pub fn select_next_block(&mut self) {
        let count = self.code_blocks().len();
        self.selected_block = self
            .target_block(count)
            .map(|current| (current + 1).min(count - 1));
    }

    /// Copy the targeted code block and show "Copied" on it.
    pub fn copy_selected_block(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> bool {
        let blocks = self.code_blocks();
        let Some(index) = self.target_block(blocks.len()) else {
            return false;
        };

        match clipboard.set_text(&blocks[index]) {
            Ok(()) => {
                info!(block = index, "code block copied");
                self.copy_indicator.mark(index, now);
                self.notice = None;
                true
            }
            Err(e) => {
                warn!(block = index, error = %e, "copy failed");
                self.notice = Some(e.to_string());
                false
            }
        }
    }

    /// Per-frame housekeeping: expire the copy mark, move the particles.
    pub fn tick(&mut self, now: Instant, dt: Duration) {
        self.copy_indicator.tick(now);
        self.particles.step(dt);
    }

    pub fn resize_background(&mut self, width: u16, height: u16, rng: &mut impl Rng) {
        // Braille cells are two dots wide and four tall; keep the field square-ish.
        self.particles
            .resize(f64::from(width), f64::from(height) * 2.0, rng);
    }

    pub const fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // Clamped to the real maximum when the transcript is drawn
        self.scroll_offset = usize::MAX;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}
