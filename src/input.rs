// Draft editing, input auto-grow and the submit key

use crossterm::event::{KeyCode, KeyModifiers};

pub const MIN_VISIBLE_LINES: usize = 1;
pub const MAX_VISIBLE_LINES: usize = 3;

/// What a key press asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Submit,
    Edited,
    Ignored,
}

#[derive(Debug)]
pub struct InputController {
    draft: String,
    visible_lines: usize,
    /// Columns available to the text inside the input box.
    width: usize,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}

impl InputController {
    pub const fn new() -> Self {
        Self {
            draft: String::new(),
            visible_lines: MIN_VISIBLE_LINES,
            width: usize::MAX,
        }
    }

    pub fn current_draft(&self) -> &str {
        &self.draft
    }

    pub const fn visible_lines(&self) -> usize {
        self.visible_lines
    }

    /// Re-measure against a new input width (terminal resize).
    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(1);
        self.visible_lines = visible_lines_for(content_rows(&self.draft, self.width));
    }

    pub fn on_text_change(&mut self, new_text: impl Into<String>) {
        self.draft = new_text.into();
        self.visible_lines = visible_lines_for(content_rows(&self.draft, self.width));
    }

    /// Enter submits; Shift+Enter or Alt+Enter inserts a newline.
    pub fn on_key_press(&mut self, key: KeyCode, modifiers: KeyModifiers) -> KeyOutcome {
        let mut text = self.draft.clone();
        match key {
            KeyCode::Enter
                if !modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                return KeyOutcome::Submit;
            }
            KeyCode::Enter => text.push('\n'),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => text.push(c),
            KeyCode::Backspace => {
                if text.pop().is_none() {
                    return KeyOutcome::Ignored;
                }
            }
            _ => return KeyOutcome::Ignored,
        }
        self.on_text_change(text);
        KeyOutcome::Edited
    }

    /// Take the trimmed draft for sending, or `None` if there is nothing to send.
    ///
    /// The draft is only cleared when something is returned.
    pub fn on_submit(&mut self) -> Option<String> {
        let trimmed = self.draft.trim();
        if trimmed.is_empty() {
            return None;
        }
        let message = trimmed.to_string();
        self.draft.clear();
        self.visible_lines = MIN_VISIBLE_LINES;
        Some(message)
    }
}

/// Rows the text occupies when wrapped at `width` columns.
pub fn content_rows(text: &str, width: usize) -> usize {
    let width = width.max(1);
    let mut rows = 0;
    // `split` rather than `lines` so a trailing newline opens a fresh row.
    for line in text.split('\n') {
        rows += line.chars().count().div_ceil(width).max(1);
    }
    rows
}

pub fn visible_lines_for(rows: usize) -> usize {
    rows.clamp(MIN_VISIBLE_LINES, MAX_VISIBLE_LINES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_growth_is_clamped() {
        let mut input = InputController::new();
        input.set_width(10);

        input.on_text_change("short");
        assert_eq!(input.visible_lines(), 1);

        input.on_text_change("a\nb");
        assert_eq!(input.visible_lines(), 2);

        input.on_text_change("x".repeat(25));
        assert_eq!(input.visible_lines(), 3);

        input.on_text_change("1\n2\n3\n4\n5\n6");
        assert_eq!(input.visible_lines(), 3);
    }

    #[test]
    fn test_content_rows() {
        assert_eq!(content_rows("", 10), 1);
        assert_eq!(content_rows("0123456789", 10), 1);
        assert_eq!(content_rows("0123456789a", 10), 2);
        assert_eq!(content_rows("hi\n", 10), 2);
    }

    #[test]
    fn test_enter_submits_and_shift_enter_inserts_newline() {
        let mut input = InputController::new();
        input.on_text_change("hello");

        assert_eq!(
            input.on_key_press(KeyCode::Enter, KeyModifiers::NONE),
            KeyOutcome::Submit
        );
        assert_eq!(input.current_draft(), "hello");

        assert_eq!(
            input.on_key_press(KeyCode::Enter, KeyModifiers::SHIFT),
            KeyOutcome::Edited
        );
        assert_eq!(input.current_draft(), "hello\n");
        assert_eq!(input.visible_lines(), 2);

        input.on_key_press(KeyCode::Enter, KeyModifiers::ALT);
        assert_eq!(input.current_draft(), "hello\n\n");
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut input = InputController::new();
        input.on_key_press(KeyCode::Char('h'), KeyModifiers::NONE);
        input.on_key_press(KeyCode::Char('I'), KeyModifiers::SHIFT);
        assert_eq!(input.current_draft(), "hI");

        assert_eq!(
            input.on_key_press(KeyCode::Char('y'), KeyModifiers::CONTROL),
            KeyOutcome::Ignored
        );

        input.on_key_press(KeyCode::Backspace, KeyModifiers::NONE);
        input.on_key_press(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(
            input.on_key_press(KeyCode::Backspace, KeyModifiers::NONE),
            KeyOutcome::Ignored
        );
        assert_eq!(input.current_draft(), "");
    }

    #[test]
    fn test_submit_whitespace_is_noop() {
        let mut input = InputController::new();
        input.on_text_change("   \n\t ");
        assert_eq!(input.on_submit(), None);
        assert_eq!(input.current_draft(), "   \n\t ");
    }

    #[test]
    fn test_submit_trims_and_resets() {
        let mut input = InputController::new();
        input.set_width(4);
        input.on_text_change("  what is rust?\n");
        assert_eq!(input.visible_lines(), 3);

        assert_eq!(input.on_submit(), Some("what is rust?".to_string()));
        assert_eq!(input.current_draft(), "");
        assert_eq!(input.visible_lines(), 1);
    }
}
