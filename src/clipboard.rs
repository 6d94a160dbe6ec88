// System clipboard access and the transient "copied" indicator

use std::time::{Duration, Instant};

use thiserror::Error;

/// How long a code block shows "Copied" after it was copied.
pub const COPIED_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(String);

impl From<arboard::Error> for ClipboardError {
    fn from(err: arboard::Error) -> Self {
        Self(err.to_string())
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
        })
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner.set_text(text.to_string())?;
        Ok(())
    }
}

/// Used when no system clipboard could be opened (e.g. headless sessions).
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn set_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError("no clipboard available".to_string()))
    }
}

/// Which code block, if any, currently shows "Copied".
///
/// Only one block at a time: copying another block moves the indicator.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyIndicator {
    active: Option<(usize, Instant)>,
}

impl CopyIndicator {
    pub fn mark(&mut self, block: usize, now: Instant) {
        self.active = Some((block, now + COPIED_WINDOW));
    }

    pub fn current(&self, now: Instant) -> Option<usize> {
        self.active
            .filter(|&(_, until)| now < until)
            .map(|(block, _)| block)
    }

    pub fn is_copied(&self, block: usize, now: Instant) -> bool {
        self.current(now) == Some(block)
    }

    /// Drop an expired mark so the UI stops redrawing it.
    pub fn tick(&mut self, now: Instant) {
        if self.current(now).is_none() {
            self.active = None;
        }
    }
}
