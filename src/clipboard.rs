//! Clipboard and clock seams used by the session controller.

use crate::error::{Error, Result};
use std::time::Instant;

/// Writes text to a clipboard.
pub trait Clipboard {
    /// Replaces the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Clipboard`] if the platform clipboard rejects the write.
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard backed by `arboard`.
///
/// The platform clipboard is opened on first write, so constructing one in a
/// headless session is harmless until something is actually copied.
#[derive(Default)]
pub struct ArboardClipboard {
    clipboard: Option<arboard::Clipboard>,
}

impl ArboardClipboard {
    /// Creates a clipboard handle without opening the system clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for ArboardClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArboardClipboard")
            .field("open", &self.clipboard.is_some())
            .finish()
    }
}

impl Clipboard for ArboardClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let clipboard = match self.clipboard {
            Some(ref mut clipboard) => clipboard,
            None => self
                .clipboard
                .insert(arboard::Clipboard::new().map_err(|e| Error::clipboard(e.to_string()))?),
        };

        clipboard
            .set_text(text)
            .map_err(|e| Error::clipboard(e.to_string()))
    }
}

/// Monotonic time source.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
