//! Message composer input
//!
//! Line-editing buffer driven by terminal key events. Enter submits,
//! Shift+Enter starts a new line.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    text: String,
    disabled: bool,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Disable submission, e.g. while the host has no session
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Whether the send action is currently available
    pub fn can_send(&self) -> bool {
        !self.disabled && !self.text.trim().is_empty()
    }

    /// Apply a key event. Returns the submitted text when the key was a
    /// plain Enter and there is something to send.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.text.push('\n');
                None
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.text.pop();
                None
            }
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                self.text.push(c);
                None
            }
            _ => None,
        }
    }

    /// Take the buffered text if it can be sent, leaving the buffer empty
    pub fn submit(&mut self) -> Option<String> {
        if !self.can_send() {
            return None;
        }
        Some(std::mem::take(&mut self.text))
    }
}
