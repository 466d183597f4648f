//! Terminal colors for rendered lines.

use colored::{Color, Colorize};

/// Applies ANSI colors when enabled, passes text through otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Event kind tag.
    pub fn kind(&self, kind: &str) -> String {
        self.paint(kind, Color::Cyan)
    }

    /// ` (Nms)` suffix.
    pub fn duration(&self, ms: u64) -> String {
        format!(" {}", self.paint(&format!("({}ms)", ms), Color::Magenta))
    }

    /// Optional duration suffix, empty when absent.
    pub fn maybe_duration(&self, ms: Option<u64>) -> String {
        ms.map(|ms| self.duration(ms)).unwrap_or_default()
    }

    /// Status code colored by class: 2xx success, 3xx redirect, 4xx client
    /// error, everything else (5xx, timeouts, aborts) server error.
    pub fn status(&self, status: Option<u16>, fallback: &str) -> String {
        match status {
            Some(code @ 200..=299) => self.paint(&code.to_string(), Color::Green),
            Some(code @ 300..=399) => self.paint(&code.to_string(), Color::Cyan),
            Some(code @ 400..=499) => self.paint(&code.to_string(), Color::Yellow),
            Some(code) => self.paint(&code.to_string(), Color::Red),
            None => self.paint(fallback, Color::Red),
        }
    }
}
