use std::fmt;

use chrono::{DateTime, Local};
use colored::Colorize;

/// Colour tag of a progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
    Highlight,
    Accent,
    Plain,
}

/// A timestamped `[HH:MM:SS.mmm]` console line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressLine {
    message: String,
    tone: Tone,
    timestamp: DateTime<Local>,
    with_colors: bool,
}

impl ProgressLine {
    pub fn new(tone: Tone, message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
            tone,
            timestamp: Local::now(),
            with_colors: true,
        }
    }

    pub fn info(message: impl ToString) -> Self {
        Self::new(Tone::Info, message)
    }

    pub fn success(message: impl ToString) -> Self {
        Self::new(Tone::Success, message)
    }

    pub fn warning(message: impl ToString) -> Self {
        Self::new(Tone::Warning, message)
    }

    pub fn error(message: impl ToString) -> Self {
        Self::new(Tone::Error, message)
    }

    pub fn with_colors(mut self, with_colors: bool) -> Self {
        self.with_colors = with_colors;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn format_plain(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S%.3f"), self.message)
    }
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.format_plain();
        if !self.with_colors {
            return write!(f, "{line}");
        }

        let line = match self.tone {
            Tone::Info => line.bright_blue(),
            Tone::Success => line.bright_green(),
            Tone::Warning => line.bright_yellow(),
            Tone::Error => line.bright_red(),
            Tone::Highlight => line.bright_cyan(),
            Tone::Accent => line.bright_magenta(),
            Tone::Plain => line.normal(),
        };
        write!(f, "{line}")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 9, 5, 7).unwrap() + chrono::TimeDelta::milliseconds(42)
    }

    #[test]
    fn test_plain_line_has_millisecond_timestamp() {
        let fixture = ProgressLine::success("Request # 1 | SUCCESS | 1.20s")
            .at(timestamp())
            .with_colors(false);

        let actual = fixture.to_string();
        let expected = "[09:05:07.042] Request # 1 | SUCCESS | 1.20s";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_coloured_line_strips_to_plain() {
        colored::control::set_override(true);
        let fixture = ProgressLine::error("boom").at(timestamp());

        let coloured = fixture.to_string();
        let actual = String::from_utf8(strip_ansi_escapes::strip(&coloured)).unwrap();
        assert_eq!(actual, "[09:05:07.042] boom");
    }
}
