//! Formatted output helpers for CLI commands.
//!
//! Provides consistent headings, colored risk indicators, and
//! human-readable percentages. Colors are only emitted when stdout is a
//! terminal, so piped output stays plain.

use std::io::IsTerminal;

use stackweave_risk::RiskLevel;

/// ANSI escapes used by the human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Bold text.
    pub bold: &'static str,
    /// Dimmed text.
    pub dim: &'static str,
    /// Green foreground.
    pub green: &'static str,
    /// Yellow foreground.
    pub yellow: &'static str,
    /// Red foreground.
    pub red: &'static str,
    /// Resets all attributes.
    pub reset: &'static str,
}

impl Palette {
    /// Standard ANSI escapes.
    pub const ANSI: Self = Self {
        bold: "\x1b[1m",
        dim: "\x1b[2m",
        green: "\x1b[32m",
        yellow: "\x1b[33m",
        red: "\x1b[31m",
        reset: "\x1b[0m",
    };

    /// No escapes at all.
    pub const PLAIN: Self = Self {
        bold: "",
        dim: "",
        green: "",
        yellow: "",
        red: "",
        reset: "",
    };

    /// Picks the palette for the current stdout.
    #[must_use]
    pub fn detect() -> Self {
        Self::for_terminal(std::io::stdout().is_terminal())
    }

    /// ANSI when writing to a terminal, plain otherwise.
    #[must_use]
    pub const fn for_terminal(is_terminal: bool) -> Self {
        if is_terminal { Self::ANSI } else { Self::PLAIN }
    }

    /// Returns the color escape for a risk tier.
    #[must_use]
    pub const fn risk(&self, level: RiskLevel) -> &'static str {
        match level {
            RiskLevel::Low => self.green,
            RiskLevel::Medium => self.yellow,
            RiskLevel::High | RiskLevel::Critical => self.red,
        }
    }
}

/// Prints a title underlined to its width.
pub fn heading(title: &str) {
    println!("{title}");
    println!("{}", "\u{2550}".repeat(title.chars().count()));
    println!();
}

/// Formats a percentage with one decimal (e.g., "42.5%").
#[must_use]
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_percentage_rounds_to_one_decimal() {
        assert_eq!(format_percentage(42.46), "42.5%");
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_percentage(100.0), "100.0%");
    }

    #[test]
    fn risk_colors_escalate() {
        let palette = Palette::ANSI;
        assert_eq!(palette.risk(RiskLevel::Low), palette.green);
        assert_eq!(palette.risk(RiskLevel::Critical), palette.red);
    }

    #[test]
    fn non_terminal_output_has_no_escapes() {
        let palette = Palette::for_terminal(false);
        assert_eq!(palette, Palette::PLAIN);
        assert_eq!(palette.risk(RiskLevel::High), "");
        assert!(Palette::for_terminal(true).bold.starts_with('\x1b'));
    }
}
