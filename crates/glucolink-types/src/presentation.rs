//! Terminal presentation of measurements.
//!
//! All lookups are static tables. Unknown trend or color codes degrade to a
//! neutral glyph or an uncolored style; they never produce an error.

use owo_colors::{AnsiColors, OwoColorize, Style};

use crate::types::{Measurement, StatusColor, TrendArrow};

/// Glyphs for trends 1..=5, from falling quickly to rising quickly.
const TREND_SYMBOLS: [&str; 5] = ["⇊", "↘", "→", "↗", "⇈"];

/// Glyph shown when no trend is available.
pub const UNKNOWN_TREND_SYMBOL: &str = "?";

/// Foreground colors for Normal, Warning and Critical.
const STATUS_COLORS: [AnsiColors; 3] = [AnsiColors::Green, AnsiColors::Yellow, AnsiColors::Red];

/// Reset sequence that brackets readings with an unknown status.
pub const ANSI_RESET: &str = "\x1b[0m";

/// Indicator printed in front of every rendered value.
pub const READING_INDICATOR: &str = "🩸";

impl TrendArrow {
    /// Directional glyph for this trend.
    pub fn symbol(self) -> &'static str {
        TREND_SYMBOLS[usize::from(self.code() - 1)]
    }
}

/// Glyph for a raw vendor trend code.
///
/// ```
/// use glucolink_types::presentation::{trend_symbol_for_code, UNKNOWN_TREND_SYMBOL};
///
/// assert_eq!(trend_symbol_for_code(3), "→");
/// assert_eq!(trend_symbol_for_code(0), UNKNOWN_TREND_SYMBOL);
/// ```
pub fn trend_symbol_for_code(code: i64) -> &'static str {
    TrendArrow::from_code(code).map_or(UNKNOWN_TREND_SYMBOL, TrendArrow::symbol)
}

impl StatusColor {
    /// Terminal color for this status, `None` for `Unknown`.
    pub fn ansi_color(self) -> Option<AnsiColors> {
        match self {
            StatusColor::Normal => Some(STATUS_COLORS[0]),
            StatusColor::Warning => Some(STATUS_COLORS[1]),
            StatusColor::Critical => Some(STATUS_COLORS[2]),
            StatusColor::Unknown => None,
        }
    }

    /// Style for text in this status. Plain for `Unknown`.
    pub fn style(self) -> Style {
        match self.ansi_color() {
            Some(color) => Style::new().color(color),
            None => Style::new(),
        }
    }
}

/// Terminal color for a raw `MeasurementColor` code.
///
/// ```
/// use glucolink_types::presentation::status_color_code_for;
/// use owo_colors::AnsiColors;
///
/// assert_eq!(status_color_code_for(1), Some(AnsiColors::Green));
/// assert_eq!(status_color_code_for(7), None);
/// ```
pub fn status_color_code_for(code: i64) -> Option<AnsiColors> {
    StatusColor::from_code(code).ansi_color()
}

impl Measurement {
    /// Trend glyph, or [`UNKNOWN_TREND_SYMBOL`] when the trend is absent.
    pub fn trend_symbol(&self) -> &'static str {
        self.trend.map_or(UNKNOWN_TREND_SYMBOL, TrendArrow::symbol)
    }

    /// Terminal color for the reading's status.
    pub fn status_color_code(&self) -> Option<AnsiColors> {
        self.status_color.ansi_color()
    }

    /// One-line colored rendering, e.g. `🩸 6.4 mmol/L →` in green.
    ///
    /// The value is bold. A reading with an unknown status is bracketed by
    /// [`ANSI_RESET`] instead of a color.
    pub fn render(&self) -> String {
        let style = self.status_color.style();
        let value = format!("{:.1}", self.value_mmol);
        let tail = format!("mmol/L {}", self.trend_symbol());

        let line = format!(
            "{} {} {}",
            READING_INDICATOR.style(style),
            value.style(style.bold()),
            tail.style(style),
        );

        match self.status_color.ansi_color() {
            Some(_) => line,
            None => format!("{ANSI_RESET}{line}{ANSI_RESET}"),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Codes outside 1..=5 always map to the unknown glyph.
        #[test]
        fn trend_out_of_range_is_unknown(code in any::<i64>().prop_filter("outside 1..=5", |c| !(1..=5).contains(c))) {
            prop_assert_eq!(trend_symbol_for_code(code), UNKNOWN_TREND_SYMBOL);
        }

        /// Codes outside 1..=3 never map to a color.
        #[test]
        fn status_out_of_range_is_uncolored(code in any::<i64>().prop_filter("outside 1..=3", |c| !(1..=3).contains(c))) {
            prop_assert_eq!(status_color_code_for(code), None);
        }
    }
}
