//! Character-grid layout helpers for the 20×4 display.
//!
//! Values are right-aligned inside fixed-width fields.  Only the cells
//! the new text does not cover are blanked, so a refreshed reading never
//! flashes an empty field.

use core::fmt::Write;

use heapless::String;

use crate::app::ports::DisplayPort;

pub const COLUMNS: u8 = 20;
pub const ROWS: u8 = 4;

/// Shown in place of a value whose acquisition failed.
pub const ERROR_MARKER: &str = "ERROR";
/// Shown where no value exists (fan idle, missing calibration).
pub const NOT_AVAILABLE: &str = "N/A";

pub type Text = String<32>;

/// Round to `decimals` places with ties going away from zero, so 45.25
/// reads "45.3" rather than the round-half-even "45.2".
pub fn round_half_away(value: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(i32::from(decimals));
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Format with a fixed number of decimals.  Output that would not fit a
/// display row is truncated.
pub fn format_number(value: f64, decimals: u8) -> Text {
    let mut text = Text::new();
    write!(
        text,
        "{:.*}",
        usize::from(decimals),
        round_half_away(value, decimals)
    )
    .ok();
    text
}

pub fn print_at(display: &mut impl DisplayPort, col: u8, row: u8, text: &str) {
    display.set_cursor(col, row);
    display.print_str(text);
}

/// Print `text` so its last character lands on `right_col`, blanking the
/// rest of a `width`-cell field.
pub fn print_right_aligned(
    display: &mut impl DisplayPort,
    text: &str,
    width: u8,
    right_col: u8,
    row: u8,
) {
    let len = text.len().min(usize::from(COLUMNS)) as u8;
    let field_start = (right_col + 1).saturating_sub(width);
    let text_start = (right_col + 1).saturating_sub(len);
    let start = field_start.min(text_start);

    let mut line = Text::new();
    for _ in start..text_start {
        line.push(' ').ok();
    }
    line.push_str(text).ok();

    display.set_cursor(start, row);
    display.print_str(&line);
}

pub fn print_number_right_aligned(
    display: &mut impl DisplayPort,
    value: f64,
    decimals: u8,
    width: u8,
    right_col: u8,
    row: u8,
) {
    let text = format_number(value, decimals);
    print_right_aligned(display, &text, width, right_col, row);
}

/// Digits in the integer part, at least one.
pub fn integer_digits(value: f64) -> u8 {
    let mut n = value.abs().trunc();
    let mut digits = 1;
    while n >= 10.0 && digits < 20 {
        n /= 10.0;
        digits += 1;
    }
    digits
}
