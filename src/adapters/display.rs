//! In-memory 20×4 character display.
//!
//! Implements [`DisplayPort`] over a cell grid.  Used by the simulator to
//! dump the screen to the log and by tests to assert on exact layout.

use crate::app::ports::DisplayPort;
use crate::ui::layout::{COLUMNS, ROWS};

const COLS: usize = COLUMNS as usize;
const LINES: usize = ROWS as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharDisplay {
    cells: [[char; COLS]; LINES],
    cursor: (u8, u8),
    blink: bool,
}

impl CharDisplay {
    pub fn new() -> Self {
        Self {
            cells: [[' '; COLS]; LINES],
            cursor: (0, 0),
            blink: false,
        }
    }

    pub fn row_text(&self, row: u8) -> String {
        self.cells
            .get(usize::from(row))
            .map(|r| r.iter().collect())
            .unwrap_or_default()
    }

    /// All rows joined with newlines.
    pub fn text(&self) -> String {
        (0..ROWS).map(|r| self.row_text(r)).collect::<Vec<_>>().join("\n")
    }

    /// Whether `needle` appears on any row.
    pub fn contains(&self, needle: &str) -> bool {
        (0..ROWS).any(|r| self.row_text(r).contains(needle))
    }

    pub fn cursor(&self) -> (u8, u8) {
        self.cursor
    }

    pub fn is_blinking(&self) -> bool {
        self.blink
    }
}

impl Default for CharDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for CharDisplay {
    fn clear(&mut self) {
        self.cells = [[' '; COLS]; LINES];
        self.cursor = (0, 0);
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        self.cursor = (col.min(COLUMNS - 1), row.min(ROWS - 1));
    }

    fn print_str(&mut self, text: &str) {
        let (mut col, row) = self.cursor;
        for c in text.chars() {
            // Characters past the last column are dropped.
            if col >= COLUMNS {
                break;
            }
            self.cells[usize::from(row)][usize::from(col)] = c;
            col += 1;
        }
        self.cursor = (col.min(COLUMNS - 1), row);
    }

    fn set_blink(&mut self, on: bool) {
        self.blink = on;
    }
}
