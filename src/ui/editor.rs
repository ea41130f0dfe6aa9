//! Numeric input editor for the bottom-right input field.
//!
//! The decimal point counts toward the field's character budget but not
//! toward its digits.  It may be entered once, only after at least one
//! integer digit.  Delete removes, in order: the last decimal digit, the
//! decimal point, the last integer digit.

use heapless::String;

/// Character budget and decimal places of one input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub max_chars: u8,
    pub max_decimals: u8,
}

impl FieldSpec {
    /// Humidity targets and calibration references: `99.9`.
    pub const HUMIDITY: Self = Self {
        max_chars: 4,
        max_decimals: 1,
    };

    /// Fan targets: `9800`.
    pub const FAN_SPEED: Self = Self {
        max_chars: 4,
        max_decimals: 0,
    };
}

const CAPACITY: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputEditor {
    text: String<CAPACITY>,
    integer_digits: u8,
    decimal_digits: u8,
    decimal_used: bool,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Characters entered, decimal point included.
    pub fn chars(&self) -> u8 {
        self.text.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn integer_digits(&self) -> u8 {
        self.integer_digits
    }

    pub fn decimal_digits(&self) -> u8 {
        self.decimal_digits
    }

    pub fn decimal_used(&self) -> bool {
        self.decimal_used
    }

    /// The field as typed, e.g. `"50."`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Numeric value of the entry; zero when empty.
    pub fn value(&self) -> f64 {
        let mut mantissa: u32 = 0;
        let mut scale: u32 = 1;
        let mut after_point = false;
        for b in self.text.bytes() {
            match b {
                b'.' => after_point = true,
                d => {
                    mantissa = mantissa * 10 + u32::from(d - b'0');
                    if after_point {
                        scale *= 10;
                    }
                }
            }
        }
        f64::from(mantissa) / f64::from(scale)
    }

    /// Append a digit.  Returns `false` when the field refused it.
    pub fn push_digit(&mut self, digit: u8, field: FieldSpec) -> bool {
        if digit > 9 || self.chars() + 1 > field.max_chars {
            return false;
        }
        if self.decimal_used && self.decimal_digits + 1 > field.max_decimals {
            return false;
        }
        if self.text.push(char::from(b'0' + digit)).is_err() {
            return false;
        }
        if self.decimal_used {
            self.decimal_digits += 1;
        } else {
            self.integer_digits += 1;
        }
        true
    }

    /// Insert the decimal point.  Returns `false` when the field refused it.
    pub fn push_decimal(&mut self, field: FieldSpec) -> bool {
        if field.max_decimals == 0
            || self.chars() >= field.max_chars
            || self.decimal_used
            || self.integer_digits == 0
        {
            return false;
        }
        if self.text.push('.').is_err() {
            return false;
        }
        self.decimal_used = true;
        true
    }

    /// Remove the last entered unit.  Returns `false` when already empty.
    pub fn delete(&mut self) -> bool {
        match self.text.pop() {
            None => false,
            Some('.') => {
                self.decimal_used = false;
                true
            }
            Some(_) => {
                if self.decimal_used {
                    self.decimal_digits -= 1;
                } else {
                    self.integer_digits -= 1;
                }
                true
            }
        }
    }
}
