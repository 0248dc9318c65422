//! Tagged cell values with explicit equality rules

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single scalar value read from a tabular source.
///
/// Equality is defined per tag pair and never coerces between text and
/// numbers: `Text("4")` and `Number(4.0)` are different keys. A `Date` equals
/// a `DateTime` only when the latter falls exactly on midnight of that date,
/// which is how spreadsheets tend to store plain dates.
#[derive(Debug, Clone, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Date portion of a date-like cell
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whole numbers small enough to print without a fractional part
    fn as_whole_number(n: f64) -> Option<i64> {
        if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
            Some(n as i64)
        } else {
            None
        }
    }
}

/// -0.0 and 0.0 compare equal, and every NaN is treated as one key value.
fn canonical_bits(n: f64) -> u64 {
    if n == 0.0 {
        0.0f64.to_bits()
    } else if n.is_nan() {
        f64::NAN.to_bits()
    } else {
        n.to_bits()
    }
}

fn is_midnight(dt: &NaiveDateTime) -> bool {
    dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Empty, Cell::Empty) => true,
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Number(a), Cell::Number(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Cell::Date(a), Cell::Date(b)) => a == b,
            (Cell::DateTime(a), Cell::DateTime(b)) => a == b,
            (Cell::Date(d), Cell::DateTime(dt)) | (Cell::DateTime(dt), Cell::Date(d)) => {
                is_midnight(dt) && dt.date() == *d
            }
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Cell::Empty => 0u8.hash(state),
            Cell::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
            Cell::Number(n) => {
                2u8.hash(state);
                canonical_bits(*n).hash(state);
            }
            // Dates and datetimes share a tag so midnight datetimes collide
            // with their date, matching `eq`.
            Cell::Date(d) => {
                3u8.hash(state);
                d.hash(state);
                0u32.hash(state);
                0u32.hash(state);
            }
            Cell::DateTime(dt) => {
                3u8.hash(state);
                dt.date().hash(state);
                dt.num_seconds_from_midnight().hash(state);
                dt.nanosecond().hash(state);
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => match Cell::as_whole_number(*n) {
                Some(i) => write!(f, "{}", i),
                None => write!(f, "{}", n),
            },
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) => match Cell::as_whole_number(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Cell::Date(_) | Cell::DateTime(_) => serializer.collect_str(self),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}
