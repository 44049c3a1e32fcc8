//! Output formatting for dynbson
//!
//! This module renders command results for the terminal:
//! - Decoded values in their tagged JSON form
//! - BSON documents as relaxed extended JSON
//! - Encoded bytes as hex dumps
//! - One-line value summaries for status messages
//!
//! JSON has no NaN or infinity; such numbers are written as `null`, so a
//! decoded value holding them does not encode back to itself.

mod json;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::{DisplayConfig, OutputFormat};
use crate::error::Result;
use crate::value::{DateArray, DynamicValue, NumericData};

pub use json::JsonFormatter;

/// Main formatter for command output
pub struct Formatter {
    /// Output format type
    format_type: OutputFormat,

    /// JSON renderer
    json: JsonFormatter,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `format_type` - Output format type
    /// * `use_colors` - Enable colored output
    /// * `indent` - Indentation width for pretty output
    ///
    /// # Returns
    /// * `Self` - New formatter instance
    pub fn new(format_type: OutputFormat, use_colors: bool, indent: usize) -> Self {
        Self {
            format_type,
            json: JsonFormatter::new(format_type.is_pretty(), use_colors, indent),
        }
    }

    /// Create a formatter from display configuration
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(config.format, config.color_output, config.indent)
    }

    /// Output format in use
    pub fn format_type(&self) -> OutputFormat {
        self.format_type
    }

    /// Format a decoded value
    pub fn format_value(&self, value: &DynamicValue) -> Result<String> {
        self.json.format_value(value)
    }

    /// Format a JSON value
    pub fn format_json(&self, value: &serde_json::Value) -> Result<String> {
        self.json.format_json(value)
    }

    /// Format encoded bytes as lowercase hex, 32 bytes per line
    pub fn format_hex(bytes: &[u8]) -> String {
        bytes
            .chunks(32)
            .map(hex::encode)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One-line summary such as `double 3x4x5`
    ///
    /// Dates also show their range in RFC 3339.
    pub fn summarize(value: &DynamicValue) -> String {
        match value {
            DynamicValue::Record(record) => format!(
                "{} {} with fields [{}]",
                value.class_name(),
                record.dims,
                record.fields.join(", ")
            ),
            DynamicValue::Date(dates) => match date_range(dates) {
                Some(range) => format!("{} {} {}", value.class_name(), dates.dims, range),
                None => format!("{} {}", value.class_name(), dates.dims),
            },
            _ => match value.dims() {
                Some(dims) => format!("{} {}", value.class_name(), dims),
                None => value.class_name().to_string(),
            },
        }
    }

    /// Check for NaN or infinite numbers anywhere in `value`
    ///
    /// These print as `null` in JSON output.
    pub fn has_non_finite(value: &DynamicValue) -> bool {
        match value {
            DynamicValue::Numeric(array) => match &array.data {
                NumericData::Float32(values) => values.iter().any(|v| !v.is_finite()),
                NumericData::Float64(values) => values.iter().any(|v| !v.is_finite()),
                _ => false,
            },
            DynamicValue::Date(array) => array.data.iter().any(|v| !v.is_finite()),
            DynamicValue::Cell(array) => array.elements.iter().any(Self::has_non_finite),
            DynamicValue::Record(array) => {
                array.records.iter().flatten().any(Self::has_non_finite)
            }
            DynamicValue::Logical(_) | DynamicValue::Text(_) | DynamicValue::Opaque(_) => false,
        }
    }
}

/// `at T` for one date, `from T1 to T2` for several; `None` when empty or
/// when any date is not representable
fn date_range(dates: &DateArray) -> Option<String> {
    let datetimes = dates.to_datetimes()?;
    let render = |dt: &DateTime<Utc>| dt.to_rfc3339_opts(SecondsFormat::Millis, true);
    match datetimes.as_slice() {
        [] => None,
        [only] => Some(format!("at {}", render(only))),
        [..] => {
            let first = datetimes.iter().min()?;
            let last = datetimes.iter().max()?;
            Some(format!("from {} to {}", render(first), render(last)))
        }
    }
}
