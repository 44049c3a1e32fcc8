//! JSON formatting for values and documents
//!
//! This module provides:
//! - Pretty-printed and compact JSON output with configurable indentation
//! - Optional color highlighting for pretty output

use colored_json::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::value::DynamicValue;

/// JSON formatter with pretty printing support
pub struct JsonFormatter {
    /// Enable pretty printing
    pretty: bool,

    /// Indentation width
    indent: usize,

    /// Enable colored output
    use_colors: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    ///
    /// # Arguments
    /// * `pretty` - Enable pretty printing
    /// * `use_colors` - Enable colored output
    /// * `indent` - Indentation width for pretty output
    ///
    /// # Returns
    /// * `Self` - New formatter
    pub fn new(pretty: bool, use_colors: bool, indent: usize) -> Self {
        Self {
            pretty,
            indent,
            use_colors,
        }
    }

    /// Format a dynamic value in its tagged JSON form
    pub fn format_value(&self, value: &DynamicValue) -> Result<String> {
        self.render(value)
    }

    /// Format an arbitrary JSON value
    pub fn format_json(&self, value: &serde_json::Value) -> Result<String> {
        self.render(value)
    }

    fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        if !self.pretty {
            // Compact JSON stays uncolored for piping
            return Ok(serde_json::to_string(value)?);
        }

        let json_str = self.to_pretty_string(value)?;
        if self.use_colors {
            Ok(json_str.to_colored_json_auto().unwrap_or(json_str))
        } else {
            Ok(json_str)
        }
    }

    /// Serialize `value` with the configured indentation
    fn to_pretty_string<T: Serialize>(&self, value: &T) -> Result<String> {
        let mut buf = Vec::new();
        let indent = " ".repeat(self.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, Bson};
    use bson::oid::ObjectId;

    #[test]
    fn test_compact_value() {
        let formatter = JsonFormatter::new(false, true, 2);
        let result = formatter.format_value(&DynamicValue::scalar(1.5)).unwrap();
        assert_eq!(
            result,
            r#"{"class":"numeric","dims":[1,1],"data":{"kind":"float64","values":[1.5]}}"#
        );
    }

    #[test]
    fn test_pretty_indent() {
        let formatter = JsonFormatter::new(true, false, 4);
        let result = formatter.format_json(&serde_json::json!({ "a": 1 })).unwrap();
        assert_eq!(result, "{\n    \"a\": 1\n}");
    }

    #[test]
    fn test_relaxed_extjson() {
        let formatter = JsonFormatter::new(false, false, 2);
        let oid = ObjectId::parse_str("65705d84dfc3f3b5094e1f72").unwrap();
        let json = Bson::Document(doc! { "_id": oid, "n": 42i64 }).into_relaxed_extjson();
        let result = formatter.format_json(&json).unwrap();
        assert_eq!(result, r#"{"_id":{"$oid":"65705d84dfc3f3b5094e1f72"},"n":42}"#);
    }
}
