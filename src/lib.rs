//! dynbson Library
//!
//! This library converts between dynamically typed, N-dimensional host
//! values and BSON documents. It can be used on its own or through the
//! `dynbson` command-line tool.
//!
//! # Modules
//!
//! - `value`: The dynamic value model (typed arrays, cells, records, dates)
//! - `document`: Views over BSON documents used by the codec
//! - `codec`: Encoder, decoder, merge engine and key sanitization
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `formatter`: Output formatting and display
//! - `cli`: Command-line interface and argument parsing
//!
//! # Example
//!
//! ```rust
//! use dynbson::{decode_from_bytes, encode_to_bytes, DynamicValue};
//!
//! let value = DynamicValue::text("hello");
//! let bytes = encode_to_bytes(&value).unwrap();
//! assert_eq!(decode_from_bytes(&bytes).unwrap(), value);
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod formatter;
pub mod value;

use bson::{Bson, Document};
use tracing::debug;

// Re-export commonly used types
pub use codec::{Decoder, Encoder};
pub use config::{CodecConfig, Config};
pub use error::{CodecError, DynbsonError, Result};
pub use formatter::Formatter;
pub use value::{DynamicValue, NumericData};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

/// Encode a value into BSON bytes with the default configuration
pub fn encode_to_bytes(value: &DynamicValue) -> Result<Vec<u8>> {
    encode_to_bytes_with(value, &CodecConfig::default())
}

/// Encode a value into BSON bytes
///
/// # Arguments
/// * `value` - Value to encode
/// * `config` - Codec limits
///
/// # Returns
/// * `Result<Vec<u8>>` - Serialized root document
pub fn encode_to_bytes_with(value: &DynamicValue, config: &CodecConfig) -> Result<Vec<u8>> {
    let doc = Encoder::new(config).encode(value)?;
    let mut bytes = Vec::new();
    doc.to_writer(&mut bytes)?;
    Ok(bytes)
}

/// Decode BSON bytes into a value with the default configuration
pub fn decode_from_bytes(bytes: &[u8]) -> Result<DynamicValue> {
    decode_from_bytes_with(bytes, &CodecConfig::default())
}

/// Decode BSON bytes into a value
///
/// Bytes that do not hold a readable root document decode to the empty
/// value. Errors inside a readable document are reported.
///
/// # Arguments
/// * `bytes` - Serialized root document
/// * `config` - Codec limits
///
/// # Returns
/// * `Result<DynamicValue>` - Decoded value or error
pub fn decode_from_bytes_with(bytes: &[u8], config: &CodecConfig) -> Result<DynamicValue> {
    match Document::from_reader(bytes) {
        Ok(doc) => Decoder::new(config).decode(&doc),
        Err(e) => {
            debug!("root document unreadable, decoding as empty value: {}", e);
            Ok(DynamicValue::empty())
        }
    }
}

/// Check that `bytes` hold exactly one well-formed BSON document
pub fn validate_bytes(bytes: &[u8]) -> bool {
    let declared = bytes
        .get(..4)
        .and_then(|prefix| prefix.try_into().ok())
        .map(i32::from_le_bytes);
    match declared {
        Some(len) if usize::try_from(len).ok() == Some(bytes.len()) => {
            Document::from_reader(bytes).is_ok()
        }
        _ => false,
    }
}

/// Render BSON bytes as relaxed extended JSON
///
/// # Returns
/// * `Result<serde_json::Value>` - JSON rendering, or `MalformedDocument`
///   if the bytes are not a readable document
pub fn bytes_to_json(bytes: &[u8]) -> Result<serde_json::Value> {
    let doc = Document::from_reader(bytes)
        .map_err(|e| CodecError::MalformedDocument(e.to_string()))?;
    Ok(Bson::Document(doc).into_relaxed_extjson())
}
