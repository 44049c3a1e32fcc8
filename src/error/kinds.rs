use std::{fmt, io};

/// Crate-wide `Result` type using [`DynbsonError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, DynbsonError>;

/// Top-level error type for dynbson operations.
#[derive(Debug)]
pub enum DynbsonError {
    /// Encoding or decoding failed.
    Codec(CodecError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// JSON (de)serialization errors from the command-line front end.
    Json(serde_json::Error),
}

/// Failures of the transcoding core.
///
/// Any of these aborts the whole encode or decode call; no partial
/// document or value is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value is outside the closed set of encodable variants.
    UnsupportedType(String),

    /// A leaf could not be converted (invalid text, out-of-range integer,
    /// nesting past the configured depth).
    ConversionFailure(String),

    /// Field name sanitization could not produce a unique identifier.
    KeyCollisionUnresolvable(String),

    /// The document holds an element the decoder cannot represent, or is
    /// nested past the configured depth.
    MalformedDocument(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for DynbsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynbsonError::Codec(e) => write!(f, "{e}"),
            DynbsonError::Config(e) => write!(f, "Configuration error: {e}"),
            DynbsonError::Io(e) => write!(f, "I/O error: {e}"),
            DynbsonError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnsupportedType(class) => write!(f, "Unsupported type: {class}"),
            CodecError::ConversionFailure(msg) => write!(f, "Conversion failed: {msg}"),
            CodecError::KeyCollisionUnresolvable(name) => {
                write!(f, "Cannot make a unique field name from '{name}'")
            }
            CodecError::MalformedDocument(msg) => write!(f, "Malformed document: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for DynbsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DynbsonError::Codec(e) => Some(e),
            DynbsonError::Config(e) => Some(e),
            DynbsonError::Io(e) => Some(e),
            DynbsonError::Json(e) => Some(e),
        }
    }
}

impl std::error::Error for CodecError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to DynbsonError ========================= */

impl From<CodecError> for DynbsonError {
    fn from(err: CodecError) -> Self {
        DynbsonError::Codec(err)
    }
}

impl From<ConfigError> for DynbsonError {
    fn from(err: ConfigError) -> Self {
        DynbsonError::Config(err)
    }
}

impl From<io::Error> for DynbsonError {
    fn from(err: io::Error) -> Self {
        DynbsonError::Io(err)
    }
}

impl From<serde_json::Error> for DynbsonError {
    fn from(err: serde_json::Error) -> Self {
        DynbsonError::Json(err)
    }
}

impl From<bson::ser::Error> for DynbsonError {
    fn from(err: bson::ser::Error) -> Self {
        DynbsonError::Codec(CodecError::ConversionFailure(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_display() {
        let err: DynbsonError = CodecError::MalformedDocument("decimal128".into()).into();
        assert_eq!(err.to_string(), "Malformed document: decimal128");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "codec.max_depth".into(),
            value: "0".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value '0' for field 'codec.max_depth'"
        );
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err = DynbsonError::from(CodecError::UnsupportedType("sparse".into()));
        assert!(err.source().is_some());
        let io = DynbsonError::from(io::Error::other("disk"));
        assert_eq!(io.to_string(), "I/O error: disk");
        assert!(io.source().is_some());
    }
}
