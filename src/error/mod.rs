//! Error handling for dynbson
//!
//! This module provides the error taxonomy shared by the codec and the CLI:
//! - Codec errors raised while encoding or decoding values
//! - Configuration errors raised while loading settings
//! - I/O and JSON errors surfaced by the command-line front end
//!
//! # Example
//!
//! ```rust
//! use dynbson::error::{CodecError, DynbsonError, Result};
//!
//! fn reject() -> Result<()> {
//!     Err(CodecError::UnsupportedType("function_handle".into()).into())
//! }
//!
//! assert!(matches!(
//!     reject(),
//!     Err(DynbsonError::Codec(CodecError::UnsupportedType(_)))
//! ));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{CodecError, ConfigError, DynbsonError, Result};
