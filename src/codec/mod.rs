//! Conversion engine between dynamic values and BSON documents
//!
//! This module provides:
//! - `Encoder`: folds N-dimensional values and emits BSON elements
//! - `Decoder`: classifies aggregates and rebuilds values
//! - `try_merge`: reassembles folded arrays from cells of equal parts
//! - `sanitize`: maps document keys to unique record field names
//!
//! # Design
//!
//! Encoding and decoding are synchronous and keep no state between calls.
//! Both carry only the depth limit from [`CodecConfig`], so a single
//! instance can be shared freely.
//!
//! [`CodecConfig`]: crate::config::CodecConfig

mod decoder;
mod encoder;
mod fold;
mod keys;
mod merge;

pub use decoder::{Decoder, TypeClass};
pub use encoder::Encoder;
pub use keys::{sanitize, MAX_IDENTIFIER_LEN, OBJECT_ID_FIELD, OBJECT_ID_KEY};
pub use merge::try_merge;

#[cfg(test)]
mod tests;
