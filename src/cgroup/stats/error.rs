//! Diagnostics produced while parsing cgroup statistics.
//!
//! Parsing is lossy, so a [`StatParseError`] never aborts a read. Parsers return it next
//! to the value they could recover and the caller decides how loudly to report it.
//!
//! # Error Types
//!
//! - [`StatParseError::InvalidKeyValue`]: a known key carried a value that is not a base-10 `u64`.
//! - [`StatParseError::InvalidValue`]: a single-value file (e.g., `memory.current`) did not hold a number.
//! - [`StatParseError::DuplicateField`]: a key that must be unique appeared again.

use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("duplicate field '{field}' at line {line}")]
    DuplicateField { field: String, line: usize },

    #[error("invalid value for '{key}' at line {line}: '{value}': {source}")]
    InvalidKeyValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid value at line {line}: '{value}': {source}")]
    InvalidValue {
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },
}
