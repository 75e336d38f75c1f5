//! Error types for ZIP archive construction.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when building ZIP archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. A build
//! that fails part-way leaves the archive without its central directory, so
//! the bytes produced so far must be discarded:
//!
//! ```rust
//! use zipflow::{Error, ZipBuilder};
//!
//! let mut builder = ZipBuilder::new();
//! let trailer = builder.end().unwrap();
//! assert!(!trailer.is_empty());
//!
//! // Finalizing twice is a programming error.
//! match builder.end() {
//!     Err(e @ Error::ProtocolMisuse(_)) => assert!(e.is_protocol_misuse()),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use std::io;

/// The main error type for ZIP archive construction.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | Entry source or output sink failed |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod] | Unknown or compiled-out method |
/// | Usage | [`ProtocolMisuse`][Self::ProtocolMisuse] | Calls made out of order |
/// | Input | [`InvalidEntryName`][Self::InvalidEntryName], [`InvalidOption`][Self::InvalidOption] | Bad names or configuration |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading an entry source or writing output.
    ///
    /// Errors raised by a byte source are propagated unchanged. Codec
    /// failures and failed worker tasks are reported through this variant
    /// as well.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The compression method is unknown or not compiled into this build.
    ///
    /// Method codes understood by this crate:
    /// - `0`: Stored
    /// - `8`: Deflated
    /// - `12`: BZip2
    /// - `14`: LZMA
    ///
    /// # Recovery
    ///
    /// Enable the corresponding feature flag when building:
    /// ```toml
    /// zipflow = { version = "1", features = ["deflate", "bzip2", "lzma"] }
    /// ```
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The ZIP method code that is not supported.
        method: u16,
    },

    /// An operation was invoked in a state that does not allow it.
    ///
    /// Raised when adding an entry after the archive was finalized,
    /// finalizing twice, starting an entry while another one is still
    /// unfinished, or feeding a compressor that was already flushed.
    /// The archive under construction must be treated as failed.
    #[error("Protocol misuse: {0}")]
    ProtocolMisuse(&'static str),

    /// An entry name is invalid.
    ///
    /// Entry names must not be empty, must not contain NUL bytes, and must
    /// not contain `.` or `..` segments.
    #[error("Invalid entry name: {0}")]
    InvalidEntryName(String),

    /// A configuration value is out of range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

impl Error {
    /// Returns `true` if this error reports calls made out of order.
    pub fn is_protocol_misuse(&self) -> bool {
        matches!(self, Error::ProtocolMisuse(_))
    }

    /// Returns `true` if this error is related to an unsupported method.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedMethod { .. })
    }

    /// Returns the method code if this is an unsupported method error.
    pub fn method(&self) -> Option<u16> {
        match self {
            Error::UnsupportedMethod { method } => Some(*method),
            _ => None,
        }
    }
}

/// A specialized Result type for ZIP operations.
///
/// This is defined as `std::result::Result<T, Error>` for convenience.
pub type Result<T> = std::result::Result<T, Error>;
