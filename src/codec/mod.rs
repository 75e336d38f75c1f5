//! Per-entry compression layer.
//!
//! Every entry is compressed by a [`Compressor`] with a two-operation
//! contract:
//!
//! - [`Compressor::compress`] feeds a chunk of raw bytes and returns
//!   whatever compressed bytes the codec has produced so far (possibly none)
//! - [`Compressor::flush`] finishes the stream and returns the remaining
//!   bytes; it may be called exactly once
//!
//! The set of methods is closed and fixed by the ZIP format, so the
//! compressor is a tagged variant over the four supported codecs rather
//! than an open trait object.
//!
//! # Feature Flags
//!
//! | Method | Feature | Backend |
//! |--------|---------|---------|
//! | Stored | always | none |
//! | Deflated | `deflate` | `flate2` |
//! | BZip2 | `bzip2` | `bzip2` |
//! | LZMA | `lzma` | `lzma-rust2` |
//!
//! Selecting a method whose feature is disabled fails with
//! [`Error::UnsupportedMethod`].

#[cfg(feature = "deflate")]
pub mod deflate;

#[cfg(feature = "bzip2")]
pub mod bzip2;

#[cfg(feature = "lzma")]
pub mod lzma;

use std::fmt;
#[cfg(any(feature = "deflate", feature = "bzip2", feature = "lzma"))]
use std::io;

use crate::format::{self, method, version};
use crate::{Error, Result};

#[cfg(feature = "deflate")]
pub use self::deflate::DeflateCompressor;

#[cfg(feature = "bzip2")]
pub use self::bzip2::Bzip2Compressor;

#[cfg(feature = "lzma")]
pub use self::lzma::LzmaCompressor;

/// A stateful byte-in/byte-out compressor for a single entry.
pub trait Encoder: Send {
    /// Compresses a chunk and returns the output produced so far.
    fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>>;

    /// Finishes the stream and returns the remaining output.
    fn flush(&mut self) -> Result<Vec<u8>>;
}

/// Compression method of a ZIP entry.
///
/// # Example
///
/// ```rust
/// use zipflow::CompressionMethod;
///
/// assert_eq!(CompressionMethod::Deflated.code(), 8);
/// assert_eq!(CompressionMethod::from_code(14).unwrap(), CompressionMethod::Lzma);
/// assert!(CompressionMethod::from_code(99).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    /// No compression.
    Stored,
    /// Raw deflate at maximum compression.
    #[default]
    Deflated,
    /// BZip2 at maximum block size.
    Bzip2,
    /// Raw LZMA with the 9-byte ZIP properties header.
    Lzma,
}

impl CompressionMethod {
    /// All methods understood by the format layer.
    pub const ALL: [CompressionMethod; 4] = [
        CompressionMethod::Stored,
        CompressionMethod::Deflated,
        CompressionMethod::Bzip2,
        CompressionMethod::Lzma,
    ];

    /// Returns the ZIP method code.
    pub const fn code(self) -> u16 {
        match self {
            CompressionMethod::Stored => method::STORED,
            CompressionMethod::Deflated => method::DEFLATED,
            CompressionMethod::Bzip2 => method::BZIP2,
            CompressionMethod::Lzma => method::LZMA,
        }
    }

    /// Looks up a method by its ZIP code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] for unknown codes.
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            method::STORED => Ok(CompressionMethod::Stored),
            method::DEFLATED => Ok(CompressionMethod::Deflated),
            method::BZIP2 => Ok(CompressionMethod::Bzip2),
            method::LZMA => Ok(CompressionMethod::Lzma),
            _ => Err(Error::UnsupportedMethod { method: code }),
        }
    }

    /// Returns a human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            CompressionMethod::Stored => "Stored",
            CompressionMethod::Deflated => "Deflated",
            CompressionMethod::Bzip2 => "BZip2",
            CompressionMethod::Lzma => "LZMA",
        }
    }

    /// Returns true if the codec for this method is compiled in.
    pub const fn is_supported(self) -> bool {
        match self {
            CompressionMethod::Stored => true,
            CompressionMethod::Deflated => cfg!(feature = "deflate"),
            CompressionMethod::Bzip2 => cfg!(feature = "bzip2"),
            CompressionMethod::Lzma => cfg!(feature = "lzma"),
        }
    }

    /// Minimum "version needed to extract" for an entry using this method.
    ///
    /// Codec requirements take precedence over ZIP64: both the BZip2 and
    /// LZMA versions already imply ZIP64 support.
    pub const fn version_needed(self, zip64: bool) -> u16 {
        match self {
            CompressionMethod::Lzma => version::LZMA,
            CompressionMethod::Bzip2 => version::BZIP2,
            _ if zip64 => version::ZIP64,
            _ => version::DEFAULT,
        }
    }

    /// General purpose flag bits implied by the method.
    pub(crate) const fn flags(self) -> u16 {
        match self {
            CompressionMethod::Lzma => format::flag::LZMA_EOS_MARKER,
            _ => 0,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u16> for CompressionMethod {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self> {
        Self::from_code(code)
    }
}

enum Backend {
    Stored,
    #[cfg(feature = "deflate")]
    Deflate(DeflateCompressor),
    #[cfg(feature = "bzip2")]
    Bzip2(Bzip2Compressor),
    #[cfg(feature = "lzma")]
    Lzma(LzmaCompressor),
}

/// Compressor for one entry, dispatched on [`CompressionMethod`].
///
/// # Example
///
/// ```rust
/// use zipflow::CompressionMethod;
/// use zipflow::codec::Compressor;
///
/// let mut stored = Compressor::new(CompressionMethod::Stored).unwrap();
/// assert_eq!(stored.compress(b"abc").unwrap(), b"abc");
/// assert!(stored.flush().unwrap().is_empty());
/// assert!(stored.compress(b"more").is_err());
/// ```
pub struct Compressor {
    method: CompressionMethod,
    backend: Backend,
    finished: bool,
}

impl fmt::Debug for Compressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compressor")
            .field("method", &self.method)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Compressor {
    /// Creates a compressor for the given method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] if the codec is not compiled in.
    pub fn new(method: CompressionMethod) -> Result<Self> {
        let backend = match method {
            CompressionMethod::Stored => Backend::Stored,
            #[cfg(feature = "deflate")]
            CompressionMethod::Deflated => Backend::Deflate(DeflateCompressor::new()),
            #[cfg(feature = "bzip2")]
            CompressionMethod::Bzip2 => Backend::Bzip2(Bzip2Compressor::new()),
            #[cfg(feature = "lzma")]
            CompressionMethod::Lzma => Backend::Lzma(LzmaCompressor::new()),
            #[allow(unreachable_patterns)]
            _ => {
                return Err(Error::UnsupportedMethod {
                    method: method.code(),
                });
            }
        };

        Ok(Self {
            method,
            backend,
            finished: false,
        })
    }

    /// Creates a compressor from a raw ZIP method code.
    pub fn from_code(code: u16) -> Result<Self> {
        Self::new(CompressionMethod::from_code(code)?)
    }

    /// Returns the method this compressor produces.
    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    /// Returns true once [`flush`](Self::flush) has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Compresses a chunk of raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolMisuse`] after [`flush`](Self::flush), or an
    /// I/O error if the codec fails.
    pub fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        if self.finished {
            return Err(Error::ProtocolMisuse("compressor already flushed"));
        }
        match &mut self.backend {
            Backend::Stored => Ok(chunk.to_vec()),
            #[cfg(feature = "deflate")]
            Backend::Deflate(c) => c.compress(chunk),
            #[cfg(feature = "bzip2")]
            Backend::Bzip2(c) => c.compress(chunk),
            #[cfg(feature = "lzma")]
            Backend::Lzma(c) => c.compress(chunk),
        }
    }

    /// Finishes the stream and returns the trailing bytes.
    pub fn flush(&mut self) -> Result<Vec<u8>> {
        if self.finished {
            return Err(Error::ProtocolMisuse("compressor already flushed"));
        }
        self.finished = true;
        match &mut self.backend {
            Backend::Stored => Ok(Vec::new()),
            #[cfg(feature = "deflate")]
            Backend::Deflate(c) => c.flush(),
            #[cfg(feature = "bzip2")]
            Backend::Bzip2(c) => c.flush(),
            #[cfg(feature = "lzma")]
            Backend::Lzma(c) => c.flush(),
        }
    }
}

/// Maps a codec error into the crate error type.
#[cfg(any(feature = "deflate", feature = "bzip2", feature = "lzma"))]
pub(crate) fn codec_error(e: impl fmt::Display) -> Error {
    Error::Io(io::Error::other(e.to_string()))
}
