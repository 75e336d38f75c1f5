//! Archive construction options and results.

use crate::codec::CompressionMethod;
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// Default number of bytes pulled from a source per driver step (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Maximum length of the archive comment in bytes.
pub const MAX_COMMENT_LENGTH: usize = 0xFFFF;

/// Options for building archives.
///
/// # Example
///
/// ```rust
/// use zipflow::{CompressionMethod, DosDateTime, ZipOptions};
///
/// let options = ZipOptions::new()
///     .method(CompressionMethod::Bzip2)
///     .chunk_size(16 * 1024)?
///     .comment("nightly build")?
///     .modified(DosDateTime::new(2024, 1, 1, 0, 0, 0).unwrap());
/// assert_eq!(options.chunk_size, 16 * 1024);
/// # Ok::<(), zipflow::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipOptions {
    /// Method used by adapters that are not given one explicitly.
    pub method: CompressionMethod,
    /// Bytes pulled from a source per driver step.
    pub chunk_size: usize,
    /// Archive comment stored in the end of central directory record.
    pub comment: Option<String>,
    /// Fixed modification time for entries that carry none.
    ///
    /// When `None`, the current time at the start of each entry is used.
    pub modified: Option<DosDateTime>,
}

impl Default for ZipOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Deflated,
            chunk_size: DEFAULT_CHUNK_SIZE,
            comment: None,
            modified: None,
        }
    }
}

impl ZipOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default compression method.
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the number of bytes read from a source per step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if `chunk_size` is zero.
    pub fn chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidOption("chunk size must be non-zero".into()));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Sets the archive comment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if the comment is longer than
    /// 65535 bytes.
    pub fn comment(mut self, comment: impl Into<String>) -> Result<Self> {
        self.comment = Some(comment.into());
        self.comment_bytes()?;
        Ok(self)
    }

    /// Uses a fixed modification time for entries, for reproducible output.
    pub fn modified(mut self, modified: DosDateTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Returns the comment as written into the trailer.
    ///
    /// The field is public, so the length is checked again here.
    pub(crate) fn comment_bytes(&self) -> Result<&[u8]> {
        let comment = self.comment.as_deref().unwrap_or("").as_bytes();
        if comment.len() > MAX_COMMENT_LENGTH {
            return Err(Error::InvalidOption(format!(
                "comment exceeds maximum length of {} bytes",
                MAX_COMMENT_LENGTH
            )));
        }
        Ok(comment)
    }

    /// Resolves the timestamp for a new entry.
    pub(crate) fn timestamp(&self) -> DosDateTime {
        self.modified.unwrap_or_else(DosDateTime::now)
    }
}

/// Summary of an archive build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Number of file entries written.
    pub entries_written: usize,
    /// Number of folder entries written.
    pub directories_written: usize,
    /// Total uncompressed bytes.
    pub total_size: u64,
    /// Total compressed bytes.
    pub compressed_size: u64,
    /// Bytes emitted so far, including headers and the trailer once written.
    pub archive_size: u64,
    /// Whether the archive uses (or will use) ZIP64 records.
    pub zip64: bool,
}

impl ArchiveSummary {
    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_size as f64
        }
    }

    /// Returns the space savings percentage.
    pub fn space_savings(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            1.0 - self.compression_ratio()
        }
    }
}
