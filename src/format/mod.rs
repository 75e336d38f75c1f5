//! ZIP format constants.
//!
//! This module contains the record signatures, version codes, flag bits and
//! other fixed values defined by the ZIP application note (PKWARE APPNOTE)
//! that the writer emits.

/// Record signatures (little-endian `u32` values).
pub mod signature {
    /// Local file header.
    pub const LOCAL_FILE_HEADER: u32 = 0x0403_4b50;
    /// Data descriptor following deferred-size entry data.
    pub const DATA_DESCRIPTOR: u32 = 0x0807_4b50;
    /// Central directory file header.
    pub const CENTRAL_DIRECTORY: u32 = 0x0201_4b50;
    /// End of central directory record.
    pub const END_OF_CENTRAL_DIRECTORY: u32 = 0x0605_4b50;
    /// ZIP64 end of central directory record.
    pub const ZIP64_END_OF_CENTRAL_DIRECTORY: u32 = 0x0606_4b50;
    /// ZIP64 end of central directory locator.
    pub const ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR: u32 = 0x0706_4b50;
}

/// Minimum "version needed to extract" values.
pub mod version {
    /// Baseline: deflate, folders.
    pub const DEFAULT: u16 = 20;
    /// ZIP64 format extensions.
    pub const ZIP64: u16 = 45;
    /// BZip2 compression.
    pub const BZIP2: u16 = 46;
    /// LZMA compression.
    pub const LZMA: u16 = 63;
}

/// General purpose bit flags.
pub mod flag {
    /// LZMA: the stream is terminated by an end-of-stream marker.
    pub const LZMA_EOS_MARKER: u16 = 0x0002;
    /// CRC-32 and sizes are zero in the local header and follow the data in
    /// a data descriptor.
    pub const SIZES_DEFERRED: u16 = 0x0008;
    /// Entry name is encoded as UTF-8.
    pub const UTF8_NAME: u16 = 0x0800;
}

/// Compression method codes.
pub mod method {
    /// No compression.
    pub const STORED: u16 = 0;
    /// Raw deflate.
    pub const DEFLATED: u16 = 8;
    /// BZip2.
    pub const BZIP2: u16 = 12;
    /// LZMA with a 9-byte properties header.
    pub const LZMA: u16 = 14;
}

/// Extra field header id of the ZIP64 extended information block.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Host system recorded in "version made by" (Unix).
pub const HOST_UNIX: u16 = 3;

/// Sentinel stored in a 32-bit field whose value lives in a ZIP64 block.
pub const ZIP64_SENTINEL_32: u32 = 0xFFFF_FFFF;

/// Sentinel stored in a 16-bit entry count that lives in the ZIP64 trailer.
pub const ZIP64_SENTINEL_16: u16 = 0xFFFF;

/// Largest entry count representable without ZIP64.
pub const MAX_16: u64 = 0xFFFF;

/// Fixed size of the local file header before the name.
pub const LOCAL_FILE_HEADER_SIZE: usize = 30;

/// Fixed size of a central directory header before the name.
pub const CENTRAL_DIRECTORY_HEADER_SIZE: usize = 46;

/// Fixed size of the classic end of central directory record before the comment.
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 22;

/// Size of the ZIP64 end of central directory record.
pub const ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE: usize = 56;

/// Size of the ZIP64 end of central directory locator.
pub const ZIP64_LOCATOR_SIZE: usize = 20;

/// Unix mode of regular file entries, stored in the upper half of the
/// external attributes.
pub const UNIX_FILE_MODE: u32 = 0o100644;

/// Unix mode of folder entries.
pub const UNIX_DIR_MODE: u32 = 0o40755;

/// MS-DOS directory attribute bit.
pub const DOS_DIRECTORY_ATTRIBUTE: u32 = 0x10;

/// Properties header that precedes every raw LZMA stream in a ZIP entry.
///
/// Layout:
/// - 2 bytes: LZMA SDK version (9.4)
/// - 2 bytes: properties size (5)
/// - 1 byte: `(pb * 5 + lp) * 9 + lc` with lc = 3, lp = 0, pb = 2
/// - 4 bytes: dictionary size (8 MiB)
pub const LZMA_PROPERTIES_HEADER: [u8; 9] = [0x09, 0x04, 0x05, 0x00, 0x5D, 0x00, 0x00, 0x80, 0x00];

/// LZMA literal context bits.
pub const LZMA_LC: u32 = 3;

/// LZMA literal position bits.
pub const LZMA_LP: u32 = 0;

/// LZMA position bits.
pub const LZMA_PB: u32 = 2;

/// LZMA dictionary size.
pub const LZMA_DICT_SIZE: u32 = 8 * 1024 * 1024;
