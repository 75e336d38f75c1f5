//! Entry records retained until the central directory is written.

use crate::codec::CompressionMethod;
use crate::entry_name::EntryName;
use crate::format::{self, ZIP64_SENTINEL_32, flag, version};
use crate::timestamp::DosDateTime;

use super::accounting::EntryAccounting;

/// Metadata of one archive entry.
///
/// The offset is fixed when the local header is emitted. CRC and sizes are
/// filled in once the entry data has been fully consumed and are frozen
/// from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub(crate) name: EntryName,
    pub(crate) method: CompressionMethod,
    pub(crate) modified: DosDateTime,
    pub(crate) flags: u16,
    pub(crate) crc: u32,
    pub(crate) compressed_size: u64,
    pub(crate) uncompressed_size: u64,
    pub(crate) offset: u64,
    pub(crate) is_dir: bool,
    /// Whether the local header carried a ZIP64 extra block.
    pub(crate) local_zip64: bool,
}

impl Entry {
    pub(crate) fn new(
        name: EntryName,
        method: CompressionMethod,
        modified: DosDateTime,
        offset: u64,
        deferred: bool,
    ) -> Self {
        let is_dir = name.is_dir();
        let mut flags = method.flags();
        if deferred {
            flags |= flag::SIZES_DEFERRED;
        }
        if name.needs_utf8_flag() {
            flags |= flag::UTF8_NAME;
        }

        Self {
            name,
            method,
            modified,
            flags,
            crc: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            offset,
            is_dir,
            local_zip64: false,
        }
    }

    /// Copies the final CRC and sizes out of the accounting.
    pub(crate) fn freeze(&mut self, accounting: &EntryAccounting) {
        self.crc = accounting.crc();
        self.compressed_size = accounting.compressed_size();
        self.uncompressed_size = accounting.uncompressed_size();
    }

    /// Entry name.
    pub fn name(&self) -> &EntryName {
        &self.name
    }

    /// Compression method.
    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    /// Last-modified timestamp.
    pub fn modified(&self) -> DosDateTime {
        self.modified
    }

    /// General purpose bit flags.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// CRC-32 of the uncompressed data.
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Size of the stored data.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Size of the original data.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Offset of the local file header from the start of the archive.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether this is a folder entry.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Whether CRC and sizes follow the data in a descriptor.
    pub fn has_descriptor(&self) -> bool {
        self.flags & flag::SIZES_DEFERRED != 0
    }

    /// Whether any central directory field of this entry overflows 32 bits.
    pub fn needs_zip64(&self) -> bool {
        exceeds_32(self.uncompressed_size)
            || exceeds_32(self.compressed_size)
            || exceeds_32(self.offset)
    }

    /// Version needed to extract, given whether ZIP64 fields are in use.
    pub(crate) fn version_needed(&self, zip64: bool) -> u16 {
        self.method.version_needed(zip64)
    }

    /// Version made by: Unix host, format version at least the baseline.
    pub(crate) fn version_made_by(&self, zip64: bool) -> u16 {
        (format::HOST_UNIX << 8) | self.version_needed(zip64).max(version::DEFAULT)
    }

    /// External attributes: Unix mode in the upper half, DOS bits below.
    pub(crate) fn external_attributes(&self) -> u32 {
        if self.is_dir {
            (format::UNIX_DIR_MODE << 16) | format::DOS_DIRECTORY_ATTRIBUTE
        } else {
            format::UNIX_FILE_MODE << 16
        }
    }
}

/// Returns true if `value` cannot be stored in a 32-bit field.
///
/// `0xFFFFFFFF` itself is the ZIP64 sentinel, so it overflows as well.
pub(crate) fn exceeds_32(value: u64) -> bool {
    value >= u64::from(ZIP64_SENTINEL_32)
}
