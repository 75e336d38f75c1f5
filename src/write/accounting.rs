//! Per-entry CRC and size accounting.

use crate::checksum::Crc32;

/// Running CRC-32 and byte counters for the entry being written.
#[derive(Debug, Clone, Default)]
pub struct EntryAccounting {
    crc: Crc32,
    compressed_size: u64,
    uncompressed_size: u64,
}

impl EntryAccounting {
    /// Creates empty accounting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one raw chunk and the compressed bytes it produced.
    pub fn update(&mut self, raw: &[u8], compressed: &[u8]) {
        self.crc.update(raw);
        self.uncompressed_size += raw.len() as u64;
        self.compressed_size += compressed.len() as u64;
    }

    /// Records the bytes returned by the final compressor flush.
    ///
    /// Flush output carries no raw bytes, so only the compressed size moves.
    pub fn finalize_flush(&mut self, tail: &[u8]) {
        self.compressed_size += tail.len() as u64;
    }

    /// CRC-32 of all raw bytes seen so far.
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Compressed bytes produced so far.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Raw bytes consumed so far.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }
}
