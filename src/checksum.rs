//! Checksum computation utilities.
//!
//! ZIP records carry a CRC-32 of the uncompressed entry data using the
//! IEEE 802.3 polynomial (same as Ethernet, PNG, gzip, etc.). The value is
//! accumulated chunk by chunk while an entry is streamed, so the whole
//! entry never has to be in memory at once.
//!
//! # Example
//!
//! ```rust
//! use zipflow::checksum::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), 0xEC4AC3D0);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

/// CRC-32 checksum calculator backed by `crc32fast`.
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &format_args!("{:#010x}", self.finalize()))
            .finish()
    }
}

impl Crc32 {
    /// Creates a new calculator.
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Updates the checksum with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of everything seen so far.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Computes the checksum of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}
