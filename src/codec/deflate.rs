//! Raw deflate compressor.

use std::io::Write;

use flate2::Compression;
use flate2::write::DeflateEncoder as FlateEncoder;

use super::{Encoder, codec_error};
use crate::{Error, Result};

/// Raw deflate (no zlib wrapper) at maximum compression.
pub struct DeflateCompressor {
    inner: Option<FlateEncoder<Vec<u8>>>,
}

impl std::fmt::Debug for DeflateCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateCompressor").finish_non_exhaustive()
    }
}

impl Default for DeflateCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DeflateCompressor {
    /// Creates a new deflate compressor.
    pub fn new() -> Self {
        Self {
            inner: Some(FlateEncoder::new(Vec::new(), Compression::best())),
        }
    }
}

impl Encoder for DeflateCompressor {
    fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let encoder = self
            .inner
            .as_mut()
            .ok_or(Error::ProtocolMisuse("compressor already flushed"))?;
        encoder.write_all(chunk).map_err(codec_error)?;
        Ok(std::mem::take(encoder.get_mut()))
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        match self.inner.take() {
            Some(encoder) => encoder.finish().map_err(codec_error),
            None => Err(Error::ProtocolMisuse("compressor already flushed")),
        }
    }
}
