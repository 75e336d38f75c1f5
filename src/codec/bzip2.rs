//! BZip2 compressor.

use std::io::Write;

use bzip2::Compression;
use bzip2::write::BzEncoder;

use super::{Encoder, codec_error};
use crate::{Error, Result};

/// BZip2 compressor using 900k blocks.
pub struct Bzip2Compressor {
    inner: Option<BzEncoder<Vec<u8>>>,
}

impl std::fmt::Debug for Bzip2Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bzip2Compressor").finish_non_exhaustive()
    }
}

impl Default for Bzip2Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Bzip2Compressor {
    /// Creates a new BZip2 compressor.
    pub fn new() -> Self {
        Self {
            inner: Some(BzEncoder::new(Vec::new(), Compression::best())),
        }
    }
}

impl Encoder for Bzip2Compressor {
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
