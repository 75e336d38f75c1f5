//! Raw LZMA compressor with the ZIP properties header.
//!
//! ZIP stores LZMA data as a 9-byte header (SDK version, properties size,
//! properties byte, dictionary size) followed by a raw LZMA stream
//! terminated by an end-of-stream marker. The encoder is created on the
//! first call to [`compress`](Encoder::compress) or [`flush`](Encoder::flush)
//! and the header is prepended to that call's output, exactly once.

use std::io::Write;

use super::{Encoder, codec_error};
use crate::format::{LZMA_DICT_SIZE, LZMA_LC, LZMA_LP, LZMA_PB, LZMA_PROPERTIES_HEADER};
use crate::{Error, Result};

/// Preset the tuned parameters are layered on.
const LZMA_PRESET: u32 = 6;

enum State {
    Uninitialized,
    Initialized(lzma_rust2::LzmaWriter<Vec<u8>>),
    Finished,
}

/// Raw LZMA compressor (lc=3, lp=0, pb=2, 8 MiB dictionary).
pub struct LzmaCompressor {
    state: State,
}

impl std::fmt::Debug for LzmaCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Uninitialized => "uninitialized",
            State::Initialized(_) => "initialized",
            State::Finished => "finished",
        };
        f.debug_struct("LzmaCompressor")
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

impl Default for LzmaCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl LzmaCompressor {
    /// Creates a compressor; the encoder itself is built on first use.
    pub fn new() -> Self {
        Self {
            state: State::Uninitialized,
        }
    }

    /// Returns the encoder parameters written into the properties header.
    pub fn options() -> lzma_rust2::LzmaOptions {
        let mut opts = lzma_rust2::LzmaOptions::with_preset(LZMA_PRESET);
        opts.lc = LZMA_LC;
        opts.lp = LZMA_LP;
        opts.pb = LZMA_PB;
        opts.dict_size = LZMA_DICT_SIZE;
        opts
    }

    /// Builds the encoder if needed and returns the header bytes to
    /// prepend to this call's output.
    fn ensure_initialized(&mut self) -> Result<Vec<u8>> {
        match self.state {
            State::Uninitialized => {
                let writer =
                    lzma_rust2::LzmaWriter::new_no_header(Vec::new(), &Self::options(), true)
                        .map_err(codec_error)?;
                self.state = State::Initialized(writer);
                Ok(LZMA_PROPERTIES_HEADER.to_vec())
            }
            State::Initialized(_) => Ok(Vec::new()),
            State::Finished => Err(Error::ProtocolMisuse("compressor already flushed")),
        }
    }
}

impl Encoder for LzmaCompressor {
    fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut out = self.ensure_initialized()?;
        if let State::Initialized(writer) = &mut self.state {
            writer.write_all(chunk).map_err(codec_error)?;
            out.append(writer.inner_mut());
        }
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        let mut out = self.ensure_initialized()?;
        if let State::Initialized(writer) = std::mem::replace(&mut self.state, State::Finished) {
            out.extend(writer.finish().map_err(codec_error)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn decode(data: &[u8]) -> Vec<u8> {
        assert_eq!(&data[..9], &LZMA_PROPERTIES_HEADER);
        let dict_size = u32::from_le_bytes(data[5..9].try_into().unwrap());
        let mut reader =
            lzma_rust2::LzmaReader::new_with_props(&data[9..], u64::MAX, data[4], dict_size, None)
                .unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_options_match_header() {
        let opts = LzmaCompressor::options();
        assert_eq!(opts.get_props(), LZMA_PROPERTIES_HEADER[4]);
        assert_eq!(opts.dict_size, LZMA_DICT_SIZE);
    }

    #[test]
    fn test_header_prepended_once() {
        let data = b"LZMA test data, repeated. ".repeat(500);
        let mut c = LzmaCompressor::new();
        let first = c.compress(&data[..100]).unwrap();
        assert!(first.starts_with(&LZMA_PROPERTIES_HEADER));

        let mut compressed = first;
        for chunk in data[100..].chunks(1024) {
            let out = c.compress(chunk).unwrap();
            assert!(!out.starts_with(&LZMA_PROPERTIES_HEADER));
            compressed.extend(out);
        }
        compressed.extend(c.flush().unwrap());

        assert_eq!(decode(&compressed), data);
    }

    #[test]
    fn test_flush_without_input_emits_header() {
        let mut c = LzmaCompressor::new();
        let out = c.flush().unwrap();
        assert!(out.starts_with(&LZMA_PROPERTIES_HEADER));
        assert!(out.len() > LZMA_PROPERTIES_HEADER.len());
        assert!(decode(&out).is_empty());
    }

    #[test]
    fn test_compress_after_flush() {
        let mut c = LzmaCompressor::new();
        c.compress(b"abc").unwrap();
        c.flush().unwrap();
        assert!(c.compress(b"x").unwrap_err().is_protocol_misuse());
        assert!(c.flush().unwrap_err().is_protocol_misuse());
    }
}
