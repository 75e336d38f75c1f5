//! Blocking streaming compression driver.
//!
//! The driver pulls raw chunks from a [`ChunkSource`], compresses each one
//! and hands the compressed bytes out immediately. When the source is
//! exhausted the compressor is flushed once and any trailing bytes are
//! returned as a final chunk.

use std::io::{self, Read};

use crate::codec::{CompressionMethod, Compressor};
use crate::Result;

use super::accounting::EntryAccounting;

/// A pull-based supplier of raw entry bytes.
pub trait ChunkSource {
    /// Returns the next raw chunk, or `None` once the source is exhausted.
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>>;
}

/// A source with no bytes, used by buffer and folder entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySource;

impl ChunkSource for EmptySource {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        Ok(None)
    }
}

/// Reads fixed-size chunks from a blocking reader into a reusable buffer.
pub struct ReadSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R> std::fmt::Debug for ReadSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSource")
            .field("chunk_size", &self.buf.len())
            .finish_non_exhaustive()
    }
}

impl<R: Read> ReadSource<R> {
    /// Wraps a reader; at most `chunk_size` bytes are read per step.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0u8; chunk_size.max(1)],
        }
    }
}

impl<R: Read> ChunkSource for ReadSource<R> {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(&self.buf[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Adapts an iterator of byte chunks, passing each chunk through as is.
pub struct IterSource<I: Iterator> {
    iter: I,
    current: Option<I::Item>,
}

impl<I: Iterator> std::fmt::Debug for IterSource<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterSource").finish_non_exhaustive()
    }
}

impl<I> IterSource<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    /// Wraps a chunk iterator.
    pub fn new(chunks: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: chunks.into_iter(),
            current: None,
        }
    }
}

impl<I> ChunkSource for IterSource<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        self.current = self.iter.next();
        Ok(self.current.as_ref().map(AsRef::as_ref))
    }
}

/// Compressor and accounting for one entry, owned as a single value so the
/// cooperative driver can move it to a worker and back per chunk.
#[derive(Debug)]
pub(crate) struct CompressState {
    compressor: Compressor,
    accounting: EntryAccounting,
}

impl CompressState {
    pub(crate) fn new(method: CompressionMethod) -> Result<Self> {
        Ok(Self {
            compressor: Compressor::new(method)?,
            accounting: EntryAccounting::new(),
        })
    }

    /// Compresses one raw chunk and accounts for it.
    pub(crate) fn feed(&mut self, raw: &[u8]) -> Result<Vec<u8>> {
        let compressed = self.compressor.compress(raw)?;
        self.accounting.update(raw, &compressed);
        Ok(compressed)
    }

    /// Flushes the compressor and accounts for the tail.
    pub(crate) fn finish(&mut self) -> Result<Vec<u8>> {
        let tail = self.compressor.flush()?;
        self.accounting.finalize_flush(&tail);
        Ok(tail)
    }

    pub(crate) fn accounting(&self) -> &EntryAccounting {
        &self.accounting
    }
}

/// Compresses everything in `data` in one pass.
pub(crate) fn compress_all(
    method: CompressionMethod,
    data: &[u8],
) -> Result<(Vec<u8>, EntryAccounting)> {
    let mut state = CompressState::new(method)?;
    let mut out = state.feed(data)?;
    out.extend(state.finish()?);
    Ok((out, state.accounting))
}

/// Lazy, finite, non-restartable sequence of compressed chunks.
///
/// Empty compressor outputs are skipped; the flush tail is yielded only
/// when non-empty.
#[derive(Debug)]
pub struct CompressStream<S> {
    source: S,
    state: CompressState,
    done: bool,
}

impl<S: ChunkSource> CompressStream<S> {
    /// Creates a driver over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`](crate::Error::UnsupportedMethod)
    /// if the method's codec is not available.
    pub fn new(source: S, method: CompressionMethod) -> Result<Self> {
        Ok(Self {
            source,
            state: CompressState::new(method)?,
            done: false,
        })
    }

    /// Produces the next compressed chunk, or `None` when the entry data
    /// is complete.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        while !self.done {
            match self.source.next_chunk()? {
                Some(raw) => {
                    let compressed = self.state.feed(raw)?;
                    if !compressed.is_empty() {
                        return Ok(Some(compressed));
                    }
                }
                None => {
                    self.done = true;
                    let tail = self.state.finish()?;
                    if !tail.is_empty() {
                        return Ok(Some(tail));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Returns true once the source is exhausted and the compressor flushed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Accounting for the bytes processed so far.
    pub fn accounting(&self) -> &EntryAccounting {
        self.state.accounting()
    }
}

impl<S: ChunkSource> Iterator for CompressStream<S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
