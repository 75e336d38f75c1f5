//! Sink-backed archive writer.

use std::io::{Read, Write};
use std::path::Path;

use crate::codec::CompressionMethod;
use crate::Result;

use super::{ArchiveSummary, ZipBuilder, ZipOptions};

/// Writes an archive straight into a [`Write`] sink.
///
/// Every chunk produced by the underlying [`ZipBuilder`] is written to the
/// sink in order, so the sink only needs sequential writes: files, pipes,
/// sockets and HTTP response bodies all work.
///
/// # Example
///
/// ```rust
/// use zipflow::{CompressionMethod, ZipStreamWriter};
///
/// let mut writer = ZipStreamWriter::create(Vec::new());
/// writer.add_buf("hello.txt", b"hello world", CompressionMethod::Deflated)?;
/// writer.add_gen("parts.txt", [b"a".as_slice(), b"b"], CompressionMethod::Stored)?;
/// let (summary, bytes) = writer.finish_into_inner()?;
///
/// assert_eq!(summary.entries_written, 2);
/// assert_eq!(summary.archive_size, bytes.len() as u64);
/// # Ok::<(), zipflow::Error>(())
/// ```
#[derive(Debug)]
pub struct ZipStreamWriter<W: Write> {
    sink: W,
    builder: ZipBuilder,
}

impl<W: Write> ZipStreamWriter<W> {
    /// Creates a writer with default options.
    pub fn create(sink: W) -> Self {
        Self {
            sink,
            builder: ZipBuilder::new(),
        }
    }

    /// Sets the options used for subsequent entries and the trailer.
    pub fn options(mut self, options: ZipOptions) -> Self {
        self.builder.set_options(options);
        self
    }

    /// Returns the underlying builder.
    pub fn builder(&self) -> &ZipBuilder {
        &self.builder
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Adds an entry with fully known content.
    pub fn add_buf(
        &mut self,
        name: &str,
        data: impl AsRef<[u8]>,
        method: CompressionMethod,
    ) -> Result<()> {
        let sink = &mut self.sink;
        self.builder
            .add_buf(name, data, method)?
            .for_each_chunk(|chunk| Ok(sink.write_all(chunk)?))
    }

    /// Adds an entry read from a blocking source of unknown length.
    pub fn add_io(&mut self, name: &str, reader: impl Read, method: CompressionMethod) -> Result<()> {
        let sink = &mut self.sink;
        self.builder
            .add_io(name, reader, method)?
            .for_each_chunk(|chunk| Ok(sink.write_all(chunk)?))
    }

    /// Adds an entry fed from a chunk sequence.
    pub fn add_gen<I>(&mut self, name: &str, chunks: I, method: CompressionMethod) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let sink = &mut self.sink;
        self.builder
            .add_gen(name, chunks, method)?
            .for_each_chunk(|chunk| Ok(sink.write_all(chunk)?))
    }

    /// Adds a folder entry.
    pub fn add_folder(&mut self, name: &str) -> Result<()> {
        let sink = &mut self.sink;
        self.builder
            .add_folder(name)?
            .for_each_chunk(|chunk| Ok(sink.write_all(chunk)?))
    }

    /// Adds everything below `root` under the archive-internal `prefix`.
    pub fn walk(&mut self, root: impl AsRef<Path>, prefix: &str) -> Result<()> {
        for chunk in self.builder.walk(root, prefix)? {
            self.sink.write_all(&chunk?)?;
        }
        Ok(())
    }

    /// Writes the trailer, flushes the sink and returns the summary.
    pub fn finish(self) -> Result<ArchiveSummary> {
        self.finish_into_inner().map(|(summary, _)| summary)
    }

    /// Like [`finish`](Self::finish), also handing back the sink.
    pub fn finish_into_inner(mut self) -> Result<(ArchiveSummary, W)> {
        let trailer = self.builder.end()?;
        self.sink.write_all(&trailer)?;
        self.sink.flush()?;
        Ok((self.builder.summary(), self.sink))
    }
}
