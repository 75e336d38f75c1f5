//! Archive building API for ZIP archives.
//!
//! [`ZipBuilder`] is the archive state machine. Every `add_*` method begins
//! one entry and returns a lazy iterator over the bytes that entry
//! contributes to the archive: local header, data, and (for sources of
//! unknown length) a trailing data descriptor. [`ZipBuilder::end`] returns
//! the central directory and end of central directory records.
//!
//! Concatenating every yielded chunk in order gives the complete archive.
//! The builder never seeks and never holds more than one chunk of an
//! entry in memory, except for buffer-backed entries.
//!
//! # Example
//!
//! ```rust
//! use zipflow::{CompressionMethod, ZipBuilder};
//!
//! let mut builder = ZipBuilder::new();
//! let mut archive = Vec::new();
//!
//! for chunk in builder.add_buf("hello.txt", b"hello world", CompressionMethod::Stored)? {
//!     archive.extend(chunk?);
//! }
//! for chunk in builder.add_folder("docs")? {
//!     archive.extend(chunk?);
//! }
//! archive.extend(builder.end()?);
//!
//! assert_eq!(builder.entries().len(), 2);
//! assert_eq!(builder.offset(), archive.len() as u64);
//! # Ok::<(), zipflow::Error>(())
//! ```
//!
//! # Abandoned entries
//!
//! Dropping an entry iterator before it is exhausted, or stopping after it
//! yields an error, leaves the entry unfinished. The builder then rejects
//! further entries and [`end`](ZipBuilder::end) with
//! [`Error::ProtocolMisuse`]; the bytes produced so far do not form a valid
//! archive.

mod accounting;
mod driver;
mod entry;
mod header_encode;
pub(crate) mod options;
mod stream_writer;
pub(crate) mod walk;

pub use accounting::EntryAccounting;
pub use driver::{ChunkSource, CompressStream, EmptySource, IterSource, ReadSource};
pub use entry::Entry;
pub use options::{ArchiveSummary, DEFAULT_CHUNK_SIZE, ZipOptions};
pub use stream_writer::ZipStreamWriter;
pub use walk::WalkChunks;

#[cfg(feature = "async")]
pub(crate) use driver::CompressState;
pub(crate) use driver::compress_all;

use std::io::Read;
use std::path::Path;

use crate::codec::CompressionMethod;
use crate::entry_name::EntryName;
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

use header_encode::{
    encode_data_descriptor, encode_local_header, encode_trailer, local_needs_zip64,
};

/// State of the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    /// Ready to begin a new entry.
    AcceptingEntries,
    /// An entry has begun and has not been committed yet.
    EntryInProgress,
    /// The trailer has been emitted.
    Finished,
}

/// Streaming ZIP archive builder.
///
/// See the [module documentation](self) for the output contract.
#[derive(Debug)]
pub struct ZipBuilder {
    pub(crate) options: ZipOptions,
    offset: u64,
    entries: Vec<Entry>,
    zip64: bool,
    state: BuilderState,
}

impl Default for ZipBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipBuilder {
    /// Creates a builder with default options.
    pub fn new() -> Self {
        Self::with_options(ZipOptions::default())
    }

    /// Creates a builder with the given options.
    pub fn with_options(options: ZipOptions) -> Self {
        Self {
            options,
            offset: 0,
            entries: Vec::new(),
            zip64: false,
            state: BuilderState::AcceptingEntries,
        }
    }

    /// Returns the builder options.
    pub fn options(&self) -> &ZipOptions {
        &self.options
    }

    /// Replaces the builder options.
    pub fn set_options(&mut self, options: ZipOptions) {
        self.options = options;
    }

    /// Number of bytes yielded so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Entries committed to the central directory so far, in order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Whether ZIP64 records are (or will be) required.
    pub fn is_zip64(&self) -> bool {
        self.zip64
    }

    /// Whether [`end`](Self::end) has completed.
    pub fn is_finished(&self) -> bool {
        self.state == BuilderState::Finished
    }

    /// Returns statistics about the entries committed so far.
    pub fn summary(&self) -> ArchiveSummary {
        let mut summary = ArchiveSummary {
            archive_size: self.offset,
            zip64: self.zip64,
            ..Default::default()
        };
        for entry in &self.entries {
            if entry.is_dir() {
                summary.directories_written += 1;
            } else {
                summary.entries_written += 1;
            }
            summary.total_size += entry.uncompressed_size();
            summary.compressed_size += entry.compressed_size();
        }
        summary
    }

    /// Adds an entry whose content is fully known.
    ///
    /// The data is compressed up front, so the local header carries the
    /// exact CRC and sizes and no data descriptor is written.
    ///
    /// # Errors
    ///
    /// Fails if the name is invalid, the method is unsupported, or the
    /// builder is not accepting entries.
    pub fn add_buf(
        &mut self,
        name: &str,
        data: impl AsRef<[u8]>,
        method: CompressionMethod,
    ) -> Result<EntryChunks<'_>> {
        let name = EntryName::new(name)?;
        self.ensure_accepting_entries()?;
        let (compressed, accounting) = compress_all(method, data.as_ref())?;
        let task = self.begin_compressed(name, method, None, compressed, &accounting)?;
        Ok(EntryChunks::new(self, task))
    }

    /// Adds an entry read from a blocking source of unknown length.
    ///
    /// The local header has the sizes-deferred flag set and a data
    /// descriptor follows the compressed data.
    pub fn add_io<R: Read>(
        &mut self,
        name: &str,
        reader: R,
        method: CompressionMethod,
    ) -> Result<EntryChunks<'_, ReadSource<R>>> {
        let name = EntryName::new(name)?;
        let source = ReadSource::new(reader, self.options.chunk_size);
        let task = self.begin_stream(name, source, method, None)?;
        Ok(EntryChunks::new(self, task))
    }

    /// Adds an entry fed from a pull-based chunk sequence.
    ///
    /// Each chunk is compressed as it is pulled; sizes are deferred.
    pub fn add_gen<I>(
        &mut self,
        name: &str,
        chunks: I,
        method: CompressionMethod,
    ) -> Result<EntryChunks<'_, IterSource<I::IntoIter>>>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let name = EntryName::new(name)?;
        let task = self.begin_stream(name, IterSource::new(chunks), method, None)?;
        Ok(EntryChunks::new(self, task))
    }

    /// Adds a folder entry. A trailing `/` is appended if missing.
    pub fn add_folder(&mut self, name: &str) -> Result<EntryChunks<'_>> {
        let name = EntryName::folder(name)?;
        let task = self.begin_folder(name, None)?;
        Ok(EntryChunks::new(self, task))
    }

    /// Adds everything below `root`, naming entries `prefix` + relative path.
    ///
    /// Entries are visited sorted by file name; the root itself is not
    /// added. Files no larger than the configured chunk size are added as
    /// buffers, larger files are streamed. Uses the default method from
    /// the method field of [`ZipOptions`].
    pub fn walk(&mut self, root: impl AsRef<Path>, prefix: &str) -> Result<WalkChunks<'_>> {
        self.ensure_accepting_entries()?;
        let method = self.options.method;
        Ok(WalkChunks::new(self, root.as_ref(), prefix, method))
    }

    /// Finalizes the archive and returns the central directory and trailer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolMisuse`] if called twice or while an entry
    /// is unfinished, and [`Error::InvalidOption`] if the archive comment
    /// is longer than 65535 bytes.
    pub fn end(&mut self) -> Result<Vec<u8>> {
        self.ensure_accepting_entries()?;

        let comment = self.options.comment_bytes()?;
        let (trailer, zip64) = encode_trailer(&self.entries, self.offset, comment, self.zip64);
        self.zip64 = zip64;
        self.state = BuilderState::Finished;

        log::debug!(
            "writing central directory: {} entries, zip64={}",
            self.entries.len(),
            zip64
        );
        Ok(self.emit(trailer))
    }

    /// Ensures the builder can begin a new entry.
    pub(crate) fn ensure_accepting_entries(&self) -> Result<()> {
        match self.state {
            BuilderState::AcceptingEntries => Ok(()),
            BuilderState::EntryInProgress => {
                Err(Error::ProtocolMisuse("previous entry is unfinished"))
            }
            BuilderState::Finished => Err(Error::ProtocolMisuse("archive already finalized")),
        }
    }

    /// Marks an entry as begun.
    pub(crate) fn claim(&mut self) -> Result<()> {
        self.ensure_accepting_entries()?;
        self.state = BuilderState::EntryInProgress;
        Ok(())
    }

    /// Creates the record of a claimed entry at the current offset.
    ///
    /// Known-size entries pass their accounting; deferred ones pass `None`.
    pub(crate) fn open_entry(
        &self,
        name: EntryName,
        method: CompressionMethod,
        modified: Option<DosDateTime>,
        known: Option<&EntryAccounting>,
    ) -> Entry {
        debug_assert_eq!(self.state, BuilderState::EntryInProgress);
        let modified = modified.unwrap_or_else(|| self.options.timestamp());
        let mut entry = Entry::new(name, method, modified, self.offset, known.is_none());
        if let Some(accounting) = known {
            entry.freeze(accounting);
        }
        entry.local_zip64 = local_needs_zip64(&entry);
        entry
    }

    /// Advances the offset past `bytes` and hands them back.
    pub(crate) fn emit(&mut self, bytes: Vec<u8>) -> Vec<u8> {
        self.offset += bytes.len() as u64;
        log::trace!("emitting {} bytes, offset now {}", bytes.len(), self.offset);
        bytes
    }

    /// Emits the local header of an opened entry.
    pub(crate) fn emit_header(&mut self, entry: &Entry) -> Vec<u8> {
        let header = encode_local_header(entry, entry.local_zip64);
        self.emit(header)
    }

    /// Freezes a deferred entry, emits its descriptor and commits it.
    pub(crate) fn finish_deferred(
        &mut self,
        mut entry: Entry,
        accounting: &EntryAccounting,
    ) -> Vec<u8> {
        entry.freeze(accounting);
        let descriptor = self.emit(encode_data_descriptor(&entry));
        self.commit(entry);
        descriptor
    }

    /// Appends a finished entry to the directory.
    pub(crate) fn commit(&mut self, entry: Entry) {
        if entry.local_zip64 || entry.needs_zip64() {
            self.zip64 = true;
        }
        log::debug!(
            "committed entry '{}': {} -> {} bytes at offset {}",
            entry.name(),
            entry.uncompressed_size(),
            entry.compressed_size(),
            entry.offset()
        );
        self.entries.push(entry);
        self.state = BuilderState::AcceptingEntries;
    }

    /// Begins an entry whose data has already been compressed.
    pub(crate) fn begin_compressed<S>(
        &mut self,
        name: EntryName,
        method: CompressionMethod,
        modified: Option<DosDateTime>,
        compressed: Vec<u8>,
        accounting: &EntryAccounting,
    ) -> Result<EntryTask<S>> {
        self.claim()?;
        let entry = self.open_entry(name, method, modified, Some(accounting));
        Ok(EntryTask::new(entry, Body::Known(compressed)))
    }

    /// Begins an entry streamed from `source` with deferred sizes.
    pub(crate) fn begin_stream<S: ChunkSource>(
        &mut self,
        name: EntryName,
        source: S,
        method: CompressionMethod,
        modified: Option<DosDateTime>,
    ) -> Result<EntryTask<S>> {
        self.ensure_accepting_entries()?;
        let stream = CompressStream::new(source, method)?;
        self.claim()?;
        let entry = self.open_entry(name, method, modified, None);
        Ok(EntryTask::new(entry, Body::Streamed(stream)))
    }

    /// Begins a folder entry: stored, zero length, no descriptor.
    pub(crate) fn begin_folder<S>(
        &mut self,
        name: EntryName,
        modified: Option<DosDateTime>,
    ) -> Result<EntryTask<S>> {
        self.claim()?;
        let entry = self.open_entry(
            name,
            CompressionMethod::Stored,
            modified,
            Some(&EntryAccounting::new()),
        );
        Ok(EntryTask::new(entry, Body::Folder))
    }
}

/// Entry data still to be emitted.
pub(crate) enum Body<S> {
    Folder,
    Known(Vec<u8>),
    Streamed(CompressStream<S>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Data,
    Done,
}

/// Per-entry state machine: header, data, optional descriptor, commit.
pub(crate) struct EntryTask<S> {
    entry: Option<Entry>,
    body: Body<S>,
    phase: Phase,
}

impl<S> std::fmt::Debug for EntryTask<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryTask")
            .field("entry", &self.entry)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<S> EntryTask<S> {
    fn new(entry: Entry, body: Body<S>) -> Self {
        Self {
            entry: Some(entry),
            body,
            phase: Phase::Header,
        }
    }
}

impl<S: ChunkSource> EntryTask<S> {
    /// Produces the entry's next bytes, or `None` once it is committed.
    ///
    /// After an error the task yields nothing more and the entry is left
    /// unfinished.
    pub(crate) fn step(&mut self, builder: &mut ZipBuilder) -> Result<Option<Vec<u8>>> {
        let result = self.advance(builder);
        if result.is_err() {
            self.phase = Phase::Done;
        }
        result
    }

    fn advance(&mut self, builder: &mut ZipBuilder) -> Result<Option<Vec<u8>>> {
        match self.phase {
            Phase::Header => {
                let Some(entry) = self.entry.as_ref() else {
                    return Ok(None);
                };
                let header = builder.emit_header(entry);
                self.phase = Phase::Data;
                let no_data = match &self.body {
                    Body::Folder => true,
                    Body::Known(data) => data.is_empty(),
                    Body::Streamed(_) => false,
                };
                if no_data {
                    self.commit(builder);
                }
                Ok(Some(header))
            }
            Phase::Data => match &mut self.body {
                Body::Folder => {
                    self.commit(builder);
                    Ok(None)
                }
                Body::Known(data) => {
                    let data = builder.emit(std::mem::take(data));
                    self.commit(builder);
                    Ok(Some(data))
                }
                Body::Streamed(stream) => match stream.next_chunk()? {
                    Some(chunk) => Ok(Some(builder.emit(chunk))),
                    None => {
                        let accounting = stream.accounting().clone();
                        self.phase = Phase::Done;
                        let Some(entry) = self.entry.take() else {
                            return Ok(None);
                        };
                        Ok(Some(builder.finish_deferred(entry, &accounting)))
                    }
                },
            },
            Phase::Done => Ok(None),
        }
    }

    fn commit(&mut self, builder: &mut ZipBuilder) {
        self.phase = Phase::Done;
        if let Some(entry) = self.entry.take() {
            builder.commit(entry);
        }
    }
}

/// Lazy sequence of the bytes one entry contributes to the archive.
///
/// Returned by the `add_*` methods of [`ZipBuilder`]. The iterator must be
/// driven to completion before the next entry can begin.
pub struct EntryChunks<'a, S = EmptySource> {
    builder: &'a mut ZipBuilder,
    task: EntryTask<S>,
}

impl<S> std::fmt::Debug for EntryChunks<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryChunks")
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

impl<'a, S: ChunkSource> EntryChunks<'a, S> {
    fn new(builder: &'a mut ZipBuilder, task: EntryTask<S>) -> Self {
        Self { builder, task }
    }

    /// Drives the entry to completion, passing each chunk to `sink`.
    pub fn for_each_chunk(
        mut self,
        mut sink: impl FnMut(&[u8]) -> Result<()>,
    ) -> Result<()> {
        while let Some(chunk) = self.task.step(self.builder)? {
            sink(&chunk)?;
        }
        Ok(())
    }

    /// Drives the entry to completion and concatenates its bytes.
    pub fn collect_bytes(self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.for_each_chunk(|chunk| {
            out.extend_from_slice(chunk);
            Ok(())
        })?;
        Ok(out)
    }
}

impl<S: ChunkSource> Iterator for EntryChunks<'_, S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.task.step(self.builder).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ZIP64_EXTRA_ID, ZIP64_SENTINEL_32, flag, signature};
    use std::io::{self, Cursor};

    fn u16_at(buf: &[u8], pos: usize) -> u16 {
        u16::from_le_bytes([buf[pos], buf[pos + 1]])
    }

    fn u32_at(buf: &[u8], pos: usize) -> u32 {
        u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap())
    }

    fn u64_at(buf: &[u8], pos: usize) -> u64 {
        u64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap())
    }

    fn fixed_builder() -> ZipBuilder {
        ZipBuilder::with_options(
            ZipOptions::new().modified(DosDateTime::new(2020, 1, 1, 0, 0, 0).unwrap()),
        )
    }

    #[test]
    fn test_offset_tracks_every_byte() {
        let mut builder = fixed_builder();
        let mut archive = Vec::new();
        archive.extend(
            builder
                .add_buf("a.txt", b"aaaa", CompressionMethod::Stored)
                .unwrap()
                .collect_bytes()
                .unwrap(),
        );
        assert_eq!(builder.offset(), archive.len() as u64);
        assert_eq!(builder.entries()[0].offset(), 0);

        archive.extend(
            builder
                .add_io("b.txt", Cursor::new(b"bbbb".to_vec()), CompressionMethod::Stored)
                .unwrap()
                .collect_bytes()
                .unwrap(),
        );
        assert_eq!(builder.entries()[1].offset(), 30 + 5 + 4);
        archive.extend(builder.end().unwrap());
        assert_eq!(builder.offset(), archive.len() as u64);
        assert_eq!(builder.summary().archive_size, archive.len() as u64);
    }

    #[test]
    fn test_buffer_entry_has_no_descriptor() {
        let mut builder = fixed_builder();
        let bytes = builder
            .add_buf("hello.txt", b"hello world", CompressionMethod::Stored)
            .unwrap()
            .collect_bytes()
            .unwrap();
        assert_eq!(u16_at(&bytes, 6) & flag::SIZES_DEFERRED, 0);
        assert_eq!(bytes.len(), 30 + 9 + 11);
        assert!(!builder.entries()[0].has_descriptor());
    }

    #[test]
    fn test_streamed_entry_has_descriptor() {
        let mut builder = fixed_builder();
        let chunks: Vec<Vec<u8>> = builder
            .add_gen(
                "gen.bin",
                vec![b"hello".to_vec(), b"world".to_vec()],
                CompressionMethod::Stored,
            )
            .unwrap()
            .map(|c| c.unwrap())
            .collect();

        // header, two data chunks, descriptor
        assert_eq!(chunks.len(), 4);
        assert_eq!(u16_at(&chunks[0], 6), flag::SIZES_DEFERRED);
        assert_eq!(u32_at(&chunks[0], 14), 0);
        let descriptor = &chunks[3];
        assert_eq!(u32_at(descriptor, 0), signature::DATA_DESCRIPTOR);
        assert_eq!(u32_at(descriptor, 8), 10);
        assert_eq!(u32_at(descriptor, 12), 10);
        assert_eq!(builder.entries()[0].crc(), crc32fast::hash(b"helloworld"));
    }

    #[test]
    fn test_folder_entry() {
        let mut builder = fixed_builder();
        let chunks: Vec<_> = builder
            .add_folder("test1/test2")
            .unwrap()
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(chunks.len(), 1);
        let entry = &builder.entries()[0];
        assert_eq!(entry.name().as_str(), "test1/test2/");
        assert!(entry.is_dir());
        assert_eq!(entry.method(), CompressionMethod::Stored);
        assert_eq!(entry.uncompressed_size(), 0);
        assert!(!entry.has_descriptor());
    }

    #[test]
    fn test_add_after_end_is_misuse() {
        let mut builder = ZipBuilder::new();
        builder.end().unwrap();
        assert!(builder.is_finished());
        let err = builder
            .add_buf("x", b"", CompressionMethod::Stored)
            .unwrap_err();
        assert!(err.is_protocol_misuse());
        assert!(builder.add_folder("d").unwrap_err().is_protocol_misuse());
        assert!(builder.end().unwrap_err().is_protocol_misuse());
    }

    #[test]
    fn test_abandoned_entry_blocks_builder() {
        let mut builder = ZipBuilder::new();
        {
            let mut chunks = builder
                .add_io("a", Cursor::new(vec![1u8; 10]), CompressionMethod::Stored)
                .unwrap();
            chunks.next().unwrap().unwrap();
        }
        let err = builder
            .add_buf("b", b"", CompressionMethod::Stored)
            .unwrap_err();
        assert!(err.is_protocol_misuse());
        assert!(builder.end().unwrap_err().is_protocol_misuse());
    }

    #[test]
    fn test_source_error_leaves_entry_unfinished() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk on fire"))
            }
        }

        let mut builder = ZipBuilder::new();
        let results: Vec<_> = builder
            .add_io("a", Broken, CompressionMethod::Stored)
            .unwrap()
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Io(_))));
        assert!(builder.entries().is_empty());
        assert!(builder.end().unwrap_err().is_protocol_misuse());
    }

    #[test]
    fn test_invalid_name_does_not_start_entry() {
        let mut builder = ZipBuilder::new();
        assert!(matches!(
            builder.add_buf("../x", b"", CompressionMethod::Stored),
            Err(Error::InvalidEntryName(_))
        ));
        builder
            .add_buf("ok", b"", CompressionMethod::Stored)
            .unwrap()
            .collect_bytes()
            .unwrap();
        assert_eq!(builder.entries().len(), 1);
    }

    #[test]
    fn test_zip64_promotion_by_offset() {
        let mut builder = fixed_builder();
        builder.offset = 5 << 30;

        let bytes = builder
            .add_buf("late.txt", b"data", CompressionMethod::Stored)
            .unwrap()
            .collect_bytes()
            .unwrap();
        // Local header carries the ZIP64 block with both sizes.
        assert_eq!(u16_at(&bytes, 4), 45);
        assert_eq!(u32_at(&bytes, 18), ZIP64_SENTINEL_32);
        assert_eq!(u16_at(&bytes, 28), 20);
        assert_eq!(u16_at(&bytes, 30 + 8), ZIP64_EXTRA_ID);
        assert_eq!(u64_at(&bytes, 30 + 8 + 4), 4);
        assert!(builder.is_zip64());

        let cd_offset = builder.offset();
        let trailer = builder.end().unwrap();
        // Central record: offset in the extra block.
        assert_eq!(u32_at(&trailer, 42), ZIP64_SENTINEL_32);
        let extra = 46 + 8;
        assert_eq!(u16_at(&trailer, extra), ZIP64_EXTRA_ID);
        assert_eq!(u16_at(&trailer, extra + 2), 8);
        assert_eq!(u64_at(&trailer, extra + 4), 5 << 30);

        let eocd64 = extra + 12;
        assert_eq!(
            u32_at(&trailer, eocd64),
            signature::ZIP64_END_OF_CENTRAL_DIRECTORY
        );
        assert_eq!(u64_at(&trailer, eocd64 + 48), cd_offset);
        assert!(builder.summary().zip64);
    }

    #[test]
    fn test_deferred_entry_past_4gib() {
        let mut builder = fixed_builder();
        builder.offset = 5 << 30;

        let data = b"streamed data".to_vec();
        let bytes = builder
            .add_io("stream.txt", Cursor::new(data.clone()), CompressionMethod::Deflated)
            .unwrap()
            .collect_bytes()
            .unwrap();

        // Local header: sentinels with a ZIP64 block of zero sizes.
        assert_eq!(u16_at(&bytes, 4), 45);
        assert_ne!(u16_at(&bytes, 6) & flag::SIZES_DEFERRED, 0);
        assert_eq!(u32_at(&bytes, 14), 0);
        assert_eq!(u32_at(&bytes, 18), ZIP64_SENTINEL_32);
        assert_eq!(u32_at(&bytes, 22), ZIP64_SENTINEL_32);
        assert_eq!(u16_at(&bytes, 28), 20);
        let extra = 30 + 10;
        assert_eq!(u16_at(&bytes, extra), ZIP64_EXTRA_ID);
        assert_eq!(u16_at(&bytes, extra + 2), 16);
        assert_eq!(u64_at(&bytes, extra + 4), 0);
        assert_eq!(u64_at(&bytes, extra + 12), 0);

        // Descriptor is wide even though both sizes are small.
        let entry = builder.entries()[0].clone();
        let descriptor = &bytes[bytes.len() - 24..];
        assert_eq!(u32_at(descriptor, 0), signature::DATA_DESCRIPTOR);
        assert_eq!(u32_at(descriptor, 4), crc32fast::hash(&data));
        assert_eq!(u64_at(descriptor, 8), entry.compressed_size());
        assert_eq!(u64_at(descriptor, 16), data.len() as u64);
        assert_eq!(
            bytes.len() as u64,
            30 + 10 + 20 + entry.compressed_size() + 24
        );
        assert!(builder.is_zip64());

        // Central record: classic sizes, only the offset in the extra block.
        let cd_offset = builder.offset();
        let trailer = builder.end().unwrap();
        assert_eq!(u32_at(&trailer, 20), entry.compressed_size() as u32);
        assert_eq!(u32_at(&trailer, 24), data.len() as u32);
        assert_eq!(u32_at(&trailer, 42), ZIP64_SENTINEL_32);
        assert_eq!(u16_at(&trailer, 30), 12);
        let extra = 46 + 10;
        assert_eq!(u16_at(&trailer, extra), ZIP64_EXTRA_ID);
        assert_eq!(u16_at(&trailer, extra + 2), 8);
        assert_eq!(u64_at(&trailer, extra + 4), 5 << 30);

        let eocd64 = extra + 12;
        assert_eq!(
            u32_at(&trailer, eocd64),
            signature::ZIP64_END_OF_CENTRAL_DIRECTORY
        );
        assert_eq!(u64_at(&trailer, eocd64 + 48), cd_offset);
        let locator = eocd64 + 56;
        assert_eq!(
            u32_at(&trailer, locator),
            signature::ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR
        );
        assert_eq!(u64_at(&trailer, locator + 8), cd_offset + 56 + 12);
    }

    #[test]
    fn test_zip64_promotion_by_size() {
        let mut builder = fixed_builder();
        let mut entry = Entry::new(
            EntryName::new("huge.bin").unwrap(),
            CompressionMethod::Stored,
            DosDateTime::MIN,
            0,
            false,
        );
        entry.uncompressed_size = 5 << 30;
        entry.compressed_size = 5 << 30;
        entry.local_zip64 = local_needs_zip64(&entry);
        assert!(entry.local_zip64);

        let header = encode_local_header(&entry, entry.local_zip64);
        assert_eq!(u16_at(&header, 28), 20);

        builder.state = BuilderState::EntryInProgress;
        builder.commit(entry);
        assert!(builder.is_zip64());

        let trailer = builder.end().unwrap();
        assert_eq!(u32_at(&trailer, 20), ZIP64_SENTINEL_32);
        assert_eq!(u32_at(&trailer, 24), ZIP64_SENTINEL_32);
        assert_eq!(u16_at(&trailer, 30), 20);
        let eocd64 = 46 + 8 + 20;
        assert_eq!(
            u32_at(&trailer, eocd64),
            signature::ZIP64_END_OF_CENTRAL_DIRECTORY
        );
    }

    #[test]
    fn test_small_archive_has_no_zip64() {
        let mut builder = fixed_builder();
        builder
            .add_buf("a", b"abc", CompressionMethod::Stored)
            .unwrap()
            .collect_bytes()
            .unwrap();
        let trailer = builder.end().unwrap();
        assert!(!builder.is_zip64());
        assert_eq!(trailer.len(), 46 + 1 + 22);
        assert_eq!(u32_at(&trailer, 47), signature::END_OF_CENTRAL_DIRECTORY);
    }

    #[test]
    fn test_summary_counts() {
        let mut builder = fixed_builder();
        builder.add_folder("d").unwrap().collect_bytes().unwrap();
        builder
            .add_buf("d/a", vec![0u8; 100], CompressionMethod::Stored)
            .unwrap()
            .collect_bytes()
            .unwrap();
        let summary = builder.summary();
        assert_eq!(summary.entries_written, 1);
        assert_eq!(summary.directories_written, 1);
        assert_eq!(summary.total_size, 100);
        assert_eq!(summary.compressed_size, 100);
    }

    #[test]
    fn test_comment_in_trailer() {
        let mut builder = ZipBuilder::with_options(ZipOptions::new().comment("abc").unwrap());
        let trailer = builder.end().unwrap();
        assert_eq!(u16_at(&trailer, 20), 3);
        assert_eq!(&trailer[22..], b"abc");
    }

    #[test]
    fn test_oversized_comment_rejected_at_end() {
        let mut options = ZipOptions::new();
        options.comment = Some("c".repeat(70_000));
        let mut builder = ZipBuilder::with_options(options);

        let err = builder.end().unwrap_err();
        assert!(matches!(err, Error::InvalidOption(_)));
        assert_eq!(builder.offset(), 0);
        assert_eq!(builder.state, BuilderState::AcceptingEntries);
    }

    #[test]
    fn test_unsupported_method_does_not_start_entry() {
        let unsupported = CompressionMethod::ALL
            .into_iter()
            .find(|m| !m.is_supported());
        if let Some(method) = unsupported {
            let mut builder = ZipBuilder::new();
            let err = builder.add_buf("x", b"x", method).unwrap_err();
            assert!(err.is_unsupported());
            builder.end().unwrap();
        }
    }
}
