//! Cooperative archive building for async runtimes.
//!
//! The async adapters produce exactly the same bytes as their blocking
//! counterparts on [`ZipBuilder`]. Raw data is awaited on the runtime, while
//! every compression step (and every blocking read) is moved to Tokio's
//! blocking pool so the event loop never stalls on CPU work.
//!
//! # Example
//!
//! ```rust,ignore
//! use zipflow::{AsyncZipStreamWriter, CompressionMethod};
//!
//! #[tokio::main]
//! async fn main() -> zipflow::Result<()> {
//!     let file = tokio::fs::File::create("archive.zip").await?;
//!     let mut writer = AsyncZipStreamWriter::create(file);
//!
//!     writer
//!         .add_buf("hello.txt", b"Hello, World!".to_vec(), CompressionMethod::Deflated)
//!         .await?;
//!     writer.walk("./assets", "assets").await?;
//!
//!     let summary = writer.finish().await?;
//!     println!("Wrote {} entries", summary.entries_written);
//!     Ok(())
//! }
//! ```

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use crate::codec::CompressionMethod;
use crate::entry_name::EntryName;
use crate::timestamp::DosDateTime;
use crate::write::walk::{WalkItem, WalkKind, classify, walker};
use crate::write::{
    ArchiveSummary, CompressState, CompressStream, EmptySource, Entry, EntryAccounting, EntryTask,
    ReadSource, ZipBuilder, ZipOptions, compress_all,
};
use crate::{Error, Result};

/// Stream of archive bytes produced by one async adapter call.
pub type ChunkStream<'a> = BoxStream<'a, Result<Vec<u8>>>;

/// Raw, uncompressed chunks awaited on the runtime.
type RawStream<'a> = BoxStream<'a, io::Result<Vec<u8>>>;

/// Blocking reader moved to a worker thread for every step.
type BlockingStream = CompressStream<ReadSource<Box<dyn Read + Send>>>;

/// Runs `f` on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(io::Error::other(e)))
}

// =============================================================================
// Cooperative entry driver
// =============================================================================

/// Where the raw data of a streamed entry comes from.
enum Driver<'a> {
    /// A blocking reader: each read and its compression run on a worker.
    Blocking(Option<BlockingStream>),
    /// Chunks awaited on the runtime, each compressed on a worker.
    Chunks {
        source: RawStream<'a>,
        state: Option<CompressState>,
        exhausted: bool,
    },
}

impl Driver<'_> {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self {
            Driver::Blocking(slot) => {
                let mut current = slot
                    .take()
                    .ok_or(Error::ProtocolMisuse("entry stream resumed after a failure"))?;
                let (current, result) = run_blocking(move || {
                    let result = current.next_chunk();
                    (current, result)
                })
                .await?;
                *slot = Some(current);
                result
            }
            Driver::Chunks {
                source,
                state,
                exhausted,
            } => loop {
                if *exhausted {
                    return Ok(None);
                }
                let raw = source.next().await.transpose()?;
                let mut current = state
                    .take()
                    .ok_or(Error::ProtocolMisuse("entry stream resumed after a failure"))?;
                let (current, result) = match raw {
                    Some(raw) => {
                        run_blocking(move || {
                            let result = current.feed(&raw);
                            (current, result)
                        })
                        .await?
                    }
                    None => {
                        *exhausted = true;
                        run_blocking(move || {
                            let result = current.finish();
                            (current, result)
                        })
                        .await?
                    }
                };
                *state = Some(current);
                let out = result?;
                if !out.is_empty() {
                    return Ok(Some(out));
                }
            },
        }
    }

    fn accounting(&self) -> Option<&EntryAccounting> {
        match self {
            Driver::Blocking(slot) => slot.as_ref().map(|s| s.accounting()),
            Driver::Chunks { state, .. } => state.as_ref().map(|s| s.accounting()),
        }
    }
}

/// Async counterpart of the per-entry state machine.
enum CoopTask<'a> {
    /// Nothing blocking left to do: folders and compressed buffers.
    Ready(EntryTask<EmptySource>),
    /// A buffer still waiting for its one-shot compression.
    Buffer {
        name: EntryName,
        data: Vec<u8>,
        method: CompressionMethod,
        modified: Option<DosDateTime>,
    },
    /// A deferred-size entry fed by a driver.
    Streamed {
        entry: Option<Entry>,
        header_sent: bool,
        driver: Driver<'a>,
    },
    Done,
}

impl CoopTask<'_> {
    /// Produces the entry's next bytes, or `None` once it is committed.
    async fn step(&mut self, builder: &mut ZipBuilder) -> Result<Option<Vec<u8>>> {
        let result = self.advance(builder).await;
        if result.is_err() {
            *self = CoopTask::Done;
        }
        result
    }

    async fn advance(&mut self, builder: &mut ZipBuilder) -> Result<Option<Vec<u8>>> {
        loop {
            match self {
                CoopTask::Done => return Ok(None),
                CoopTask::Ready(task) => return task.step(builder),
                CoopTask::Buffer { .. } => {
                    if let CoopTask::Buffer {
                        name,
                        data,
                        method,
                        modified,
                    } = std::mem::replace(self, CoopTask::Done)
                    {
                        let (compressed, accounting) =
                            run_blocking(move || compress_all(method, &data)).await??;
                        let task = builder.begin_compressed(
                            name,
                            method,
                            modified,
                            compressed,
                            &accounting,
                        )?;
                        *self = CoopTask::Ready(task);
                    }
                }
                CoopTask::Streamed {
                    entry,
                    header_sent,
                    driver,
                } => {
                    if !*header_sent {
                        *header_sent = true;
                        let Some(entry) = entry.as_ref() else {
                            return Ok(None);
                        };
                        return Ok(Some(builder.emit_header(entry)));
                    }
                    if let Some(chunk) = driver.next_chunk().await? {
                        return Ok(Some(builder.emit(chunk)));
                    }
                    let accounting = driver.accounting().cloned().unwrap_or_default();
                    let entry = entry.take();
                    *self = CoopTask::Done;
                    return Ok(entry.map(|entry| builder.finish_deferred(entry, &accounting)));
                }
            }
        }
    }
}

/// Turns a task into a stream that borrows the builder until it ends.
fn entry_stream<'a>(builder: &'a mut ZipBuilder, task: CoopTask<'a>) -> ChunkStream<'a> {
    stream::unfold(Some((builder, task)), |state| async move {
        let (builder, mut task) = state?;
        match task.step(builder).await {
            Ok(Some(chunk)) => Some((Ok(chunk), Some((builder, task)))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
    .boxed()
}

// =============================================================================
// Async adapters
// =============================================================================

impl ZipBuilder {
    /// Async form of [`add_buf`](Self::add_buf).
    ///
    /// The buffer is compressed on the blocking pool; the entry begins once
    /// that compression has finished.
    pub fn add_buf_async(
        &mut self,
        name: &str,
        data: impl Into<Vec<u8>>,
        method: CompressionMethod,
    ) -> Result<ChunkStream<'_>> {
        let name = EntryName::new(name)?;
        self.ensure_accepting_entries()?;
        if !method.is_supported() {
            return Err(Error::UnsupportedMethod {
                method: method.code(),
            });
        }
        let task = CoopTask::Buffer {
            name,
            data: data.into(),
            method,
            modified: None,
        };
        Ok(entry_stream(self, task))
    }

    /// Async form of [`add_io`](Self::add_io) for blocking readers.
    ///
    /// Each read, together with the compression of what it returned, runs
    /// on the blocking pool.
    pub fn add_io_async<R>(
        &mut self,
        name: &str,
        reader: R,
        method: CompressionMethod,
    ) -> Result<ChunkStream<'_>>
    where
        R: Read + Send + 'static,
    {
        let name = EntryName::new(name)?;
        self.ensure_accepting_entries()?;
        let reader: Box<dyn Read + Send> = Box::new(reader);
        let stream = CompressStream::new(ReadSource::new(reader, self.options.chunk_size), method)?;
        self.begin_cooperative(name, method, None, Driver::Blocking(Some(stream)))
    }

    /// Adds an entry read from an [`AsyncRead`] source of unknown length.
    pub fn add_reader_async<'a, R>(
        &'a mut self,
        name: &str,
        reader: R,
        method: CompressionMethod,
    ) -> Result<ChunkStream<'a>>
    where
        R: AsyncRead + Send + 'a,
    {
        let chunk_size = self.options.chunk_size;
        let source = ReaderStream::with_capacity(reader, chunk_size)
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        self.begin_chunks(name, source, method, None)
    }

    /// Async form of [`add_gen`](Self::add_gen) for a stream of chunks.
    pub fn add_gen_async<'a, S>(
        &'a mut self,
        name: &str,
        chunks: S,
        method: CompressionMethod,
    ) -> Result<ChunkStream<'a>>
    where
        S: Stream + Send + 'a,
        S::Item: AsRef<[u8]>,
    {
        let source = chunks.map(|chunk| Ok(chunk.as_ref().to_vec())).boxed();
        self.begin_chunks(name, source, method, None)
    }

    /// Async form of [`walk`](Self::walk).
    ///
    /// Directory traversal runs on the blocking pool one item at a time;
    /// file contents are read with Tokio's async file API.
    pub fn walk_async(&mut self, root: impl AsRef<Path>, prefix: &str) -> Result<ChunkStream<'_>> {
        self.ensure_accepting_entries()?;
        let method = self.options.method;
        let root = root.as_ref().to_path_buf();
        let walk = CoopWalk {
            walker: Some(walker(&root)),
            root,
            prefix: prefix.to_string(),
            method,
            builder: self,
            current: None,
        };
        Ok(stream::unfold(Some(walk), |state| async move {
            let mut walk = state?;
            match walk.advance().await {
                Ok(Some(chunk)) => Some((Ok(chunk), Some(walk))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
        .boxed())
    }

    fn begin_chunks<'a>(
        &'a mut self,
        name: &str,
        source: RawStream<'a>,
        method: CompressionMethod,
        modified: Option<DosDateTime>,
    ) -> Result<ChunkStream<'a>> {
        let name = EntryName::new(name)?;
        self.ensure_accepting_entries()?;
        let driver = Driver::Chunks {
            source,
            state: Some(CompressState::new(method)?),
            exhausted: false,
        };
        self.begin_cooperative(name, method, modified, driver)
    }

    fn begin_cooperative<'a>(
        &'a mut self,
        name: EntryName,
        method: CompressionMethod,
        modified: Option<DosDateTime>,
        driver: Driver<'a>,
    ) -> Result<ChunkStream<'a>> {
        let task = self.claim_streamed(name, method, modified, driver)?;
        Ok(entry_stream(self, task))
    }

    fn claim_streamed<'a>(
        &mut self,
        name: EntryName,
        method: CompressionMethod,
        modified: Option<DosDateTime>,
        driver: Driver<'a>,
    ) -> Result<CoopTask<'a>> {
        self.claim()?;
        let entry = self.open_entry(name, method, modified, None);
        Ok(CoopTask::Streamed {
            entry: Some(entry),
            header_sent: false,
            driver,
        })
    }
}

/// State of a cooperative directory walk.
struct CoopWalk<'a> {
    builder: &'a mut ZipBuilder,
    walker: Option<walkdir::IntoIter>,
    root: PathBuf,
    prefix: String,
    method: CompressionMethod,
    current: Option<CoopTask<'static>>,
}

impl CoopWalk<'_> {
    async fn advance(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(task) = self.current.as_mut() {
                if let Some(chunk) = task.step(self.builder).await? {
                    return Ok(Some(chunk));
                }
                self.current = None;
            }

            let Some(mut walker) = self.walker.take() else {
                return Ok(None);
            };
            let root = self.root.clone();
            let prefix = self.prefix.clone();
            let chunk_size = self.builder.options.chunk_size;
            let (walker, next) = run_blocking(move || {
                let next = walker
                    .next()
                    .map(|next| classify(&root, &prefix, next, chunk_size));
                (walker, next)
            })
            .await?;

            let Some(item) = next else {
                return Ok(None);
            };
            self.walker = Some(walker);
            if let Some(item) = item? {
                self.current = Some(self.begin(item).await?);
            }
        }
    }

    async fn begin(&mut self, item: WalkItem) -> Result<CoopTask<'static>> {
        match item.kind {
            WalkKind::Folder => Ok(CoopTask::Ready(
                self.builder.begin_folder(item.name, item.modified)?,
            )),
            WalkKind::SmallFile => Ok(CoopTask::Buffer {
                data: tokio::fs::read(&item.path).await?,
                name: item.name,
                method: self.method,
                modified: item.modified,
            }),
            WalkKind::LargeFile => {
                let file = tokio::fs::File::open(&item.path).await?;
                let source = ReaderStream::with_capacity(file, self.builder.options.chunk_size)
                    .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                    .boxed();
                let driver = Driver::Chunks {
                    source,
                    state: Some(CompressState::new(self.method)?),
                    exhausted: false,
                };
                self.builder
                    .claim_streamed(item.name, self.method, item.modified, driver)
            }
        }
    }
}

// =============================================================================
// Sink-backed writer
// =============================================================================

/// Writes an archive into an [`AsyncWrite`] sink.
///
/// Async counterpart of [`ZipStreamWriter`](crate::ZipStreamWriter).
#[derive(Debug)]
pub struct AsyncZipStreamWriter<W> {
    sink: W,
    builder: ZipBuilder,
}

impl<W: AsyncWrite + Unpin> AsyncZipStreamWriter<W> {
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
    pub async fn add_buf(
        &mut self,
        name: &str,
        data: impl Into<Vec<u8>>,
        method: CompressionMethod,
    ) -> Result<()> {
        let chunks = self.builder.add_buf_async(name, data, method)?;
        drain(chunks, &mut self.sink).await
    }

    /// Adds an entry read from a blocking source of unknown length.
    pub async fn add_io<R>(&mut self, name: &str, reader: R, method: CompressionMethod) -> Result<()>
    where
        R: Read + Send + 'static,
    {
        let chunks = self.builder.add_io_async(name, reader, method)?;
        drain(chunks, &mut self.sink).await
    }

    /// Adds an entry read from an async source of unknown length.
    pub async fn add_reader<R>(
        &mut self,
        name: &str,
        reader: R,
        method: CompressionMethod,
    ) -> Result<()>
    where
        R: AsyncRead + Send,
    {
        let chunks = self.builder.add_reader_async(name, reader, method)?;
        drain(chunks, &mut self.sink).await
    }

    /// Adds an entry fed from a stream of chunks.
    pub async fn add_gen<S>(&mut self, name: &str, chunks: S, method: CompressionMethod) -> Result<()>
    where
        S: Stream + Send,
        S::Item: AsRef<[u8]>,
    {
        let chunks = self.builder.add_gen_async(name, chunks, method)?;
        drain(chunks, &mut self.sink).await
    }

    /// Adds a folder entry.
    pub async fn add_folder(&mut self, name: &str) -> Result<()> {
        let bytes = self.builder.add_folder(name)?.collect_bytes()?;
        self.sink.write_all(&bytes).await?;
        Ok(())
    }

    /// Adds everything below `root` under the archive-internal `prefix`.
    pub async fn walk(&mut self, root: impl AsRef<Path>, prefix: &str) -> Result<()> {
        let chunks = self.builder.walk_async(root, prefix)?;
        drain(chunks, &mut self.sink).await
    }

    /// Writes the trailer, flushes the sink and returns the summary.
    pub async fn finish(self) -> Result<ArchiveSummary> {
        self.finish_into_inner().await.map(|(summary, _)| summary)
    }

    /// Like [`finish`](Self::finish), also handing back the sink.
    pub async fn finish_into_inner(mut self) -> Result<(ArchiveSummary, W)> {
        let trailer = self.builder.end()?;
        self.sink.write_all(&trailer).await?;
        self.sink.flush().await?;
        Ok((self.builder.summary(), self.sink))
    }
}

async fn drain<W: AsyncWrite + Unpin>(mut chunks: ChunkStream<'_>, sink: &mut W) -> Result<()> {
    while let Some(chunk) = chunks.next().await {
        sink.write_all(&chunk?).await?;
    }
    Ok(())
}
