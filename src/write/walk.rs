//! Directory walk adapter.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::codec::CompressionMethod;
use crate::entry_name::EntryName;
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

use super::{EntryTask, ReadSource, ZipBuilder, compress_all};

/// One filesystem item found below a walked root.
#[derive(Debug, Clone)]
pub(crate) struct WalkItem {
    pub(crate) path: PathBuf,
    pub(crate) name: EntryName,
    pub(crate) kind: WalkKind,
    pub(crate) modified: Option<DosDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WalkKind {
    Folder,
    /// A file no larger than the chunk size, read whole.
    SmallFile,
    /// A file streamed chunk by chunk.
    LargeFile,
}

/// Creates the walker used by both the blocking and cooperative adapters.
pub(crate) fn walker(root: &Path) -> walkdir::IntoIter {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
}

/// Classifies one item yielded by [`walker`].
///
/// Returns `None` for items that are neither folders nor regular files
/// (sockets, dangling links and the like). Symlink loops are errors.
pub(crate) fn classify(
    root: &Path,
    prefix: &str,
    next: walkdir::Result<walkdir::DirEntry>,
    chunk_size: usize,
) -> Result<Option<WalkItem>> {
    let dent = match next {
        Ok(dent) => dent,
        Err(e) if is_dangling(&e) => {
            log::debug!("skipping dangling link {:?}", e.path());
            return Ok(None);
        }
        Err(e) => return Err(std::io::Error::from(e).into()),
    };
    let path = dent.path();
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(_) if dent.path_is_symlink() => {
            log::debug!("skipping dangling link {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let kind = if metadata.is_dir() {
        WalkKind::Folder
    } else if metadata.is_file() {
        if metadata.len() <= chunk_size as u64 {
            WalkKind::SmallFile
        } else {
            WalkKind::LargeFile
        }
    } else {
        log::debug!("skipping special file {}", path.display());
        return Ok(None);
    };

    let relative = path.strip_prefix(root).map_err(|_| {
        Error::InvalidEntryName(format!("{} is outside the walked root", path.display()))
    })?;
    let name = EntryName::from_relative(prefix, relative, kind == WalkKind::Folder)?;
    let modified = metadata.modified().ok().map(DosDateTime::from_system_time);

    Ok(Some(WalkItem {
        path: path.to_path_buf(),
        name,
        kind,
        modified,
    }))
}

/// A link whose target does not exist.
fn is_dangling(err: &walkdir::Error) -> bool {
    err.loop_ancestor().is_none()
        && err
            .path()
            .is_some_and(|path| fs::symlink_metadata(path).is_ok_and(|m| m.is_symlink()))
        && err
            .io_error()
            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

/// Lazy sequence of the bytes contributed by every entry below a root.
///
/// Returned by [`ZipBuilder::walk`]. Walk and I/O errors are yielded and
/// end the sequence.
pub struct WalkChunks<'a> {
    builder: &'a mut ZipBuilder,
    walker: walkdir::IntoIter,
    root: PathBuf,
    prefix: String,
    method: CompressionMethod,
    current: Option<EntryTask<ReadSource<File>>>,
    failed: bool,
}

impl std::fmt::Debug for WalkChunks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkChunks")
            .field("root", &self.root)
            .field("prefix", &self.prefix)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl<'a> WalkChunks<'a> {
    pub(crate) fn new(
        builder: &'a mut ZipBuilder,
        root: &Path,
        prefix: &str,
        method: CompressionMethod,
    ) -> Self {
        Self {
            builder,
            walker: walker(root),
            root: root.to_path_buf(),
            prefix: prefix.to_string(),
            method,
            current: None,
            failed: false,
        }
    }

    fn begin(&mut self, item: WalkItem) -> Result<EntryTask<ReadSource<File>>> {
        match item.kind {
            WalkKind::Folder => self.builder.begin_folder(item.name, item.modified),
            WalkKind::SmallFile => {
                let data = fs::read(&item.path)?;
                self.builder.ensure_accepting_entries()?;
                let (compressed, accounting) = compress_all(self.method, &data)?;
                self.builder.begin_compressed(
                    item.name,
                    self.method,
                    item.modified,
                    compressed,
                    &accounting,
                )
            }
            WalkKind::LargeFile => {
                let file = File::open(&item.path)?;
                let source = ReadSource::new(file, self.builder.options.chunk_size);
                self.builder
                    .begin_stream(item.name, source, self.method, item.modified)
            }
        }
    }

    fn advance(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(task) = self.current.as_mut() {
                if let Some(chunk) = task.step(self.builder)? {
                    return Ok(Some(chunk));
                }
                self.current = None;
            }

            let Some(next) = self.walker.next() else {
                return Ok(None);
            };
            let chunk_size = self.builder.options.chunk_size;
            if let Some(item) = classify(&self.root, &self.prefix, next, chunk_size)? {
                self.current = Some(self.begin(item)?);
            }
        }
    }
}

impl Iterator for WalkChunks<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.advance();
        if result.is_err() {
            self.failed = true;
        }
        result.transpose()
    }
}
