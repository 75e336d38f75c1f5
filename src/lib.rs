//! # zipflow
//!
//! A streaming ZIP/ZIP64 archive builder that never seeks backward.
//!
//! Archives are produced as a lazy sequence of byte chunks. Entries are
//! added one at a time from in-memory buffers, blocking readers, chunk
//! iterators, async streams or whole directory trees, and each entry is
//! compressed while it is being pulled. Because nothing is ever patched
//! after it has been emitted, the output can go straight to a pipe, a
//! socket or an HTTP response body.
//!
//! ## Quick Start
//!
//! ### Pulling chunks from the builder
//!
//! ```rust
//! use zipflow::{CompressionMethod, ZipBuilder};
//!
//! let mut builder = ZipBuilder::new();
//! let mut archive = Vec::new();
//!
//! for chunk in builder.add_buf("hello.txt", b"Hello, World!", CompressionMethod::Deflated)? {
//!     archive.extend(chunk?);
//! }
//! for chunk in builder.add_gen("parts.txt", [b"a".as_slice(), b"b"], CompressionMethod::Stored)? {
//!     archive.extend(chunk?);
//! }
//! archive.extend(builder.end()?);
//!
//! assert_eq!(builder.offset(), archive.len() as u64);
//! # Ok::<(), zipflow::Error>(())
//! ```
//!
//! ### Writing into a sink
//!
//! ```rust,no_run
//! use std::fs::File;
//! use zipflow::{CompressionMethod, ZipOptions, ZipStreamWriter};
//!
//! fn main() -> zipflow::Result<()> {
//!     let options = ZipOptions::new()
//!         .method(CompressionMethod::Deflated)
//!         .comment("nightly backup")?;
//!     let mut writer = ZipStreamWriter::create(File::create("backup.zip")?).options(options);
//!
//!     writer.walk("./data", "data")?;
//!     writer.add_io("log.txt", File::open("app.log")?, CompressionMethod::Bzip2)?;
//!
//!     let summary = writer.finish()?;
//!     println!(
//!         "Wrote {} entries ({:.1}% compression)",
//!         summary.entries_written,
//!         summary.space_savings() * 100.0
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate compression (method 8) |
//! | `bzip2` | Yes | BZip2 compression (method 12) |
//! | `lzma` | Yes | LZMA compression (method 14) |
//! | `async` | No | Cooperative API with Tokio integration |
//!
//! Stored entries (method 0) are always available.
//!
//! ## Async API
//!
//! Enable the `async` feature for Tokio-based cooperative building. The
//! compression work is moved off the event loop:
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use zipflow::{CompressionMethod, ZipBuilder};
//!
//! #[tokio::main]
//! async fn main() -> zipflow::Result<()> {
//!     let mut builder = ZipBuilder::new();
//!     let child = tokio::process::Command::new("echo")
//!         .arg("hello")
//!         .stdout(std::process::Stdio::piped())
//!         .spawn()?;
//!     let stdout = child.stdout.expect("piped");
//!
//!     let chunks: Vec<Vec<u8>> = builder
//!         .add_reader_async("echo.txt", stdout, CompressionMethod::Deflated)?
//!         .try_collect()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## ZIP64
//!
//! ZIP64 records are emitted only when they are needed: an entry's size
//! or offset reaches `0xFFFFFFFF`, or the entry count reaches `0xFFFF`.
//! Small archives stay plain ZIP and open with any reader.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`:
//!
//! ```rust
//! use zipflow::{CompressionMethod, Error, ZipBuilder};
//!
//! let mut builder = ZipBuilder::new();
//! builder.end()?;
//!
//! match builder.add_buf("late.txt", b"", CompressionMethod::Stored) {
//!     Err(e) if e.is_protocol_misuse() => {}
//!     other => panic!("unexpected: {:?}", other.map(|_| ())),
//! }
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod checksum;
pub mod codec;
pub mod entry_name;
pub mod error;
pub mod format;
pub mod timestamp;
pub mod write;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod async_write;

pub use codec::CompressionMethod;
pub use entry_name::EntryName;
pub use error::{Error, Result};
pub use timestamp::DosDateTime;

// Re-export writing API at crate root for convenience
pub use write::{ArchiveSummary, ZipBuilder, ZipOptions, ZipStreamWriter};

// Async API re-exports (requires "async" feature)
#[cfg(feature = "async")]
pub use async_write::AsyncZipStreamWriter;
