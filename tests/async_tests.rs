//! Async API integration tests.
//!
//! These tests require the `async` feature to be enabled.

#![cfg(feature = "async")]

mod common;

use std::io::Cursor;

use futures::{TryStreamExt, stream};
use zipflow::{AsyncZipStreamWriter, CompressionMethod, ZipBuilder, ZipOptions};

#[tokio::test]
async fn test_async_writer_roundtrip() {
    let data = common::random_bytes(150_000, 21);

    let mut writer = AsyncZipStreamWriter::create(Vec::new()).options(common::fixed_options());
    writer
        .add_buf("hello.txt", b"hello async".to_vec(), CompressionMethod::Deflated)
        .await
        .unwrap();
    writer
        .add_io("random.bin", Cursor::new(data.clone()), CompressionMethod::Stored)
        .await
        .unwrap();
    writer
        .add_gen(
            "gen.txt",
            stream::iter(vec![b"hello".to_vec(), b"world".to_vec()]),
            CompressionMethod::Deflated,
        )
        .await
        .unwrap();
    writer.add_folder("empty").await.unwrap();
    let (summary, bytes) = writer.finish_into_inner().await.unwrap();

    assert_eq!(summary.archive_size, bytes.len() as u64);
    let entries = common::read_back(&bytes);
    assert_eq!(common::entry(&entries, "hello.txt").data, b"hello async");
    assert_eq!(common::entry(&entries, "random.bin").data, data);
    assert_eq!(common::entry(&entries, "gen.txt").data, b"helloworld");
    assert!(common::entry(&entries, "empty/").is_dir);
}

#[tokio::test]
async fn test_cooperative_matches_blocking_archive() {
    let data = common::random_bytes(90_000, 5);
    let text = b"lorem ipsum dolor sit amet ".repeat(500);

    for method in common::supported_methods() {
        let mut blocking = ZipBuilder::with_options(common::fixed_options());
        let mut expected = Vec::new();
        common::drain(blocking.add_buf("text.txt", &text, method).unwrap(), &mut expected);
        common::drain(
            blocking
                .add_io("data.bin", Cursor::new(data.clone()), method)
                .unwrap(),
            &mut expected,
        );
        expected.extend(blocking.end().unwrap());

        let mut cooperative = ZipBuilder::with_options(common::fixed_options());
        let mut actual: Vec<u8> = Vec::new();
        let chunks: Vec<Vec<u8>> = cooperative
            .add_buf_async("text.txt", text.clone(), method)
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        actual.extend(chunks.concat());
        let chunks: Vec<Vec<u8>> = cooperative
            .add_io_async("data.bin", Cursor::new(data.clone()), method)
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        actual.extend(chunks.concat());
        actual.extend(cooperative.end().unwrap());

        assert_eq!(actual, expected, "{method}");
    }
}

#[tokio::test]
async fn test_async_walk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("a.txt"), b"small").unwrap();
    std::fs::write(dir.path().join("sub").join("b.bin"), common::random_bytes(20_000, 8)).unwrap();

    let options = ZipOptions::new().chunk_size(4096).unwrap();
    let mut writer = AsyncZipStreamWriter::create(Vec::new()).options(options);
    writer.walk(dir.path(), "/").await.unwrap();
    let (_, bytes) = writer.finish_into_inner().await.unwrap();

    let entries = common::read_back(&bytes);
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "sub/", "sub/b.bin"]);
    assert_eq!(
        common::entry(&entries, "sub/b.bin").data,
        common::random_bytes(20_000, 8)
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_async_walk_descends_into_symlinked_folder() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("real")).unwrap();
    std::fs::write(dir.path().join("real").join("f.txt"), b"linked").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();

    let mut writer = AsyncZipStreamWriter::create(Vec::new());
    writer.walk(dir.path(), "").await.unwrap();
    let (_, bytes) = writer.finish_into_inner().await.unwrap();

    let entries = common::read_back(&bytes);
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["alias/", "alias/f.txt", "real/", "real/f.txt"]);
    assert_eq!(common::entry(&entries, "alias/f.txt").data, b"linked");
}

#[tokio::test]
async fn test_async_reader_from_tokio_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.bin");
    let data = common::random_bytes(50_000, 13);
    std::fs::write(&path, &data).unwrap();

    let file = tokio::fs::File::open(&path).await.unwrap();
    let mut writer = AsyncZipStreamWriter::create(Vec::new());
    writer
        .add_reader("input.bin", file, CompressionMethod::Deflated)
        .await
        .unwrap();
    let (_, bytes) = writer.finish_into_inner().await.unwrap();

    let entries = common::read_back(&bytes);
    assert_eq!(entries[0].data, data);
}

#[cfg(unix)]
#[tokio::test]
async fn test_subprocess_output_stream() {
    let mut child = tokio::process::Command::new("echo")
        .arg("hello from a subprocess")
        .stdout(std::process::Stdio::piped())
        .spawn()
        .unwrap();
    let stdout = child.stdout.take().unwrap();

    let mut writer = AsyncZipStreamWriter::create(Vec::new());
    writer
        .add_reader("echo.txt", stdout, CompressionMethod::Deflated)
        .await
        .unwrap();
    child.wait().await.unwrap();
    let (_, bytes) = writer.finish_into_inner().await.unwrap();

    let entries = common::read_back(&bytes);
    assert_eq!(entries[0].data, b"hello from a subprocess\n");
}

#[tokio::test]
async fn test_dropped_stream_blocks_builder() {
    let mut builder = ZipBuilder::new();
    {
        let mut chunks = builder
            .add_io_async("partial", Cursor::new(vec![1u8; 10]), CompressionMethod::Stored)
            .unwrap();
        // Header only.
        let _header = futures::StreamExt::next(&mut chunks).await.unwrap().unwrap();
    }
    assert!(builder.end().unwrap_err().is_protocol_misuse());
}

#[tokio::test]
async fn test_unpolled_buffer_stream_does_not_claim() {
    let mut builder = ZipBuilder::new();
    drop(
        builder
            .add_buf_async("never", b"data".to_vec(), CompressionMethod::Stored)
            .unwrap(),
    );
    let trailer = builder.end().unwrap();
    assert_eq!(trailer.len(), 22);
}
