//! Fuzz target streaming arbitrary chunks through the archive builder.
//!
//! Run with: cargo +nightly fuzz run build_archive
//!
//! The first byte picks the compression method, the rest is split into
//! chunks on every 0xFF byte. The emitted byte count must always match the
//! builder offset and the archive must end with an EOCD record.

#![no_main]

use libfuzzer_sys::fuzz_target;
use zipflow::{CompressionMethod, ZipBuilder};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let method = CompressionMethod::ALL[usize::from(selector) % CompressionMethod::ALL.len()];
    let chunks: Vec<&[u8]> = payload.split(|&b| b == 0xFF).collect();
    let joined = chunks.concat();

    let mut builder = ZipBuilder::new();
    let mut archive = Vec::new();
    for chunk in builder.add_gen("fuzz.bin", chunks, method).unwrap() {
        archive.extend(chunk.unwrap());
    }
    for chunk in builder.add_buf("copy.bin", &joined, method).unwrap() {
        archive.extend(chunk.unwrap());
    }
    archive.extend(builder.end().unwrap());

    assert_eq!(archive.len() as u64, builder.offset());
    let eocd = archive.len() - 22;
    assert_eq!(&archive[eocd..eocd + 4], b"PK\x05\x06");
    let entries = builder.entries();
    assert_eq!(entries[0].crc(), entries[1].crc());
    assert_eq!(entries[0].uncompressed_size(), joined.len() as u64);
});
