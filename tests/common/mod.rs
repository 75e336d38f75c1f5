//! Shared test utilities for integration tests.
//!
//! Archives produced by zipflow are read back with the `zip` crate, an
//! independent implementation, to prove that readers accept them.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Cursor, Read};

use rand::{RngCore, SeedableRng};
use zipflow::{CompressionMethod, DosDateTime, ZipOptions};

/// One entry as seen by the `zip` crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadEntry {
    pub name: String,
    pub is_dir: bool,
    pub data: Vec<u8>,
    pub crc: u32,
    pub unix_mode: Option<u32>,
}

/// Methods compiled into this build.
pub fn supported_methods() -> Vec<CompressionMethod> {
    CompressionMethod::ALL
        .into_iter()
        .filter(|m| m.is_supported())
        .collect()
}

/// Options with a fixed timestamp so that archives are reproducible.
pub fn fixed_options() -> ZipOptions {
    ZipOptions::new().modified(DosDateTime::new(2021, 3, 14, 15, 9, 26).unwrap())
}

/// Deterministic incompressible payload.
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut buf = vec![0u8; len];
    rng.fill_bytes(&mut buf);
    buf
}

/// Appends every chunk of an entry (or walk) to `out`.
pub fn drain<I>(chunks: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = zipflow::Result<Vec<u8>>>,
{
    for chunk in chunks {
        out.extend(chunk.expect("chunk failed"));
    }
}

/// Opens an archive with the `zip` crate.
pub fn open(bytes: &[u8]) -> zip::ZipArchive<Cursor<&[u8]>> {
    zip::ZipArchive::new(Cursor::new(bytes)).expect("zip crate rejected the archive")
}

/// Reads every entry back, decompressing and checking its CRC.
pub fn read_back(bytes: &[u8]) -> Vec<ReadEntry> {
    let mut archive = open(bytes);
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let is_lzma = {
            let file = archive.by_index_raw(index).unwrap();
            file.compression() == zip::CompressionMethod::Lzma
        };
        let entry = if is_lzma {
            read_lzma(&mut archive, index)
        } else {
            let mut file = archive.by_index(index).unwrap();
            let mut data = Vec::new();
            // The zip crate verifies the CRC at end of stream.
            file.read_to_end(&mut data).unwrap();
            ReadEntry {
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                crc: file.crc32(),
                unix_mode: file.unix_mode(),
                data,
            }
        };
        entries.push(entry);
    }
    entries
}

/// LZMA entries are decoded from their raw bytes with lzma-rust2.
fn read_lzma(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, index: usize) -> ReadEntry {
    let mut file = archive.by_index_raw(index).unwrap();
    let mut raw = Vec::new();
    file.read_to_end(&mut raw).unwrap();
    let data = decode_lzma(&raw);
    assert_eq!(data.len() as u64, file.size());
    assert_eq!(crc32fast::hash(&data), file.crc32());
    ReadEntry {
        name: file.name().to_string(),
        is_dir: file.is_dir(),
        crc: file.crc32(),
        unix_mode: file.unix_mode(),
        data,
    }
}

/// Decodes a ZIP LZMA payload: 9-byte properties header, then raw LZMA
/// terminated by an end marker.
#[cfg(feature = "lzma")]
pub fn decode_lzma(raw: &[u8]) -> Vec<u8> {
    assert_eq!(&raw[..4], &[0x09, 0x04, 0x05, 0x00]);
    let dict_size = u32::from_le_bytes(raw[5..9].try_into().unwrap());
    let mut reader =
        lzma_rust2::LzmaReader::new_with_props(&raw[9..], u64::MAX, raw[4], dict_size, None)
            .unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    out
}

#[cfg(not(feature = "lzma"))]
pub fn decode_lzma(_raw: &[u8]) -> Vec<u8> {
    panic!("LZMA entry found without the lzma feature")
}

/// Finds an entry by name.
pub fn entry<'a>(entries: &'a [ReadEntry], name: &str) -> &'a ReadEntry {
    entries
        .iter()
        .find(|e| e.name == name)
        .unwrap_or_else(|| panic!("no entry named {name}"))
}

/// Little-endian helpers for poking at raw records.
pub fn u16_at(buf: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([buf[pos], buf[pos + 1]])
}

pub fn u32_at(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap())
}
