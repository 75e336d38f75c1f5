//! Record encoding for ZIP archives.
//!
//! This module encodes the local file header, the data descriptor, the
//! central directory records and the end of central directory trailer
//! (classic and ZIP64).

use crate::format::{
    self, CENTRAL_DIRECTORY_HEADER_SIZE, END_OF_CENTRAL_DIRECTORY_SIZE, LOCAL_FILE_HEADER_SIZE,
    MAX_16, ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE, ZIP64_EXTRA_ID, ZIP64_LOCATOR_SIZE,
    ZIP64_SENTINEL_16, ZIP64_SENTINEL_32, signature, version,
};

use super::entry::{Entry, exceeds_32};

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Stores `value` in a 32-bit field, or the sentinel if it overflows.
fn field_32(value: u64) -> u32 {
    if exceeds_32(value) {
        ZIP64_SENTINEL_32
    } else {
        value as u32
    }
}

/// Stores an entry count in a 16-bit field, or the sentinel if it overflows.
fn field_16(value: u64) -> u16 {
    if value >= MAX_16 {
        ZIP64_SENTINEL_16
    } else {
        value as u16
    }
}

/// Encodes the local file header of `entry`.
///
/// Deferred entries carry zero CRC and sizes. With `zip64` set the size
/// fields hold the sentinel and the real sizes (zero when deferred) go into
/// a ZIP64 extra block.
pub(crate) fn encode_local_header(entry: &Entry, zip64: bool) -> Vec<u8> {
    let deferred = entry.has_descriptor();
    let (crc, compressed, uncompressed) = if deferred {
        (0, 0, 0)
    } else {
        (entry.crc, entry.compressed_size, entry.uncompressed_size)
    };

    let mut extra = Vec::new();
    if zip64 {
        put_u16(&mut extra, ZIP64_EXTRA_ID);
        put_u16(&mut extra, 16);
        put_u64(&mut extra, uncompressed);
        put_u64(&mut extra, compressed);
    }

    let name = entry.name.as_bytes();
    let mut buf = Vec::with_capacity(LOCAL_FILE_HEADER_SIZE + name.len() + extra.len());
    put_u32(&mut buf, signature::LOCAL_FILE_HEADER);
    put_u16(&mut buf, entry.version_needed(zip64));
    put_u16(&mut buf, entry.flags);
    put_u16(&mut buf, entry.method.code());
    put_u16(&mut buf, entry.modified.time());
    put_u16(&mut buf, entry.modified.date());
    put_u32(&mut buf, crc);
    if zip64 {
        put_u32(&mut buf, ZIP64_SENTINEL_32);
        put_u32(&mut buf, ZIP64_SENTINEL_32);
    } else {
        put_u32(&mut buf, compressed as u32);
        put_u32(&mut buf, uncompressed as u32);
    }
    put_u16(&mut buf, name.len() as u16);
    put_u16(&mut buf, extra.len() as u16);
    buf.extend_from_slice(name);
    buf.extend_from_slice(&extra);
    buf
}

/// Returns true if the local header of an entry should carry a ZIP64 block.
///
/// Deferred entries decide by offset alone; their sizes are not known yet.
pub(crate) fn local_needs_zip64(entry: &Entry) -> bool {
    exceeds_32(entry.offset)
        || (!entry.has_descriptor()
            && (exceeds_32(entry.compressed_size) || exceeds_32(entry.uncompressed_size)))
}

/// Encodes the data descriptor that follows a deferred entry's data.
///
/// Sizes are 8 bytes wide when the local header used ZIP64 or either size
/// overflows 32 bits.
pub(crate) fn encode_data_descriptor(entry: &Entry) -> Vec<u8> {
    let wide = entry.local_zip64
        || exceeds_32(entry.compressed_size)
        || exceeds_32(entry.uncompressed_size);

    let mut buf = Vec::with_capacity(24);
    put_u32(&mut buf, signature::DATA_DESCRIPTOR);
    put_u32(&mut buf, entry.crc);
    if wide {
        put_u64(&mut buf, entry.compressed_size);
        put_u64(&mut buf, entry.uncompressed_size);
    } else {
        put_u32(&mut buf, entry.compressed_size as u32);
        put_u32(&mut buf, entry.uncompressed_size as u32);
    }
    buf
}

/// Builds the ZIP64 extra block of a central record, holding only the
/// fields that overflow, in the order uncompressed, compressed, offset.
fn central_zip64_extra(entry: &Entry) -> Vec<u8> {
    let mut body = Vec::new();
    if exceeds_32(entry.uncompressed_size) {
        put_u64(&mut body, entry.uncompressed_size);
    }
    if exceeds_32(entry.compressed_size) {
        put_u64(&mut body, entry.compressed_size);
    }
    if exceeds_32(entry.offset) {
        put_u64(&mut body, entry.offset);
    }
    if body.is_empty() {
        return body;
    }

    let mut extra = Vec::with_capacity(4 + body.len());
    put_u16(&mut extra, ZIP64_EXTRA_ID);
    put_u16(&mut extra, body.len() as u16);
    extra.extend_from_slice(&body);
    extra
}

/// Encodes the central directory record of a finished entry.
pub(crate) fn encode_central_record(entry: &Entry) -> Vec<u8> {
    let extra = central_zip64_extra(entry);
    let zip64 = !extra.is_empty();
    let name = entry.name.as_bytes();

    let mut buf = Vec::with_capacity(CENTRAL_DIRECTORY_HEADER_SIZE + name.len() + extra.len());
    put_u32(&mut buf, signature::CENTRAL_DIRECTORY);
    put_u16(&mut buf, entry.version_made_by(zip64));
    put_u16(&mut buf, entry.version_needed(zip64));
    put_u16(&mut buf, entry.flags);
    put_u16(&mut buf, entry.method.code());
    put_u16(&mut buf, entry.modified.time());
    put_u16(&mut buf, entry.modified.date());
    put_u32(&mut buf, entry.crc);
    put_u32(&mut buf, field_32(entry.compressed_size));
    put_u32(&mut buf, field_32(entry.uncompressed_size));
    put_u16(&mut buf, name.len() as u16);
    put_u16(&mut buf, extra.len() as u16);
    put_u16(&mut buf, 0); // comment length
    put_u16(&mut buf, 0); // disk number start
    put_u16(&mut buf, 0); // internal attributes
    put_u32(&mut buf, entry.external_attributes());
    put_u32(&mut buf, field_32(entry.offset));
    buf.extend_from_slice(name);
    buf.extend_from_slice(&extra);
    buf
}

/// Encodes the central directory and the end of central directory records.
///
/// `cd_offset` is the archive offset at which the directory starts. The
/// ZIP64 record and locator are emitted when `force_zip64` is set or any
/// trailer value overflows its classic field. `comment` must already be
/// within the 16-bit length limit. Returns the encoded bytes and whether
/// the ZIP64 records were written.
pub(crate) fn encode_trailer(
    entries: &[Entry],
    cd_offset: u64,
    comment: &[u8],
    force_zip64: bool,
) -> (Vec<u8>, bool) {
    let mut buf = Vec::new();
    for entry in entries {
        buf.extend(encode_central_record(entry));
    }

    let cd_size = buf.len() as u64;
    let count = entries.len() as u64;
    let zip64 = force_zip64 || count >= MAX_16 || exceeds_32(cd_size) || exceeds_32(cd_offset);

    if zip64 {
        let eocd64_offset = cd_offset + cd_size;
        buf.reserve(ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE + ZIP64_LOCATOR_SIZE);

        put_u32(&mut buf, signature::ZIP64_END_OF_CENTRAL_DIRECTORY);
        // Size of the remaining record, excluding the leading 12 bytes.
        put_u64(&mut buf, (ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE - 12) as u64);
        put_u16(&mut buf, (format::HOST_UNIX << 8) | version::ZIP64);
        put_u16(&mut buf, version::ZIP64);
        put_u32(&mut buf, 0); // this disk
        put_u32(&mut buf, 0); // disk with central directory
        put_u64(&mut buf, count);
        put_u64(&mut buf, count);
        put_u64(&mut buf, cd_size);
        put_u64(&mut buf, cd_offset);

        put_u32(&mut buf, signature::ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR);
        put_u32(&mut buf, 0); // disk with ZIP64 record
        put_u64(&mut buf, eocd64_offset);
        put_u32(&mut buf, 1); // total disks
    }

    debug_assert!(comment.len() <= usize::from(u16::MAX));
    buf.reserve(END_OF_CENTRAL_DIRECTORY_SIZE + comment.len());
    put_u32(&mut buf, signature::END_OF_CENTRAL_DIRECTORY);
    put_u16(&mut buf, 0); // this disk
    put_u16(&mut buf, 0); // disk with central directory
    put_u16(&mut buf, field_16(count));
    put_u16(&mut buf, field_16(count));
    put_u32(&mut buf, field_32(cd_size));
    put_u32(&mut buf, field_32(cd_offset));
    put_u16(&mut buf, comment.len() as u16);
    buf.extend_from_slice(comment);

    (buf, zip64)
}
