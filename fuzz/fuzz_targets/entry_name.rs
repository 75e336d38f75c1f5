//! Fuzz target for EntryName::new with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run entry_name
//!
//! Properties checked on every accepted name:
//! - no `.` or `..` segment survives normalization
//! - no leading `/` and no backslash
//! - no NUL byte, and the length fits the 16-bit header field

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(name) = zipflow::EntryName::new(raw) else {
        return;
    };
    let normalized = name.as_str();

    assert!(!normalized.starts_with('/'), "absolute name: {normalized:?}");
    assert!(!normalized.contains('\\'), "backslash kept: {normalized:?}");
    assert!(!normalized.contains('\0'), "NUL byte: {normalized:?}");
    assert!(normalized.len() <= u16::MAX as usize);
    let body = normalized.strip_suffix('/').unwrap_or(normalized);
    assert!(
        body.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != ".."),
        "bad segment in {normalized:?}"
    );
});
