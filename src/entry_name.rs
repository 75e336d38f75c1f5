//! Entry name type with validation and normalization.

use crate::{Error, Result};
use std::fmt;
use std::path::{Component, Path};

/// Maximum length of an entry name in bytes.
///
/// The name length is stored in a 16-bit field of both the local header and
/// the central directory record.
const MAX_NAME_LENGTH: usize = 0xFFFF;

/// A validated entry name as stored in the archive.
///
/// `EntryName` normalizes names to use forward slashes, strips leading
/// slashes, and validates that:
/// - The name is not empty
/// - No NUL bytes are present
/// - No empty segments exist (no `a//b`)
/// - No `.` or `..` segments are present
///
/// A single trailing `/` is kept and marks a folder entry.
///
/// # Examples
///
/// ```
/// use zipflow::EntryName;
///
/// let name = EntryName::new("dir\\file.txt").unwrap();
/// assert_eq!(name.as_str(), "dir/file.txt");
///
/// let folder = EntryName::folder("test1/test2").unwrap();
/// assert_eq!(folder.as_str(), "test1/test2/");
/// assert!(folder.is_dir());
///
/// assert!(EntryName::new("../secret").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryName(String);

impl EntryName {
    /// Creates a new `EntryName`, normalizing separators and validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntryName`] if the name:
    /// - Is empty after stripping leading slashes
    /// - Contains NUL bytes
    /// - Contains empty segments (e.g., `a//b`)
    /// - Contains `.` or `..` segments
    /// - Is longer than 65535 bytes
    pub fn new(s: &str) -> Result<Self> {
        let normalized = normalize(s);
        validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// Creates a folder name, appending `/` if it is missing.
    pub fn folder(s: &str) -> Result<Self> {
        let mut normalized = normalize(s);
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// Builds a name from an archive-internal prefix and a path relative to
    /// a walked root.
    ///
    /// The prefix may be empty or `/`; both place the entry at the archive
    /// root.
    pub(crate) fn from_relative(prefix: &str, relative: &Path, is_dir: bool) -> Result<Self> {
        let mut joined = String::from(prefix);
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        Error::InvalidEntryName(format!(
                            "path is not valid UTF-8: {}",
                            relative.display()
                        ))
                    })?;
                    if !joined.is_empty() && !joined.ends_with(['/', '\\']) {
                        joined.push('/');
                    }
                    joined.push_str(part);
                }
                Component::CurDir => {}
                _ => {
                    return Err(Error::InvalidEntryName(format!(
                        "path is not relative to the walked root: {}",
                        relative.display()
                    )));
                }
            }
        }

        if is_dir {
            Self::folder(&joined)
        } else {
            Self::new(&joined)
        }
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name as raw bytes, as they are written to the archive.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns the encoded length of the name in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; empty names are rejected at construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if this name denotes a folder (ends with `/`).
    pub fn is_dir(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns true if the name needs the UTF-8 flag to be read correctly.
    pub fn needs_utf8_flag(&self) -> bool {
        !self.0.is_ascii()
    }
}

fn normalize(s: &str) -> String {
    s.replace('\\', "/").trim_start_matches('/').to_string()
}

fn validate(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::InvalidEntryName("empty name".into()));
    }

    if s.contains('\0') {
        return Err(Error::InvalidEntryName("contains NUL byte".into()));
    }

    if s.len() > MAX_NAME_LENGTH {
        return Err(Error::InvalidEntryName(format!(
            "name exceeds maximum length of {} bytes",
            MAX_NAME_LENGTH
        )));
    }

    let body = s.strip_suffix('/').unwrap_or(s);
    for segment in body.split('/') {
        if segment.is_empty() {
            return Err(Error::InvalidEntryName(
                "empty segment (consecutive slashes)".into(),
            ));
        }
        if segment == "." {
            return Err(Error::InvalidEntryName("'.' segment not allowed".into()));
        }
        if segment == ".." {
            return Err(Error::InvalidEntryName(
                "'..' segment not allowed (path traversal)".into(),
            ));
        }
    }

    Ok(())
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for EntryName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntryName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl TryFrom<&String> for EntryName {
    type Error = Error;

    fn try_from(s: &String) -> Result<Self> {
        Self::new(s)
    }
}
