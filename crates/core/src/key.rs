//! Hierarchical keys
//!
//! A [`Key`] is a slash-separated path such as `/blocks/CIQ...`. Its canonical
//! string form is what ends up in the `key` column of the backing table, so
//! every write and every prefix read goes through the same canonicalization.
//!
//! ## Contract
//!
//! Canonical form:
//! - Always starts with `/`
//! - Never ends with `/` (except the root key `/` itself)
//! - Never contains empty segments (`//`)
//! - `.` segments are dropped and `..` removes the preceding segment,
//!   never climbing above the root
//!
//! Canonicalization is pure and idempotent:
//! `Key::new(Key::new(s).as_str()) == Key::new(s)`.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Path separator between key segments
pub const SEPARATOR: char = '/';

/// Separator between the type and value of a namespace (`type:value`)
pub const TYPE_SEPARATOR: char = ':';

/// A canonical hierarchical key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    path: String,
}

impl Key {
    /// Create a key from any string, canonicalizing it
    ///
    /// ```
    /// use sqlds_core::Key;
    ///
    /// assert_eq!(Key::new("a/b/").as_str(), "/a/b");
    /// assert_eq!(Key::new("//a//b").as_str(), "/a/b");
    /// assert_eq!(Key::new("").as_str(), "/");
    /// ```
    pub fn new(s: impl AsRef<str>) -> Self {
        Key {
            path: clean(s.as_ref()),
        }
    }

    /// Create a key from a string that is already canonical
    ///
    /// Unlike [`Key::new`] this does not rewrite the input; it rejects it if
    /// it is not in canonical form.
    pub fn raw(s: impl Into<String>) -> Result<Self, KeyError> {
        let path = s.into();
        if !path.starts_with(SEPARATOR) {
            return Err(KeyError::NotRooted);
        }
        if path.len() > 1 && path.ends_with(SEPARATOR) {
            return Err(KeyError::TrailingSeparator);
        }
        if path.len() > 1 {
            for segment in path[1..].split(SEPARATOR) {
                match segment {
                    "" => return Err(KeyError::EmptySegment),
                    "." | ".." => return Err(KeyError::RelativeSegment),
                    _ => {}
                }
            }
        }
        Ok(Key { path })
    }

    /// The root key `/`
    pub fn root() -> Self {
        Key {
            path: SEPARATOR.to_string(),
        }
    }

    /// Canonical string form, used as the storage row identifier
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Consume the key and return its canonical string
    pub fn into_string(self) -> String {
        self.path
    }

    /// True for the root key `/`
    pub fn is_root(&self) -> bool {
        self.path.len() == 1
    }

    /// Key segments, root excluded: `/a/b:c` → `["a", "b:c"]`
    pub fn namespaces(&self) -> Vec<&str> {
        self.segments().collect()
    }

    /// Alias of [`Key::namespaces`]
    pub fn list(&self) -> Vec<&str> {
        self.namespaces()
    }

    /// Last segment of the key, empty for the root
    pub fn base_namespace(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    /// Type part of the last namespace: `/a/b:c` → `b`
    ///
    /// Empty when the last namespace has no type.
    pub fn type_name(&self) -> &str {
        match self.base_namespace().rsplit_once(TYPE_SEPARATOR) {
            Some((kind, _)) => kind,
            None => "",
        }
    }

    /// Value part of the last namespace: `/a/b:c` → `c`, `/a/b` → `b`
    pub fn name(&self) -> &str {
        let base = self.base_namespace();
        match base.rsplit_once(TYPE_SEPARATOR) {
            Some((_, value)) => value,
            None => base,
        }
    }

    /// Parent key; the parent of a top-level key (and of the root) is the root
    pub fn parent(&self) -> Key {
        match self.path.rfind(SEPARATOR) {
            Some(0) | None => Key::root(),
            Some(idx) => Key {
                path: self.path[..idx].to_string(),
            },
        }
    }

    /// Append another key below this one
    pub fn child(&self, other: &Key) -> Key {
        if self.is_root() {
            other.clone()
        } else if other.is_root() {
            self.clone()
        } else {
            Key {
                path: format!("{}{}", self.path, other.path),
            }
        }
    }

    /// Append a raw string below this key, canonicalizing the result
    pub fn child_string(&self, s: &str) -> Key {
        Key::new(format!("{}{}{}", self.path, SEPARATOR, s))
    }

    /// True if `other` lies strictly below this key
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        if other.path.len() <= self.path.len() {
            return false;
        }
        if self.is_root() {
            return true;
        }
        other.path.starts_with(&self.path)
            && other.path.as_bytes()[self.path.len()] == SEPARATOR as u8
    }

    /// True if this key lies strictly below `other`
    pub fn is_descendant_of(&self, other: &Key) -> bool {
        other.is_ancestor_of(self)
    }

    /// True for keys with exactly one segment
    pub fn is_top_level(&self) -> bool {
        self.segments().count() == 1
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split(SEPARATOR).filter(|s| !s.is_empty())
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::root()
    }
}

/// Keys order segment by segment, so `/a/b` sorts before `/a-c`
///
/// Query results come back in bytewise order of the canonical string, where
/// `/a-c` sorts first. Compare [`Key::as_str`] to reproduce store order.
impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments().cmp(other.segments())
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::new(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::new(s)
    }
}

/// Lexically canonicalize a slash path, rooted at `/`
fn clean(s: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in s.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return SEPARATOR.to_string();
    }

    let mut out = String::with_capacity(s.len() + 1);
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment);
    }
    out
}

/// Errors for keys that are required to already be canonical
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key does not start with `/`
    #[error("Key must start with '/'")]
    NotRooted,

    /// Key ends with `/`
    #[error("Key cannot end with '/'")]
    TrailingSeparator,

    /// Key contains `//`
    #[error("Key cannot contain empty segments")]
    EmptySegment,

    /// Key contains a `.` or `..` segment
    #[error("Key cannot contain '.' or '..' segments")]
    RelativeSegment,
}

impl KeyError {
    /// Short machine-readable reason
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyError::NotRooted => "not_rooted",
            KeyError::TrailingSeparator => "trailing_separator",
            KeyError::EmptySegment => "empty_segment",
            KeyError::RelativeSegment => "relative_segment",
        }
    }
}
