//! Card identity and image artifact naming

use std::fmt;

/// Characters that must never reach a filesystem path.
///
/// `/` shows up in split and double-faced card names ("Fire // Ice").
pub const UNSAFE_PATH_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replacement for every unsafe character
pub const PATH_SUBSTITUTE: char = ';';

/// (name, set code) pair identifying a row across tables
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardKey {
    pub name: String,
    pub set_code: String,
}

impl CardKey {
    pub fn new(name: impl Into<String>, set_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            set_code: set_code.into(),
        }
    }

    /// Deterministic artifact filename: `<name>_<set>.jpg`, path-safe.
    ///
    /// The set code goes through [`sanitize_name`] as well as the name. Real
    /// set codes are alphanumeric, so this only matters for hand-edited input,
    /// where a `/` in the set column would otherwise escape `image_dir`.
    pub fn image_file_name(&self) -> String {
        format!(
            "{}_{}.jpg",
            sanitize_name(&self.name),
            sanitize_name(&self.set_code)
        )
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.set_code)
    }
}

/// Where the card database says the artwork lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocation(pub String);

impl ImageLocation {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Substitute [`PATH_SUBSTITUTE`] for every character in [`UNSAFE_PATH_CHARS`].
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if UNSAFE_PATH_CHARS.contains(&c) {
                PATH_SUBSTITUTE
            } else {
                c
            }
        })
        .collect()
}
