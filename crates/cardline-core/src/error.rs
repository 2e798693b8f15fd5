//! Row-level error type shared by both pipeline passes

use crate::http::HttpError;

/// Failure processing a single row.
///
/// Row errors never abort a run: the pipeline logs them and records
/// `(name, set, message)` in the pass's error table. The `Display` output is
/// exactly what lands in the `ErrorMessage` column.
#[derive(Debug)]
pub enum RowError {
    /// Card lookup answered with a non-success status
    Lookup {
        name: String,
        set_code: String,
        status: u16,
    },
    /// Card lookup succeeded but carried no usable image field
    NotFound { name: String, set_code: String },
    /// Image download answered with a non-success status
    Fetch { status: u16, url: String },
    /// Image host answered with a non-success status
    Upload { status: u16, payload: String },
    /// A success response whose payload could not be understood
    Decode(String),
    /// Transport failure (connect, timeout, truncated body)
    Http(HttpError),
    /// Local file could not be read or written
    Io(std::io::Error),
    /// Input record ended before a required column
    ShortRow { column: &'static str },
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lookup {
                name,
                set_code,
                status,
            } => write!(f, "Error fetching {name} ({set_code}): {status}"),
            Self::NotFound { name, set_code } => {
                write!(f, "Image uris not found for {name} ({set_code})")
            }
            Self::Fetch { status, url } => write!(f, "Image download failed ({status}): {url}"),
            Self::Upload { status, payload } => {
                write!(f, "Failed to upload image (status {status}). Response: {payload}")
            }
            Self::Decode(msg) => write!(f, "Malformed response: {msg}"),
            Self::Http(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
            Self::ShortRow { column } => write!(f, "Row has no {column} field"),
        }
    }
}

impl std::error::Error for RowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl RowError {
    /// Short stable label, used to break failures down in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lookup { .. } => "lookup",
            Self::NotFound { .. } => "not_found",
            Self::Fetch { .. } => "fetch",
            Self::Upload { .. } => "upload",
            Self::Decode(_) => "decode",
            Self::Http(_) => "http",
            Self::Io(_) => "io",
            Self::ShortRow { .. } => "short_row",
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Lookup { status, .. } | Self::Fetch { status, .. } | Self::Upload { status, .. } => {
                Some(*status)
            }
            Self::Http(HttpError::Http { status, .. }) => *status,
            _ => None,
        }
    }
}

impl From<HttpError> for RowError {
    fn from(e: HttpError) -> Self {
        Self::Http(e)
    }
}

impl From<reqwest::Error> for RowError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(HttpError::from_reqwest(e))
    }
}

impl From<std::io::Error> for RowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
