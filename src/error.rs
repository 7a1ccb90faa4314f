//! Error types for galley operations.

use thiserror::Error;

/// Errors that can occur while reading, prefixing or merging packages.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML in {member}: {reason}")]
    MalformedXml { member: String, reason: String },

    #[error("Missing package member: {0}")]
    MissingMember(String),

    #[error("Missing required element: {0}")]
    MissingElement(String),

    #[error("Missing attribute {attribute} on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    #[error("Invalid structure path: {0}")]
    InvalidPath(String),

    #[error("Structure path matched nothing: {0}")]
    PathNotFound(String),

    #[error("Page {requested} out of range (package has {available} pages)")]
    PageOutOfRange { requested: usize, available: usize },

    #[error("Package must be staged before {0}")]
    NotStaged(&'static str),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Attach the member name to a parse error raised without one.
    pub(crate) fn in_member(self, name: &str) -> Self {
        match self {
            Error::MalformedXml { member, reason } if member.is_empty() => Error::MalformedXml {
                member: name.to_string(),
                reason,
            },
            Error::Xml(e) => Error::MalformedXml {
                member: name.to_string(),
                reason: e.to_string(),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
