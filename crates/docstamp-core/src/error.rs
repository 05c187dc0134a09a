use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StampError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Malformed PDF document: {0}")]
    MalformedDocument(String),

    #[error("Invalid signature image: {0}")]
    InvalidImage(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Stable, transport-independent classification of a [`StampError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInput,
    InvalidInput,
    NotFound,
    MalformedDocument,
    InvalidImage,
    InvalidPage,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MalformedDocument => "malformed_document",
            ErrorKind::InvalidImage => "invalid_image",
            ErrorKind::InvalidPage => "invalid_page",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StampError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StampError::MissingInput(_) => ErrorKind::MissingInput,
            StampError::InvalidInput(_) => ErrorKind::InvalidInput,
            StampError::NotFound(_) => ErrorKind::NotFound,
            StampError::MalformedDocument(_) => ErrorKind::MalformedDocument,
            StampError::InvalidImage(_) => ErrorKind::InvalidImage,
            StampError::InvalidPage(_) => ErrorKind::InvalidPage,
            StampError::Storage(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, StampError>;
