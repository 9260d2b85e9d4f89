use std::fmt;

use thiserror::Error;

/// What kind of named entry an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    File,
    Chat,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Folder => f.write_str("folder"),
            ItemKind::File => f.write_str("file"),
            ItemKind::Chat => f.write_str("chat"),
        }
    }
}

/// A user-supplied name was rejected. Nothing was mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must be between {min} and {max} characters (got {len})")]
    InvalidLength { len: usize, min: usize, max: usize },

    #[error("a {kind} named \"{name}\" already exists")]
    DuplicateName { kind: ItemKind, name: String },
}

/// An index path does not describe a node of the current tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("index {index} out of range at depth {depth} (folder has {len} children)")]
    IndexOutOfRange {
        depth: usize,
        index: usize,
        len: usize,
    },

    #[error("node at depth {depth} is a file and has no children")]
    NotAFolder { depth: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("no chat named \"{name}\"")]
    ChatNotFound { name: String },

    #[error("expected a {expected}, found a {found}")]
    WrongKind { expected: ItemKind, found: ItemKind },
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("persisted tree root is not a folder")]
    InvalidRoot,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("service responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{message}")]
    Service { message: String },

    #[error("Invalid response from server: {reason}")]
    InvalidResponse { reason: String },

    #[error("{reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    /// The string shown to the user when a remote call fails.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Request(e) if e.is_timeout() => {
                "The captioning service took too long to respond.".to_string()
            }
            ApiError::Request(e) if e.is_connect() => {
                "Could not reach the captioning service.".to_string()
            }
            ApiError::Request(e) => format!("An error occurred: {}", e),
            ApiError::Status { status, .. } => {
                format!("An error occurred: the service returned status {}", status)
            }
            ApiError::Service { message } => message.clone(),
            ApiError::InvalidResponse { reason } => {
                format!("Invalid response from server: {}", reason)
            }
            ApiError::InvalidUrl { reason, .. } => reason.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CaptutorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<ValidationError> for CaptutorError {
    fn from(e: ValidationError) -> Self {
        CaptutorError::Store(e.into())
    }
}

impl From<PathError> for CaptutorError {
    fn from(e: PathError) -> Self {
        CaptutorError::Store(e.into())
    }
}

pub type Result<T> = std::result::Result<T, CaptutorError>;
