use std::fmt;

use serde::Deserialize;

/// Results flowing back from the engine thread, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    LoginCompleted(Result<String, ApiError>),
    SignupCompleted(Result<(), ApiError>),
    UploadCompleted(Result<UploadReceipt, ApiError>),
    ScrapeCompleted(Result<TaskTicket, ApiError>),
    AskCompleted(Result<Answer, ApiError>),
    /// One `data` payload from the status stream.
    StatusFrame { task_id: String, data: String },
    StreamFailed { task_id: String, error: ApiError },
    /// The server closed the status stream.
    StreamEnded { task_id: String },
}

/// Body of a successful `/upload-and-process` call. Every field is optional;
/// the client only needs the status code to proceed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub chunks_created: Option<u64>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskTicket {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Answer {
    pub response: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// The engine thread is gone; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("engine thread has stopped")]
pub struct EngineStopped;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
    /// Human-readable `detail` from the error body, when the server sent one.
    pub detail: Option<String>,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::Unauthorized => Some(401),
            FailureKind::HttpStatus(code) => Some(code),
            _ => None,
        }
    }

    /// Server detail if present, otherwise the transport message.
    pub fn user_message(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Unauthorized,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
