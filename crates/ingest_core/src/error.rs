/// User-facing failures. Every one of them ends up as a single notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Missing or unusable input, detected before any request is made.
    #[error("{0}")]
    Validation(String),
    /// Credential or session failure.
    #[error("{0}")]
    Auth(String),
    /// The server rejected the bearer token mid-flow.
    #[error("Session expired. Please login again.")]
    SessionExpired,
    /// The server refused a submission.
    #[error("{}", describe_ingestion(.status, .detail))]
    Ingestion {
        status: Option<u16>,
        detail: Option<String>,
    },
    /// The progress stream failed at the transport level.
    #[error("{0}")]
    Stream(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }
}

fn describe_ingestion(status: &Option<u16>, detail: &Option<String>) -> String {
    match (detail, status) {
        (Some(detail), _) => detail.clone(),
        (None, Some(status)) => format!("Processing request failed (HTTP {status})"),
        (None, None) => "Processing request failed".to_string(),
    }
}
