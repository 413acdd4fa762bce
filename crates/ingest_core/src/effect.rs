use std::path::PathBuf;

use crate::Credentials;

/// Work the app must perform on behalf of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Login(Credentials),
    Signup {
        credentials: Credentials,
        username: String,
    },
    /// Answered by [`crate::Msg::SessionSaved`].
    PersistToken(String),
    /// Answered by [`crate::Msg::SessionCleared`].
    ClearToken,
    UploadFile {
        path: PathBuf,
        token: String,
    },
    ScrapeUrl {
        url: String,
        token: String,
    },
    Subscribe {
        task_id: String,
    },
    CloseStream {
        task_id: String,
    },
    PresentEmbed {
        snippet: String,
    },
    Ask {
        question: String,
        collection: String,
    },
    Notify(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient notification; the one place failures are shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
