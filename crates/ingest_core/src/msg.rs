use std::fmt;
use std::path::PathBuf;

use crate::{ClientError, StatusEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Token read from the session store at startup, if any.
    SessionRestored { token: Option<String>, now: i64 },
    /// User submitted the login form.
    LoginSubmitted(Credentials),
    /// Login call returned a token.
    LoginSucceeded { token: String },
    LoginFailed(ClientError),
    /// User submitted the signup form.
    SignupSubmitted {
        credentials: Credentials,
        username: String,
    },
    SignupSucceeded,
    SignupFailed(ClientError),
    LogoutClicked,
    /// Outcome of writing the token to the session store.
    SessionSaved(Result<(), String>),
    /// Outcome of removing the stored token.
    SessionCleared(Result<(), String>),
    /// User asked to process a URL or a file.
    SubmitClicked {
        url: Option<String>,
        file: Option<PathBuf>,
    },
    /// File upload finished processing server-side.
    UploadSucceeded {
        file_name: String,
        chunks_created: Option<u64>,
    },
    /// URL submission accepted; progress follows on the status stream.
    ScrapeAccepted { task_id: String },
    /// Submission call failed (either path).
    SubmissionFailed(ClientError),
    /// One event from the status stream of `task_id`.
    ProgressReceived { task_id: String, event: StatusEvent },
    /// Status stream transport failure.
    StreamFailed { task_id: String, message: String },
    /// Status stream closed by the server.
    StreamEnded { task_id: String },
    /// User asked the widget backend a question about their collection.
    AskSubmitted { question: String },
    AnswerReceived {
        answer: String,
        conversation_id: Option<String>,
    },
    AskFailed(ClientError),
    /// Render tick.
    Tick,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<hidden>")
            .finish()
    }
}
