//! Ingest core: pure client state machine and view-model helpers.
//!
//! Nothing in this crate performs IO. The app feeds [`Msg`]s into [`update`]
//! and executes the returned [`Effect`]s against the ingestion service.
mod effect;
mod embed;
mod error;
mod msg;
mod phase;
mod progress;
mod state;
mod submission;
mod token;
mod update;
mod view_model;

pub use effect::{Effect, Notice, NoticeLevel};
pub use embed::{render_embed_snippet, WidgetConfig};
pub use error::ClientError;
pub use msg::{Credentials, Msg};
pub use phase::{step_markers, Phase, StepStatus};
pub use progress::{Outcome, PhaseReport, ProgressTracker, StatusEvent, StepView, Transition};
pub use state::{
    ActiveTask, AppState, AuthState, Completion, CompletionSource, SubmissionKind,
    SubmissionState,
};
pub use submission::{resolve_submission, Submission, ALLOWED_EXTENSIONS};
pub use token::{decode_claims, try_decode_claims, Claims, DecodeError, Session};
pub use update::update;
pub use view_model::{AnswerView, AppViewModel};
