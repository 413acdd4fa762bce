use crate::view_model::{AnswerView, AppViewModel};
use crate::{Notice, Outcome, ProgressTracker, Session, WidgetConfig};

/// Single-flight guard for submissions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting(SubmissionKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionKind {
    Url { url: String },
    File { file_name: String },
}

/// Guard for auth-adjacent one-shot calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Idle,
    LoggingIn { email: String },
    SigningUp,
    /// Logged in; waiting for the token to reach the session store.
    SavingSession { greeting: String },
    LoggingOut,
    Asking { question: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTask {
    pub task_id: String,
    pub url: String,
    pub tracker: ProgressTracker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSource {
    Crawl {
        url: String,
    },
    Upload {
        file_name: String,
        chunks_created: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub collection: String,
    pub embed_snippet: String,
    pub source: CompletionSource,
}

/// The whole client state. Owned by one controller and replaced through
/// [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    widget: WidgetConfig,
    session: Option<Session>,
    auth: AuthState,
    submission: SubmissionState,
    task: Option<ActiveTask>,
    completion: Option<Completion>,
    answer: Option<AnswerView>,
    notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_widget(widget: WidgetConfig) -> Self {
        Self {
            widget,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let steps = self
            .task
            .as_ref()
            .map(|task| task.tracker.steps())
            .unwrap_or_default();
        AppViewModel {
            authenticated: self.session.is_some(),
            user_id: self.session.as_ref().map(|s| s.user_id.clone()),
            email: self.session.as_ref().and_then(|s| s.email.clone()),
            auth: self.auth.clone(),
            submission: self.submission.clone(),
            task_id: self.task.as_ref().map(|t| t.task_id.clone()),
            task_outcome: self.task.as_ref().map(|t| t.tracker.outcome().clone()),
            steps,
            completed: self.completion.is_some(),
            embed_snippet: self.completion.as_ref().map(|c| c.embed_snippet.clone()),
            answer: self.answer.clone(),
            notice: self.notice.clone(),
            busy: self.is_busy(),
            dirty: self.dirty,
        }
    }

    /// True while a call is in flight or a stream is being followed.
    pub fn is_busy(&self) -> bool {
        self.auth != AuthState::Idle
            || self.submission != SubmissionState::Idle
            || self
                .task
                .as_ref()
                .is_some_and(|task| !task.tracker.is_terminal())
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn task(&self) -> Option<&ActiveTask> {
        self.task.as_ref()
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    pub fn widget(&self) -> &WidgetConfig {
        &self.widget
    }

    pub(crate) fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub(crate) fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Drop every session and task field in one step. Widget config survives.
    pub(crate) fn reset(&mut self) {
        self.session = None;
        self.auth = AuthState::Idle;
        self.submission = SubmissionState::Idle;
        self.task = None;
        self.completion = None;
        self.answer = None;
        self.dirty = true;
    }

    pub(crate) fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
        self.dirty = true;
    }

    pub(crate) fn set_auth(&mut self, auth: AuthState) {
        self.auth = auth;
        self.dirty = true;
    }

    pub(crate) fn set_submission(&mut self, submission: SubmissionState) {
        self.submission = submission;
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.dirty = true;
    }

    pub(crate) fn set_answer(&mut self, answer: AnswerView) {
        self.answer = Some(answer);
        self.dirty = true;
    }

    pub(crate) fn set_completion(&mut self, completion: Completion) {
        self.completion = Some(completion);
        self.dirty = true;
    }

    pub(crate) fn start_task(&mut self, task_id: String, url: String) {
        self.task = Some(ActiveTask {
            task_id,
            url,
            tracker: ProgressTracker::new(),
        });
        self.dirty = true;
    }

    /// Clear task and completion. Returns the id of a stream still open.
    pub(crate) fn take_task(&mut self) -> Option<String> {
        self.completion = None;
        self.dirty = true;
        self.task
            .take()
            .filter(|task| !task.tracker.is_terminal())
            .map(|task| task.task_id)
    }

    /// The active task, when `task_id` names it and it is still running.
    pub(crate) fn running_task_mut(&mut self, task_id: &str) -> Option<&mut ActiveTask> {
        self.task
            .as_mut()
            .filter(|task| task.task_id == task_id && task.tracker.outcome() == &Outcome::Running)
    }
}
