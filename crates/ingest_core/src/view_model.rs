use crate::{AuthState, Notice, Outcome, StepView, SubmissionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView {
    pub question: String,
    pub answer: String,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub auth: AuthState,
    pub submission: SubmissionState,
    pub task_id: Option<String>,
    pub task_outcome: Option<Outcome>,
    /// Five entries while a task exists, empty otherwise.
    pub steps: Vec<StepView>,
    pub completed: bool,
    pub embed_snippet: Option<String>,
    pub answer: Option<AnswerView>,
    pub notice: Option<Notice>,
    pub busy: bool,
    pub dirty: bool,
}
