//! Text rendering of the view model.

use ingest_core::{AnswerView, AppViewModel, Notice, NoticeLevel, StepStatus, StepView};

pub fn step_lines(view: &AppViewModel) -> Vec<String> {
    view.steps
        .iter()
        .enumerate()
        .map(|(i, step)| step_line(i + 1, step))
        .collect()
}

fn step_line(position: usize, step: &StepView) -> String {
    let marker = match step.status {
        StepStatus::Completed => "[x]",
        StepStatus::Active => "[>]",
        StepStatus::Pending => "[ ]",
    };
    let mut line = format!("{marker} {position}. {}", step.phase.label());
    if let Some(progress) = step.progress {
        line.push_str(&format!(" {progress:>3}%"));
    }
    if let Some(message) = step.message.as_deref().filter(|m| !m.is_empty()) {
        line.push_str(" - ");
        line.push_str(message);
    }
    line
}

pub fn notice_line(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("{tag}: {}", notice.message)
}

pub fn embed_block(snippet: &str) -> String {
    format!("Embed this snippet in your page to add the chat widget:\n\n    {snippet}\n")
}

pub fn answer_block(answer: &AnswerView) -> String {
    let mut text = format!("Q: {}\nA: {}", answer.question, answer.answer);
    if let Some(id) = &answer.conversation_id {
        text.push_str(&format!("\n(conversation {id})"));
    }
    text
}

pub fn whoami(view: &AppViewModel) -> String {
    match (&view.user_id, &view.email) {
        (Some(user_id), Some(email)) => format!("{email} (collection {user_id})"),
        (Some(user_id), None) => format!("collection {user_id}"),
        _ => "Not logged in.".to_string(),
    }
}

/// Prints step lines that changed since the previous render.
#[derive(Debug, Default)]
pub struct StepPrinter {
    last: Vec<String>,
}

impl StepPrinter {
    pub fn changed(&mut self, view: &AppViewModel) -> Vec<String> {
        let lines = step_lines(view);
        let changed = lines
            .iter()
            .enumerate()
            .filter(|(i, line)| self.last.get(*i) != Some(*line))
            .map(|(_, line)| line.clone())
            .collect();
        self.last = lines;
        changed
    }
}
