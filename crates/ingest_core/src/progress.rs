use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::phase::{step_markers, Phase, StepStatus};

/// One message from the status stream.
///
/// Either `{ "error": "..." }` or a full snapshot
/// `{ "states": { phase: {...} }, "current_state": phase, "is_complete": bool }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StatusEvent {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub states: Option<BTreeMap<String, PhaseReport>>,
    #[serde(default)]
    pub current_state: Option<String>,
    #[serde(default)]
    pub is_complete: Option<bool>,
}

impl StatusEvent {
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PhaseReport {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_percent")]
    pub progress: Option<u8>,
}

fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|value| value.is_finite())
        .map(|value| value.round().clamp(0.0, 100.0) as u8))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Running,
    Completed,
    Failed(String),
}

/// What applying one event did to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved to a later phase.
    Advanced(Phase),
    /// Same phase, fresher messages.
    Refreshed(Phase),
    /// Reported phase is behind the current one; the snapshot was dropped.
    Stale { reported: Phase, current: Phase },
    /// No recognisable phase snapshot in the event.
    Unrecognized,
    Completed,
    Failed(String),
    /// The tracker was already terminal.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub phase: Phase,
    pub status: StepStatus,
    pub message: Option<String>,
    pub progress: Option<u8>,
}

/// Progress state machine for one task.
///
/// Phases only move forward. Once completed or failed, further events are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTracker {
    current: Option<Phase>,
    reports: BTreeMap<Phase, PhaseReport>,
    outcome: Outcome,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            current: None,
            reports: BTreeMap::new(),
            outcome: Outcome::Running,
        }
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.current
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Completed
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome != Outcome::Running
    }

    pub fn apply(&mut self, event: &StatusEvent) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }

        if let Some(message) = event.error_message() {
            let message = message.to_string();
            self.outcome = Outcome::Failed(message.clone());
            return Transition::Failed(message);
        }

        let transition = match (&event.states, event.current_state.as_deref()) {
            (Some(states), Some(key)) => match Phase::from_key(key) {
                Some(phase) => self.apply_snapshot(phase, states),
                None => Transition::Unrecognized,
            },
            _ => Transition::Unrecognized,
        };

        if event.is_complete == Some(true) {
            self.current = Some(Phase::Completed);
            self.outcome = Outcome::Completed;
            return Transition::Completed;
        }
        transition
    }

    /// Transport-level failure: the stream is gone and no more events come.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.outcome = Outcome::Failed(message.into());
        true
    }

    pub fn steps(&self) -> Vec<StepView> {
        let markers = step_markers(self.current, self.is_complete());
        Phase::ALL
            .into_iter()
            .zip(markers)
            .map(|(phase, status)| {
                let report = self.reports.get(&phase);
                StepView {
                    phase,
                    status,
                    message: report.and_then(|r| r.message.clone()),
                    progress: report.and_then(|r| r.progress),
                }
            })
            .collect()
    }

    fn apply_snapshot(
        &mut self,
        reported: Phase,
        states: &BTreeMap<String, PhaseReport>,
    ) -> Transition {
        if let Some(current) = self.current {
            if reported < current {
                return Transition::Stale { reported, current };
            }
        }

        for (key, report) in states {
            if let Some(phase) = Phase::from_key(key) {
                self.reports.insert(phase, report.clone());
            }
        }

        let advanced = self.current != Some(reported);
        self.current = Some(reported);
        if advanced {
            Transition::Advanced(reported)
        } else {
            Transition::Refreshed(reported)
        }
    }
}
