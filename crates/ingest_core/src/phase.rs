/// Ordered ingestion stages reported by the status stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Crawling,
    Processing,
    GeneratingEmbeddings,
    Storing,
    Completed,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Crawling,
        Phase::Processing,
        Phase::GeneratingEmbeddings,
        Phase::Storing,
        Phase::Completed,
    ];

    /// 1-based position in the visual progression.
    pub fn index(self) -> usize {
        match self {
            Phase::Crawling => 1,
            Phase::Processing => 2,
            Phase::GeneratingEmbeddings => 3,
            Phase::Storing => 4,
            Phase::Completed => 5,
        }
    }

    /// Wire name used in `states` maps and `current_state`.
    pub fn key(self) -> &'static str {
        match self {
            Phase::Crawling => "crawling",
            Phase::Processing => "processing",
            Phase::GeneratingEmbeddings => "generating_embeddings",
            Phase::Storing => "storing",
            Phase::Completed => "completed",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Crawling => "Crawling",
            Phase::Processing => "Processing",
            Phase::GeneratingEmbeddings => "Generating embeddings",
            Phase::Storing => "Storing",
            Phase::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

/// Marker for each of the five steps, in phase order.
///
/// Steps before `current` are completed, `current` is active and later steps
/// are pending. A finished task shows every step completed.
pub fn step_markers(current: Option<Phase>, finished: bool) -> [StepStatus; 5] {
    if finished {
        return [StepStatus::Completed; 5];
    }
    let Some(current) = current else {
        return [StepStatus::Pending; 5];
    };
    Phase::ALL.map(|phase| match phase.index().cmp(&current.index()) {
        std::cmp::Ordering::Less => StepStatus::Completed,
        std::cmp::Ordering::Equal => StepStatus::Active,
        std::cmp::Ordering::Greater => StepStatus::Pending,
    })
}
