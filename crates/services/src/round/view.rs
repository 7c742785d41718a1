use chrono::Duration;

use round_core::model::{DecisionTree, QuestionRecord, SelectedPath};

use super::engine::RoundPhase;

/// Everything a presentation surface needs to draw the round.
#[derive(Debug, Clone)]
pub struct RoundView {
    pub question: Option<QuestionRecord>,
    /// 1-based number of the question on screen.
    pub question_number: usize,
    pub total_questions: usize,
    pub tree: DecisionTree,
    pub selected_path: SelectedPath,
    pub score: u32,
    pub elapsed: Duration,
    /// True while an answer is being processed or shown.
    pub loading: bool,
    pub phase: RoundPhase,
    pub completed: bool,
}

/// Events for the surrounding shell, drained after each step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundSignal {
    /// The registry says this player already finished.
    AlreadyCompleted,
    /// The result reached the registry.
    Completed { score: u32 },
    /// Advisory message for the player.
    Warning(String),
    /// The player may move on to the post-round destination.
    ProceedPastRound,
    /// The last question was answered.
    RoundEnded { completed: bool },
}
