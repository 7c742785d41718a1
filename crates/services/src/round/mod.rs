//! The round: a fixed sequence of questions answered along the decision tree.

mod completion;
mod config;
mod controller;
mod engine;
mod status;
mod view;

pub use completion::{CompletionSync, SubmissionOutcome, SubmissionTicket};
pub use config::{
    DEFAULT_ROUND_LENGTH, DEFAULT_SCORE_THRESHOLD, DEFAULT_STATUS_TIMEOUT, DEFAULT_TRANSITION_DELAY,
    RoundConfig,
};
pub use controller::{RoundController, RoundDeps};
pub use engine::{AnswerOutcome, AnswerReceipt, IgnoreReason, RoundEngine, RoundPhase};
pub use status::fetch_completion;
pub use view::{RoundSignal, RoundView};
