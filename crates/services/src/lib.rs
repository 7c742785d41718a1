#![forbid(unsafe_code)]

pub mod error;
pub mod questions;
pub mod registry;
pub mod round;

pub use round_core::Clock;

pub use error::{EngineError, QuestionSourceError, RegistryError};
pub use questions::{QuestionBank, QuestionSource};
pub use registry::{HttpPlayerRegistry, PlayerRegistry, RegistryConfig};
pub use round::{
    AnswerOutcome, AnswerReceipt, CompletionSync, IgnoreReason, RoundConfig, RoundController,
    RoundDeps, RoundEngine, RoundPhase, RoundSignal, RoundView, SubmissionOutcome,
    SubmissionTicket,
};
