use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every question offers exactly this many options; the tree branches the same way.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question must have exactly {OPTION_COUNT} options, got {0}")]
    OptionCount(usize),

    #[error("correct answer must be between 1 and {OPTION_COUNT}, got {0}")]
    CorrectAnswerOutOfRange(u8),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in a question pool file.
///
/// `correctAnswer` is 1-based, matching the pool format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: u8,
}

impl QuestionDraft {
    /// Validate the draft into an immutable question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for blank text, an option count other than four,
    /// or a correct answer outside `1..=4`.
    pub fn validate(self) -> Result<QuestionRecord, QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        let count = self.options.len();
        let options: [String; OPTION_COUNT] = self
            .options
            .try_into()
            .map_err(|_| QuestionError::OptionCount(count))?;
        if !(1..=OPTION_COUNT).contains(&usize::from(self.correct_answer)) {
            return Err(QuestionError::CorrectAnswerOutOfRange(self.correct_answer));
        }

        Ok(QuestionRecord {
            text: self.text,
            options,
            correct_answer: self.correct_answer,
        })
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// A drawn question. Immutable for the lifetime of the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    text: String,
    options: [String; OPTION_COUNT],
    correct_answer: u8,
}

impl QuestionRecord {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// The 1-based index of the correct option.
    #[must_use]
    pub fn correct_answer(&self) -> u8 {
        self.correct_answer
    }

    /// Whether the zero-based UI option index picks the correct answer.
    ///
    /// Pool data is 1-based and UI indices are 0-based, so `index + 1` is compared.
    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index + 1 == usize::from(self.correct_answer)
    }
}
