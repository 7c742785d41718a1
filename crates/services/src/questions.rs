use rand::rng;
use rand::seq::SliceRandom;

use round_core::model::{QuestionDraft, QuestionRecord};

use crate::error::QuestionSourceError;

/// Supplies the question sequence for one round.
pub trait QuestionSource: Send + Sync {
    /// Draw the round's questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError` if a full round cannot be drawn.
    fn fetch_question_sequence(&self) -> Result<Vec<QuestionRecord>, QuestionSourceError>;
}

/// A fixed pool from which each round draws a random subset without replacement.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pool: Vec<QuestionRecord>,
    round_length: usize,
}

impl QuestionBank {
    #[must_use]
    pub fn new(pool: Vec<QuestionRecord>, round_length: usize) -> Self {
        Self { pool, round_length }
    }

    /// Parse a pool from a JSON array of `{ text, options, correctAnswer }` objects.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError::Json` for malformed JSON and
    /// `QuestionSourceError::InvalidQuestion` for the first entry that fails validation.
    pub fn from_json_str(json: &str, round_length: usize) -> Result<Self, QuestionSourceError> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(json)?;
        let pool = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                draft
                    .validate()
                    .map_err(|source| QuestionSourceError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(pool, round_length))
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn round_length(&self) -> usize {
        self.round_length
    }
}

impl QuestionSource for QuestionBank {
    fn fetch_question_sequence(&self) -> Result<Vec<QuestionRecord>, QuestionSourceError> {
        if self.pool.len() < self.round_length {
            return Err(QuestionSourceError::InsufficientPool {
                needed: self.round_length,
                available: self.pool.len(),
            });
        }

        let mut drawn = self.pool.clone();
        drawn.as_mut_slice().shuffle(&mut rng());
        drawn.truncate(self.round_length);
        Ok(drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool_json(count: usize) -> String {
        let entries: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#"{{"text":"Question {i}","options":["a","b","c","d"],"correctAnswer":{}}}"#,
                    i % 4 + 1
                )
            })
            .collect();
        format!("[{}]", entries.join(","))
    }

    #[test]
    fn draws_round_length_distinct_questions() {
        let bank = QuestionBank::from_json_str(&pool_json(60), 40).unwrap();
        let drawn = bank.fetch_question_sequence().unwrap();
        assert_eq!(drawn.len(), 40);
        let distinct: HashSet<_> = drawn.iter().map(QuestionRecord::text).collect();
        assert_eq!(distinct.len(), 40);
    }

    #[test]
    fn small_pool_is_rejected() {
        let bank = QuestionBank::from_json_str(&pool_json(5), 40).unwrap();
        let err = bank.fetch_question_sequence().unwrap_err();
        assert!(matches!(
            err,
            QuestionSourceError::InsufficientPool {
                needed: 40,
                available: 5
            }
        ));
    }

    #[test]
    fn invalid_entry_reports_its_index() {
        let json = r#"[
            {"text":"ok","options":["a","b","c","d"],"correctAnswer":1},
            {"text":"bad","options":["a","b"],"correctAnswer":1}
        ]"#;
        let err = QuestionBank::from_json_str(json, 1).unwrap_err();
        assert!(matches!(err, QuestionSourceError::InvalidQuestion { index: 1, .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            QuestionBank::from_json_str("{not json", 1),
            Err(QuestionSourceError::Json(_))
        ));
    }
}
