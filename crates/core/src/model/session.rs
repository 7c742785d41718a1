use chrono::{DateTime, Duration, Utc};

use crate::model::path::SelectedPath;

/// Persisted session as read back from a progress store.
///
/// Every field is optional: a missing key means "never written".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDraft {
    pub player_name: Option<String>,
    pub score: Option<u32>,
    pub current_question_index: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub submitted: Option<bool>,
    pub completed: Option<bool>,
    pub selected_path: Option<SelectedPath>,
}

impl SessionDraft {
    /// True when the store held nothing for this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The player's round progress.
///
/// `score` only grows and `submitted` flips to true at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    player_name: Option<String>,
    score: u32,
    current_question_index: u32,
    start_time: DateTime<Utc>,
    submitted: bool,
    completed: bool,
    selected_path: SelectedPath,
}

impl SessionState {
    /// A fresh session starting at `started_at`.
    #[must_use]
    pub fn start(player_name: Option<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            player_name: normalize_name(player_name),
            score: 0,
            current_question_index: 0,
            start_time: started_at,
            submitted: false,
            completed: false,
            selected_path: SelectedPath::root(),
        }
    }

    /// Rehydrate a session, filling never-written fields with defaults.
    ///
    /// If the path records more answers than the stored question index (the
    /// process stopped during a transition), the index catches up to the path.
    #[must_use]
    pub fn from_draft(draft: SessionDraft, now: DateTime<Utc>) -> Self {
        let selected_path = draft.selected_path.unwrap_or_default();
        let answered = u32::try_from(selected_path.answered()).unwrap_or(u32::MAX);
        let stored_index = draft.current_question_index.unwrap_or(0);

        Self {
            player_name: normalize_name(draft.player_name),
            score: draft.score.unwrap_or(0),
            current_question_index: stored_index.max(answered),
            start_time: draft.start_time.unwrap_or(now),
            submitted: draft.submitted.unwrap_or(false),
            completed: draft.completed.unwrap_or(false),
            selected_path,
        }
    }

    #[must_use]
    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn current_question_index(&self) -> u32 {
        self.current_question_index
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn submitted(&self) -> bool {
        self.submitted
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn selected_path(&self) -> &SelectedPath {
        &self.selected_path
    }

    /// Time since the session started, never negative.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start_time).max(Duration::zero())
    }

    pub fn set_player_name(&mut self, name: Option<String>) {
        self.player_name = normalize_name(name);
    }

    /// Record one answer: move along `path` and bump the score if correct.
    pub fn record_answer(&mut self, path: SelectedPath, correct: bool) {
        self.selected_path = path;
        if correct {
            self.score = self.score.saturating_add(1);
        }
    }

    pub fn advance_question(&mut self) {
        self.current_question_index = self.current_question_index.saturating_add(1);
    }

    /// Flip `submitted` to true. Returns false if it already was.
    pub fn mark_submitted(&mut self) -> bool {
        !std::mem::replace(&mut self.submitted, true)
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    /// Export every field for persistence.
    #[must_use]
    pub fn to_draft(&self) -> SessionDraft {
        SessionDraft {
            player_name: self.player_name.clone(),
            score: Some(self.score),
            current_question_index: Some(self.current_question_index),
            start_time: Some(self.start_time),
            submitted: Some(self.submitted),
            completed: Some(self.completed),
            selected_path: Some(self.selected_path.clone()),
        }
    }
}

fn normalize_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn empty_draft_yields_fresh_session() {
        let draft = SessionDraft::default();
        assert!(draft.is_empty());
        let state = SessionState::from_draft(draft, fixed_now());
        assert_eq!(state, SessionState::start(None, fixed_now()));
    }

    #[test]
    fn index_catches_up_with_recorded_answers() {
        let draft = SessionDraft {
            current_question_index: Some(1),
            selected_path: Some("root,1,1-0,1-0-3".parse().unwrap()),
            ..SessionDraft::default()
        };
        let state = SessionState::from_draft(draft, fixed_now());
        assert_eq!(state.current_question_index(), 3);
    }

    #[test]
    fn submitted_flips_only_once() {
        let mut state = SessionState::start(Some("ada".into()), fixed_now());
        assert!(state.mark_submitted());
        assert!(!state.mark_submitted());
        assert!(state.submitted());
    }

    #[test]
    fn blank_names_are_treated_as_missing() {
        let state = SessionState::start(Some("   ".into()), fixed_now());
        assert_eq!(state.player_name(), None);
    }

    #[test]
    fn draft_round_trip_preserves_state() {
        let mut state = SessionState::start(Some("ada".into()), fixed_now());
        state.record_answer("root,2".parse().unwrap(), true);
        state.advance_question();
        let restored = SessionState::from_draft(state.to_draft(), fixed_now());
        assert_eq!(restored, state);
    }

    #[test]
    fn elapsed_is_clamped_at_zero() {
        let state = SessionState::start(None, fixed_now());
        assert_eq!(state.elapsed_at(fixed_now() - Duration::seconds(5)), Duration::zero());
        assert_eq!(
            state.elapsed_at(fixed_now() + Duration::seconds(5)),
            Duration::seconds(5)
        );
    }
}
