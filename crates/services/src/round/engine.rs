use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use round_core::Clock;
use round_core::model::{
    DecisionTree, NodeId, OPTION_COUNT, QuestionRecord, SelectedPath, SessionState, TreeError,
};
use storage::repository::SessionStore;

use super::completion::{SubmissionOutcome, SubmissionTicket};
use super::config::RoundConfig;
use super::status;
use super::view::{RoundSignal, RoundView};
use crate::error::EngineError;
use crate::questions::QuestionSource;
use crate::registry::PlayerRegistry;

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Where the round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Waiting for an answer to the current question.
    Idle,
    /// An answer was accepted; the visible pause is running.
    Advancing,
    /// The registry submission is in flight; advancement waits for it.
    Completing,
    /// The last question has been answered.
    Terminal,
}

/// Why an answer was dropped without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoQuestion,
    Busy(RoundPhase),
}

/// What happened to a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Accepted(AnswerReceipt),
    Ignored(IgnoreReason),
}

/// Details of an accepted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReceipt {
    pub node_id: NodeId,
    pub correct: bool,
    pub score: u32,
    pub is_final: bool,
    /// Present when this answer armed the one-time registry submission.
    pub submission: Option<SubmissionTicket>,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Progression state machine for one player's round.
///
/// Owns the session, the decision tree and the drawn questions. Every
/// mutation is persisted through the injected `SessionStore` before the
/// method returns.
pub struct RoundEngine {
    config: RoundConfig,
    clock: Clock,
    store: Arc<dyn SessionStore>,
    session: SessionState,
    questions: Vec<QuestionRecord>,
    tree: DecisionTree,
    phase: RoundPhase,
    transition_pending: bool,
    pending_final: bool,
    ended_at: Option<DateTime<Utc>>,
    signals: Vec<RoundSignal>,
}

impl RoundEngine {
    /// Load persisted progress (or start fresh), draw questions and rebuild the tree.
    ///
    /// `player_name` overrides the stored identity when given.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the store cannot be read or written and
    /// `EngineError::Questions` if no sequence can be drawn.
    pub async fn resume(
        config: RoundConfig,
        clock: Clock,
        store: Arc<dyn SessionStore>,
        questions: &dyn QuestionSource,
        player_name: Option<String>,
    ) -> Result<Self, EngineError> {
        let draft = store.load().await?;
        let fresh = draft.is_empty();
        let mut session = SessionState::from_draft(draft, clock.now());
        if player_name.is_some() {
            session.set_player_name(player_name);
        }

        let mut questions = questions.fetch_question_sequence()?;
        if questions.len() > config.round_length() {
            debug!(drawn = questions.len(), round_length = config.round_length(), "sequence truncated");
            questions.truncate(config.round_length());
        } else if questions.len() < config.round_length() {
            warn!(drawn = questions.len(), round_length = config.round_length(), "short question sequence");
        }

        // A path that does not replay is kept as-is so answers abort on it
        // instead of silently restarting the player.
        let tree = DecisionTree::replay(session.selected_path()).unwrap_or_else(|err| {
            warn!(error = %err, path = %session.selected_path(), "stored path does not replay");
            DecisionTree::new()
        });

        let mut engine = Self {
            config,
            clock,
            store,
            session,
            questions,
            tree,
            phase: RoundPhase::Idle,
            transition_pending: false,
            pending_final: false,
            ended_at: None,
            signals: Vec::new(),
        };

        if engine.round_is_over() {
            engine.end_round();
        }
        engine.persist().await?;

        info!(
            fresh,
            player = engine.session.player_name().unwrap_or("<unnamed>"),
            question = engine.session.current_question_index(),
            score = engine.session.score(),
            "round mounted"
        );
        Ok(engine)
    }

    // ─── Accessors ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    #[must_use]
    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        if self.phase == RoundPhase::Terminal {
            return None;
        }
        usize::try_from(self.session.current_question_index())
            .ok()
            .and_then(|index| self.questions.get(index))
    }

    /// Time on the round clock; stops when the round ends.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        let now = self.ended_at.unwrap_or_else(|| self.clock.now());
        self.session.elapsed_at(now)
    }

    /// Snapshot for presentation surfaces.
    #[must_use]
    pub fn view(&self) -> RoundView {
        let index = usize::try_from(self.session.current_question_index()).unwrap_or(usize::MAX);
        RoundView {
            question: self.current_question().cloned(),
            question_number: index.saturating_add(1).min(self.questions.len()),
            total_questions: self.questions.len(),
            tree: self.tree.clone(),
            selected_path: self.session.selected_path().clone(),
            score: self.session.score(),
            elapsed: self.elapsed(),
            loading: matches!(self.phase, RoundPhase::Advancing | RoundPhase::Completing),
            phase: self.phase,
            completed: self.session.completed(),
        }
    }

    /// Take the signals raised since the last call.
    pub fn drain_signals(&mut self) -> Vec<RoundSignal> {
        std::mem::take(&mut self.signals)
    }

    // ─── Answer transition ─────────────────────────────────────────────────────

    /// Accept an answer for the current question.
    ///
    /// Dropped without effect unless the engine is `Idle` with a question
    /// loaded. On acceptance the path, tree, score and (when the threshold is
    /// newly reached) the `submitted` flag are updated and persisted together,
    /// and the engine enters `Advancing` or `Completing`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidOption` for an index past the last option and
    /// `EngineError::PathIntegrity` if the stored path does not resolve; neither
    /// changes any state. Returns `EngineError::Storage` if persisting fails.
    pub async fn submit_answer(&mut self, option_index: usize) -> Result<AnswerOutcome, EngineError> {
        if self.phase != RoundPhase::Idle {
            debug!(phase = ?self.phase, "answer dropped while busy");
            return Ok(AnswerOutcome::Ignored(IgnoreReason::Busy(self.phase)));
        }
        let Some(question) = self.current_question() else {
            return Ok(AnswerOutcome::Ignored(IgnoreReason::NoQuestion));
        };
        if option_index >= OPTION_COUNT {
            return Err(EngineError::InvalidOption(option_index));
        }
        let correct = question.is_correct(option_index);
        let is_final = self.is_last_question();

        let (tree, next_path, node_id) = self.step_tree(option_index)?;

        let mut next = self.session.clone();
        next.record_answer(next_path, correct);
        let submission = if correct {
            arm_completion_guard(&mut next, self.config.score_threshold())
        } else {
            None
        };
        self.commit(next).await?;

        self.tree = tree;
        self.phase = if submission.is_some() {
            RoundPhase::Completing
        } else {
            RoundPhase::Advancing
        };
        self.transition_pending = true;
        self.pending_final = is_final;

        debug!(node = %node_id, correct, score = self.session.score(), "answer accepted");
        Ok(AnswerOutcome::Accepted(AnswerReceipt {
            node_id,
            correct,
            score: self.session.score(),
            is_final,
            submission,
        }))
    }

    /// Walk to the current node, expanding it on first visit, then step to the
    /// chosen child and expand that one. Works on a copy of the tree.
    fn step_tree(
        &self,
        option_index: usize,
    ) -> Result<(DecisionTree, SelectedPath, NodeId), EngineError> {
        let path = self.session.selected_path();
        let mut tree = self.tree.clone();
        if !tree.resolve(path)?.is_expanded() {
            tree = tree.expand_at(path)?;
        }

        let node = tree.resolve(path)?;
        let child_id = node
            .child(option_index)
            .map(|child| child.id().clone())
            .ok_or_else(|| TreeError::PathIntegrity {
                parent: node.id().clone(),
                missing: node.id().child(option_index),
            })?;

        let next_path = path.extended(child_id.clone());
        let tree = tree.expand_at(&next_path)?;
        Ok((tree, next_path, child_id))
    }

    /// End the visible pause: move to the next question, or end the round.
    ///
    /// Does nothing unless the engine is `Advancing`. If the new index cannot be
    /// saved the engine stays `Advancing` with nothing changed, so the call can
    /// be repeated.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if persisting the new index fails.
    pub async fn finish_transition(&mut self) -> Result<RoundPhase, EngineError> {
        if self.phase != RoundPhase::Advancing {
            return Ok(self.phase);
        }

        if self.pending_final {
            self.pending_final = false;
            self.transition_pending = false;
            self.end_round();
        } else {
            let mut next = self.session.clone();
            next.advance_question();
            self.commit(next).await?;
            self.transition_pending = false;
            self.phase = RoundPhase::Idle;
        }
        Ok(self.phase)
    }

    // ─── Completion guard ──────────────────────────────────────────────────────

    /// Arm the registry submission if the threshold is reached and nothing was
    /// submitted yet. The `submitted` flag is persisted before returning, so a
    /// second call can never produce another ticket.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if persisting the flag fails; no ticket is
    /// issued and the flag stays false in that case.
    pub async fn evaluate_completion_guard(
        &mut self,
    ) -> Result<Option<SubmissionTicket>, EngineError> {
        let mut next = self.session.clone();
        let ticket = arm_completion_guard(&mut next, self.config.score_threshold());
        if ticket.is_some() {
            self.commit(next).await?;
            if self.phase == RoundPhase::Idle {
                self.phase = RoundPhase::Completing;
            }
        }
        Ok(ticket)
    }

    /// Record how the registry submission ended and release the `Completing` hold.
    ///
    /// The hold is released even when the completed flag cannot be saved; the
    /// flag then stays false in memory too.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if persisting the completed flag fails.
    pub async fn finish_submission(&mut self, outcome: SubmissionOutcome) -> Result<(), EngineError> {
        if self.phase != RoundPhase::Completing {
            warn!(phase = ?self.phase, "submission outcome arrived outside Completing");
            return Ok(());
        }

        let saved = match outcome {
            SubmissionOutcome::Accepted => {
                let mut next = self.session.clone();
                next.set_completed(true);
                let saved = self.commit(next).await;
                match &saved {
                    Ok(()) => self.signals.push(RoundSignal::Completed {
                        score: self.session.score(),
                    }),
                    Err(err) => {
                        warn!(error = %err, "completed flag not saved");
                        self.signals.push(RoundSignal::Warning(format!(
                            "Your result reached the leaderboard but progress could not be saved ({err})."
                        )));
                    }
                }
                saved
            }
            SubmissionOutcome::Failed(message) => {
                self.signals.push(RoundSignal::Warning(message));
                Ok(())
            }
        };
        self.signals.push(RoundSignal::ProceedPastRound);

        self.phase = if self.transition_pending {
            RoundPhase::Advancing
        } else {
            RoundPhase::Idle
        };
        saved
    }

    // ─── Status poll ───────────────────────────────────────────────────────────

    /// Mirror the registry's completion flag for this player into local state.
    ///
    /// Registry failures are logged and leave local state untouched.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` only if persisting the mirrored flag fails.
    pub async fn sync_remote_status(
        &mut self,
        registry: &dyn PlayerRegistry,
    ) -> Result<(), EngineError> {
        let Some(name) = self.session.player_name().map(str::to_owned) else {
            debug!("no player name; status poll skipped");
            return Ok(());
        };

        match status::fetch_completion(registry, &name).await {
            Ok(Some(is_complete)) => {
                let mut next = self.session.clone();
                next.set_completed(is_complete);
                self.commit(next).await?;
                if is_complete {
                    info!(player = %name, "registry reports round already completed");
                    self.signals.push(RoundSignal::AlreadyCompleted);
                }
            }
            Ok(None) => debug!(player = %name, "player not in registry yet"),
            Err(err) => warn!(player = %name, error = %err, "status poll failed"),
        }
        Ok(())
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn is_last_question(&self) -> bool {
        usize::try_from(self.session.current_question_index())
            .is_ok_and(|index| index + 1 >= self.questions.len())
    }

    fn round_is_over(&self) -> bool {
        !self.questions.is_empty()
            && usize::try_from(self.session.current_question_index())
                .map_or(true, |index| index >= self.questions.len())
    }

    fn end_round(&mut self) {
        self.phase = RoundPhase::Terminal;
        self.ended_at = Some(self.clock.now());
        self.signals.push(RoundSignal::RoundEnded {
            completed: self.session.completed(),
        });
        info!(score = self.session.score(), "round over");
    }

    async fn persist(&self) -> Result<(), EngineError> {
        self.store.save(&self.session.to_draft()).await?;
        Ok(())
    }

    /// Save `next` and adopt it only once the store accepted it.
    async fn commit(&mut self, next: SessionState) -> Result<(), EngineError> {
        self.store.save(&next.to_draft()).await?;
        self.session = next;
        Ok(())
    }
}

fn arm_completion_guard(session: &mut SessionState, threshold: u32) -> Option<SubmissionTicket> {
    if session.submitted() || session.score() < threshold {
        return None;
    }
    let Some(name) = session.player_name().map(str::to_owned) else {
        debug!("threshold reached without a player name; submission skipped");
        return None;
    };
    if !session.mark_submitted() {
        return None;
    }

    info!(player = %name, score = session.score(), "completion threshold reached");
    Some(SubmissionTicket {
        name,
        score: session.score(),
    })
}

impl fmt::Debug for RoundEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundEngine")
            .field("phase", &self.phase)
            .field("session", &self.session)
            .field("questions_len", &self.questions.len())
            .field("materialized", &self.tree.materialized_count())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
