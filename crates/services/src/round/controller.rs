use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use round_core::Clock;
use storage::repository::SessionStore;

use super::completion::CompletionSync;
use super::config::RoundConfig;
use super::engine::{AnswerOutcome, RoundEngine, RoundPhase};
use super::view::{RoundSignal, RoundView};
use crate::error::EngineError;
use crate::questions::QuestionSource;
use crate::registry::PlayerRegistry;

/// Collaborators injected into a round.
#[derive(Clone)]
pub struct RoundDeps {
    pub clock: Clock,
    pub store: Arc<dyn SessionStore>,
    pub questions: Arc<dyn QuestionSource>,
    pub registry: Arc<dyn PlayerRegistry>,
}

/// Drives a `RoundEngine` through whole answer cycles, including the visible
/// pause and the registry submission.
pub struct RoundController {
    engine: RoundEngine,
    sync: CompletionSync,
    registry: Arc<dyn PlayerRegistry>,
    transition_delay: Duration,
    status_timeout: Duration,
}

impl RoundController {
    /// Resume the round and poll the registry for this player's status.
    ///
    /// The poll waits at most `RoundConfig::status_timeout`; a slow registry
    /// is treated like an unreachable one.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the round cannot be resumed.
    pub async fn mount(
        deps: RoundDeps,
        config: RoundConfig,
        player_name: Option<String>,
    ) -> Result<Self, EngineError> {
        let transition_delay = config.transition_delay();
        let status_timeout = config.status_timeout();
        let engine = RoundEngine::resume(
            config,
            deps.clock,
            deps.store,
            deps.questions.as_ref(),
            player_name,
        )
        .await?;

        let mut controller = Self {
            engine,
            sync: CompletionSync::new(Arc::clone(&deps.registry)),
            registry: deps.registry,
            transition_delay,
            status_timeout,
        };
        controller.refresh_status().await?;
        Ok(controller)
    }

    /// Answer the current question and play out the transition.
    ///
    /// When the answer arms the registry submission, it runs alongside the
    /// visible pause and advancement waits for both.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` for an invalid option, a broken path or a
    /// persistence failure.
    pub async fn answer(&mut self, option_index: usize) -> Result<AnswerOutcome, EngineError> {
        // A transition whose save failed earlier is still pending.
        if self.engine.phase() == RoundPhase::Advancing {
            self.engine.finish_transition().await?;
        }

        let outcome = self.engine.submit_answer(option_index).await?;
        let AnswerOutcome::Accepted(receipt) = &outcome else {
            return Ok(outcome);
        };

        let mut saved = Ok(());
        if let Some(ticket) = &receipt.submission {
            let (submission, ()) = tokio::join!(
                self.sync.submit(ticket),
                tokio::time::sleep(self.transition_delay)
            );
            saved = self.engine.finish_submission(submission).await;
        } else {
            tokio::time::sleep(self.transition_delay).await;
        }

        let phase = self.engine.finish_transition().await?;
        debug!(?phase, "transition finished");
        saved?;
        Ok(outcome)
    }

    /// Re-run the registry status poll.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if persisting the mirrored flag fails.
    pub async fn refresh_status(&mut self) -> Result<(), EngineError> {
        let poll = self.engine.sync_remote_status(self.registry.as_ref());
        match tokio::time::timeout(self.status_timeout, poll).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.status_timeout, "status poll timed out");
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn view(&self) -> RoundView {
        self.engine.view()
    }

    pub fn drain_signals(&mut self) -> Vec<RoundSignal> {
        self.engine.drain_signals()
    }

    #[must_use]
    pub fn engine(&self) -> &RoundEngine {
        &self.engine
    }
}
