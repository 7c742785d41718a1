use std::sync::Arc;

use tracing::{debug, info, warn};

use round_core::model::{NewPlayerRecord, find_by_name};

use crate::error::RegistryError;
use crate::registry::PlayerRegistry;

/// Issued once per session when the score threshold is first reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    pub name: String,
    pub score: u32,
}

/// How the one-time registry submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    /// Carries the advisory message shown to the player.
    Failed(String),
}

/// Replaces the player's registry record with a completed one.
///
/// Runs at most once per ticket and never retries: a lost submission is
/// preferred over a duplicate.
#[derive(Clone)]
pub struct CompletionSync {
    registry: Arc<dyn PlayerRegistry>,
}

impl CompletionSync {
    #[must_use]
    pub fn new(registry: Arc<dyn PlayerRegistry>) -> Self {
        Self { registry }
    }

    pub async fn submit(&self, ticket: &SubmissionTicket) -> SubmissionOutcome {
        match self.replace_record(ticket).await {
            Ok(()) => {
                info!(player = %ticket.name, score = ticket.score, "round result recorded");
                SubmissionOutcome::Accepted
            }
            Err(err) => {
                warn!(player = %ticket.name, error = %err, "round result submission failed");
                SubmissionOutcome::Failed(format!(
                    "Your result could not be saved to the leaderboard ({err}). You can still continue."
                ))
            }
        }
    }

    async fn replace_record(&self, ticket: &SubmissionTicket) -> Result<(), RegistryError> {
        let players = self.registry.list_players().await?;
        if let Some(stale) = find_by_name(&players, &ticket.name) {
            debug!(player = %ticket.name, id = %stale.id, "removing previous registry record");
            self.registry.delete_player(stale.id).await?;
        }
        self.registry
            .create_player(&NewPlayerRecord::completed(ticket.name.as_str(), ticket.score))
            .await
    }
}
