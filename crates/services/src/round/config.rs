use std::time::Duration;

/// Questions per round.
pub const DEFAULT_ROUND_LENGTH: usize = 40;
/// Score at which the result is submitted to the registry.
pub const DEFAULT_SCORE_THRESHOLD: u32 = 10;
/// Visible pause between an accepted answer and the next question.
pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(600);
/// Longest wait for the mount-time registry status poll.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundConfig {
    round_length: usize,
    score_threshold: u32,
    transition_delay: Duration,
    status_timeout: Duration,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_length: DEFAULT_ROUND_LENGTH,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            transition_delay: DEFAULT_TRANSITION_DELAY,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }
}

impl RoundConfig {
    #[must_use]
    pub fn with_round_length(mut self, round_length: usize) -> Self {
        self.round_length = round_length;
        self
    }

    #[must_use]
    pub fn with_score_threshold(mut self, score_threshold: u32) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    #[must_use]
    pub fn with_transition_delay(mut self, transition_delay: Duration) -> Self {
        self.transition_delay = transition_delay;
        self
    }

    #[must_use]
    pub fn with_status_timeout(mut self, status_timeout: Duration) -> Self {
        self.status_timeout = status_timeout;
        self
    }

    /// Questions played per round; longer sequences are cut to this length.
    #[must_use]
    pub fn round_length(&self) -> usize {
        self.round_length
    }

    #[must_use]
    pub fn score_threshold(&self) -> u32 {
        self.score_threshold
    }

    #[must_use]
    pub fn transition_delay(&self) -> Duration {
        self.transition_delay
    }

    #[must_use]
    pub fn status_timeout(&self) -> Duration {
        self.status_timeout
    }
}
