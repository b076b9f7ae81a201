//! Verdict polling
//!
//! ```text
//! SUBMIT --submit--> PENDING --AC--------------> ACCEPTED
//!                       |    --other verdict---> FAILED
//!                       |    --query error-----> FAILED
//!                       +----retries exhausted-> SUBMIT
//! ```
//!
//! While pending, each query is followed by a wait of `d`, `2d`, `4d`, ...
//! At most `max_retries` queries are made per cycle.

use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    config::PollingConfig,
    constants::{DEFAULT_POLL_INITIAL_DELAY_MS, DEFAULT_POLL_MAX_RETRIES},
    handlers::submissions::{CreateSubmissionRequest, SubmissionStatusResponse},
    models::SubmissionStatus,
};

use super::StatusSource;

/// Where the submit flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Submit,
    Pending,
    Accepted,
    Failed,
}

/// Exponential backoff between status queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_retries: u32,
    /// Add up to 25% random extra wait
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_POLL_INITIAL_DELAY_MS),
            max_retries: DEFAULT_POLL_MAX_RETRIES,
            jitter: false,
        }
    }
}

impl From<&PollingConfig> for BackoffPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            initial_delay: config.initial_delay,
            max_retries: config.max_retries,
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    /// Wait after the `attempt`-th pending answer (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));

        if !self.jitter || base.is_zero() {
            return base;
        }

        let quarter = (base.as_millis() / 4) as u64;
        base.saturating_add(Duration::from_millis(rand::rng().random_range(0..=quarter)))
    }
}

/// Progress notifications for whoever renders the flow
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Submitted { id: Uuid },
    /// Still pending; carries whatever test cases have finished so far
    Progress(SubmissionStatusResponse),
    Accepted(SubmissionStatusResponse),
    Failed(SubmissionStatusResponse),
    /// Retries ran out while still pending
    Inconclusive { id: Uuid },
    Error(String),
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Accepted(SubmissionStatusResponse),
    Failed(SubmissionStatusResponse),
    Inconclusive,
    Error(String),
    Cancelled,
}

impl PollOutcome {
    /// State the flow settles in after this outcome
    pub fn state(&self) -> PollState {
        match self {
            Self::Accepted(_) => PollState::Accepted,
            Self::Failed(_) | Self::Error(_) => PollState::Failed,
            Self::Inconclusive | Self::Cancelled => PollState::Submit,
        }
    }
}

/// Drives one submission at a time through the poll state machine
pub struct PollingClient<S> {
    source: S,
    policy: BackoffPolicy,
    state: PollState,
    events: Option<UnboundedSender<PollEvent>>,
}

impl<S: StatusSource> PollingClient<S> {
    pub fn new(source: S, policy: BackoffPolicy) -> Self {
        Self {
            source,
            policy,
            state: PollState::Submit,
            events: None,
        }
    }

    /// Send progress events to `tx`
    pub fn with_events(mut self, tx: UnboundedSender<PollEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Submit and poll until a verdict, exhaustion, error or cancellation.
    ///
    /// Every call starts a fresh cycle: the delay and retry budget reset.
    pub async fn submit(
        &mut self,
        request: CreateSubmissionRequest,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        self.state = PollState::Pending;

        let id = match self.source.submit(request).await {
            Ok(id) => id,
            Err(e) => return self.finish(None, PollOutcome::Error(format!("Submission failed: {e}"))),
        };
        self.emit(PollEvent::Submitted { id });
        tracing::info!(submission_id = %id, "Submitted, waiting for verdict");

        self.poll(id, cancel).await
    }

    /// Poll an existing submission
    pub async fn poll(&mut self, id: Uuid, cancel: &CancellationToken) -> PollOutcome {
        self.state = PollState::Pending;

        for attempt in 0..self.policy.max_retries {
            let response = tokio::select! {
                _ = cancel.cancelled() => None,
                r = self.source.status(id) => Some(r),
            };
            let response = match response {
                None => return self.finish(Some(id), PollOutcome::Cancelled),
                Some(Err(e)) => {
                    let message = format!("Error fetching submission status: {e}");
                    return self.finish(Some(id), PollOutcome::Error(message));
                }
                Some(Ok(response)) => response,
            };

            match response.submission.status {
                SubmissionStatus::Pending => {
                    tracing::debug!(
                        submission_id = %id,
                        attempt,
                        passed = response.passed,
                        total = response.total,
                        "Still pending"
                    );
                    self.emit(PollEvent::Progress(response));
                }
                SubmissionStatus::Accepted => {
                    return self.finish(Some(id), PollOutcome::Accepted(response));
                }
                _ => return self.finish(Some(id), PollOutcome::Failed(response)),
            }

            let delay = self.policy.delay(attempt);
            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                return self.finish(Some(id), PollOutcome::Cancelled);
            }
        }

        self.finish(Some(id), PollOutcome::Inconclusive)
    }

    fn finish(&mut self, id: Option<Uuid>, outcome: PollOutcome) -> PollOutcome {
        self.state = outcome.state();

        let event = match &outcome {
            PollOutcome::Accepted(r) => Some(PollEvent::Accepted(r.clone())),
            PollOutcome::Failed(r) => Some(PollEvent::Failed(r.clone())),
            PollOutcome::Error(message) => Some(PollEvent::Error(message.clone())),
            PollOutcome::Inconclusive => id.map(|id| PollEvent::Inconclusive { id }),
            PollOutcome::Cancelled => None,
        };
        if let Some(event) = event {
            self.emit(event);
        }

        match &outcome {
            PollOutcome::Error(message) => tracing::warn!(error = %message, "Polling stopped"),
            PollOutcome::Inconclusive => tracing::warn!("Not able to get status"),
            PollOutcome::Cancelled => tracing::debug!("Polling cancelled"),
            _ => {}
        }

        outcome
    }

    fn emit(&self, event: PollEvent) {
        if let Some(tx) = &self.events {
            // receiver gone just means nobody is watching
            let _ = tx.send(event);
        }
    }
}
