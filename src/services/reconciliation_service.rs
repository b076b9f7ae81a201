//! Verdict reconciliation
//!
//! Folds per-test-case verdicts into the stored submission. Verdicts may
//! arrive in any order, more than once, and concurrently; the aggregate is
//! always recomputed from the full set of test case statuses.

use std::sync::Arc;

use futures::future::try_join_all;
use uuid::Uuid;

use crate::{
    db::{ReconcileOutcome, SubmissionStore, TestCaseRef},
    error::{AppError, AppResult},
    judge::{JudgeClient, Judge0Submission},
    models::SubmissionStatus,
};

#[derive(Clone)]
pub struct ReconciliationService {
    store: Arc<dyn SubmissionStore>,
    judge: Arc<dyn JudgeClient>,
}

impl ReconciliationService {
    pub fn new(store: Arc<dyn SubmissionStore>, judge: Arc<dyn JudgeClient>) -> Self {
        Self { store, judge }
    }

    /// Record `status` for test case `index` of `submission_id`.
    ///
    /// Last write wins for the test case; the submission's aggregate is
    /// rewritten only when it changes.
    pub async fn ingest(
        &self,
        submission_id: Uuid,
        index: i32,
        status: SubmissionStatus,
    ) -> AppResult<ReconcileOutcome> {
        let target = TestCaseRef::Index {
            submission_id,
            index,
        };
        let outcome = self
            .store
            .record_verdict(&target, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Test case not found".to_string()))?;

        log_outcome(&outcome);
        Ok(outcome)
    }

    /// Apply a result pushed by Judge0's callback.
    ///
    /// Returns `None` for in-queue and processing notifications, which carry
    /// no verdict. An unknown token is `NotFound` and changes nothing.
    pub async fn ingest_callback(
        &self,
        result: Judge0Submission,
    ) -> AppResult<Option<ReconcileOutcome>> {
        let status = result.status.verdict();
        if !status.is_terminal() {
            tracing::debug!(token = %result.token, judge0_status = result.status.id, "Ignoring non-final callback");
            return Ok(None);
        }

        let outcome = self
            .store
            .record_verdict(&TestCaseRef::Token(result.token.clone()), status)
            .await?
            .ok_or_else(|| {
                tracing::warn!(token = %result.token, "Callback for unknown token");
                AppError::NotFound("Test case not found".to_string())
            })?;

        log_outcome(&outcome);
        Ok(Some(outcome))
    }

    /// Pull the current state of a submission's pending test cases from
    /// Judge0 and fold in whatever has finished.
    ///
    /// Returns the number of test cases that received a verdict.
    pub async fn refresh(&self, submission_id: Uuid) -> AppResult<usize> {
        let pending: Vec<String> = self
            .store
            .list_test_cases(submission_id)
            .await?
            .into_iter()
            .filter(|tc| tc.status == SubmissionStatus::Pending)
            .map(|tc| tc.token)
            .collect();

        if pending.is_empty() {
            return Ok(0);
        }

        let finished: Vec<(TestCaseRef, SubmissionStatus)> = self
            .judge
            .fetch_batch(pending)
            .await?
            .into_iter()
            .map(|s| (TestCaseRef::Token(s.token), s.status.verdict()))
            .filter(|(_, status)| status.is_terminal())
            .collect();

        let outcomes = try_join_all(
            finished
                .iter()
                .map(|(target, status)| self.store.record_verdict(target, *status)),
        )
        .await?;

        let applied: Vec<ReconcileOutcome> = outcomes.into_iter().flatten().collect();
        applied.iter().for_each(log_outcome);

        tracing::debug!(submission_id = %submission_id, applied = applied.len(), "Refreshed from Judge0");
        Ok(applied.len())
    }
}

fn log_outcome(outcome: &ReconcileOutcome) {
    if outcome.changed() {
        tracing::info!(
            submission_id = %outcome.submission_id,
            index = outcome.index,
            from = %outcome.previous,
            to = %outcome.aggregate,
            "Submission status changed"
        );
    } else {
        tracing::debug!(
            submission_id = %outcome.submission_id,
            index = outcome.index,
            status = %outcome.test_case_status,
            "Test case verdict recorded"
        );
    }
}
