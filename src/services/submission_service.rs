//! Submission service
//!
//! Intake of new submissions and owner-scoped status reads.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{NewSubmission, SubmissionStore},
    error::{AppError, AppResult},
    handlers::submissions::{
        request::CreateSubmissionRequest,
        response::{SubmissionStatusResponse, SubmissionView},
    },
    judge::{self, JudgeClient},
    models::{Language, Submission},
    services::ProblemCatalog,
};

/// Submission service for business logic
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn SubmissionStore>,
    judge: Arc<dyn JudgeClient>,
    catalog: Arc<dyn ProblemCatalog>,
    callback_url: Option<String>,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        judge: Arc<dyn JudgeClient>,
        catalog: Arc<dyn ProblemCatalog>,
        callback_url: Option<String>,
    ) -> Self {
        Self {
            store,
            judge,
            catalog,
            callback_url,
        }
    }

    /// Create a new submission.
    ///
    /// Dispatches to Judge0 first and persists only after it accepted the
    /// whole batch, so a failed call leaves nothing behind. Exactly one batch
    /// is sent per call; there is no retry here.
    pub async fn submit(
        &self,
        caller: Option<Uuid>,
        payload: CreateSubmissionRequest,
    ) -> AppResult<Submission> {
        let user_id = caller.ok_or(AppError::Unauthorized)?;

        let language = Language::from_key(&payload.language_id).ok_or_else(|| {
            AppError::Validation(format!("Unsupported language: {}", payload.language_id))
        })?;

        let problem = self
            .catalog
            .resolve(payload.problem_id, language)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))?;

        let outcome = judge::dispatch(
            self.judge.as_ref(),
            self.callback_url.as_deref(),
            &problem,
            language,
            &payload.code,
        )
        .await
        .inspect_err(|e| {
            tracing::warn!(
                user_id = %user_id,
                problem = %problem.slug,
                error = %e,
                "Dispatch to Judge0 failed"
            );
        })?;

        let new = NewSubmission {
            user_id,
            problem_id: problem.id,
            language,
            code: payload.code,
            full_code: outcome.full_code,
            active_contest_id: payload.active_contest_id,
        };
        let (submission, test_cases) = self.store.create_submission(new, &outcome.tokens).await?;

        tracing::info!(
            submission_id = %submission.id,
            user_id = %user_id,
            problem = %problem.slug,
            language = %language,
            tests = test_cases.len(),
            "Submission created"
        );

        Ok(submission)
    }

    /// Aggregate status and ordered test cases of a caller's own submission.
    ///
    /// Someone else's submission is reported as not found.
    pub async fn get_status(
        &self,
        caller: Option<Uuid>,
        id: Uuid,
    ) -> AppResult<SubmissionStatusResponse> {
        let user_id = caller.ok_or(AppError::Unauthorized)?;

        let submission = self
            .store
            .find_submission(id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        let test_cases = self.store.list_test_cases(id).await?;

        Ok(SubmissionStatusResponse::new(submission, test_cases))
    }

    /// The caller's submissions for a problem, newest first
    pub async fn list_for_problem(
        &self,
        caller: Uuid,
        problem_id: Uuid,
        page: u32,
        per_page: u32,
    ) -> AppResult<(Vec<SubmissionView>, i64)> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);

        let (submissions, total) = self
            .store
            .list_for_problem(caller, problem_id, offset, i64::from(per_page))
            .await?;

        Ok((submissions.into_iter().map(SubmissionView::from).collect(), total))
    }
}
