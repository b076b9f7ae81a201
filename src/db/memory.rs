//! In-memory store used by service tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Submission, SubmissionStatus, TestCase, aggregate_status},
};

use super::store::{NewSubmission, ReconcileOutcome, SubmissionStore, TestCaseRef};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<Uuid, (Submission, Vec<TestCase>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submission_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn test_case_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .values()
            .map(|(_, cases)| cases.len())
            .sum()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create_submission(
        &self,
        new: NewSubmission,
        tokens: &[String],
    ) -> AppResult<(Submission, Vec<TestCase>)> {
        let now = Utc::now();
        let submission = Submission {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            problem_id: new.problem_id,
            language: new.language,
            code: new.code,
            full_code: new.full_code,
            status: SubmissionStatus::Pending,
            active_contest_id: new.active_contest_id,
            created_at: now,
            judged_at: None,
        };

        let mut inner = self.inner.lock().unwrap();
        let token_taken = inner
            .values()
            .flat_map(|(_, cases)| cases.iter())
            .any(|tc| tokens.contains(&tc.token));
        if token_taken {
            return Err(AppError::AlreadyExists("Resource already exists".to_string()));
        }

        let test_cases: Vec<TestCase> = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| TestCase {
                id: Uuid::new_v4(),
                submission_id: submission.id,
                index: index as i32,
                token: token.clone(),
                status: SubmissionStatus::Pending,
                updated_at: now,
            })
            .collect();

        inner.insert(submission.id, (submission.clone(), test_cases.clone()));
        Ok((submission, test_cases))
    }

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>> {
        Ok(self.inner.lock().unwrap().get(&id).map(|(s, _)| s.clone()))
    }

    async fn list_test_cases(&self, submission_id: Uuid) -> AppResult<Vec<TestCase>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .get(&submission_id)
            .map(|(_, cases)| cases.clone())
            .unwrap_or_default())
    }

    async fn list_for_problem(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let mut matching: Vec<Submission> = self
            .inner
            .lock()
            .unwrap()
            .values()
            .map(|(s, _)| s.clone())
            .filter(|s| s.user_id == user_id && s.problem_id == problem_id)
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn record_verdict(
        &self,
        target: &TestCaseRef,
        status: SubmissionStatus,
    ) -> AppResult<Option<ReconcileOutcome>> {
        let mut inner = self.inner.lock().unwrap();

        let location = match target {
            TestCaseRef::Token(token) => inner.iter().find_map(|(id, (_, cases))| {
                cases
                    .iter()
                    .find(|tc| &tc.token == token)
                    .map(|tc| (*id, tc.index))
            }),
            TestCaseRef::Index {
                submission_id,
                index,
            } => inner
                .get(submission_id)
                .filter(|(_, cases)| cases.iter().any(|tc| tc.index == *index))
                .map(|_| (*submission_id, *index)),
        };
        let Some((submission_id, index)) = location else {
            return Ok(None);
        };

        let Some((submission, cases)) = inner.get_mut(&submission_id) else {
            return Ok(None);
        };
        for tc in cases.iter_mut().filter(|tc| tc.index == index) {
            tc.status = status;
            tc.updated_at = Utc::now();
        }

        let previous = submission.status;
        let aggregate = aggregate_status(cases.iter().map(|tc| tc.status));
        if aggregate != previous {
            submission.status = aggregate;
            submission.judged_at = aggregate.is_terminal().then(Utc::now);
        }

        Ok(Some(ReconcileOutcome {
            submission_id,
            index,
            test_case_status: status,
            previous,
            aggregate,
        }))
    }
}
