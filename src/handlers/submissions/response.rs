//! Submission response DTOs
//!
//! These also deserialize, so the polling client reads the same shapes the
//! server writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Language, Submission, SubmissionStatus, TestCase};

/// Submission as shown to its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionView {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub language: Language,
    pub status: SubmissionStatus,
    pub code: String,
    pub active_contest_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub judged_at: Option<DateTime<Utc>>,
}

impl From<Submission> for SubmissionView {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            problem_id: s.problem_id,
            language: s.language,
            status: s.status,
            code: s.code,
            active_contest_id: s.active_contest_id,
            created_at: s.created_at,
            judged_at: s.judged_at,
        }
    }
}

/// Verdict of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseView {
    pub index: i32,
    pub status: SubmissionStatus,
}

impl From<TestCase> for TestCaseView {
    fn from(tc: TestCase) -> Self {
        Self {
            index: tc.index,
            status: tc.status,
        }
    }
}

/// `GET /submissions/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionStatusResponse {
    pub submission: SubmissionView,
    /// Ordered by index
    pub test_cases: Vec<TestCaseView>,
    pub passed: usize,
    pub total: usize,
}

impl SubmissionStatusResponse {
    pub fn new(submission: Submission, test_cases: Vec<TestCase>) -> Self {
        let mut test_cases: Vec<TestCaseView> =
            test_cases.into_iter().map(TestCaseView::from).collect();
        test_cases.sort_by_key(|tc| tc.index);

        let passed = test_cases
            .iter()
            .filter(|tc| tc.status == SubmissionStatus::Accepted)
            .count();
        let total = test_cases.len();

        Self {
            submission: submission.into(),
            test_cases,
            passed,
            total,
        }
    }
}

/// Submission list response
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionsListResponse {
    pub submissions: Vec<SubmissionView>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// Create submission response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSubmissionResponse {
    pub id: Uuid,
    pub message: String,
}

/// Acknowledgement of a Judge0 callback
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub message: String,
}
