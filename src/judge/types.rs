//! Judge0 wire types

use serde::{Deserialize, Serialize};

use crate::{constants::judge0_status, models::SubmissionStatus};

/// One item of a batch submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub language_id: u32,
    pub source_code: String,
    pub stdin: String,
    pub expected_output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// Body of `POST /submissions/batch`
#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub submissions: &'a [BatchItem],
}

/// One entry of the batch submission reply.
///
/// Judge0 answers a rejected item with its validation errors instead of a
/// token, so the token is optional here.
#[derive(Debug, Deserialize)]
pub struct BatchTokenEntry {
    pub token: Option<String>,
}

/// Judge0 execution status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judge0Status {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

impl Judge0Status {
    /// Map Judge0's status onto ours
    pub fn verdict(&self) -> SubmissionStatus {
        match self.id {
            judge0_status::IN_QUEUE | judge0_status::PROCESSING => SubmissionStatus::Pending,
            judge0_status::ACCEPTED => SubmissionStatus::Accepted,
            judge0_status::WRONG_ANSWER => SubmissionStatus::Failed,
            judge0_status::TIME_LIMIT_EXCEEDED => SubmissionStatus::TimeLimitExceeded,
            judge0_status::COMPILATION_ERROR => SubmissionStatus::CompilationError,
            // runtime errors, internal error, exec format error
            _ => SubmissionStatus::Failed,
        }
    }
}

/// A Judge0 submission as delivered by callback or batch fetch.
///
/// Only the fields used for reconciliation are kept; the rest of the
/// payload (stdout, time, memory, ...) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judge0Submission {
    pub token: String,
    pub status: Judge0Status,
}

/// Body of `GET /submissions/batch`
#[derive(Debug, Deserialize)]
pub struct BatchStatusResponse {
    pub submissions: Vec<Option<Judge0Submission>>,
}
