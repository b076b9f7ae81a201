//! Submission request DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::{validate_language_key, validate_source_code};

/// Create submission request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    /// Problem ID to submit for
    #[serde(alias = "problemId")]
    pub problem_id: Uuid,

    /// Language key (`js`, `cpp`, `rs`, `java`)
    #[serde(alias = "languageId")]
    #[validate(custom(function = "validate_language_key"))]
    pub language_id: String,

    /// The user's function body, spliced into the problem's boilerplate
    #[validate(custom(function = "validate_source_code"))]
    pub code: String,

    /// Contest the submission was made in, if any (stored, not checked)
    #[serde(default, alias = "activeContestId")]
    pub active_contest_id: Option<Uuid>,
}

/// List submissions query parameters
#[derive(Debug, Deserialize)]
pub struct ListSubmissionsQuery {
    pub problem_id: Uuid,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Status query parameters
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    /// Pull pending verdicts from Judge0 before answering
    #[serde(default)]
    pub refresh: bool,
}
