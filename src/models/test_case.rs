//! Test case execution model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::SubmissionStatus;

/// One execution of a submission against one problem input
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub submission_id: Uuid,
    /// 0-based, aligned with the problem's input order
    pub index: i32,
    /// Judge0 tracking token
    pub token: String,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub updated_at: DateTime<Utc>,
}
