//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::constants::statuses;

use super::Language;

/// Submission database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    #[sqlx(rename = "language_id", try_from = "i32")]
    pub language: Language,
    pub code: String,
    #[serde(skip_serializing)]
    pub full_code: String,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub active_contest_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub judged_at: Option<DateTime<Utc>>,
}

/// Status of a submission or of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "FAIL")]
    Failed,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
    #[serde(rename = "COMPILATION_ERROR")]
    CompilationError,
}

impl SubmissionStatus {
    /// Get status as stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => statuses::PENDING,
            Self::Accepted => statuses::ACCEPTED,
            Self::Failed => statuses::FAIL,
            Self::TimeLimitExceeded => statuses::TIME_LIMIT_EXCEEDED,
            Self::CompilationError => statuses::COMPILATION_ERROR,
        }
    }

    /// Parse status from stored string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            statuses::PENDING => Some(Self::Pending),
            statuses::ACCEPTED => Some(Self::Accepted),
            statuses::FAIL => Some(Self::Failed),
            statuses::TIME_LIMIT_EXCEEDED => Some(Self::TimeLimitExceeded),
            statuses::COMPILATION_ERROR => Some(Self::CompilationError),
            _ => None,
        }
    }

    /// Check if judging is complete
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Check if this is a non-accept verdict
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Pending | Self::Accepted)
    }

    /// How the status is presented to a user
    pub fn display(&self) -> StatusDisplay {
        match self {
            Self::Pending => StatusDisplay {
                label: "Pending",
                tone: StatusTone::Info,
                icon: StatusIcon::Spinner,
            },
            Self::Accepted => StatusDisplay {
                label: "Accepted",
                tone: StatusTone::Success,
                icon: StatusIcon::Check,
            },
            Self::Failed => StatusDisplay {
                label: "Wrong Answer",
                tone: StatusTone::Danger,
                icon: StatusIcon::Cross,
            },
            Self::TimeLimitExceeded => StatusDisplay {
                label: "Time Limit Exceeded",
                tone: StatusTone::Danger,
                icon: StatusIcon::Clock,
            },
            Self::CompilationError => StatusDisplay {
                label: "Compilation Error",
                tone: StatusTone::Danger,
                icon: StatusIcon::Cross,
            },
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for a stored status string outside the enum
#[derive(Debug, thiserror::Error)]
#[error("unknown submission status: {0}")]
pub struct UnknownStatus(pub String);

impl TryFrom<String> for SubmissionStatus {
    type Error = UnknownStatus;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or(UnknownStatus(s))
    }
}

/// Presentation of a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub tone: StatusTone,
    pub icon: StatusIcon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Info,
    Success,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusIcon {
    Spinner,
    Check,
    Cross,
    Clock,
}

/// Aggregate verdict of a submission from its test case statuses.
///
/// `statuses` must be in test case index order. All accepted gives `AC`;
/// otherwise the first failure in index order wins, even if earlier cases are
/// still pending; with no failure and something pending, the result is
/// `PENDING`. An empty set is `PENDING`.
pub fn aggregate_status<I>(statuses: I) -> SubmissionStatus
where
    I: IntoIterator<Item = SubmissionStatus>,
{
    let mut any = false;
    let mut pending = false;

    for status in statuses {
        any = true;
        match status {
            SubmissionStatus::Accepted => {}
            SubmissionStatus::Pending => pending = true,
            failure => return failure,
        }
    }

    if !any || pending {
        SubmissionStatus::Pending
    } else {
        SubmissionStatus::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::SubmissionStatus::*;
    use super::*;

    #[test]
    fn test_first_failure_wins() {
        assert_eq!(aggregate_status([Accepted, Accepted, Failed, Pending]), Failed);
        assert_eq!(
            aggregate_status([Accepted, TimeLimitExceeded, Failed]),
            TimeLimitExceeded
        );
        assert_eq!(aggregate_status([Pending, CompilationError, Failed]), CompilationError);
    }

    #[test]
    fn test_all_accepted() {
        assert_eq!(aggregate_status([Accepted, Accepted, Accepted, Accepted]), Accepted);
    }

    #[test]
    fn test_pending_without_failure() {
        assert_eq!(aggregate_status([Accepted, Pending, Pending, Pending]), Pending);
        assert_eq!(aggregate_status([Pending]), Pending);
    }

    #[test]
    fn test_empty_set_is_pending() {
        assert_eq!(aggregate_status(Vec::new()), Pending);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let statuses = vec![Accepted, Pending, TimeLimitExceeded, Failed];
        assert_eq!(
            aggregate_status(statuses.clone()),
            aggregate_status(statuses)
        );
    }

    #[test]
    fn test_status_strings_round_trip() {
        for s in statuses::ALL {
            let status = SubmissionStatus::parse(s).unwrap();
            assert_eq!(status.as_str(), *s);
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{s}\""));
        }
        assert!(SubmissionStatus::try_from("WA".to_string()).is_err());
    }

    #[test]
    fn test_display_descriptor() {
        assert_eq!(Accepted.display().tone, StatusTone::Success);
        assert_eq!(Pending.display().icon, StatusIcon::Spinner);
        assert_eq!(TimeLimitExceeded.display().icon, StatusIcon::Clock);
        assert!([Failed, TimeLimitExceeded, CompilationError]
            .iter()
            .all(|s| s.display().tone == StatusTone::Danger));
    }
}
