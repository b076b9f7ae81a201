//! Submission client
//!
//! Submits code to the API and polls the verdict with exponential backoff.
//! The HTTP side lives behind [`StatusSource`]; the polling rules live in
//! [`PollingClient`].

pub mod http;
pub mod poller;

use async_trait::async_trait;
use uuid::Uuid;

use crate::handlers::submissions::{CreateSubmissionRequest, SubmissionStatusResponse};

pub use http::HttpSubmissionApi;
pub use poller::{BackoffPolicy, PollEvent, PollOutcome, PollState, PollingClient};

/// Client-side errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Where submissions go and statuses come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Create a submission; returns its id
    async fn submit(&self, request: CreateSubmissionRequest) -> Result<Uuid, ClientError>;

    /// Current aggregate status and test cases of a submission
    async fn status(&self, id: Uuid) -> Result<SubmissionStatusResponse, ClientError>;
}
