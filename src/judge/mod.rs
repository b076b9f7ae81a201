//! Judging client
//!
//! Turns a resolved problem and a user's code into a single Judge0 batch and
//! hands back one tracking token per test case, in test case order.
//!
//! The transport is behind [`JudgeClient`] so the dispatch rules (materialize
//! once, one item per input, tokens 1:1 with inputs, all-or-nothing) are
//! independent of HTTP.

pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::{Language, Problem},
};

pub use client::Judge0Client;
pub use types::{BatchItem, Judge0Status, Judge0Submission};

/// Transport to the remote execution service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Submit a batch; returns one token per item, in submission order
    async fn submit_batch(&self, items: Vec<BatchItem>) -> AppResult<Vec<String>>;

    /// Fetch the current status of previously issued tokens
    async fn fetch_batch(&self, tokens: Vec<String>) -> AppResult<Vec<Judge0Submission>>;
}

/// Result of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Boilerplate with the user's code substituted
    pub full_code: String,
    /// Token for test case `i` at position `i`
    pub tokens: Vec<String>,
}

/// Build the batch for `problem` and submit it in one call.
///
/// Fails without contacting Judge0 when the problem has no inputs, the
/// inputs and outputs disagree in length, or the code is empty. Any transport
/// failure, or a reply that is not exactly one token per input, fails the
/// whole dispatch.
pub async fn dispatch(
    client: &dyn JudgeClient,
    callback_url: Option<&str>,
    problem: &Problem,
    language: Language,
    code: &str,
) -> AppResult<DispatchOutcome> {
    if code.trim().is_empty() {
        return Err(AppError::Validation("Code cannot be empty".to_string()));
    }
    if problem.test_count() == 0 {
        return Err(AppError::InvalidInput(format!(
            "Problem {} has no test cases",
            problem.slug
        )));
    }
    if problem.inputs.len() != problem.outputs.len() {
        return Err(AppError::Configuration(format!(
            "Problem {} has {} inputs but {} outputs",
            problem.slug,
            problem.inputs.len(),
            problem.outputs.len()
        )));
    }

    let full_code = problem.materialize(code)?;
    let language_id = language.judge0_id();

    let items: Vec<BatchItem> = problem
        .test_cases()
        .map(|(input, output)| BatchItem {
            language_id,
            source_code: full_code.clone(),
            stdin: input.to_string(),
            expected_output: output.to_string(),
            callback_url: callback_url.map(str::to_string),
        })
        .collect();
    let expected = items.len();

    tracing::debug!(
        problem = %problem.slug,
        language = %language,
        items = expected,
        "Dispatching batch to Judge0"
    );

    let tokens = client.submit_batch(items).await?;

    if tokens.len() != expected {
        return Err(AppError::Upstream(format!(
            "expected {} tokens from Judge0, got {}",
            expected,
            tokens.len()
        )));
    }

    Ok(DispatchOutcome { full_code, tokens })
}
