//! CodeQuest submit CLI
//!
//! Submits a solution file and polls its verdict.
//!
//! ```text
//! codequest-submit <problem-id> <language> <file> [contest-id]
//! ```
//!
//! Reads `CODEQUEST_API_URL` (default `http://localhost:8080/api/v1`),
//! `CODEQUEST_TOKEN`, `CODEQUEST_REFRESH` and the `POLL_*` settings.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, bail};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use codequest_judge::{
    client::{BackoffPolicy, HttpSubmissionApi, PollEvent, PollOutcome, PollingClient},
    config::PollingConfig,
    handlers::submissions::{CreateSubmissionRequest, TestCaseView},
    models::{Language, StatusIcon},
};

const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

struct Args {
    problem_id: Uuid,
    language: Language,
    file: PathBuf,
    contest_id: Option<Uuid>,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !(3..=4).contains(&args.len()) {
        bail!("usage: codequest-submit <problem-id> <language> <file> [contest-id]");
    }

    let problem_id = Uuid::parse_str(&args[0]).context("problem id must be a UUID")?;
    let Some(language) = Language::from_key(&args[1]) else {
        bail!("unknown language {:?} (expected js, cpp, rs or java)", args[1]);
    };
    let contest_id = args
        .get(3)
        .map(|s| Uuid::parse_str(s).context("contest id must be a UUID"))
        .transpose()?;

    Ok(Args {
        problem_id,
        language,
        file: PathBuf::from(&args[2]),
        contest_id,
    })
}

/// One glyph per test case, in index order
fn progress_line(test_cases: &[TestCaseView]) -> String {
    test_cases
        .iter()
        .map(|tc| match tc.status.display().icon {
            StatusIcon::Spinner => '.',
            StatusIcon::Check => '+',
            StatusIcon::Cross => 'x',
            StatusIcon::Clock => 't',
        })
        .collect()
}

async fn run() -> anyhow::Result<bool> {
    dotenvy::dotenv().ok();
    let args = parse_args()?;

    let code = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;

    let base_url =
        std::env::var("CODEQUEST_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let token = std::env::var("CODEQUEST_TOKEN").ok();
    let refresh = std::env::var("CODEQUEST_REFRESH").is_ok_and(|v| v == "1" || v == "true");
    let policy = BackoffPolicy {
        jitter: true,
        ..BackoffPolicy::from(&PollingConfig::from_env()?)
    };

    let api = HttpSubmissionApi::new(&base_url, token)?.with_refresh(refresh);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut client = PollingClient::new(api, policy).with_events(tx);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                PollEvent::Submitted { id } => tracing::info!(submission_id = %id, "Submitted"),
                PollEvent::Progress(r) => tracing::info!(
                    "{} {}/{} passed",
                    progress_line(&r.test_cases),
                    r.passed,
                    r.total
                ),
                PollEvent::Accepted(r) => tracing::info!(
                    "{} Accepted! {}/{} passed",
                    progress_line(&r.test_cases),
                    r.passed,
                    r.total
                ),
                PollEvent::Failed(r) => tracing::warn!(
                    "{} {} ({}/{} passed)",
                    progress_line(&r.test_cases),
                    r.submission.status.display().label,
                    r.passed,
                    r.total
                ),
                PollEvent::Inconclusive { id } => {
                    tracing::warn!(submission_id = %id, "Not able to get status, try again later")
                }
                PollEvent::Error(message) => tracing::error!("{}", message),
            }
        }
    });

    let request = CreateSubmissionRequest {
        problem_id: args.problem_id,
        language_id: args.language.key().to_string(),
        code,
        active_contest_id: args.contest_id,
    };
    let outcome = client.submit(request, &cancel).await;

    // closing the channel lets the printer drain and stop
    drop(client);
    printer.await.ok();

    if outcome == PollOutcome::Cancelled {
        tracing::info!("Cancelled");
    }
    Ok(matches!(outcome, PollOutcome::Accepted(_)))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
