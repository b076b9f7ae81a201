//! Database module
//!
//! This module handles database connections, migrations, repositories and
//! the submission store built on top of them.

pub mod connection;
#[cfg(test)]
pub mod memory;
pub mod repositories;
pub mod store;

use sqlx::PgPool;

pub use connection::*;
pub use store::{NewSubmission, PgStore, ReconcileOutcome, SubmissionStore, TestCaseRef};

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
