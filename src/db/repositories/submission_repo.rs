//! Submission repository
//!
//! Writes that must be atomic take a `&mut PgConnection` so callers can run
//! them inside one transaction.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    db::store::NewSubmission,
    error::AppResult,
    models::{Submission, SubmissionStatus, TestCase},
};

/// Repository for submission and test case database operations
pub struct SubmissionRepository;

impl SubmissionRepository {
    /// Insert a new submission
    pub async fn insert(conn: &mut PgConnection, new: &NewSubmission) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (user_id, problem_id, language_id, code, full_code, status, active_contest_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.problem_id)
        .bind(new.language.internal_id())
        .bind(&new.code)
        .bind(&new.full_code)
        .bind(SubmissionStatus::Pending.as_str())
        .bind(new.active_contest_id)
        .fetch_one(conn)
        .await?;

        Ok(submission)
    }

    /// Insert one pending test case per token, index-aligned.
    ///
    /// Returns the inserted rows in index order.
    pub async fn insert_test_cases(
        conn: &mut PgConnection,
        submission_id: &Uuid,
        tokens: &[String],
    ) -> AppResult<Vec<TestCase>> {
        let indices: Vec<i32> = (0..tokens.len() as i32).collect();

        let mut test_cases = sqlx::query_as::<_, TestCase>(
            r#"
            INSERT INTO test_cases (submission_id, "index", token, status)
            SELECT $1, t.idx, t.token, $4
            FROM UNNEST($2::int4[], $3::text[]) AS t(idx, token)
            RETURNING *
            "#,
        )
        .bind(submission_id)
        .bind(&indices)
        .bind(tokens)
        .bind(SubmissionStatus::Pending.as_str())
        .fetch_all(conn)
        .await?;

        test_cases.sort_by_key(|tc| tc.index);
        Ok(test_cases)
    }

    /// Find submission by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> AppResult<Option<Submission>> {
        let submission =
            sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(submission)
    }

    /// Test cases of a submission in index order
    pub async fn list_test_cases(pool: &PgPool, submission_id: &Uuid) -> AppResult<Vec<TestCase>> {
        let test_cases = sqlx::query_as::<_, TestCase>(
            r#"SELECT * FROM test_cases WHERE submission_id = $1 ORDER BY "index""#,
        )
        .bind(submission_id)
        .fetch_all(pool)
        .await?;

        Ok(test_cases)
    }

    /// A user's submissions for one problem, newest first
    pub async fn list_for_problem(
        pool: &PgPool,
        user_id: &Uuid,
        problem_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE user_id = $1 AND problem_id = $2
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(problem_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM submissions WHERE user_id = $1 AND problem_id = $2"#,
        )
        .bind(user_id)
        .bind(problem_id)
        .fetch_one(pool)
        .await?;

        Ok((submissions, count))
    }

    /// Resolve a Judge0 token to `(submission_id, index)`
    pub async fn locate_by_token(
        conn: &mut PgConnection,
        token: &str,
    ) -> AppResult<Option<(Uuid, i32)>> {
        let location = sqlx::query_as::<_, (Uuid, i32)>(
            r#"SELECT submission_id, "index" FROM test_cases WHERE token = $1"#,
        )
        .bind(token)
        .fetch_optional(conn)
        .await?;

        Ok(location)
    }

    /// Check that a test case exists
    pub async fn test_case_exists(
        conn: &mut PgConnection,
        submission_id: &Uuid,
        index: i32,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM test_cases WHERE submission_id = $1 AND "index" = $2)"#,
        )
        .bind(submission_id)
        .bind(index)
        .fetch_one(conn)
        .await?;

        Ok(exists)
    }

    /// Lock the submission row for the rest of the transaction and return its status
    pub async fn lock_status(conn: &mut PgConnection, id: &Uuid) -> AppResult<String> {
        let status: String =
            sqlx::query_scalar(r#"SELECT status FROM submissions WHERE id = $1 FOR UPDATE"#)
                .bind(id)
                .fetch_one(conn)
                .await?;

        Ok(status)
    }

    /// Set one test case's status
    pub async fn update_test_case_status(
        conn: &mut PgConnection,
        submission_id: &Uuid,
        index: i32,
        status: SubmissionStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE test_cases
            SET status = $3, updated_at = NOW()
            WHERE submission_id = $1 AND "index" = $2
            "#,
        )
        .bind(submission_id)
        .bind(index)
        .bind(status.as_str())
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Current test case statuses in index order
    pub async fn test_case_statuses(
        conn: &mut PgConnection,
        submission_id: &Uuid,
    ) -> AppResult<Vec<String>> {
        let statuses: Vec<String> = sqlx::query_scalar(
            r#"SELECT status FROM test_cases WHERE submission_id = $1 ORDER BY "index""#,
        )
        .bind(submission_id)
        .fetch_all(conn)
        .await?;

        Ok(statuses)
    }

    /// Set the aggregate status; `judged_at` tracks the last terminal verdict
    pub async fn update_status(
        conn: &mut PgConnection,
        id: &Uuid,
        status: SubmissionStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE submissions
            SET
                status = $2,
                judged_at = CASE WHEN $2 = 'PENDING' THEN NULL ELSE NOW() END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .execute(conn)
        .await?;

        Ok(())
    }
}
