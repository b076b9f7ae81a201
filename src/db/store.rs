//! Submission store
//!
//! The single source of truth for a submission and its test cases. A
//! submission and its full set of test cases are written together or not at
//! all, and verdicts are applied under a per-submission lock so concurrent
//! results for different test cases cannot lose an aggregate update.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Language, Submission, SubmissionStatus, TestCase, aggregate_status},
};

use super::repositories::SubmissionRepository;

/// Everything needed to persist a freshly dispatched submission
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub language: Language,
    pub code: String,
    pub full_code: String,
    pub active_contest_id: Option<Uuid>,
}

/// Addresses one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCaseRef {
    /// By Judge0 tracking token (callbacks, pulled statuses)
    Token(String),
    /// By position within a submission
    Index { submission_id: Uuid, index: i32 },
}

/// What a verdict did to its submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub submission_id: Uuid,
    pub index: i32,
    pub test_case_status: SubmissionStatus,
    pub previous: SubmissionStatus,
    pub aggregate: SubmissionStatus,
}

impl ReconcileOutcome {
    /// Whether the submission's aggregate status changed
    pub fn changed(&self) -> bool {
        self.previous != self.aggregate
    }
}

/// Durable storage for submissions and their test cases
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a submission and one pending test case per token, atomically
    async fn create_submission(
        &self,
        new: NewSubmission,
        tokens: &[String],
    ) -> AppResult<(Submission, Vec<TestCase>)>;

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>>;

    /// Test cases in index order
    async fn list_test_cases(&self, submission_id: Uuid) -> AppResult<Vec<TestCase>>;

    /// A user's submissions for a problem, newest first, with the total count
    async fn list_for_problem(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)>;

    /// Set one test case's status and recompute the aggregate from scratch.
    ///
    /// Returns `None` when the test case does not exist.
    async fn record_verdict(
        &self,
        target: &TestCaseRef,
        status: SubmissionStatus,
    ) -> AppResult<Option<ReconcileOutcome>>;
}

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn create_submission(
        &self,
        new: NewSubmission,
        tokens: &[String],
    ) -> AppResult<(Submission, Vec<TestCase>)> {
        let mut tx = self.pool.begin().await?;

        let submission = SubmissionRepository::insert(&mut tx, &new).await?;
        let test_cases =
            SubmissionRepository::insert_test_cases(&mut tx, &submission.id, tokens).await?;

        tx.commit().await?;

        Ok((submission, test_cases))
    }

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>> {
        SubmissionRepository::find_by_id(&self.pool, &id).await
    }

    async fn list_test_cases(&self, submission_id: Uuid) -> AppResult<Vec<TestCase>> {
        SubmissionRepository::list_test_cases(&self.pool, &submission_id).await
    }

    async fn list_for_problem(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)> {
        SubmissionRepository::list_for_problem(&self.pool, &user_id, &problem_id, offset, limit)
            .await
    }

    async fn record_verdict(
        &self,
        target: &TestCaseRef,
        status: SubmissionStatus,
    ) -> AppResult<Option<ReconcileOutcome>> {
        let mut tx = self.pool.begin().await?;

        let (submission_id, index) = match target {
            TestCaseRef::Token(token) => {
                match SubmissionRepository::locate_by_token(&mut tx, token).await? {
                    Some(location) => location,
                    None => return Ok(None),
                }
            }
            TestCaseRef::Index {
                submission_id,
                index,
            } => {
                if !SubmissionRepository::test_case_exists(&mut tx, submission_id, *index).await? {
                    return Ok(None);
                }
                (*submission_id, *index)
            }
        };

        let previous = SubmissionRepository::lock_status(&mut tx, &submission_id).await?;
        let previous = parse_stored(&previous)?;

        SubmissionRepository::update_test_case_status(&mut tx, &submission_id, index, status)
            .await?;

        let statuses = SubmissionRepository::test_case_statuses(&mut tx, &submission_id)
            .await?
            .iter()
            .map(|s| parse_stored(s))
            .collect::<AppResult<Vec<_>>>()?;
        let aggregate = aggregate_status(statuses);

        if aggregate != previous {
            SubmissionRepository::update_status(&mut tx, &submission_id, aggregate).await?;
        }

        tx.commit().await?;

        Ok(Some(ReconcileOutcome {
            submission_id,
            index,
            test_case_status: status,
            previous,
            aggregate,
        }))
    }
}

fn parse_stored(s: &str) -> AppResult<SubmissionStatus> {
    SubmissionStatus::parse(s)
        .ok_or_else(|| AppError::Database(format!("unknown status in database: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::database::{insert_problem, test_pool};

    use SubmissionStatus::*;

    fn new_submission(user_id: Uuid, problem_id: Uuid) -> NewSubmission {
        NewSubmission {
            user_id,
            problem_id,
            language: Language::Cpp,
            code: "int add(int a, int b) { return a + b; }".to_string(),
            full_code: "int add(int a, int b) { return a + b; }\nint main() {}".to_string(),
            active_contest_id: None,
        }
    }

    fn fresh_tokens(n: usize) -> Vec<String> {
        (0..n).map(|_| Uuid::new_v4().to_string()).collect()
    }

    async fn submission_rows(pool: &PgPool, user_id: Uuid) -> i64 {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM submissions WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_pending_cases_in_index_order() {
        let pool = test_pool().await;
        let problem_id = insert_problem(&pool).await;
        let store = PgStore::new(pool);
        let tokens = fresh_tokens(5);

        let (submission, test_cases) = store
            .create_submission(new_submission(Uuid::new_v4(), problem_id), &tokens)
            .await
            .unwrap();

        assert_eq!(submission.status, Pending);
        assert!(submission.judged_at.is_none());
        let stored: Vec<(i32, &str)> = test_cases
            .iter()
            .map(|tc| (tc.index, tc.token.as_str()))
            .collect();
        let expected: Vec<(i32, &str)> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (i as i32, t.as_str()))
            .collect();
        assert_eq!(stored, expected);
        assert!(test_cases.iter().all(|tc| tc.status == Pending));
    }

    #[tokio::test]
    async fn test_failed_test_case_insert_rolls_back_submission() {
        let pool = test_pool().await;
        let problem_id = insert_problem(&pool).await;
        let store = PgStore::new(pool.clone());
        let user_id = Uuid::new_v4();
        let token = Uuid::new_v4().to_string();

        // tokens are unique, so the second row violates the constraint
        let result = store
            .create_submission(
                new_submission(user_id, problem_id),
                &[token.clone(), token],
            )
            .await;

        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
        assert_eq!(submission_rows(&pool, user_id).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_verdicts_produce_correct_aggregate() {
        let pool = test_pool().await;
        let problem_id = insert_problem(&pool).await;
        let store = PgStore::new(pool);

        for failing in [None, Some(5)] {
            let (submission, _) = store
                .create_submission(
                    new_submission(Uuid::new_v4(), problem_id),
                    &fresh_tokens(8),
                )
                .await
                .unwrap();

            let handles: Vec<_> = (0..8)
                .map(|index| {
                    let store = store.clone();
                    let status = if Some(index) == failing { Failed } else { Accepted };
                    tokio::spawn(async move {
                        store
                            .record_verdict(
                                &TestCaseRef::Index {
                                    submission_id: submission.id,
                                    index,
                                },
                                status,
                            )
                            .await
                    })
                })
                .collect();
            for handle in handles {
                assert!(handle.await.unwrap().unwrap().is_some());
            }

            let stored = store.find_submission(submission.id).await.unwrap().unwrap();
            let expected = if failing.is_some() { Failed } else { Accepted };
            assert_eq!(stored.status, expected, "failing index {:?}", failing);
            assert!(stored.judged_at.is_some());
            assert!(
                store
                    .list_test_cases(submission.id)
                    .await
                    .unwrap()
                    .iter()
                    .all(|tc| tc.status != Pending)
            );
        }
    }

    #[tokio::test]
    async fn test_record_verdict_by_token_and_judged_at() {
        let pool = test_pool().await;
        let problem_id = insert_problem(&pool).await;
        let store = PgStore::new(pool);
        let tokens = fresh_tokens(2);
        let (submission, _) = store
            .create_submission(new_submission(Uuid::new_v4(), problem_id), &tokens)
            .await
            .unwrap();

        let first = store
            .record_verdict(&TestCaseRef::Token(tokens[1].clone()), Accepted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((first.index, first.aggregate), (1, Pending));
        assert!(!first.changed());
        let stored = store.find_submission(submission.id).await.unwrap().unwrap();
        assert!(stored.judged_at.is_none());

        let last = store
            .record_verdict(&TestCaseRef::Token(tokens[0].clone()), Accepted)
            .await
            .unwrap()
            .unwrap();
        assert!(last.changed());
        let judged_at = store
            .find_submission(submission.id)
            .await
            .unwrap()
            .unwrap()
            .judged_at;
        assert!(judged_at.is_some());

        // a repeated verdict leaves the aggregate row untouched
        store
            .record_verdict(&TestCaseRef::Token(tokens[0].clone()), Accepted)
            .await
            .unwrap();
        let again = store.find_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(again.judged_at, judged_at);

        let unknown = store
            .record_verdict(&TestCaseRef::Token("no-such-token".to_string()), Accepted)
            .await
            .unwrap();
        assert!(unknown.is_none());
    }
}
