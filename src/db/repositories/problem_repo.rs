//! Problem repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::AppResult, models::ProblemRecord};

/// Repository for problem lookups
pub struct ProblemRepository;

impl ProblemRepository {
    /// Find problem by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> AppResult<Option<ProblemRecord>> {
        let problem = sqlx::query_as::<_, ProblemRecord>(
            r#"SELECT id, slug, title FROM problems WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(problem)
    }
}
