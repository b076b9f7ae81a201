//! Problem catalog
//!
//! Problems are looked up by id in the database to find their slug, then
//! their boilerplate and hidden tests are read from the problem mount:
//!
//! ```text
//! <mount>/<slug>/boilerplate-full/function.<language key>
//! <mount>/<slug>/tests/inputs/0.txt, 1.txt, ...
//! <mount>/<slug>/tests/outputs/0.txt, 1.txt, ...
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::repositories::ProblemRepository,
    error::{AppError, AppResult},
    models::{Language, Problem},
};

/// Read-only source of judgeable problems
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemCatalog: Send + Sync {
    /// Resolve a problem for one language; `None` if the id is unknown
    async fn resolve(&self, problem_id: Uuid, language: Language) -> AppResult<Option<Problem>>;
}

/// Catalog backed by the `problems` table and the problem mount
#[derive(Debug, Clone)]
pub struct MountedProblemCatalog {
    pool: PgPool,
    mount_path: PathBuf,
}

impl MountedProblemCatalog {
    pub fn new(pool: PgPool, mount_path: PathBuf) -> Self {
        Self { pool, mount_path }
    }
}

#[async_trait]
impl ProblemCatalog for MountedProblemCatalog {
    async fn resolve(&self, problem_id: Uuid, language: Language) -> AppResult<Option<Problem>> {
        let Some(record) = ProblemRepository::find_by_id(&self.pool, &problem_id).await? else {
            return Ok(None);
        };

        let problem = load_problem(&self.mount_path, record.id, &record.slug, language).await?;
        Ok(Some(problem))
    }
}

/// Read a problem's content for `language` from the mount
pub async fn load_problem(
    mount_path: &Path,
    id: Uuid,
    slug: &str,
    language: Language,
) -> AppResult<Problem> {
    let root = mount_path.join(slug);

    let boilerplate_path = root
        .join("boilerplate-full")
        .join(format!("function.{}", language.key()));
    let full_boilerplate = match tokio::fs::read_to_string(&boilerplate_path).await {
        Ok(code) => code,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::Validation(format!(
                "Language {} is not available for this problem",
                language
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let inputs = read_numbered_files(&root.join("tests").join("inputs")).await?;
    let outputs = read_numbered_files(&root.join("tests").join("outputs")).await?;

    if inputs.len() != outputs.len() {
        return Err(AppError::Configuration(format!(
            "Problem {} has {} inputs but {} outputs",
            slug,
            inputs.len(),
            outputs.len()
        )));
    }

    tracing::debug!(problem = %slug, language = %language, tests = inputs.len(), "Loaded problem");

    Ok(Problem {
        id,
        slug: slug.to_string(),
        language,
        full_boilerplate,
        inputs,
        outputs,
    })
}

/// Read `0.txt`, `1.txt`, ... in numeric order; the sequence must be gapless
async fn read_numbered_files(dir: &Path) -> AppResult<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut numbered = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        if let Some(n) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<usize>().ok())
        {
            numbered.push((n, path));
        }
    }
    numbered.sort_by_key(|(n, _)| *n);

    let mut contents = Vec::with_capacity(numbered.len());
    for (expected, (n, path)) in numbered.into_iter().enumerate() {
        if n != expected {
            return Err(AppError::Configuration(format!(
                "missing test file {}/{}.txt",
                dir.display(),
                expected
            )));
        }
        contents.push(tokio::fs::read_to_string(&path).await?);
    }

    Ok(contents)
}
