//! Problem model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    constants::USER_CODE_MARKER,
    error::{AppError, AppResult},
};

use super::Language;

/// Problem database row (content lives on the problem mount)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
}

/// A problem resolved for one language, ready for judging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub id: Uuid,
    pub slug: String,
    pub language: Language,
    /// Full boilerplate containing exactly one user code marker
    pub full_boilerplate: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Problem {
    /// Number of hidden test cases
    pub fn test_count(&self) -> usize {
        self.inputs.len()
    }

    /// `(input, expected_output)` pairs in index order
    pub fn test_cases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inputs
            .iter()
            .map(String::as_str)
            .zip(self.outputs.iter().map(String::as_str))
    }

    /// Replace the user code marker with `code`
    pub fn materialize(&self, code: &str) -> AppResult<String> {
        if !self.full_boilerplate.contains(USER_CODE_MARKER) {
            return Err(AppError::Configuration(format!(
                "boilerplate for {} ({}) has no user code marker",
                self.slug, self.language
            )));
        }
        Ok(self.full_boilerplate.replacen(USER_CODE_MARKER, code, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(boilerplate: &str) -> Problem {
        Problem {
            id: Uuid::new_v4(),
            slug: "sum".to_string(),
            language: Language::Cpp,
            full_boilerplate: boilerplate.to_string(),
            inputs: vec!["1 2".to_string(), "3 4".to_string()],
            outputs: vec!["3".to_string(), "7".to_string()],
        }
    }

    #[test]
    fn test_materialize_replaces_marker() {
        let p = problem("#include <cstdio>\n##USER_CODE_HERE##\nint main() {}");
        let source = p.materialize("int sum(int a, int b) { return a + b; }").unwrap();
        assert_eq!(
            source,
            "#include <cstdio>\nint sum(int a, int b) { return a + b; }\nint main() {}"
        );
    }

    #[test]
    fn test_materialize_only_substitutes_once() {
        let p = problem("a##USER_CODE_HERE##b##USER_CODE_HERE##");
        let source = p.materialize("x").unwrap();
        assert_eq!(source, "axb##USER_CODE_HERE##");
    }

    #[test]
    fn test_materialize_without_marker_fails() {
        let p = problem("int main() {}");
        assert!(matches!(
            p.materialize("x"),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_cases_are_index_aligned() {
        let p = problem("##USER_CODE_HERE##");
        let pairs: Vec<_> = p.test_cases().collect();
        assert_eq!(pairs, vec![("1 2", "3"), ("3 4", "7")]);
        assert_eq!(p.test_count(), 2);
    }
}
