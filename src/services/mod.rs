//! Business logic services

pub mod auth_service;
pub mod problem_service;
pub mod reconciliation_service;
pub mod submission_service;

pub use auth_service::AuthService;
#[cfg(test)]
pub use problem_service::MockProblemCatalog;
pub use problem_service::{MountedProblemCatalog, ProblemCatalog};
pub use reconciliation_service::ReconciliationService;
pub use submission_service::SubmissionService;
