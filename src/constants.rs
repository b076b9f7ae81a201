//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Upper bound on any single request, including the synchronous Judge0 dispatch
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum request body size in bytes (source code plus envelope)
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// JUDGE0 DEFAULTS
// =============================================================================

/// Default timeout for a single Judge0 HTTP call
pub const DEFAULT_JUDGE0_TIMEOUT_SECS: u64 = 10;

/// Default location of the problem content mount
pub const DEFAULT_MOUNT_PATH: &str = "../../problems";

/// Marker in a full boilerplate that is replaced by the user's code
pub const USER_CODE_MARKER: &str = "##USER_CODE_HERE##";

/// Judge0 status identifiers
pub mod judge0_status {
    pub const IN_QUEUE: u32 = 1;
    pub const PROCESSING: u32 = 2;
    pub const ACCEPTED: u32 = 3;
    pub const WRONG_ANSWER: u32 = 4;
    pub const TIME_LIMIT_EXCEEDED: u32 = 5;
    pub const COMPILATION_ERROR: u32 = 6;
}

// =============================================================================
// POLLING DEFAULTS
// =============================================================================

/// Delay before the first status re-check, in milliseconds
pub const DEFAULT_POLL_INITIAL_DELAY_MS: u64 = 1500;

/// Number of status queries before the poller gives up
pub const DEFAULT_POLL_MAX_RETRIES: u32 = 10;

// =============================================================================
// SUBMISSION STATUSES
// =============================================================================

/// Submission and test case status strings, as stored
pub mod statuses {
    pub const PENDING: &str = "PENDING";
    pub const ACCEPTED: &str = "AC";
    pub const FAIL: &str = "FAIL";
    pub const TIME_LIMIT_EXCEEDED: &str = "TLE";
    pub const COMPILATION_ERROR: &str = "COMPILATION_ERROR";

    /// All status strings
    pub const ALL: &[&str] = &[PENDING, ACCEPTED, FAIL, TIME_LIMIT_EXCEEDED, COMPILATION_ERROR];
}

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Rate limiting configuration
pub mod rate_limits {
    /// Submission endpoint - max requests
    pub const SUBMISSION_MAX_REQUESTS: i64 = 10;
    /// Submission endpoint - window in seconds
    pub const SUBMISSION_WINDOW_SECS: i64 = 60;

    /// General API - max requests
    pub const GENERAL_MAX_REQUESTS: i64 = 100;
    /// General API - window in seconds
    pub const GENERAL_WINDOW_SECS: i64 = 60;
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for paginated results
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for paginated results
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// VALIDATION
// =============================================================================

/// Maximum source code size in bytes (1 MB)
pub const MAX_SOURCE_CODE_SIZE: u64 = 1024 * 1024;
