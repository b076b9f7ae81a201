//! Rate limiting middleware
//!
//! Fixed window counters in Redis, keyed by client IP and bucket.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use redis::AsyncCommands;
use std::net::SocketAddr;

use crate::{constants, error::AppError, state::AppState};

/// Rate limit middleware
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some((bucket, limit, window)) = rate_limit_for(request.method(), request.uri().path())
    else {
        return Ok(next.run(request).await);
    };

    let key = format!("rate_limit:{}:{}", addr.ip(), bucket);
    let mut redis = state.redis();

    // Fail open when Redis is unavailable
    let count: i64 = match redis.incr(&key, 1).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(error = %e, "Rate limit counter unavailable");
            return Ok(next.run(request).await);
        }
    };

    if count == 1 {
        let _: () = redis.expire(&key, window).await.unwrap_or(());
    }

    if count > limit {
        tracing::debug!(ip = %addr.ip(), bucket, count, "Rate limit exceeded");
        return Err(AppError::TooManyRequests);
    }

    Ok(next.run(request).await)
}

/// Bucket, limit and window for a request; `None` for unlimited requests
fn rate_limit_for(method: &Method, path: &str) -> Option<(&'static str, i64, i64)> {
    let submissions = format!("{}/submissions", constants::API_BASE_PATH);

    if path == format!("{}/callback", submissions) {
        // Judge0 calls back once per test case
        None
    } else if *method == Method::POST && path.trim_end_matches('/') == submissions {
        Some((
            "submit",
            constants::rate_limits::SUBMISSION_MAX_REQUESTS,
            constants::rate_limits::SUBMISSION_WINDOW_SECS,
        ))
    } else {
        Some((
            "general",
            constants::rate_limits::GENERAL_MAX_REQUESTS,
            constants::rate_limits::GENERAL_WINDOW_SECS,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets() {
        let submit = rate_limit_for(&Method::POST, "/api/v1/submissions").unwrap();
        assert_eq!(submit, ("submit", 10, 60));

        let poll = rate_limit_for(&Method::GET, "/api/v1/submissions/abc").unwrap();
        assert_eq!(poll.0, "general");

        let list = rate_limit_for(&Method::GET, "/api/v1/submissions").unwrap();
        assert_eq!(list.0, "general");

        assert!(rate_limit_for(&Method::PUT, "/api/v1/submissions/callback").is_none());
    }
}
