//! Judge0 HTTP client

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    config::Judge0Config,
    error::{AppError, AppResult},
};

use super::{
    JudgeClient,
    types::{BatchItem, BatchRequest, BatchStatusResponse, BatchTokenEntry, Judge0Submission},
};

/// Judge0 client, optionally going through RapidAPI
#[derive(Debug, Clone)]
pub struct Judge0Client {
    http: Client,
    base_url: String,
    rapidapi_key: Option<String>,
    rapidapi_host: Option<String>,
}

impl Judge0Client {
    /// Create a client from configuration
    pub fn new(config: &Judge0Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Judge0 HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.uri.trim_end_matches('/').to_string(),
            rapidapi_key: config.rapidapi_key.clone(),
            rapidapi_host: config.rapidapi_host.clone(),
        })
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.rapidapi_key {
            Some(key) => request.header("X-RapidAPI-Key", key),
            None => request,
        };
        match &self.rapidapi_host {
            Some(host) => request.header("X-RapidAPI-Host", host),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Judge0 responded {}: {}",
                status,
                truncate(&body, 512)
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed Judge0 response: {}", e)))
    }
}

#[async_trait]
impl JudgeClient for Judge0Client {
    async fn submit_batch(&self, items: Vec<BatchItem>) -> AppResult<Vec<String>> {
        let url = format!("{}/submissions/batch?base64_encoded=false", self.base_url);

        let response = self
            .with_headers(self.http.post(&url))
            .json(&BatchRequest {
                submissions: &items,
            })
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::Upstream("Judge0 quota exceeded".to_string()));
        }

        let entries: Vec<BatchTokenEntry> = Self::read_json(response).await?;

        let tokens = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                entry.token.ok_or_else(|| {
                    AppError::Upstream(format!("Judge0 rejected batch item {}", index))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        tracing::info!(count = tokens.len(), "Judge0 accepted batch");

        Ok(tokens)
    }

    async fn fetch_batch(&self, tokens: Vec<String>) -> AppResult<Vec<Judge0Submission>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        // tokens are UUIDs, safe to place in a query string as-is
        let url = format!(
            "{}/submissions/batch?tokens={}&base64_encoded=false&fields=token,status",
            self.base_url,
            tokens.join(",")
        );

        let response = self.with_headers(self.http.get(&url)).send().await?;

        let body: BatchStatusResponse = Self::read_json(response).await?;

        // unknown tokens come back as null
        Ok(body.submissions.into_iter().flatten().collect())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{
        Json, Router,
        extract::{Query, State},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::post,
    };
    use serde_json::{Value, json};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorded {
        bodies: Arc<Mutex<Vec<Value>>>,
        headers: Arc<Mutex<Vec<HeaderMap>>>,
        queries: Arc<Mutex<Vec<std::collections::HashMap<String, String>>>>,
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(uri: String) -> Judge0Config {
        Judge0Config {
            uri,
            rapidapi_key: Some("key-123".to_string()),
            rapidapi_host: Some("judge0-ce.p.rapidapi.com".to_string()),
            callback_url: None,
            timeout: Duration::from_secs(5),
        }
    }

    fn item(stdin: &str) -> BatchItem {
        BatchItem {
            language_id: 54,
            source_code: "int main() {}".to_string(),
            stdin: stdin.to_string(),
            expected_output: "ok".to_string(),
            callback_url: None,
        }
    }

    fn fake_judge(recorded: Recorded) -> Router {
        Router::new()
            .route(
                "/submissions/batch",
                post(
                    |State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        let count = body["submissions"].as_array().map(Vec::len).unwrap_or(0);
                        rec.bodies.lock().unwrap().push(body);
                        rec.headers.lock().unwrap().push(headers);
                        let tokens: Vec<Value> =
                            (0..count).map(|i| json!({ "token": format!("tok-{i}") })).collect();
                        Json(Value::Array(tokens))
                    },
                )
                .get(
                    |State(rec): State<Recorded>,
                     Query(q): Query<std::collections::HashMap<String, String>>| async move {
                        let tokens: Vec<String> =
                            q["tokens"].split(',').map(str::to_string).collect();
                        rec.queries.lock().unwrap().push(q);
                        let subs: Vec<Value> = tokens
                            .iter()
                            .map(|t| {
                                if t == "missing" {
                                    Value::Null
                                } else {
                                    json!({ "token": t, "status": { "id": 3, "description": "Accepted" } })
                                }
                            })
                            .collect();
                        Json(json!({ "submissions": subs }))
                    },
                ),
            )
            .with_state(recorded)
    }

    #[tokio::test]
    async fn test_submit_batch_returns_tokens_in_order() {
        let recorded = Recorded::default();
        let base = serve(fake_judge(recorded.clone())).await;
        let client = Judge0Client::new(&config(base)).unwrap();

        let tokens = client
            .submit_batch(vec![item("a"), item("b"), item("c")])
            .await
            .unwrap();

        assert_eq!(tokens, vec!["tok-0", "tok-1", "tok-2"]);

        let bodies = recorded.bodies.lock().unwrap();
        assert_eq!(bodies[0]["submissions"][1]["stdin"], "b");
        let headers = recorded.headers.lock().unwrap();
        assert_eq!(headers[0]["x-rapidapi-key"], "key-123");
        assert_eq!(headers[0]["x-rapidapi-host"], "judge0-ce.p.rapidapi.com");
    }

    #[tokio::test]
    async fn test_fetch_batch_skips_unknown_tokens() {
        let recorded = Recorded::default();
        let base = serve(fake_judge(recorded.clone())).await;
        let client = Judge0Client::new(&config(base)).unwrap();

        let statuses = client
            .fetch_batch(vec!["tok-0".to_string(), "missing".to_string()])
            .await
            .unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].token, "tok-0");
        let queries = recorded.queries.lock().unwrap();
        assert_eq!(queries[0]["fields"], "token,status");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let router = Router::new().route(
            "/submissions/batch",
            post(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let base = serve(router).await;
        let client = Judge0Client::new(&config(base)).unwrap();

        let err = client.submit_batch(vec![item("a")]).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_rejected_item_fails_whole_batch() {
        let router = Router::new().route(
            "/submissions/batch",
            post(|| async {
                Json(json!([
                    { "token": "tok-0" },
                    { "language_id": ["language with id 999 doesn't exist"] }
                ]))
            }),
        );
        let base = serve(router).await;
        let client = Judge0Client::new(&config(base)).unwrap();

        let err = client
            .submit_batch(vec![item("a"), item("b")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(msg) if msg.contains("item 1")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_upstream_error() {
        let router = Router::new().route(
            "/submissions/batch",
            post(|| async { "not json" }),
        );
        let base = serve(router).await;
        let client = Judge0Client::new(&config(base)).unwrap();

        let err = client.submit_batch(vec![item("a")]).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unreachable_judge_is_upstream_error() {
        // nothing listens on port 9 (discard) in the test environment
        let client = Judge0Client::new(&config("http://127.0.0.1:9".to_string())).unwrap();
        let err = client.submit_batch(vec![item("a")]).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
