//! HTTP access to the submissions API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::handlers::submissions::{
    CreateSubmissionRequest, CreateSubmissionResponse, SubmissionStatusResponse,
};

use super::{ClientError, StatusSource};

/// `{error: {code, message}}` as written by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Talks to `/api/v1/submissions` with a bearer token
#[derive(Debug, Clone)]
pub struct HttpSubmissionApi {
    http: Client,
    base_url: String,
    token: Option<String>,
    refresh: bool,
}

impl HttpSubmissionApi {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8080/api/v1`
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            refresh: false,
        })
    }

    /// Ask the server to pull pending verdicts from Judge0 on every status
    /// query. Needed when Judge0 cannot reach the server's callback.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody { error }) => ClientError::Api {
                    status: status.as_u16(),
                    code: error.code,
                    message: error.message,
                },
                Err(_) => ClientError::Api {
                    status: status.as_u16(),
                    code: status.as_str().to_string(),
                    message: body,
                },
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StatusSource for HttpSubmissionApi {
    async fn submit(&self, request: CreateSubmissionRequest) -> Result<Uuid, ClientError> {
        let url = format!("{}/submissions", self.base_url);

        let response = self
            .authorized(self.http.post(&url))
            .json(&request)
            .send()
            .await?;

        let created: CreateSubmissionResponse = Self::read_json(response).await?;
        Ok(created.id)
    }

    async fn status(&self, id: Uuid) -> Result<SubmissionStatusResponse, ClientError> {
        let mut url = format!("{}/submissions/{}", self.base_url, id);
        if self.refresh {
            url.push_str("?refresh=true");
        }

        let response = self.authorized(self.http.get(&url)).send().await?;
        Self::read_json(response).await
    }
}
