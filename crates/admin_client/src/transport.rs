//! HTTP collaborator every service talks through.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use shared::error::ApiErrorBody;
use tracing::debug;

use crate::{config::ClientSettings, error::RemoteError};

/// `{data, status}` pair handed back for every successful call. `data` is the
/// decoded JSON body, or `Value::Null` when the body was empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<ApiResponse, RemoteError>;
    async fn put(&self, path: &str, body: Option<Value>) -> Result<ApiResponse, RemoteError>;
    async fn delete(&self, path: &str) -> Result<ApiResponse, RemoteError>;
}

pub struct ReqwestTransport {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            auth_token: settings.auth_token.clone(),
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn dispatch(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<ApiResponse, RemoteError> {
        debug!(method, path, "sending api request");
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .ok()
                .and_then(ApiErrorBody::into_message);
            debug!(method, path, status = status.as_u16(), "api request rejected");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let data = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))?
        };
        Ok(ApiResponse {
            status: status.as_u16(),
            data,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, RemoteError> {
        let request = self.http.get(self.url(path)).query(query);
        self.dispatch("GET", path, request).await
    }

    async fn put(&self, path: &str, body: Option<Value>) -> Result<ApiResponse, RemoteError> {
        let mut request = self.http.put(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.dispatch("PUT", path, request).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse, RemoteError> {
        let request = self.http.delete(self.url(path));
        self.dispatch("DELETE", path, request).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
