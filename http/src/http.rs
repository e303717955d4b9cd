// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication and status handling.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};

use crate::config::{AuthMethod, RemoteConfig};
use crate::error::HttpError;

/// HTTP client shared by every gateway of one remote.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    base: Url,
    config: RemoteConfig,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or HTTP client creation fails.
    pub fn new(config: RemoteConfig) -> Result<Self, HttpError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| HttpError::Config(format!("invalid base_url {}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(HttpError::Config(format!(
                "base_url {} cannot be a base",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Builds `{base}/v1/{segments...}`, percent-encoding every segment.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    /// Builds a request with authentication headers.
    pub fn build_request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self.client.request(method, url);

        match &self.config.auth {
            AuthMethod::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            AuthMethod::Bearer { token } => {
                req = req.bearer_auth(token);
            }
            AuthMethod::None => {}
        }

        req
    }

    /// Executes a request and checks for HTTP errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or returns a non-success status code.
    pub async fn execute(&self, req: RequestBuilder) -> Result<Response, HttpError> {
        let resp = req.send().await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());
        tracing::debug!(%status, body = %body, "request rejected");
        Err(HttpError::Status { status, body })
    }
}
