//! GitHub REST client.
//!
//! Thin wrapper over `reqwest` implementing [`HostingApi`]. No retries:
//! a failed call is reported to the caller, which decides whether it
//! degrades one item or a whole section.

use super::types::{
    ApiErrorBody, CloseIssueRequest, CommentRequest, Issue, IssueOrder, LabelsRequest,
    Repository, StateReason, WeekActivity,
};
use super::HostingApi;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors returned by [`GitHubClient`].
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("statistics for {0} are still being computed")]
    StatsPending(String),

    #[error("failed to decode GitHub response: {0}")]
    Decode(String),
}

/// GitHub API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a new client against `base_url`.
    ///
    /// Without a token only public data can be read; mutating calls
    /// will come back as API errors.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("repo-steward/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(String::from),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match self.token {
            Some(ref token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Turn a non-success status into [`GitHubError::Api`].
    async fn check(response: Response) -> Result<Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
        response
            .json()
            .await
            .map_err(|e| GitHubError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn list_repositories(
        &self,
        account: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, GitHubError> {
        let response = self
            .request(Method::GET, &format!("/users/{}/repos", account))
            .query(&[
                ("type", "owner".to_string()),
                ("sort", "updated".to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;

        Self::decode(Self::check(response).await?).await
    }

    async fn commit_activity(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<WeekActivity>, GitHubError> {
        let response = self
            .request(
                Method::GET,
                &format!("/repos/{}/{}/stats/commit_activity", owner, repo),
            )
            .send()
            .await?;

        match response.status() {
            StatusCode::ACCEPTED => Err(GitHubError::StatsPending(format!("{}/{}", owner, repo))),
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            _ => Self::decode(Self::check(response).await?).await,
        }
    }

    async fn list_open_issues(
        &self,
        owner: &str,
        repo: &str,
        order: IssueOrder,
        per_page: u32,
    ) -> Result<Vec<Issue>, GitHubError> {
        let (sort, direction) = order.query();
        let response = self
            .request(Method::GET, &format!("/repos/{}/{}/issues", owner, repo))
            .query(&[
                ("state", "open".to_string()),
                ("sort", sort.to_string()),
                ("direction", direction.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await?;

        Self::decode(Self::check(response).await?).await
    }

    async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        let response = self
            .request(
                Method::POST,
                &format!("/repos/{}/{}/issues/{}/comments", owner, repo, number),
            )
            .json(&CommentRequest { body })
            .send()
            .await?;

        Self::check(response).await.map(|_| ())
    }

    async fn close_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        reason: StateReason,
    ) -> Result<(), GitHubError> {
        let response = self
            .request(
                Method::PATCH,
                &format!("/repos/{}/{}/issues/{}", owner, repo, number),
            )
            .json(&CloseIssueRequest {
                state: "closed",
                state_reason: reason,
            })
            .send()
            .await?;

        Self::check(response).await.map(|_| ())
    }

    async fn add_labels(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<(), GitHubError> {
        let response = self
            .request(
                Method::POST,
                &format!("/repos/{}/{}/issues/{}/labels", owner, repo, number),
            )
            .json(&LabelsRequest { labels })
            .send()
            .await?;

        Self::check(response).await.map(|_| ())
    }
}
