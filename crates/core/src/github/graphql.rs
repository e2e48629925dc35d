//! GitHub GraphQL client for batched login lookups.
//!
//! Each batch becomes a single query with one aliased field per login:
//!
//! ```graphql
//! query {
//!   u0: user(login: "alice") { id }
//!   u1: user(login: "bob") { id }
//! }
//! ```
//!
//! The response maps every alias to a node or `null`. GitHub reports
//! unknown logins as `null` data plus an entry in `errors`, so a response
//! carrying both is normal and its data is used as-is.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{IdentityLookup, LoginKind};
use crate::errors::GitHubError;

/// Aliased lookup results for one batch, keyed by alias (`u0`, `o3`, ...).
pub type BatchData = HashMap<String, Option<AccountNode>>;

/// The only field selected for an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountNode {
    pub id: String,
}

/// Top-level GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<BatchData>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

/// Asynchronous GitHub GraphQL client.
#[derive(Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GraphQlClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, GitHubError> {
        let endpoint = format!("{}/graphql", api_url.into().trim_end_matches('/'));
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("ghostbuster/0.1"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        info!(endpoint = %endpoint, "created GraphQlClient");
        Ok(Self {
            http,
            endpoint,
            token: token.into(),
        })
    }

    /// Build the aliased lookup query for one batch.
    pub fn build_query(kind: LoginKind, logins: &[String]) -> String {
        let fields: Vec<String> = logins
            .iter()
            .enumerate()
            .map(|(i, login)| {
                format!(
                    "{}{}: {}(login: {}) {{ id }}",
                    kind.alias_prefix(),
                    i,
                    kind.field(),
                    quote(login)
                )
            })
            .collect();
        format!("query {{\n{}\n}}", fields.join("\n"))
    }

    /// Map a response back onto the batch it was issued for.
    ///
    /// Aliases are resolved to batch positions by their numeric suffix, so
    /// the order of keys in the response does not matter.
    pub fn existing_from_response(
        kind: LoginKind,
        logins: &[String],
        response: GraphQlResponse,
    ) -> Result<HashSet<String>, GitHubError> {
        for err in &response.errors {
            match err.kind.as_deref() {
                Some("NOT_FOUND") => debug!(message = %err.message, "lookup not found"),
                _ => warn!(message = %err.message, "GraphQL error alongside data"),
            }
        }
        let Some(data) = response.data else {
            return Err(GitHubError::NoData {
                messages: response.errors.into_iter().map(|e| e.message).collect(),
            });
        };

        let mut existing = HashSet::new();
        for (alias, node) in data {
            let index = alias
                .strip_prefix(kind.alias_prefix())
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&i| i < logins.len());
            match (index, node) {
                (Some(i), Some(_)) => {
                    existing.insert(logins[i].to_lowercase());
                }
                (Some(_), None) => {}
                (None, _) => warn!(alias = %alias, %kind, "ignoring unexpected alias in response"),
            }
        }
        Ok(existing)
    }

    fn check_response(&self, resp: &reqwest::Response) -> Result<(), GitHubError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GitHubError::AuthenticationFailed(format!(
                "HTTP {}",
                status
            )));
        }
        if status.as_u16() == 429 {
            let reset = resp
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            return Err(GitHubError::RateLimited { reset_at: reset });
        }
        Err(GitHubError::ApiError {
            status: status.as_u16(),
            body: format!("HTTP {}", status),
        })
    }
}

#[async_trait]
impl IdentityLookup for GraphQlClient {
    #[instrument(skip(self, logins), fields(batch = logins.len()))]
    async fn existing_logins(
        &self,
        kind: LoginKind,
        logins: &[String],
    ) -> Result<HashSet<String>, GitHubError> {
        let query = Self::build_query(kind, logins);
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&QueryBody { query: &query })
            .send()
            .await?;
        self.check_response(&resp)?;
        let body = resp.text().await?;
        let response: GraphQlResponse =
            serde_json::from_str(&body).map_err(|e| GitHubError::ParseError(e.to_string()))?;
        let existing = Self::existing_from_response(kind, logins, response)?;
        debug!(found = existing.len(), "batch lookup complete");
        Ok(existing)
    }
}

/// Quote a login as a GraphQL string literal.
///
/// GraphQL string escapes are a subset of JSON's, so JSON encoding is safe.
fn quote(login: &str) -> String {
    serde_json::Value::String(login.to_string()).to_string()
}
