//! reqwest-backed client for the RHACS Central policy API.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::ConnectionSettings;
use crate::error::{PolicySyncError, PolicySyncResult};
use crate::rhacs::{ClientError, ClientResult, CreatedPolicy, PolicyApi};
use crate::types::PolicyDefinition;

const METADATA_ENDPOINT: &str = "v1/metadata";
const POLICIES_ENDPOINT: &str = "v1/policies";

#[derive(Debug, Deserialize)]
struct ListPoliciesResponse {
    #[serde(default)]
    policies: Vec<ListPolicy>,
}

#[derive(Debug, Deserialize)]
struct ListPolicy {
    #[serde(default)]
    name: String,
}

/// Error body returned by Central's gRPC gateway.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for one Central instance, authenticated with a bearer token.
pub struct CentralClient {
    base_url: Url,
    api_token: String,
    http: reqwest::Client,
}

impl fmt::Debug for CentralClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CentralClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CentralClient {
    pub fn new(settings: &ConnectionSettings) -> PolicySyncResult<Self> {
        let base_url = parse_base_url(&settings.central_url)?;

        if settings.accept_invalid_certs {
            log::warn!("TLS certificate verification is disabled for {base_url}");
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(|e| PolicySyncError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            api_token: settings.api_token.clone(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url.join(path).map_err(|e| ClientError::Api {
            status: 0,
            message: format!("invalid endpoint '{path}': {e}"),
        })
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ClientError::Connectivity(describe(&e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

#[async_trait]
impl PolicyApi for CentralClient {
    async fn check_connection(&self) -> ClientResult<()> {
        let url = self.endpoint(METADATA_ENDPOINT)?;
        self.send(self.http.get(url)).await?;
        log::info!("Successfully connected to RHACS Central at {}", self.base_url);
        Ok(())
    }

    async fn list_policy_names(&self) -> ClientResult<BTreeSet<String>> {
        let url = self.endpoint(POLICIES_ENDPOINT)?;
        let response = self.send(self.http.get(url)).await?;
        let status = response.status();
        let listing: ListPoliciesResponse =
            response.json().await.map_err(|e| ClientError::Api {
                status: status.as_u16(),
                message: format!("invalid policy listing: {}", describe(&e)),
            })?;

        let names: BTreeSet<String> = listing
            .policies
            .into_iter()
            .map(|p| p.name)
            .filter(|name| !name.is_empty())
            .collect();
        log::debug!("Central reports {} existing policies", names.len());
        Ok(names)
    }

    async fn create_policy(&self, policy: &PolicyDefinition) -> ClientResult<CreatedPolicy> {
        let url = self.endpoint(POLICIES_ENDPOINT)?;
        let response = self.send(self.http.post(url).json(policy)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Connectivity(describe(&e)))?;

        // A 2xx without a readable body still means the policy was stored.
        let created = serde_json::from_str::<CreatedPolicy>(&body).unwrap_or_else(|e| {
            log::debug!("Could not decode create response for '{}': {e}", policy.name);
            CreatedPolicy::default()
        });
        Ok(created)
    }
}

fn parse_base_url(raw: &str) -> PolicySyncResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| PolicySyncError::config(format!("invalid central_url '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(PolicySyncError::config(format!(
            "central_url must be an http(s) URL, got '{raw}'"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Map a non-success response onto the client error taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> ClientError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth {
            status: status.as_u16(),
        },
        StatusCode::CONFLICT => ClientError::Conflict(message),
        // Central reports duplicate names as invalid arguments.
        StatusCode::BAD_REQUEST if message.to_ascii_lowercase().contains("already exists") => {
            ClientError::Conflict(message)
        }
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.message.or(parsed.error).filter(|m| !m.is_empty()) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Render an error with its source chain.
fn describe(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
