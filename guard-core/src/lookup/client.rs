use super::schema::{FindThreatsResponse, ThreatMatchRequest};
use crate::config::ApiConfig;
use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use std::fmt;
use std::time::Duration;

/// Failure of a remote threat-match query. The body is kept for internal
/// diagnostics only; nothing here is ever shown to end users.
#[derive(Debug)]
pub enum RemoteError {
  /// Non-2xx HTTP status.
  Status { status: u16, body: String },
  /// Network-level failure (timeout, DNS, connection reset); no status code.
  Transport(String),
  /// 2xx response whose payload is not the expected shape.
  Decode(String),
}

impl RemoteError {
  /// Truncated body for log fields.
  pub fn body_excerpt(&self) -> String {
    let text = match self {
      Self::Status { body, .. } => body.as_str(),
      Self::Transport(msg) | Self::Decode(msg) => msg.as_str(),
    };
    if text.chars().count() <= 180 {
      return text.to_string();
    }
    let prefix: String = text.chars().take(180).collect();
    format!("{prefix}...")
  }
}

impl fmt::Display for RemoteError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Status { status, .. } => write!(f, "remote query failed with HTTP {status}"),
      Self::Transport(msg) => write!(f, "remote query transport failure: {msg}"),
      Self::Decode(msg) => write!(f, "remote query returned an unexpected payload: {msg}"),
    }
  }
}

impl std::error::Error for RemoteError {}

/// Seam between the lookup service and the threat-intelligence provider.
/// Returns raw threat codes in response order; an empty list is the safe
/// signal.
pub trait ThreatLookupClient: Send + Sync {
  fn query(&self, url: &str) -> Result<Vec<String>, RemoteError>;
}

/// Real provider client: one HTTPS POST per lookup, API key as a query
/// parameter on the endpoint URL.
pub struct HttpThreatClient {
  http: Client,
  endpoint: reqwest::Url,
  client_id: String,
  client_version: String,
}

impl HttpThreatClient {
  pub fn new(cfg: &ApiConfig) -> anyhow::Result<Self> {
    let mut endpoint = reqwest::Url::parse(&cfg.endpoint).context("parse API endpoint")?;
    if endpoint.scheme() != "https" {
      anyhow::bail!("API endpoint must use HTTPS");
    }

    let key = cfg.resolved_api_key();
    if key.is_empty() {
      anyhow::bail!("no API key configured; set api.api_key or GUARDIAN_API_KEY");
    }
    endpoint.query_pairs_mut().append_pair("key", &key);

    let http = Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_seconds))
      .redirect(Policy::none())
      .build()
      .context("build HTTP client")?;

    Ok(Self {
      http,
      endpoint,
      client_id: cfg.client_id.clone(),
      client_version: cfg.client_version.clone(),
    })
  }
}

impl ThreatLookupClient for HttpThreatClient {
  fn query(&self, url: &str) -> Result<Vec<String>, RemoteError> {
    let body = ThreatMatchRequest::single_url(&self.client_id, &self.client_version, url);

    let response = self
      .http
      .post(self.endpoint.clone())
      .header(
        USER_AGENT,
        format!("guard-core/{}", env!("CARGO_PKG_VERSION")),
      )
      .json(&body)
      .send()
      .map_err(|e| RemoteError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
      let body = response.text().unwrap_or_default();
      return Err(RemoteError::Status { status, body });
    }

    let parsed: FindThreatsResponse = response
      .json()
      .map_err(|e| RemoteError::Decode(e.to_string()))?;
    Ok(parsed.threat_codes())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;

  #[test]
  fn rejects_non_https_endpoint() {
    let cfg = ApiConfig {
      endpoint: "http://safebrowsing.googleapis.com/v4/threatMatches:find".to_string(),
      api_key: "k".to_string(),
      ..ApiConfig::default()
    };
    assert!(HttpThreatClient::new(&cfg).is_err());
  }

  #[test]
  fn rejects_missing_api_key() {
    let cfg = ApiConfig {
      api_key: String::new(),
      ..ApiConfig::default()
    };
    // Only meaningful when the env override is absent.
    if std::env::var("GUARDIAN_API_KEY").is_err() {
      assert!(HttpThreatClient::new(&cfg).is_err());
    }
  }

  #[test]
  fn status_error_keeps_body_for_diagnostics_only() {
    let err = RemoteError::Status {
      status: 500,
      body: "internal provider detail".to_string(),
    };
    assert_eq!(err.to_string(), "remote query failed with HTTP 500");
    assert_eq!(err.body_excerpt(), "internal provider detail");
  }
}
