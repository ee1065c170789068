use crate::taxonomy;
use serde::{Deserialize, Serialize};

/// `threatMatches:find` request body. Field names follow the provider's
/// camelCase wire format; the batch surface is unused, so `threat_entries`
/// always carries exactly one URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatchRequest {
  pub client: ClientInfo,
  pub threat_info: ThreatInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
  pub client_id: String,
  pub client_version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatInfo {
  pub threat_types: Vec<String>,
  pub platform_types: Vec<String>,
  pub threat_entry_types: Vec<String>,
  pub threat_entries: Vec<ThreatEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreatEntry {
  pub url: String,
}

impl ThreatMatchRequest {
  pub fn single_url(client_id: &str, client_version: &str, url: &str) -> Self {
    Self {
      client: ClientInfo {
        client_id: client_id.to_string(),
        client_version: client_version.to_string(),
      },
      threat_info: ThreatInfo {
        threat_types: taxonomy::WIRE_THREAT_TYPES
          .iter()
          .map(|s| s.to_string())
          .collect(),
        platform_types: vec!["ANY_PLATFORM".to_string()],
        threat_entry_types: vec!["URL".to_string()],
        threat_entries: vec![ThreatEntry {
          url: url.to_string(),
        }],
      },
    }
  }
}

/// Response body. A missing or empty `matches` array is the safe signal, not
/// an error; unknown fields from the provider are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindThreatsResponse {
  #[serde(default)]
  pub matches: Option<Vec<ThreatMatch>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
  pub threat_type: String,
}

impl FindThreatsResponse {
  /// Raw threat codes in response order.
  pub fn threat_codes(self) -> Vec<String> {
    self
      .matches
      .unwrap_or_default()
      .into_iter()
      .map(|m| m.threat_type)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_body_matches_wire_format() {
    let req = ThreatMatchRequest::single_url("safe-browsing-guardian", "1.0.0", "https://x.example/");
    let value = serde_json::to_value(&req).unwrap();

    assert_eq!(value["client"]["clientId"], "safe-browsing-guardian");
    assert_eq!(value["client"]["clientVersion"], "1.0.0");
    assert_eq!(
      value["threatInfo"]["threatTypes"],
      serde_json::json!([
        "MALWARE",
        "SOCIAL_ENGINEERING",
        "UNWANTED_SOFTWARE",
        "POTENTIALLY_HARMFUL_APPLICATION"
      ])
    );
    assert_eq!(
      value["threatInfo"]["platformTypes"],
      serde_json::json!(["ANY_PLATFORM"])
    );
    assert_eq!(
      value["threatInfo"]["threatEntryTypes"],
      serde_json::json!(["URL"])
    );
    assert_eq!(
      value["threatInfo"]["threatEntries"],
      serde_json::json!([{ "url": "https://x.example/" }])
    );
  }

  #[test]
  fn empty_response_means_zero_codes() {
    let parsed: FindThreatsResponse = serde_json::from_str("{}").unwrap();
    assert!(parsed.threat_codes().is_empty());
  }

  #[test]
  fn matches_parse_in_order_with_extra_fields_ignored() {
    let raw = r#"{
      "matches": [
        { "threatType": "MALWARE", "platformType": "ANY_PLATFORM", "cacheDuration": "300s" },
        { "threatType": "SOCIAL_ENGINEERING" }
      ]
    }"#;
    let parsed: FindThreatsResponse = serde_json::from_str(raw).unwrap();
    assert_eq!(parsed.threat_codes(), vec!["MALWARE", "SOCIAL_ENGINEERING"]);
  }
}
