use serde::{Deserialize, Serialize};

/// Normalized classification of a detected hazard. `Unknown` keeps the raw
/// provider code verbatim so future threat types stay visible to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
  Malware,
  Phishing,
  UnwantedSoftware,
  PotentiallyHarmfulApplication,
  Unknown(String),
}

impl ThreatCategory {
  pub fn from_code(code: &str) -> Self {
    match code {
      "MALWARE" => Self::Malware,
      "SOCIAL_ENGINEERING" => Self::Phishing,
      "UNWANTED_SOFTWARE" => Self::UnwantedSoftware,
      "POTENTIALLY_HARMFUL_APPLICATION" => Self::PotentiallyHarmfulApplication,
      other => Self::Unknown(other.to_string()),
    }
  }

  pub fn label(&self) -> &str {
    match self {
      Self::Malware => "Malware",
      Self::Phishing => "Phishing / Social Engineering",
      Self::UnwantedSoftware => "Unwanted Software",
      Self::PotentiallyHarmfulApplication => "Potentially Harmful Application",
      Self::Unknown(code) => code,
    }
  }
}

/// Outcome of evaluating one URL. Exactly one of `safe == true`, non-empty
/// `threats`, or `is_error == true` characterizes the value; the constructors
/// below are the only way verdicts are built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
  pub safe: bool,
  #[serde(default)]
  pub threats: Vec<ThreatCategory>,
  pub message: String,
  #[serde(default)]
  pub is_error: bool,
  #[serde(default)]
  pub error_message: String,
}

impl Verdict {
  pub fn safe_site() -> Self {
    Self {
      safe: true,
      threats: Vec::new(),
      message: "Site appears safe".to_string(),
      is_error: false,
      error_message: String::new(),
    }
  }

  /// An empty threat list degenerates to a safe verdict.
  pub fn threats_detected(threats: Vec<ThreatCategory>) -> Self {
    if threats.is_empty() {
      return Self::safe_site();
    }
    let message = format!("Potential threats detected: {}", join_labels(&threats));
    Self {
      safe: false,
      threats,
      message,
      is_error: false,
      error_message: String::new(),
    }
  }

  pub fn test_site(category: ThreatCategory) -> Self {
    let message = format!("Test site detected: {}", category.label());
    Self {
      safe: false,
      threats: vec![category],
      message,
      is_error: false,
      error_message: String::new(),
    }
  }

  /// Error verdicts carry no threat data and are never cached.
  pub fn error(message: &str) -> Self {
    Self {
      safe: false,
      threats: Vec::new(),
      message: String::new(),
      is_error: true,
      error_message: message.to_string(),
    }
  }
}

fn join_labels(threats: &[ThreatCategory]) -> String {
  threats
    .iter()
    .map(|t| t.label())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Query strings can carry session tokens; logs only ever see the host.
pub fn host_for_log(url: &str) -> String {
  reqwest::Url::parse(url)
    .ok()
    .and_then(|u| u.host_str().map(|h| h.to_string()))
    .unwrap_or_else(|| "<no-host>".to_string())
}

pub fn now_unix_ms() -> u64 {
  use std::time::{SystemTime, UNIX_EPOCH};
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as u64
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn threat_verdict_message_lists_labels_in_order() {
    let v = Verdict::threats_detected(vec![
      ThreatCategory::Malware,
      ThreatCategory::Phishing,
    ]);
    assert!(!v.safe);
    assert!(!v.is_error);
    assert_eq!(
      v.message,
      "Potential threats detected: Malware, Phishing / Social Engineering"
    );
  }

  #[test]
  fn empty_threat_list_degenerates_to_safe() {
    let v = Verdict::threats_detected(Vec::new());
    assert!(v.safe);
    assert_eq!(v.message, "Site appears safe");
  }

  #[test]
  fn error_verdict_carries_no_threat_data() {
    let v = Verdict::error("Unable to verify site safety");
    assert!(v.is_error);
    assert!(!v.safe);
    assert!(v.threats.is_empty());
    assert_eq!(v.error_message, "Unable to verify site safety");
  }

  #[test]
  fn host_for_log_never_exposes_path_or_query() {
    let s = host_for_log("https://a.example/login?token=secret#frag");
    assert_eq!(s, "a.example");
    assert_eq!(host_for_log("not a url"), "<no-host>");
  }
}
