use guard_core::cache::{ResultCache, DEFAULT_TTL_MS};
use guard_core::config;
use guard_core::lookup::client::{HttpThreatClient, RemoteError, ThreatLookupClient};
use guard_core::lookup::{test_vector, SafetyLookupService};
use guard_core::notify;
use guard_core::paths;
use guard_core::types::ThreatCategory;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeMode {
  /// Run the four canned test-vector URLs through the pipeline. Never
  /// touches the network.
  Offline,
  /// One real lookup against the configured provider.
  Live(String),
}

impl ProbeMode {
  pub fn from_args(args: &[String]) -> anyhow::Result<Self> {
    if let Some(i) = args.iter().position(|a| a == "--live") {
      let url = args
        .get(i + 1)
        .ok_or_else(|| anyhow::anyhow!("expected: --live <url>"))?;
      return Ok(Self::Live(url.clone()));
    }
    if args.iter().any(|a| a == "--offline") || args.len() <= 1 {
      return Ok(Self::Offline);
    }
    Err(anyhow::anyhow!("expected `--offline` or `--live <url>`"))
  }
}

pub fn run(mode: ProbeMode) -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_ansi(false)
    .with_target(false)
    .init();

  match mode {
    ProbeMode::Offline => run_offline(),
    ProbeMode::Live(url) => run_live(&url),
  }
}

struct OfflineClient;

impl ThreatLookupClient for OfflineClient {
  fn query(&self, _url: &str) -> Result<Vec<String>, RemoteError> {
    Err(RemoteError::Transport(
      "offline probe attempted a network call".to_string(),
    ))
  }
}

pub fn offline_cases() -> [(String, ThreatCategory); 4] {
  [
    (probe_url("MALWARE"), ThreatCategory::Malware),
    (probe_url("SOCIAL_ENGINEERING"), ThreatCategory::Phishing),
    (probe_url("UNWANTED_SOFTWARE"), ThreatCategory::UnwantedSoftware),
    (
      probe_url("POTENTIALLY_HARMFUL_APPLICATION"),
      ThreatCategory::PotentiallyHarmfulApplication,
    ),
  ]
}

fn probe_url(code: &str) -> String {
  format!(
    "https://{}/apiv4/ANY_PLATFORM/{}/URL/",
    test_vector::TEST_VECTOR_HOST,
    code
  )
}

fn run_offline() -> anyhow::Result<()> {
  let service = SafetyLookupService::new(
    Arc::new(ResultCache::new(DEFAULT_TTL_MS)),
    Box::new(OfflineClient),
  );

  let mut failures = 0usize;
  for (url, expected) in offline_cases() {
    let verdict = service.check(&url);
    let got = verdict.threats.first();
    if verdict.is_error || got != Some(&expected) {
      failures += 1;
      tracing::warn!(url = %url, expected = expected.label(), "canary expectation failed");
      println!("FAIL {url}: expected {}, got {:?}", expected.label(), got.map(|t| t.label()));
      continue;
    }
    println!("PASS {url}: {}", verdict.message);
  }

  if failures > 0 {
    anyhow::bail!("{failures} canary expectation(s) failed");
  }
  println!("All canary expectations passed.");
  Ok(())
}

fn run_live(url: &str) -> anyhow::Result<()> {
  let base = paths::base_dir()?;
  let cfg = config::load_or_default_readonly(&paths::config_path(&base))?;

  let client = HttpThreatClient::new(&cfg.api)?;
  let service = SafetyLookupService::new(
    Arc::new(ResultCache::new(cfg.cache.ttl_ms)),
    Box::new(client),
  );

  let verdict = service.check(url);
  println!("{}", notify::render(url, &verdict));
  if verdict.is_error {
    anyhow::bail!("live probe failed");
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn offline_cases_all_short_circuit_to_their_category() {
    let service = SafetyLookupService::new(
      Arc::new(ResultCache::new(DEFAULT_TTL_MS)),
      Box::new(OfflineClient),
    );
    for (url, expected) in offline_cases() {
      let verdict = service.check(&url);
      assert!(!verdict.is_error, "{url}");
      assert_eq!(verdict.threats, vec![expected.clone()], "{url}");
    }
  }

  #[test]
  fn mode_parsing_defaults_to_offline() {
    let args = vec!["canary".to_string()];
    assert_eq!(ProbeMode::from_args(&args).unwrap(), ProbeMode::Offline);

    let args = vec![
      "canary".to_string(),
      "--live".to_string(),
      "https://example.com/".to_string(),
    ];
    assert_eq!(
      ProbeMode::from_args(&args).unwrap(),
      ProbeMode::Live("https://example.com/".to_string())
    );
  }
}
