pub mod client;
pub mod schema;
pub mod test_vector;

use crate::cache::ResultCache;
use crate::normalize;
use crate::taxonomy;
use crate::types::{host_for_log, ThreatCategory, Verdict};
use client::{RemoteError, ThreatLookupClient};
use std::sync::Arc;

/// The only failure text callers ever see; specifics stay in the logs.
pub const GENERIC_ERROR_MESSAGE: &str = "Unable to verify site safety";

/// Orchestrates one safety check: test-vector short-circuit, normalize,
/// cache lookup, remote query, taxonomy translation, cache write-back.
///
/// `check` never fails across this boundary; every internal error becomes an
/// error verdict. Checks may run concurrently from any number of threads;
/// the cache mutex is the only shared lock and is never held while a remote
/// query is in flight. Two concurrent misses for the same host may both hit
/// the network; that redundancy is accepted rather than de-duplicated.
pub struct SafetyLookupService {
  cache: Arc<ResultCache>,
  client: Box<dyn ThreatLookupClient>,
}

impl SafetyLookupService {
  pub fn new(cache: Arc<ResultCache>, client: Box<dyn ThreatLookupClient>) -> Self {
    Self { cache, client }
  }

  pub fn cache(&self) -> &ResultCache {
    &self.cache
  }

  pub fn check(&self, raw_url: &str) -> Verdict {
    let check_id = uuid::Uuid::new_v4().to_string();

    // Test-vector URLs stay live: no cache read, no cache write, no network.
    if test_vector::is_test_vector(raw_url) {
      let code = test_vector::canned_threat_code(raw_url);
      tracing::info!(check_id = %check_id, code, "test vector URL short-circuited");
      return Verdict::test_site(ThreatCategory::from_code(code));
    }

    let url = normalize::normalize_url(raw_url);

    // Host extraction failure degrades to an uncached lookup.
    let host = match normalize::extract_host(&url) {
      Ok(h) => Some(h),
      Err(e) => {
        tracing::debug!(check_id = %check_id, reason = %e, "unkeyable URL; skipping cache");
        None
      }
    };

    if let Some(host) = host.as_deref() {
      if let Some(verdict) = self.cache.get(host) {
        tracing::debug!(check_id = %check_id, host, "cache hit");
        return verdict;
      }
    }

    match self.client.query(&url) {
      Ok(codes) => {
        let threats = taxonomy::translate(codes);
        let verdict = if threats.is_empty() {
          Verdict::safe_site()
        } else {
          Verdict::threats_detected(threats)
        };

        if let Some(host) = host.as_deref() {
          self.cache.put(host, &verdict);
        }

        tracing::info!(
          check_id = %check_id,
          host = %host_for_log(&url),
          safe = verdict.safe,
          "lookup complete"
        );
        verdict
      }
      Err(err) => {
        self.log_remote_error(&check_id, &url, &err);
        Verdict::error(GENERIC_ERROR_MESSAGE)
      }
    }
  }

  fn log_remote_error(&self, check_id: &str, url: &str, err: &RemoteError) {
    match err {
      RemoteError::Status { status, .. } => tracing::warn!(
        check_id = %check_id,
        host = %host_for_log(url),
        status,
        body = %err.body_excerpt(),
        "remote query rejected"
      ),
      RemoteError::Transport(_) | RemoteError::Decode(_) => tracing::warn!(
        check_id = %check_id,
        host = %host_for_log(url),
        reason = %err.body_excerpt(),
        "remote query failed"
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::DEFAULT_TTL_MS;
  use std::sync::atomic::{AtomicUsize, Ordering};

  enum StubMode {
    Codes(Vec<&'static str>),
    Status(u16),
  }

  struct StubClient {
    mode: StubMode,
    calls: Arc<AtomicUsize>,
  }

  impl ThreatLookupClient for StubClient {
    fn query(&self, _url: &str) -> Result<Vec<String>, RemoteError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match &self.mode {
        StubMode::Codes(codes) => Ok(codes.iter().map(|s| s.to_string()).collect()),
        StubMode::Status(status) => Err(RemoteError::Status {
          status: *status,
          body: "stub body".to_string(),
        }),
      }
    }
  }

  fn service_with(mode: StubMode, ttl_ms: u64) -> (SafetyLookupService, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let client = StubClient {
      mode,
      calls: Arc::clone(&calls),
    };
    let service = SafetyLookupService::new(Arc::new(ResultCache::new(ttl_ms)), Box::new(client));
    (service, calls)
  }

  #[test]
  fn empty_match_list_yields_safe_verdict() {
    let (service, calls) = service_with(StubMode::Codes(vec![]), DEFAULT_TTL_MS);
    let verdict = service.check("https://a.example/page");
    assert!(verdict.safe);
    assert_eq!(verdict.message, "Site appears safe");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn malware_match_yields_threat_verdict() {
    let (service, _) = service_with(StubMode::Codes(vec!["MALWARE"]), DEFAULT_TTL_MS);
    let verdict = service.check("https://a.example/page");
    assert!(!verdict.safe);
    assert_eq!(verdict.threats, vec![ThreatCategory::Malware]);
    assert_eq!(verdict.message, "Potential threats detected: Malware");
  }

  #[test]
  fn duplicate_codes_collapse_in_first_seen_order() {
    let (service, _) = service_with(
      StubMode::Codes(vec!["MALWARE", "MALWARE", "SOCIAL_ENGINEERING"]),
      DEFAULT_TTL_MS,
    );
    let verdict = service.check("https://a.example/page");
    assert_eq!(
      verdict.threats,
      vec![ThreatCategory::Malware, ThreatCategory::Phishing]
    );
  }

  #[test]
  fn second_check_on_same_host_is_served_from_cache() {
    let (service, calls) = service_with(StubMode::Codes(vec![]), DEFAULT_TTL_MS);
    let first = service.check("https://a.example/one");
    // Different path, same host: per-host granularity shares the entry.
    let second = service.check("https://a.example/two?q=1");
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn expired_entry_triggers_a_fresh_remote_query() {
    // TTL of zero makes every entry stale immediately.
    let (service, calls) = service_with(StubMode::Codes(vec![]), 0);
    service.check("https://a.example/");
    service.check("https://a.example/");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn remote_failure_yields_generic_error_and_no_cache_entry() {
    let (service, calls) = service_with(StubMode::Status(500), DEFAULT_TTL_MS);
    let verdict = service.check("https://a.example/");
    assert!(verdict.is_error);
    assert_eq!(verdict.error_message, GENERIC_ERROR_MESSAGE);
    assert!(verdict.threats.is_empty());
    assert!(service.cache().is_empty());

    // Errors are never memoized: the next check queries again.
    service.check("https://a.example/");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn test_vector_url_bypasses_cache_read_and_write() {
    let (service, calls) = service_with(StubMode::Codes(vec![]), DEFAULT_TTL_MS);
    // A stale-free safe entry for the canary host must not shadow the probe.
    service
      .cache()
      .put(test_vector::TEST_VECTOR_HOST, &Verdict::safe_site());

    let url = "https://testsafebrowsing.appspot.com/apiv4/ANY_PLATFORM/UNWANTED_SOFTWARE/URL/";
    let verdict = service.check(url);
    assert!(!verdict.safe);
    assert_eq!(verdict.threats, vec![ThreatCategory::UnwantedSoftware]);
    assert_eq!(verdict.message, "Test site detected: Unwanted Software");

    // No network call, and the cached entry is untouched.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let cached = service.cache().get(test_vector::TEST_VECTOR_HOST).unwrap();
    assert!(cached.safe);
  }

  #[test]
  fn unkeyable_url_is_checked_but_never_cached() {
    let (service, calls) = service_with(StubMode::Codes(vec![]), DEFAULT_TTL_MS);
    let verdict = service.check("not a url at all");
    assert!(verdict.safe);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(service.cache().is_empty());

    // No host key means no memoization either.
    service.check("not a url at all");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn concurrent_checks_cached_host_skips_remote_uncached_host_queries() {
    let (service, calls) = service_with(StubMode::Codes(vec![]), DEFAULT_TTL_MS);
    service.cache().put("a.example", &Verdict::safe_site());

    let service = Arc::new(service);
    let s1 = Arc::clone(&service);
    let s2 = Arc::clone(&service);

    let t1 = std::thread::spawn(move || s1.check("https://a.example/"));
    let t2 = std::thread::spawn(move || s2.check("https://b.example/"));
    let v1 = t1.join().expect("thread panicked");
    let v2 = t2.join().expect("thread panicked");

    assert!(v1.safe);
    assert!(v2.safe);
    // Only the uncached host reached the client.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
