use crate::types::{now_unix_ms, Verdict};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

pub const DEFAULT_TTL_MS: u64 = 600_000;

#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub verdict: Verdict,
  pub created_at_unix_ms: u64,
}

/// Host-keyed verdict cache with TTL expiry. One coarse lock guards the whole
/// map; entry counts are small and operations cheap, so nothing finer is
/// needed. The lock is never held across a network call.
pub struct ResultCache {
  ttl_ms: u64,
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
  pub fn new(ttl_ms: u64) -> Self {
    Self {
      ttl_ms,
      entries: Mutex::new(HashMap::new()),
    }
  }

  pub fn ttl_ms(&self) -> u64 {
    self.ttl_ms
  }

  /// Returns the cached verdict for `host` if present and younger than the
  /// TTL. Read-only: a stale entry is reported as a miss but left in place
  /// for the next write pass to evict.
  pub fn get(&self, host: &str) -> Option<Verdict> {
    self.get_at(host, now_unix_ms())
  }

  pub(crate) fn get_at(&self, host: &str, now_ms: u64) -> Option<Verdict> {
    let entries = self.lock_entries();
    let entry = entries.get(host)?;
    if now_ms.saturating_sub(entry.created_at_unix_ms) >= self.ttl_ms {
      return None;
    }
    Some(entry.verdict.clone())
  }

  /// Inserts or overwrites the entry for `host`, first evicting every stale
  /// entry (cleanup piggybacks on writes; there is no sweep thread). Error
  /// verdicts are never stored, so a transient provider outage cannot poison
  /// a host's classification for the rest of the TTL window.
  pub fn put(&self, host: &str, verdict: &Verdict) {
    self.put_at(host, verdict, now_unix_ms());
  }

  pub(crate) fn put_at(&self, host: &str, verdict: &Verdict, now_ms: u64) {
    if verdict.is_error {
      return;
    }

    let mut entries = self.lock_entries();
    let ttl_ms = self.ttl_ms;
    entries.retain(|_, e| now_ms.saturating_sub(e.created_at_unix_ms) < ttl_ms);
    entries.insert(
      host.to_string(),
      CacheEntry {
        verdict: verdict.clone(),
        created_at_unix_ms: now_ms,
      },
    );
  }

  pub fn clear(&self) {
    self.lock_entries().clear();
  }

  pub fn len(&self) -> usize {
    self.lock_entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock_entries().is_empty()
  }

  /// Copy of the current entries, for persistence.
  pub fn snapshot(&self) -> Vec<(String, CacheEntry)> {
    self
      .lock_entries()
      .iter()
      .map(|(host, entry)| (host.clone(), entry.clone()))
      .collect()
  }

  /// Replaces the map with `entries`, dropping anything already stale.
  /// Returns how many entries survived.
  pub fn load(&self, entries: impl IntoIterator<Item = (String, CacheEntry)>) -> usize {
    let now = now_unix_ms();
    let mut map = self.lock_entries();
    map.clear();
    for (host, entry) in entries {
      if now.saturating_sub(entry.created_at_unix_ms) >= self.ttl_ms {
        continue;
      }
      if entry.verdict.is_error {
        continue;
      }
      map.insert(host, entry);
    }
    map.len()
  }

  fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    // A panic while holding this lock leaves the map intact; recover the
    // guard rather than propagating the poison.
    self
      .entries
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
