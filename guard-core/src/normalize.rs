use anyhow::Context;

/// Canonicalizes a URL for lookup and cache keying: the fragment is dropped,
/// everything else (query, path casing, trailing slashes) is left alone.
/// Unparseable input comes back unchanged; normalization never fails a check.
pub fn normalize_url(raw: &str) -> String {
  match reqwest::Url::parse(raw) {
    Ok(mut url) => {
      url.set_fragment(None);
      url.to_string()
    }
    Err(_) => raw.to_string(),
  }
}

/// Hostname component used as the cache key. Fails for strings that do not
/// parse as a URL or have no host; callers treat that as a non-cacheable
/// lookup and go straight to the remote query.
pub fn extract_host(url: &str) -> anyhow::Result<String> {
  let parsed = reqwest::Url::parse(url).context("malformed URL")?;
  parsed
    .host_str()
    .map(|h| h.to_string())
    .ok_or_else(|| anyhow::anyhow!("URL has no host component"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_fragment_only() {
    let out = normalize_url("https://a.example/path?q=1#section");
    assert_eq!(out, "https://a.example/path?q=1");
  }

  #[test]
  fn normalization_is_idempotent() {
    let once = normalize_url("https://A.example/Path#x");
    let twice = normalize_url(&once);
    assert_eq!(once, twice);
  }

  #[test]
  fn unparseable_input_is_returned_unchanged() {
    assert_eq!(normalize_url("not a url at all"), "not a url at all");
  }

  #[test]
  fn extract_host_returns_hostname() {
    assert_eq!(
      extract_host("https://b.example/some/page").unwrap(),
      "b.example"
    );
  }

  #[test]
  fn extract_host_fails_without_a_host() {
    assert!(extract_host("not a url at all").is_err());
    assert!(extract_host("data:text/plain,hello").is_err());
  }
}
