/// Vendor-provided canary host. URLs on it exercise the whole pipeline
/// without a live threat match or API quota; they bypass the cache on both
/// read and write so every probe stays live.
pub const TEST_VECTOR_HOST: &str = "testsafebrowsing.appspot.com";

pub fn is_test_vector(url: &str) -> bool {
  url.contains(TEST_VECTOR_HOST)
}

/// Canned raw threat code derived from the canary URL's path segment.
pub fn canned_threat_code(url: &str) -> &'static str {
  if url.contains("/SOCIAL_ENGINEERING/") {
    "SOCIAL_ENGINEERING"
  } else if url.contains("/UNWANTED_SOFTWARE/") {
    "UNWANTED_SOFTWARE"
  } else if url.contains("/POTENTIALLY_HARMFUL_APPLICATION/") {
    "POTENTIALLY_HARMFUL_APPLICATION"
  } else {
    "MALWARE"
  }
}
