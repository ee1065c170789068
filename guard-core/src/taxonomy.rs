use crate::types::ThreatCategory;

/// The four threat types the lookup request names, in wire order.
pub const WIRE_THREAT_TYPES: [&str; 4] = [
  "MALWARE",
  "SOCIAL_ENGINEERING",
  "UNWANTED_SOFTWARE",
  "POTENTIALLY_HARMFUL_APPLICATION",
];

/// Maps raw provider codes to categories, de-duplicating while preserving
/// first-occurrence order. Total: unrecognized codes become
/// `ThreatCategory::Unknown` rather than being dropped.
pub fn translate<I, S>(raw_codes: I) -> Vec<ThreatCategory>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut out: Vec<ThreatCategory> = Vec::new();
  for code in raw_codes {
    let category = ThreatCategory::from_code(code.as_ref());
    if !out.contains(&category) {
      out.push(category);
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dedup_preserves_first_seen_order() {
    let out = translate(["MALWARE", "MALWARE", "SOCIAL_ENGINEERING"]);
    assert_eq!(out, vec![ThreatCategory::Malware, ThreatCategory::Phishing]);
  }

  #[test]
  fn unknown_codes_are_kept_not_dropped() {
    let out = translate(["THREAT_TYPE_UNSPECIFIED", "MALWARE"]);
    assert_eq!(
      out,
      vec![
        ThreatCategory::Unknown("THREAT_TYPE_UNSPECIFIED".to_string()),
        ThreatCategory::Malware,
      ]
    );
    assert_eq!(out[0].label(), "THREAT_TYPE_UNSPECIFIED");
  }

  #[test]
  fn every_wire_type_maps_to_a_named_category() {
    for code in WIRE_THREAT_TYPES {
      let out = translate([code]);
      assert!(!matches!(out[0], ThreatCategory::Unknown(_)), "{code}");
    }
  }
}
