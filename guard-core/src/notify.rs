use crate::types::{host_for_log, Verdict};
use std::sync::mpsc;

/// Fire-and-forget delivery of finished verdicts to whatever front end is
/// listening. Delivery failure is swallowed and logged, never escalated.
pub trait VerdictSink: Send {
  fn deliver(&self, url: &str, verdict: &Verdict);
}

/// Hands verdicts to a listener over a channel. A hung-up receiver just
/// means nobody is rendering notifications right now.
pub struct ChannelSink {
  tx: mpsc::Sender<(String, Verdict)>,
}

impl ChannelSink {
  pub fn new(tx: mpsc::Sender<(String, Verdict)>) -> Self {
    Self { tx }
  }
}

impl VerdictSink for ChannelSink {
  fn deliver(&self, url: &str, verdict: &Verdict) {
    if self.tx.send((url.to_string(), verdict.clone())).is_err() {
      tracing::debug!(host = %host_for_log(url), "no verdict listener; dropping result");
    }
  }
}

/// Console front end: renders each verdict to stdout.
pub struct PrintSink;

impl VerdictSink for PrintSink {
  fn deliver(&self, url: &str, verdict: &Verdict) {
    println!("{}", render(url, verdict));
  }
}

pub fn render(url: &str, verdict: &Verdict) -> String {
  if verdict.is_error {
    return format!("ERROR  {url}: {}", verdict.error_message);
  }
  if verdict.safe {
    return format!("SAFE   {url}: {}", verdict.message);
  }
  format!("THREAT {url}: {}", verdict.message)
}
