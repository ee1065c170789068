use crate::lookup::SafetyLookupService;
use crate::notify::VerdictSink;
use std::sync::mpsc;
use std::time::Duration;

/// Browser-internal schemes that are never worth a lookup.
const INTERNAL_PREFIXES: [&str; 7] = [
  "chrome://",
  "chrome-extension://",
  "moz-extension://",
  "edge://",
  "about:",
  "data:",
  "javascript:",
];

pub fn is_internal_page(url: &str) -> bool {
  INTERNAL_PREFIXES.iter().any(|p| url.starts_with(p))
}

/// Stand-in for the browser-event trigger glue: consumes URLs from a channel
/// (one per navigation event), runs each through the lookup service, and
/// hands the verdict to the sink.
pub struct Monitor {
  service: SafetyLookupService,
  sink: Box<dyn VerdictSink>,
}

impl Monitor {
  pub fn new(service: SafetyLookupService, sink: Box<dyn VerdictSink>) -> Self {
    Self { service, sink }
  }

  pub fn service(&self) -> &SafetyLookupService {
    &self.service
  }

  pub fn run(
    &self,
    urls_rx: mpsc::Receiver<String>,
    stop_rx: mpsc::Receiver<()>,
    tick: Duration,
  ) -> anyhow::Result<()> {
    tracing::info!("monitor loop started");

    loop {
      if stop_rx.recv_timeout(tick).is_ok() {
        break;
      }

      loop {
        match urls_rx.try_recv() {
          Ok(line) => self.handle_line(&line),
          Err(mpsc::TryRecvError::Empty) => break,
          Err(mpsc::TryRecvError::Disconnected) => {
            tracing::info!("input closed; monitor loop exiting");
            return Ok(());
          }
        }
      }
    }

    tracing::info!("monitor loop exiting");
    Ok(())
  }

  fn handle_line(&self, line: &str) {
    let url = line.trim();
    if url.is_empty() {
      return;
    }
    if is_internal_page(url) {
      tracing::debug!("skipping internal page");
      return;
    }

    let verdict = self.service.check(url);
    self.sink.deliver(url, &verdict);
  }
}
