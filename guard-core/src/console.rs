use crate::cache::ResultCache;
use crate::config::Config;
use crate::lookup::client::HttpThreatClient;
use crate::lookup::{test_vector, SafetyLookupService};
use crate::monitor::Monitor;
use crate::notify::{self, PrintSink};
use crate::storage::{self, FileStore, KeyValueStore};
use crate::{paths, runtime};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

pub enum ConsoleAction {
  RunMonitor,
  ExitOk,
}

pub fn run_console_command(cfg: &Config, args: &[String]) -> anyhow::Result<ConsoleAction> {
  let args = strip_global_flags(args);

  if args.iter().any(|a| a == "--help" || a == "-h") {
    print_help();
    return Ok(ConsoleAction::ExitOk);
  }

  if let Some(i) = args.iter().position(|a| a == "--check") {
    return run_check(cfg, &args[i + 1..]);
  }

  if let Some(i) = args.iter().position(|a| a == "--cache") {
    return run_cache(cfg, &args[i + 1..]);
  }

  if let Some(i) = args.iter().position(|a| a == "--canary") {
    return run_canary(&args[i + 1..]);
  }

  Ok(ConsoleAction::RunMonitor)
}

fn run_check(cfg: &Config, tail: &[String]) -> anyhow::Result<ConsoleAction> {
  let url = tail
    .first()
    .ok_or_else(|| anyhow::anyhow!("expected: --check <url>"))?;

  let (service, store) = build_service(cfg)?;
  if let Some(store) = store.as_ref() {
    let restored = storage::load_cache(store, service.cache()).unwrap_or_else(|e| {
      tracing::warn!(reason = %e, "could not restore cache state; starting empty");
      0
    });
    tracing::debug!(restored, "cache state restored");
  }

  let verdict = service.check(url);
  println!("{}", notify::render(url, &verdict));

  if let Some(store) = store.as_ref() {
    storage::save_cache(store, service.cache())?;
  }
  Ok(ConsoleAction::ExitOk)
}

fn run_cache(cfg: &Config, tail: &[String]) -> anyhow::Result<ConsoleAction> {
  let base = paths::base_dir()?;
  let store = FileStore::new(paths::cache_state_path(&base));

  let sub = tail.first().map(|s| s.as_str()).unwrap_or("");
  match sub {
    "status" => {
      let cache = ResultCache::new(cfg.cache.ttl_ms);
      let fresh = storage::load_cache(&store, &cache).unwrap_or(0);

      println!("Cache TTL: {} ms", cfg.cache.ttl_ms);
      println!("Persistence: {}", if cfg.cache.persist { "on" } else { "off" });
      println!("State file: {}", store.path().display());
      println!("Fresh entries: {fresh}");
      Ok(ConsoleAction::ExitOk)
    }
    "clear" => {
      if runtime::is_dry_run() {
        println!("DRY-RUN: would clear persisted cache state.");
        return Ok(ConsoleAction::ExitOk);
      }
      store.set(storage::CACHE_RESULTS_KEY, serde_json::json!({}))?;
      println!("Cache state cleared.");
      Ok(ConsoleAction::ExitOk)
    }
    _ => {
      eprintln!("Unknown `--cache` subcommand. Expected: status|clear");
      print_help();
      Ok(ConsoleAction::ExitOk)
    }
  }
}

fn run_canary(tail: &[String]) -> anyhow::Result<ConsoleAction> {
  let kind = tail.first().map(|s| s.as_str()).unwrap_or("malware");
  let code = match kind {
    "malware" => "MALWARE",
    "social" => "SOCIAL_ENGINEERING",
    "unwanted" => "UNWANTED_SOFTWARE",
    "pha" => "POTENTIALLY_HARMFUL_APPLICATION",
    _ => anyhow::bail!("expected: --canary [malware|social|unwanted|pha]"),
  };

  // Canary checks short-circuit inside the service; the client is never
  // reached, so a cache-less service with no usable key still works.
  let url = canary_url(code);
  let service = SafetyLookupService::new(
    Arc::new(ResultCache::new(crate::cache::DEFAULT_TTL_MS)),
    Box::new(UnreachableClient),
  );
  let verdict = service.check(&url);
  println!("{}", notify::render(&url, &verdict));
  Ok(ConsoleAction::ExitOk)
}

pub fn canary_url(code: &str) -> String {
  format!(
    "https://{}/apiv4/ANY_PLATFORM/{}/URL/",
    test_vector::TEST_VECTOR_HOST,
    code
  )
}

struct UnreachableClient;

impl crate::lookup::client::ThreatLookupClient for UnreachableClient {
  fn query(&self, _url: &str) -> Result<Vec<String>, crate::lookup::client::RemoteError> {
    Err(crate::lookup::client::RemoteError::Transport(
      "canary checks must not reach the network".to_string(),
    ))
  }
}

pub fn run_monitor(
  cfg: &Config,
  urls_rx: mpsc::Receiver<String>,
  stop_rx: mpsc::Receiver<()>,
) -> anyhow::Result<()> {
  let (service, store) = build_service(cfg)?;

  if let Some(store) = store.as_ref() {
    let restored = storage::load_cache(store, service.cache()).unwrap_or_else(|e| {
      tracing::warn!(reason = %e, "could not restore cache state; starting empty");
      0
    });
    tracing::info!(restored, "cache state restored");

    // The notification UI reads its delay from the same store.
    let _ = store.set(
      storage::AUTO_HIDE_DELAY_KEY,
      serde_json::json!(cfg.notify.auto_hide_delay_ms),
    );
  }

  let monitor = Monitor::new(service, Box::new(PrintSink));
  monitor.run(urls_rx, stop_rx, Duration::from_millis(250))?;

  if let Some(store) = store.as_ref() {
    storage::save_cache(store, monitor.service().cache())?;
    tracing::info!("cache state saved");
  }
  Ok(())
}

fn build_service(cfg: &Config) -> anyhow::Result<(SafetyLookupService, Option<FileStore>)> {
  let cache = Arc::new(ResultCache::new(cfg.cache.ttl_ms));
  let client = HttpThreatClient::new(&cfg.api)?;
  let service = SafetyLookupService::new(cache, Box::new(client));

  let store = if cfg.cache.persist {
    let base = paths::base_dir()?;
    Some(FileStore::new(paths::cache_state_path(&base)))
  } else {
    None
  };

  Ok((service, store))
}

fn strip_global_flags(args: &[String]) -> Vec<String> {
  args
    .iter()
    .filter(|a| a.as_str() != "--monitor" && a.as_str() != "--dry-run")
    .cloned()
    .collect()
}

fn print_help() {
  println!("URL Guardian v{} (console mode)", env!("CARGO_PKG_VERSION"));
  println!("Commands:");
  println!("  --dry-run (global; skips state-file writes)");
  println!("  --check <url>");
  println!("  --cache status");
  println!("  --cache clear");
  println!("  --canary [malware|social|unwanted|pha]");
  println!("  --monitor (default; reads one URL per line from stdin)");
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canary_urls_carry_the_code_as_a_path_segment() {
    let url = canary_url("SOCIAL_ENGINEERING");
    assert!(url.contains("testsafebrowsing.appspot.com"));
    assert!(url.contains("/SOCIAL_ENGINEERING/"));
  }

  #[test]
  fn unknown_subcommands_do_not_start_the_monitor() {
    let cfg = Config::default();
    let args = vec!["--cache".to_string(), "bogus".to_string()];
    assert!(matches!(
      run_console_command(&cfg, &args).unwrap(),
      ConsoleAction::ExitOk
    ));
  }
}
