pub mod cache;
pub mod config;
pub mod console;
pub mod logging;
pub mod lookup;
pub mod monitor;
pub mod normalize;
pub mod notify;
pub mod paths;
pub mod runtime;
pub mod storage;
pub mod taxonomy;
pub mod types;

use std::sync::mpsc;

pub fn run_console(args: &[String]) -> anyhow::Result<()> {
  let dry_run = runtime::configure_from_args(args);

  let base = paths::base_dir()?;
  let config_path = paths::config_path(&base);
  let cfg = if dry_run {
    config::load_or_default_readonly(&config_path)?
  } else {
    config::load_or_create_default(&config_path)?
  };

  logging::init_file_and_stderr(
    &paths::logs_dir(&base),
    &cfg.logging.level,
    cfg.logging.retention_days,
  )?;

  match console::run_console_command(&cfg, args)? {
    console::ConsoleAction::ExitOk => return Ok(()),
    console::ConsoleAction::RunMonitor => {}
  }

  tracing::info!("starting URL Guardian monitor (one URL per stdin line)");
  let (stop_tx, stop_rx) = mpsc::channel::<()>();

  let ctrlc_tx = stop_tx.clone();
  ctrlc::set_handler(move || {
    let _ = ctrlc_tx.send(());
  })?;

  let (url_tx, url_rx) = mpsc::channel::<String>();
  std::thread::spawn(move || {
    for line in std::io::stdin().lines().map_while(Result::ok) {
      if url_tx.send(line).is_err() {
        break;
      }
    }
  });

  console::run_monitor(&cfg, url_rx, stop_rx)?;
  tracing::info!("monitor stopped");
  Ok(())
}
