use std::path::{Path, PathBuf};

pub fn base_dir() -> anyhow::Result<PathBuf> {
  if let Ok(dir) = std::env::var("GUARDIAN_HOME") {
    return Ok(PathBuf::from(dir));
  }

  let home = std::env::var("HOME")
    .or_else(|_| std::env::var("USERPROFILE"))
    .map_err(|_| anyhow::anyhow!("neither GUARDIAN_HOME, HOME nor USERPROFILE is set"))?;
  Ok(PathBuf::from(home).join(".guardian"))
}

pub fn config_path(base: &Path) -> PathBuf {
  base.join("config.toml")
}

pub fn logs_dir(base: &Path) -> PathBuf {
  base.join("logs")
}

pub fn state_dir(base: &Path) -> PathBuf {
  base.join("state")
}

pub fn cache_state_path(base: &Path) -> PathBuf {
  state_dir(base).join("cache.json")
}
