use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

const RC_ENV_VAR: &str = "TASKPADRC";
const RC_FILE_NAME: &str = ".taskpadrc";
const DATA_DIR_NAME: &str = ".taskpad";

/// Every key taskpad reads, with its
/// default.
const KNOWN_KEYS: [(&str, &str); 4] = [
  ("data.location", "~/.taskpad"),
  ("color", "on"),
  ("confirmation", "on"),
  ("list.completed", "off")
];

#[derive(Debug, Clone)]
pub struct Config {
  map:        HashMap<String, String>,
  pub source: Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let map = KNOWN_KEYS
      .iter()
      .map(|(k, v)| {
        (k.to_string(), v.to_string())
      })
      .collect();

    Self {
      map,
      source: None
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let Some(path) =
      resolve_rc_path(rc_override)
    else {
      debug!(
        "no taskpadrc found; using \
         defaults"
      );
      return Ok(cfg);
    };

    let path = expand_tilde(&path);
    info!(rc = %path.display(), "loading taskpadrc");
    let text = fs::read_to_string(
      &path
    )
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;

    let entries = parse_rc(&text)
      .with_context(|| {
        format!(
          "invalid config file {}",
          path.display()
        )
      })?;
    for (key, value) in entries {
      cfg.set(key, value);
    }

    cfg.source = Some(path);
    Ok(cfg)
  }

  /// Keys may carry the `rc.` prefix
  /// used on the command line.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.set(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  /// `None` when the key is unset or
  /// its value is not a recognised
  /// switch.
  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    let raw = self.map.get(key)?;
    let parsed = parse_switch(raw);
    if parsed.is_none() {
      warn!(key, value = %raw, "not an on/off value; using default");
    }
    parsed
  }

  fn set(
    &mut self,
    key: String,
    value: String
  ) {
    if !KNOWN_KEYS
      .iter()
      .any(|(k, _)| *k == key)
    {
      warn!(key = %key, "unknown config key");
    }
    trace!(key = %key, value = %value, "config key set");
    self.map.insert(key, value);
  }
}

/// Reads `key = value` lines. A `#`
/// starts a comment; blank lines are
/// skipped.
fn parse_rc(
  text: &str
) -> anyhow::Result<Vec<(String, String)>>
{
  let mut entries = Vec::new();
  for (idx, raw_line) in
    text.lines().enumerate()
  {
    let line = raw_line
      .split_once('#')
      .map_or(raw_line, |(before, _)| {
        before
      })
      .trim();
    if line.is_empty() {
      continue;
    }

    let (k, v) = line
      .split_once('=')
      .ok_or_else(|| {
        anyhow!(
          "line {}: expected key = \
           value, got: {}",
          idx + 1,
          raw_line.trim()
        )
      })?;
    let key = k.trim();
    if key.is_empty() {
      return Err(anyhow!(
        "line {}: missing key",
        idx + 1
      ));
    }
    entries.push((
      key.to_string(),
      v.trim().to_string()
    ));
  }
  Ok(entries)
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  if let Some(path) = override_dir {
    return Ok(path.to_path_buf());
  }

  if let Some(cfg_value) =
    cfg.get("data.location")
    && !cfg_value.trim().is_empty()
  {
    return Ok(expand_tilde(Path::new(
      cfg_value.trim()
    )));
  }

  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(DATA_DIR_NAME))
}

/// `--config`, then `TASKPADRC` (empty
/// or `/dev/null` means no file), then
/// `~/.taskpadrc` if it exists.
fn resolve_rc_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    let rc_env = rc_env.trim();
    if rc_env.is_empty()
      || rc_env == "/dev/null"
    {
      return None;
    }
    return Some(PathBuf::from(rc_env));
  }

  let home = dirs::home_dir()?;
  let candidate = home.join(RC_FILE_NAME);
  candidate.exists().then_some(candidate)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  if let Ok(rest) = path.strip_prefix("~")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_switch(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
