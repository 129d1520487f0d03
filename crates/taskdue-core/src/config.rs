use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::locale::Locale;
use crate::view::CompletionFilter;

const CONFIG_ENV_VAR: &str =
  "TASKDUE_CONFIG";
const CONFIG_DIR_NAME: &str = "taskdue";
const CONFIG_FILE_NAME: &str =
  "config.toml";
const SNAPSHOT_FILE_NAME: &str =
  "snapshot.json";

#[derive(
  Debug, Clone, Default, Deserialize,
)]
#[serde(default)]
struct ConfigFile {
  display: DisplaySection,
  view:    ViewSection,
  data:    DataSection
}

#[derive(
  Debug, Clone, Default, Deserialize,
)]
#[serde(default)]
struct DisplaySection {
  locale: Option<String>
}

#[derive(
  Debug, Clone, Default, Deserialize,
)]
#[serde(default)]
struct ViewSection {
  filter: Option<String>
}

#[derive(
  Debug, Clone, Default, Deserialize,
)]
#[serde(default)]
struct DataSection {
  location: Option<String>
}

#[derive(Debug, Clone)]
pub struct Config {
  pub locale:        Locale,
  pub filter:        CompletionFilter,
  pub data_location: Option<PathBuf>,
  pub loaded_file:   Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      locale:        Locale::default(),
      filter:
        CompletionFilter::default(),
      data_location: None,
      loaded_file:   None
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let Some(path) =
      resolve_config_path(
        config_override
      )
    else {
      warn!(
        "no config location \
         available; using defaults"
      );
      return Ok(cfg);
    };

    if !path.exists() {
      if config_override.is_some() {
        return Err(anyhow!(
          "config file does not \
           exist: {}",
          path.display()
        ));
      }
      info!(
        file = %path.display(),
        "config file not found; using defaults"
      );
      return Ok(cfg);
    }

    info!(file = %path.display(), "loading config");
    cfg.load_file(&path)?;
    Ok(cfg)
  }

  /// Parses configuration text without
  /// touching the filesystem.
  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();
    cfg.apply_file(
      toml::from_str::<ConfigFile>(raw)
        .context(
          "failed parsing config toml"
        )?
    )?;
    Ok(cfg)
  }

  /// Applies `key=value` overrides
  /// (`--rc display.locale=en`).
  /// Unknown keys are ignored.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
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
      self.set(&key, &v)?;
    }
    Ok(())
  }

  fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    match key {
      | "display.locale" => {
        self.locale = value
          .parse()
          .with_context(|| {
            format!(
              "invalid value for \
               {key}"
            )
          })?;
      }
      | "view.filter" => {
        self.filter = value
          .parse()
          .with_context(|| {
            format!(
              "invalid value for \
               {key}"
            )
          })?;
      }
      | "data.location" => {
        self.data_location =
          Some(expand_tilde(Path::new(
            value.trim()
          )));
      }
      | other => {
        warn!(
          key = other,
          "ignoring unknown config key"
        );
      }
    }
    Ok(())
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let text =
      fs::read_to_string(path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let parsed =
      toml::from_str::<ConfigFile>(
        &text
      )
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })?;

    self.apply_file(parsed)?;
    self.loaded_file =
      Some(path.to_path_buf());
    Ok(())
  }

  fn apply_file(
    &mut self,
    file: ConfigFile
  ) -> anyhow::Result<()> {
    if let Some(locale) =
      file.display.locale
    {
      self
        .set("display.locale", &locale)?;
    }
    if let Some(filter) =
      file.view.filter
    {
      self.set("view.filter", &filter)?;
    }
    if let Some(location) =
      file.data.location
    {
      self
        .set("data.location", &location)?;
    }
    Ok(())
  }
}

/// Snapshot file used by the CLI store.
#[tracing::instrument(skip(
  cfg,
  override_path
))]
pub fn resolve_data_path(
  cfg: &Config,
  override_path: Option<&Path>
) -> anyhow::Result<PathBuf> {
  if let Some(path) = override_path {
    return Ok(expand_tilde(path));
  }

  if let Some(path) =
    cfg.data_location.as_ref()
  {
    return Ok(path.clone());
  }

  let base = dirs::data_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine data \
         directory"
      )
    })?;
  Ok(
    base
      .join(CONFIG_DIR_NAME)
      .join(SNAPSHOT_FILE_NAME)
  )
}

fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(expand_tilde(path));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(expand_tilde(
        Path::new(trimmed)
      ));
    }
  }

  dirs::config_dir().map(|dir| {
    dir
      .join(CONFIG_DIR_NAME)
      .join(CONFIG_FILE_NAME)
  })
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use tempfile::tempdir;

  use super::Config;
  use crate::locale::Locale;
  use crate::view::CompletionFilter;

  #[test]
  fn defaults_without_file() {
    let cfg = Config::default();
    assert_eq!(cfg.locale, Locale::Ja);
    assert_eq!(
      cfg.filter,
      CompletionFilter::Pending
    );
    assert!(cfg.data_location.is_none());
  }

  #[test]
  fn parses_sections() {
    let cfg = Config::from_toml_str(
      "[display]\nlocale = \"en\"\n\n\
       [view]\nfilter = \"done\"\n\n\
       [data]\nlocation = \
       \"/tmp/tasks.json\"\n"
    )
    .expect("parse config");
    assert_eq!(cfg.locale, Locale::En);
    assert_eq!(
      cfg.filter,
      CompletionFilter::Done
    );
    assert_eq!(
      cfg.data_location,
      Some(PathBuf::from(
        "/tmp/tasks.json"
      ))
    );
  }

  #[test]
  fn rejects_bad_values() {
    assert!(
      Config::from_toml_str(
        "[display]\nlocale = \"xx\"\n"
      )
      .is_err()
    );
  }

  #[test]
  fn overrides_win_over_file() {
    let temp =
      tempdir().expect("tempdir");
    let path =
      temp.path().join("config.toml");
    std::fs::write(
      &path,
      "[display]\nlocale = \"en\"\n"
    )
    .expect("write config");

    let mut cfg =
      Config::load(Some(&path))
        .expect("load config");
    assert_eq!(cfg.locale, Locale::En);
    assert_eq!(
      cfg.loaded_file.as_deref(),
      Some(path.as_path())
    );

    cfg
      .apply_overrides(vec![
        (
          "rc.display.locale".to_string(),
          "ja".to_string()
        ),
        (
          "unknown.key".to_string(),
          "1".to_string()
        ),
      ])
      .expect("apply overrides");
    assert_eq!(cfg.locale, Locale::Ja);
  }

  #[test]
  fn missing_explicit_file_is_an_error()
  {
    let temp =
      tempdir().expect("tempdir");
    assert!(
      Config::load(Some(
        &temp.path().join("absent.toml")
      ))
      .is_err()
    );
  }
}
