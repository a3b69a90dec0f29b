use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  warn
};

use crate::locale::Locale;

pub const DEFAULT_TIMEZONE: Tz =
  chrono_tz::Europe::Rome;

const RC_FILE_NAME: &str = ".turnirc";
const RC_ENV_VAR: &str = "TURNIRC";
const DEFAULT_DATA_LOCATION: &str =
  "~/.turni";

/// Keys understood in `.turnirc` and
/// `--rc` overrides.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq
)]
pub enum Setting {
  DataLocation,
  Locale,
  Timezone,
  Color
}

impl Setting {
  pub const ALL: [Setting; 4] = [
    Setting::DataLocation,
    Setting::Locale,
    Setting::Timezone,
    Setting::Color
  ];

  pub fn key(self) -> &'static str {
    match self {
      | Setting::DataLocation => {
        "data.location"
      }
      | Setting::Locale => "locale",
      | Setting::Timezone => "timezone",
      | Setting::Color => "color"
    }
  }

  /// Accepts the bare key or the
  /// `rc.` prefixed form.
  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    let key = key.trim();
    let key =
      key.strip_prefix("rc.").unwrap_or(key);
    Self::ALL
      .into_iter()
      .find(|setting| setting.key() == key)
  }
}

/// Effective settings for one run.
/// `timezone` stays `None` unless a
/// file or override sets it, so the
/// clock can tell a configured zone
/// from the fallback.
#[derive(Debug, Clone)]
pub struct Config {
  data_location:    PathBuf,
  locale:           Locale,
  timezone:         Option<Tz>,
  color:            bool,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_location: PathBuf::from(
        DEFAULT_DATA_LOCATION
      ),
      locale:        Locale::default(),
      timezone:      None,
      color:         true,
      loaded_files:  vec![]
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
enum RcLine<'a> {
  Blank,
  Include(&'a str),
  Assign {
    key:   &'a str,
    value: &'a str
  }
}

fn parse_rc_line(
  raw: &str
) -> anyhow::Result<RcLine<'_>> {
  let line = raw
    .split_once('#')
    .map_or(raw, |(before, _)| before)
    .trim();
  if line.is_empty() {
    return Ok(RcLine::Blank);
  }

  if let Some(target) =
    line.strip_prefix("include ")
  {
    let target = target.trim();
    if target.is_empty() {
      return Err(anyhow!(
        "include path cannot be empty"
      ));
    }
    return Ok(RcLine::Include(target));
  }

  let (key, value) =
    line.split_once('=').ok_or_else(
      || {
        anyhow!(
          "expected `key = value`, got: \
           {raw}"
        )
      }
    )?;
  Ok(RcLine::Assign {
    key:   key.trim(),
    value: value.trim()
  })
}

impl Config {
  /// Reads `--turnirc`, else
  /// `$TURNIRC` (`/dev/null` disables
  /// it), else `~/.turnirc` when
  /// present.
  #[tracing::instrument(skip(explicit))]
  pub fn load(
    explicit: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();
    match locate_turnirc(explicit) {
      | Some(path) => {
        info!(turnirc = %path.display(), "loading turnirc");
        cfg.read_file(&path)?;
      }
      | None => {
        debug!(
          "no turnirc; using defaults"
        );
      }
    }
    Ok(cfg)
  }

  /// Applies one setting. Unknown keys
  /// are logged and ignored; bad values
  /// for known keys are errors.
  pub fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    let Some(setting) =
      Setting::from_key(key)
    else {
      warn!(key, "unknown setting; ignoring");
      return Ok(());
    };

    let value = value.trim();
    match setting {
      | Setting::DataLocation => {
        if value.is_empty() {
          return Err(anyhow!(
            "data.location cannot be \
             empty"
          ));
        }
        self.data_location =
          PathBuf::from(value);
      }
      | Setting::Locale => {
        self.locale =
          value.parse().with_context(
            || {
              format!(
                "invalid locale: {value}"
              )
            }
          )?;
      }
      | Setting::Timezone => {
        let tz = value
          .parse::<Tz>()
          .map_err(|err| {
            anyhow!(
              "invalid timezone \
               {value}: {err}"
            )
          })?;
        self.timezone = Some(tz);
      }
      | Setting::Color => {
        self.color = parse_switch(value)
          .ok_or_else(|| {
            anyhow!(
              "invalid color setting: \
               {value}"
            )
          })?;
      }
    }
    debug!(key = setting.key(), value, "setting applied");
    Ok(())
  }

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
    for (key, value) in overrides {
      self.set(&key, &value).with_context(
        || format!("override {key}={value}")
      )?;
    }
    Ok(())
  }

  pub fn locale(&self) -> Locale {
    self.locale
  }

  pub fn timezone(&self) -> Option<Tz> {
    self.timezone
  }

  pub fn color(&self) -> bool {
    self.color
  }

  pub fn data_location(&self) -> &Path {
    &self.data_location
  }

  /// `key=value` pairs in declaration
  /// order, as `turni config` prints
  /// them.
  pub fn entries(
    &self
  ) -> Vec<(&'static str, String)> {
    Setting::ALL
      .into_iter()
      .map(|setting| {
        let value = match setting {
          | Setting::DataLocation => self
            .data_location
            .display()
            .to_string(),
          | Setting::Locale => {
            self.locale.tag().to_string()
          }
          | Setting::Timezone => self
            .timezone
            .unwrap_or(DEFAULT_TIMEZONE)
            .name()
            .to_string(),
          | Setting::Color => {
            if self.color {
              "on".to_string()
            } else {
              "off".to_string()
            }
          }
        };
        (setting.key(), value)
      })
      .collect()
  }

  /// The history directory: `--data`
  /// wins over `data.location`. Created
  /// when missing.
  #[tracing::instrument(skip(self))]
  pub fn data_dir(
    &self,
    explicit: Option<&Path>
  ) -> anyhow::Result<PathBuf> {
    let dir = match explicit {
      | Some(path) => path.to_path_buf(),
      | None => {
        expand_home(&self.data_location)?
      }
    };

    if !dir.exists() {
      info!(dir = %dir.display(), "creating data directory");
      fs::create_dir_all(&dir)
        .with_context(|| {
          format!(
            "failed to create {}",
            dir.display()
          )
        })?;
    }
    Ok(dir)
  }

  fn read_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_home(path)?;
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self.loaded_files.push(path.clone());

    let base = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_default();

    for (idx, raw) in
      text.lines().enumerate()
    {
      let at = || {
        format!(
          "{}:{}",
          path.display(),
          idx + 1
        )
      };
      match parse_rc_line(raw)
        .with_context(at)?
      {
        | RcLine::Blank => {}
        | RcLine::Include(target) => {
          let target =
            base.join(expand_home(
              Path::new(target)
            )?);
          if self
            .loaded_files
            .contains(&target)
          {
            warn!(include = %target.display(), "include cycle; skipping");
          } else if target.exists() {
            self.read_file(&target)?;
          } else {
            warn!(include = %target.display(), "include file does not exist; skipping");
          }
        }
        | RcLine::Assign {
          key,
          value
        } => {
          self
            .set(key, value)
            .with_context(at)?;
        }
      }
    }
    Ok(())
  }
}

fn locate_turnirc(
  explicit: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = explicit {
    return Some(path.to_path_buf());
  }

  match std::env::var_os(RC_ENV_VAR) {
    | Some(raw) if raw == "/dev/null" => {
      None
    }
    | Some(raw) => Some(PathBuf::from(raw)),
    | None => dirs::home_dir()
      .map(|home| home.join(RC_FILE_NAME))
      .filter(|path| path.exists())
  }
}

/// Expands a leading `~`. Fails only
/// when the path needs a home
/// directory that cannot be found.
fn expand_home(
  path: &Path
) -> anyhow::Result<PathBuf> {
  let Ok(rest) = path.strip_prefix("~")
  else {
    return Ok(path.to_path_buf());
  };
  let home =
    dirs::home_dir().ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory for {}",
        path.display()
      )
    })?;
  Ok(home.join(rest))
}

fn parse_switch(
  raw: &str
) -> Option<bool> {
  match raw.to_ascii_lowercase().as_str()
  {
    | "on" | "yes" | "true" | "1" => {
      Some(true)
    }
    | "off" | "no" | "false" | "0" => {
      Some(false)
    }
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::path::Path;

  use tempfile::tempdir;

  use super::{
    Config,
    DEFAULT_TIMEZONE,
    RcLine,
    Setting,
    parse_rc_line
  };
  use crate::locale::Locale;

  #[test]
  fn defaults_without_file() {
    let cfg = Config::default();
    assert_eq!(cfg.locale(), Locale::It);
    assert_eq!(cfg.timezone(), None);
    assert!(cfg.color());
    assert_eq!(
      cfg.data_location(),
      Path::new("~/.turni")
    );
    assert_eq!(
      cfg.entries(),
      vec![
        ("data.location", "~/.turni".to_string()),
        ("locale", "it".to_string()),
        ("timezone", DEFAULT_TIMEZONE.name().to_string()),
        ("color", "on".to_string()),
      ]
    );
  }

  #[test]
  fn classifies_rc_lines() {
    assert_eq!(
      parse_rc_line("  # note")
        .expect("comment"),
      RcLine::Blank
    );
    assert_eq!(
      parse_rc_line("include extra.rc")
        .expect("include"),
      RcLine::Include("extra.rc")
    );
    assert_eq!(
      parse_rc_line(
        "locale = en # labels"
      )
      .expect("assign"),
      RcLine::Assign {
        key:   "locale",
        value: "en"
      }
    );
    assert!(parse_rc_line("locale it").is_err());
    assert!(parse_rc_line("include  ").is_err());
  }

  #[test]
  fn setting_keys_accept_rc_prefix() {
    assert_eq!(
      Setting::from_key("rc.color"),
      Some(Setting::Color)
    );
    assert_eq!(
      Setting::from_key("data.location"),
      Some(Setting::DataLocation)
    );
    assert_eq!(
      Setting::from_key("editor"),
      None
    );
  }

  #[test]
  fn loads_file_with_include() {
    let dir = tempdir().expect("tempdir");
    let extra = dir.path().join("extra.rc");
    fs::write(
      &extra,
      "timezone = Europe/London\ninclude \
       turnirc\n"
    )
    .expect("write include");
    let main = dir.path().join("turnirc");
    fs::write(
      &main,
      "# personal settings\nlocale = en\n\
       color = off\neditor = vim\ninclude \
       extra.rc\ninclude missing.rc\n"
    )
    .expect("write turnirc");

    let cfg = Config::load(Some(&main))
      .expect("load config");
    assert_eq!(cfg.locale(), Locale::En);
    assert_eq!(
      cfg.timezone(),
      Some(chrono_tz::Europe::London)
    );
    assert!(!cfg.color());
    assert_eq!(cfg.loaded_files.len(), 2);
  }

  #[test]
  fn bad_values_name_the_line() {
    let dir = tempdir().expect("tempdir");
    let main = dir.path().join("turnirc");
    fs::write(
      &main,
      "locale = it\ntimezone = Mars/Base\n"
    )
    .expect("write turnirc");
    let err = Config::load(Some(&main))
      .expect_err("invalid timezone");
    assert!(
      format!("{err:#}").contains(":2"),
      "{err:#}"
    );
  }

  #[test]
  fn overrides_apply_in_order() {
    let mut cfg = Config::default();
    cfg
      .apply_overrides(vec![
        ("rc.locale".to_string(), "en-GB".to_string()),
        ("color".to_string(), "no".to_string()),
      ])
      .expect("overrides");
    assert_eq!(cfg.locale(), Locale::En);
    assert!(!cfg.color());

    assert!(
      cfg
        .apply_overrides(vec![(
          "locale".to_string(),
          "fr".to_string()
        )])
        .is_err()
    );
    assert!(
      cfg
        .apply_overrides(vec![(
          "color".to_string(),
          "maybe".to_string()
        )])
        .is_err()
    );
  }

  #[test]
  fn explicit_data_dir_is_created() {
    let dir = tempdir().expect("tempdir");
    let target = dir.path().join("nested/data");
    let cfg = Config::default();
    let resolved = cfg
      .data_dir(Some(target.as_path()))
      .expect("data dir");
    assert_eq!(resolved, target);
    assert!(target.is_dir());
  }
}
