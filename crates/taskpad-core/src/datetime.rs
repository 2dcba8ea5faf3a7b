use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Days,
  Local,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "taskpad-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "TASKPAD_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "TASKPAD_TIME_CONFIG";

/// Zone that decides which calendar day
/// "today" is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
  Local,
  Named(Tz)
}

impl Zone {
  #[must_use]
  pub fn date_of(
    &self,
    instant: DateTime<Utc>
  ) -> NaiveDate {
    match self {
      | Zone::Local => {
        instant
          .with_timezone(&Local)
          .date_naive()
      }
      | Zone::Named(tz) => {
        instant
          .with_timezone(tz)
          .date_naive()
      }
    }
  }
}

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

pub fn configured_zone() -> &'static Zone {
  static ZONE: OnceLock<Zone> =
    OnceLock::new();
  ZONE.get_or_init(resolve_zone)
}

/// Calendar date of the current instant
/// in the configured zone.
#[must_use]
pub fn today() -> NaiveDate {
  configured_zone().date_of(Utc::now())
}

fn resolve_zone() -> Zone {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return Zone::Named(tz);
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return Zone::Named(tz);
  }

  tracing::debug!(
    "no timezone configured; using \
     system local zone"
  );
  Zone::Local
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let timezone =
    match timezone_from_toml(&raw) {
      | Ok(Some(timezone)) => timezone,
      | Ok(None) => {
        tracing::warn!(
          file = %path.display(),
          "timezone config had no timezone field"
        );
        return None;
      }
      | Err(err) => {
        tracing::error!(
          file = %path.display(),
          error = %err,
          "failed parsing timezone config file"
        );
        return None;
      }
    };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn timezone_from_toml(
  raw: &str
) -> anyhow::Result<Option<String>> {
  let parsed =
    toml::from_str::<TimezoneConfig>(
      raw
    )
    .context(
      "invalid timezone config toml"
    )?;
  Ok(parsed.timezone.or_else(|| {
    parsed
      .time
      .and_then(|section| section.timezone)
  }))
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Parses a due-date expression relative
/// to `today`.
///
/// Accepts `YYYY-MM-DD`, an RFC 3339
/// timestamp (its own calendar date),
/// `today`, `tomorrow`, `yesterday`, and
/// `+Nd` / `+Nw` offsets.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_due_date(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "" => {
      return Err(anyhow!(
        "empty date expression"
      ));
    }
    | "today" => return Ok(today),
    | "tomorrow" => {
      return today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!("date out of range")
        });
    }
    | "yesterday" => {
      return today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!("date out of range")
        });
    }
    | _ => {}
  }

  let rel_re =
    Regex::new(r"^\+(?P<num>\d{1,4})(?P<unit>[dw])$")
      .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let amount: u64 = caps["num"]
      .parse()
      .context("invalid offset")?;
    let days = if &caps["unit"] == "w" {
      amount * 7
    } else {
      amount
    };
    return today
      .checked_add_days(Days::new(days))
      .ok_or_else(|| {
        anyhow!("date out of range")
      });
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.date_naive());
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {token}"
  ))
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    TimeZone,
    Utc
  };

  use super::{
    Zone,
    parse_due_date,
    timezone_from_toml
  };

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn parses_iso_dates_and_keywords() {
    let today = day(2026, 2, 16);
    assert_eq!(
      parse_due_date(
        "2026-03-01",
        today
      )
      .expect("iso"),
      day(2026, 3, 1)
    );
    assert_eq!(
      parse_due_date("today", today)
        .expect("today"),
      today
    );
    assert_eq!(
      parse_due_date(
        "Tomorrow", today
      )
      .expect("tomorrow"),
      day(2026, 2, 17)
    );
    assert_eq!(
      parse_due_date(
        "yesterday",
        today
      )
      .expect("yesterday"),
      day(2026, 2, 15)
    );
  }

  #[test]
  fn parses_relative_offsets() {
    let today = day(2026, 2, 16);
    assert_eq!(
      parse_due_date("+3d", today)
        .expect("days"),
      day(2026, 2, 19)
    );
    assert_eq!(
      parse_due_date("+2w", today)
        .expect("weeks"),
      day(2026, 3, 2)
    );
  }

  #[test]
  fn rfc3339_uses_its_own_calendar_date()
  {
    let today = day(2026, 2, 16);
    assert_eq!(
      parse_due_date(
        "2026-02-20T23:30:00-06:00",
        today
      )
      .expect("rfc3339"),
      day(2026, 2, 20)
    );
  }

  #[test]
  fn rejects_garbage() {
    let today = day(2026, 2, 16);
    assert!(
      parse_due_date("", today).is_err()
    );
    assert!(
      parse_due_date(
        "not a date",
        today
      )
      .is_err()
    );
    assert!(
      parse_due_date(
        "2026-02-30",
        today
      )
      .is_err()
    );
  }

  #[test]
  fn named_zone_shifts_the_calendar_day()
  {
    let instant = Utc
      .with_ymd_and_hms(
        2026, 2, 16, 3, 0, 0
      )
      .unwrap();
    let zone = Zone::Named(
      chrono_tz::America::Mexico_City
    );
    assert_eq!(
      zone.date_of(instant),
      day(2026, 2, 15)
    );
  }

  #[test]
  fn timezone_file_accepts_both_layouts()
  {
    assert_eq!(
      timezone_from_toml(
        "timezone = \"Europe/Paris\""
      )
      .expect("flat"),
      Some("Europe/Paris".to_string())
    );
    assert_eq!(
      timezone_from_toml(
        "[time]\ntimezone = \"UTC\""
      )
      .expect("section"),
      Some("UTC".to_string())
    );
    assert_eq!(
      timezone_from_toml("")
        .expect("empty"),
      None
    );
  }
}
