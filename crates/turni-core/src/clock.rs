use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Duration,
  NaiveDate,
  NaiveDateTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

use crate::calendar::checked_shift_months;
use crate::config::{
  Config,
  DEFAULT_TIMEZONE
};

const TIMEZONE_ENV_VAR: &str =
  "TURNI_TIMEZONE";

/// Source of the wall-clock time shown
/// in calendar views. Read once per
/// invocation; everything downstream
/// receives the resulting value.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
  tz: Tz
}

impl Clock {
  pub fn new(tz: Tz) -> Self {
    Self { tz }
  }

  /// `TURNI_TIMEZONE` first, then the
  /// `timezone` setting, then Rome.
  #[tracing::instrument(skip(cfg))]
  pub fn from_config(
    cfg: &Config
  ) -> Self {
    let from_env =
      std::env::var(TIMEZONE_ENV_VAR)
        .ok()
        .and_then(|raw| {
          env_timezone(&raw)
        });
    Self::new(resolve_timezone(
      from_env,
      cfg.timezone()
    ))
  }

  pub fn timezone(&self) -> Tz {
    self.tz
  }

  pub fn local_from_utc(
    &self,
    dt: DateTime<Utc>
  ) -> NaiveDateTime {
    dt.with_timezone(&self.tz)
      .naive_local()
  }

  pub fn now_local(
    &self
  ) -> NaiveDateTime {
    self.local_from_utc(Utc::now())
  }
}

fn resolve_timezone(
  from_env: Option<Tz>,
  from_config: Option<Tz>
) -> Tz {
  let tz = from_env
    .or(from_config)
    .unwrap_or(DEFAULT_TIMEZONE);
  tracing::debug!(
    timezone = tz.name(),
    env = from_env.is_some(),
    "resolved timezone"
  );
  tz
}

/// An unusable environment value is
/// logged and skipped rather than
/// failing the run.
fn env_timezone(raw: &str) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }
  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(err) => {
      tracing::warn!(
        var = TIMEZONE_ENV_VAR,
        timezone = %trimmed,
        error = %err,
        "ignoring invalid timezone"
      );
      None
    }
  }
}

fn offset_days(
  from: NaiveDate,
  days: i64
) -> anyhow::Result<NaiveDate> {
  Duration::try_days(days)
    .and_then(|delta| {
      from.checked_add_signed(delta)
    })
    .ok_or_else(|| {
      anyhow!(
        "date offset out of range: \
         {days} days"
      )
    })
}

/// Resolves a date argument relative
/// to `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_lowercase();

  match lower.as_str() {
    | "today" | "oggi" => {
      return Ok(today);
    }
    | "tomorrow" | "domani" => {
      return offset_days(today, 1);
    }
    | "yesterday" | "ieri" => {
      return offset_days(today, -1);
    }
    | _ => {}
  }

  if let Some(target_weekday) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today,
      target_weekday
    ));
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let num =
      if sign == "-" { -num } else { num };
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    return match unit {
      | "d" => offset_days(today, num),
      | "w" => {
        let days = num
          .checked_mul(7)
          .ok_or_else(|| {
            anyhow!(
              "date offset out of \
               range: {num} weeks"
            )
          })?;
        offset_days(today, days)
      }
      | "m" => {
        let months = i32::try_from(num)
          .context(
            "relative month offset out \
             of range"
          )?;
        checked_shift_months(
          today, months
        )
        .ok_or_else(|| {
          anyhow!(
            "date offset out of range: \
             {num} months"
          )
        })
      }
      | _ => {
        Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ))
      }
    };
  }

  for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
    if let Ok(date) =
      NaiveDate::parse_from_str(
        token, fmt
      )
    {
      return Ok(date);
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, weekday \
     names (e.g. monday, lunedì), \
     +Nd/-Nw/+Nm, YYYY-MM-DD, \
     DD/MM/YYYY"
  })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" | "lunedì"
    | "lunedi" | "lun" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "martedì"
    | "martedi" => Some(Weekday::Tue),
    | "wednesday" | "wed"
    | "mercoledì" | "mercoledi"
    | "mer" => Some(Weekday::Wed),
    | "thursday" | "thu" | "giovedì"
    | "giovedi" | "gio" => {
      Some(Weekday::Thu)
    }
    | "friday" | "fri" | "venerdì"
    | "venerdi" | "ven" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" | "sabato"
    | "sab" => Some(Weekday::Sat),
    | "sunday" | "sun" | "domenica"
    | "dom" => Some(Weekday::Sun),
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_signed(Duration::days(
      delta
    ))
    .unwrap_or(from)
}
