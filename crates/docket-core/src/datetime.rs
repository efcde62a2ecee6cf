use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Duration,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  SecondsFormat,
  TimeZone,
  Utc
};
use chrono_tz::Tz;

pub const DEFAULT_DISPLAY_TIMEZONE: &str =
  "UTC";

pub fn parse_timezone(
  raw: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(anyhow!(
      "timezone id cannot be empty"
    ));
  }
  trimmed.parse::<Tz>().map_err(|err| {
    anyhow!(
      "invalid timezone {trimmed}: \
       {err}"
    )
  })
}

/// Parses a timestamp as transmitted by
/// the data source: RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS` (taken as UTC), or
/// a bare date (UTC midnight).
pub fn parse_timestamp(
  raw: &str
) -> Option<DateTime<Utc>> {
  let token = raw.trim();
  if token.is_empty() {
    return None;
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Some(dt.with_timezone(&Utc));
  }

  if let Ok(ndt) =
    NaiveDateTime::parse_from_str(
      token,
      "%Y-%m-%dT%H:%M:%S"
    )
  {
    return Some(ndt.and_utc());
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .ok()
  .and_then(|d| d.and_hms_opt(0, 0, 0))
  .map(|ndt| ndt.and_utc())
}

pub fn to_wire(
  dt: DateTime<Utc>
) -> String {
  dt.to_rfc3339_opts(
    SecondsFormat::Secs,
    true
  )
}

fn to_utc_from_local(
  local_naive: NaiveDateTime,
  tz: &Tz
) -> anyhow::Result<DateTime<Utc>> {
  match tz.from_local_datetime(&local_naive)
  {
    | LocalResult::Single(local_dt) => {
      Ok(local_dt.with_timezone(&Utc))
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::warn!(
        first = %first,
        second = %second,
        "ambiguous local datetime; using earliest"
      );
      let chosen = if first <= second {
        first
      } else {
        second
      };
      Ok(chosen.with_timezone(&Utc))
    }
    | LocalResult::None => {
      Err(anyhow!(
        "local datetime does not \
         exist in {tz}: \
         {local_naive}"
      ))
    }
  }
}

/// Parses a due date typed by a user.
/// Accepts `today`, `tomorrow`, a bare
/// date (local midnight in `tz`) or a
/// full RFC 3339 timestamp, and returns
/// the wire form.
#[tracing::instrument(skip(now, tz), fields(input = input))]
pub fn parse_due_input(
  input: &str,
  now: DateTime<Utc>,
  tz: &Tz
) -> anyhow::Result<String> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  let day_offset = match lower.as_str()
  {
    | "today" => Some(0),
    | "tomorrow" => Some(1),
    | _ => None
  };

  if let Some(offset) = day_offset {
    let date = now
      .with_timezone(tz)
      .date_naive()
      + Duration::days(offset);
    let midnight = date
      .and_hms_opt(0, 0, 0)
      .ok_or_else(|| {
        anyhow!(
          "failed to construct \
           midnight for {lower}"
        )
      })?;
    return Ok(to_wire(
      to_utc_from_local(midnight, tz)?
    ));
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(to_wire(
      dt.with_timezone(&Utc)
    ));
  }

  let date = NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .with_context(|| {
    format!("not a date: {token}")
  })?;
  let midnight = date
    .and_hms_opt(0, 0, 0)
    .ok_or_else(|| {
      anyhow!(
        "failed to construct \
         midnight for {date}"
      )
    })?;
  Ok(to_wire(to_utc_from_local(
    midnight, tz
  )?))
}

/// `Monday, June 10`, the table and card
/// date format. Unparseable input is
/// shown as-is.
pub fn format_day(
  raw: &str,
  tz: &Tz
) -> String {
  match parse_timestamp(raw) {
    | Some(dt) => {
      dt.with_timezone(tz)
        .format("%A, %B %-d")
        .to_string()
    }
    | None => raw.to_string()
  }
}

/// `June 10, 2024`, the detail view
/// format.
pub fn format_long(
  raw: Option<&str>,
  tz: &Tz
) -> String {
  let Some(raw) = raw else {
    return String::new();
  };
  match parse_timestamp(raw) {
    | Some(dt) => {
      dt.with_timezone(tz)
        .format("%B %-d, %Y")
        .to_string()
    }
    | None => raw.to_string()
  }
}
