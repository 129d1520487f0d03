use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  NaiveDate,
  NaiveDateTime,
  Utc
};

/// Timestamp layout exchanged with the
/// remote task store. Seconds are always
/// `00` for composed values.
pub const WIRE_FORMAT: &str =
  "%Y-%m-%dT%H:%M:%SZ";

const CALENDAR_DATE_FORMAT: &str =
  "%Y-%m-%d";

#[must_use]
pub fn format_wire(
  dt: DateTime<Utc>
) -> String {
  dt.format(WIRE_FORMAT).to_string()
}

/// Parses a stored `limit` value.
///
/// The canonical layout is tried first;
/// any RFC 3339 instant is accepted as a
/// fallback since stores commonly echo
/// `+00:00` offsets or fractional
/// seconds. Returns `None` for anything
/// else so callers can degrade instead
/// of failing a render.
#[must_use]
pub fn parse_wire(
  raw: &str
) -> Option<DateTime<Utc>> {
  let token = raw.trim();
  if token.is_empty() {
    return None;
  }

  if let Ok(ndt) =
    NaiveDateTime::parse_from_str(
      token,
      WIRE_FORMAT
    )
  {
    return Some(
      DateTime::<Utc>::from_naive_utc_and_offset(
        ndt, Utc
      )
    );
  }

  match DateTime::parse_from_rfc3339(
    token
  ) {
    | Ok(dt) => {
      Some(dt.with_timezone(&Utc))
    }
    | Err(err) => {
      tracing::debug!(
        input = token,
        error = %err,
        "unparsable wire timestamp"
      );
      None
    }
  }
}

/// Parses a calendar date typed on the
/// command line.
#[tracing::instrument(skip_all, fields(input = input))]
pub fn parse_calendar_date(
  input: &str
) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(
    input.trim(),
    CALENDAR_DATE_FORMAT
  )
  .with_context(|| {
    format!(
      "invalid calendar date \
       {input:?}; expected \
       YYYY-MM-DD"
    )
  })
}

/// Parses an explicit reference instant
/// (`--now`). Plain date-times carry no
/// offset and are read as UTC.
#[tracing::instrument(skip_all, fields(input = input))]
pub fn parse_instant(
  input: &str
) -> anyhow::Result<DateTime<Utc>> {
  let token = input.trim();

  if let Some(dt) = parse_wire(token) {
    return Ok(dt);
  }

  for fmt in [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S"
  ] {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(
        DateTime::<Utc>::from_naive_utc_and_offset(
          ndt, Utc
        )
      );
    }
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token,
      CALENDAR_DATE_FORMAT
    )
  {
    let midnight = date
      .and_hms_opt(0, 0, 0)
      .ok_or_else(|| {
        anyhow!(
          "failed to construct \
           midnight for date"
        )
      })?;
    return Ok(
      DateTime::<Utc>::from_naive_utc_and_offset(
        midnight, Utc
      )
    );
  }

  Err(anyhow!(
    "unrecognized instant: {input}"
  ))
  .with_context(|| {
    "supported formats: \
     YYYY-MM-DDTHH:MM:SSZ, RFC3339, \
     YYYY-MM-DDTHH:MM, YYYY-MM-DD \
     HH:MM, YYYY-MM-DD"
  })
}
