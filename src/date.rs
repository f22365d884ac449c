use {
    anyhow::Context,
    bstr::{BStr, ByteSlice},
    jiff::{Span, civil},
};

use crate::{
    TODAY,
    args::{Usage, flags::Weekday},
    parse::{BytesExt, FromBytes},
};

/// Returns the date for `(year, month, day)`, where `day` is clamped to the
/// last day of the month when it would otherwise overflow.
///
/// For example, `(2024, 2, 31)` becomes `2024-02-29` and `(2023, 2, 31)`
/// becomes `2023-02-28`. We never let an overflowing day spill into the
/// following month.
///
/// `None` is returned when the year or month is outside of Jiff's supported
/// range, or when `day` is less than `1`.
pub fn clamped(year: i16, month: i8, day: i8) -> Option<civil::Date> {
    if day < 1 {
        return None;
    }
    let first = civil::Date::new(year, month, 1).ok()?;
    civil::Date::new(year, month, day.min(first.days_in_month())).ok()
}

/// Returns the date on `day` of the month that is `months` months after the
/// month containing `date`. The day of `date` itself plays no role.
///
/// Overflowing days are clamped as with [`clamped`]. `None` is returned when
/// the target month is outside of Jiff's supported range.
pub fn add_months_clamped(
    date: civil::Date,
    months: i64,
    day: i8,
) -> Option<civil::Date> {
    // Count months from year zero so that rolling over into later years is
    // just euclidean division.
    let origin = i64::from(date.year()) * 12 + i64::from(date.month() - 1);
    let target = origin.checked_add(months)?;
    let year = i16::try_from(target.div_euclid(12)).ok()?;
    let month = i8::try_from(target.rem_euclid(12) + 1).ok()?;
    clamped(year, month, day)
}

/// Represents a date parsed on the CLI.
///
/// Beyond plain ISO 8601 dates, this accepts a few relative forms that are
/// resolved against the current date (`TODAY`), e.g., `tomorrow`, `fri` or
/// `-2w`.
///
/// Callers should only use this type as a target for parsing and convert it
/// to a `civil::Date` right away.
#[derive(Clone, Copy, Debug)]
pub struct DateFlexible {
    date: civil::Date,
}

impl DateFlexible {
    pub const ARG_START: Usage = Usage::arg(
        "<start>",
        "The first date of the rule, e.g., `today` or `2025-03-15`.",
        r#"
The first date of the rule. When absent, the current date is used.

An ISO 8601 date like `2025-03-15` is always accepted. Additionally, a number
of more flexible formats are supported, each interpreted relative to the
current date:

`today`, `yesterday` and `tomorrow` refer to what you'd expect.

A day of the week, e.g., `fri` or `Monday`, refers to the current day if it
falls on that weekday, or otherwise the soonest following date that does.

A duration from the current date. For example, `1 week` or more succinctly
`1w`. To go backwards, use `1 week ago` or `-1w`. Only calendar units (years,
months, weeks and days) make sense here.

The current date can be overridden with the `CADENCE_TODAY` environment
variable.
"#,
    );

    pub const FLAG_END: Usage = Usage::flag(
        "-e/--end <date>",
        "The last date (inclusive) on which an occurrence may fall.",
        r#"
The last date (inclusive) on which an occurrence may fall.

This accepts the same formats as the `<start>` argument. The end date must
not precede the start date.

When an end date is given, fewer occurrences than the cap may be generated.
"#,
    );

    /// Parses a flexible date, resolving relative forms against the date
    /// given.
    pub fn parse_relative(
        relative: civil::Date,
        s: &[u8],
    ) -> anyhow::Result<DateFlexible> {
        let s = s.as_bstr();
        match &**s {
            b"today" => return Ok(DateFlexible { date: relative }),
            b"yesterday" => {
                return Ok(DateFlexible { date: relative.yesterday()? });
            }
            b"tomorrow" => {
                return Ok(DateFlexible { date: relative.tomorrow()? });
            }
            _ => {}
        }
        let strv = s.to_str().with_context(|| {
            format!("date `{s}` is not valid UTF-8", s = BStr::new(s))
        })?;
        let iso_err = match strv.parse::<civil::Date>() {
            Ok(date) => return Ok(DateFlexible { date }),
            Err(err) => err,
        };
        if let Ok(wd) = s.parse::<Weekday>() {
            let wd = wd.get();
            let date = if relative.weekday() == wd {
                relative
            } else {
                relative.nth_weekday(1, wd)?
            };
            return Ok(DateFlexible { date });
        }
        if let Ok(span) = strv.parse::<Span>() {
            let date = relative.checked_add(span).with_context(|| {
                format!("failed to add `{strv}` to current date `{relative}`")
            })?;
            return Ok(DateFlexible { date });
        }
        log::debug!("failed to parse `{strv}` as ISO 8601 date: {iso_err}");
        anyhow::bail!("unrecognized date `{strv}`")
    }
}

impl From<DateFlexible> for civil::Date {
    fn from(date: DateFlexible) -> civil::Date {
        date.date
    }
}

impl std::str::FromStr for DateFlexible {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<DateFlexible> {
        s.as_bytes().parse()
    }
}

impl FromBytes for DateFlexible {
    type Err = anyhow::Error;

    fn from_bytes(s: &[u8]) -> anyhow::Result<DateFlexible> {
        DateFlexible::parse_relative(*TODAY, s)
    }
}
