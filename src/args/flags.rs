use {
    anyhow::Context,
    bstr::ByteSlice,
    jiff::civil,
};

use crate::{args::Usage, parse::FromBytes, rule::WeekdaySet};

/// Provides parsing for Jiff's civil `Weekday` type.
///
/// Besides names, the integers `0` (Sunday) through `6` (Saturday) are
/// accepted.
#[derive(Clone, Copy, Debug)]
pub struct Weekday {
    weekday: civil::Weekday,
}

impl Weekday {
    /// Return the parsed weekday.
    pub fn get(&self) -> civil::Weekday {
        self.weekday
    }
}

impl From<civil::Weekday> for Weekday {
    fn from(weekday: civil::Weekday) -> Weekday {
        Weekday { weekday }
    }
}

impl std::str::FromStr for Weekday {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Weekday> {
        Weekday::from_bytes(s.as_bytes())
    }
}

impl FromBytes for Weekday {
    type Err = anyhow::Error;

    fn from_bytes(s: &[u8]) -> anyhow::Result<Weekday> {
        use jiff::civil::Weekday::*;

        let weekday = match &*s.to_ascii_lowercase() {
            b"sunday" | b"sun" | b"su" | b"0" => Sunday,
            b"monday" | b"mon" | b"mo" | b"1" => Monday,
            b"tuesday" | b"tues" | b"tue" | b"tu" | b"2" => Tuesday,
            b"wednesday" | b"wed" | b"we" | b"3" => Wednesday,
            b"thursday" | b"thurs" | b"thu" | b"th" | b"4" => Thursday,
            b"friday" | b"fri" | b"fr" | b"5" => Friday,
            b"saturday" | b"sat" | b"sa" | b"6" => Saturday,
            unk => anyhow::bail!(
                "unrecognized weekday: `{unk}`",
                unk = unk.as_bstr()
            ),
        };
        Ok(Weekday { weekday })
    }
}

/// A scrappy comma delimited sequence of values.
///
/// This doesn't support quoting or escaping, so `T`'s format must not
/// contain a `,`. Empty sequences are rejected.
#[derive(Clone, Debug)]
pub struct CommaSequence<T>(Vec<T>);

impl<'a, T> IntoIterator for &'a CommaSequence<T> {
    type IntoIter = std::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> std::slice::Iter<'a, T> {
        self.0.iter()
    }
}

impl<T, E> std::str::FromStr for CommaSequence<T>
where
    T: std::str::FromStr<Err = E>,
    E: std::fmt::Display,
{
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<CommaSequence<T>> {
        let mut seq = vec![];
        for item in s.split(",") {
            seq.push(item.parse::<T>().map_err(|err| {
                anyhow::Error::msg(format!(
                    "failed to parse `{item}` \
                     within sequence `{s}`: {err}",
                ))
            })?);
        }
        anyhow::ensure!(!seq.is_empty(), "empty sequences are not allowed",);
        Ok(CommaSequence(seq))
    }
}

/// A single weekday or a contiguous range of weekdays.
///
/// The format is `start[..end]`. Ranges wrap around the end of the week, so
/// `fri..mon` is Friday, Saturday, Sunday and Monday.
#[derive(Clone, Copy, Debug)]
pub struct WeekdayRange {
    start: civil::Weekday,
    end: civil::Weekday,
}

impl WeekdayRange {
    pub const USAGE: Usage = Usage::flag(
        "-w/--week-day <week-day-list>",
        "Provide one or more days of the week (weekly rules only).",
        r#"
Provide one or more days of the week. Only weekly rules pay attention to this
flag. A weekly rule generates every date, starting at the start date, that
falls on one of the days given.

Any day of the week may be given. They can be specified in the following way
(without regard for case):

Sunday, Sun, SU, 0

Monday, Mon, MO, 1

Tuesday, Tues, Tue, TU, 2

Wednesday, Wed, WE, 3

Thursday, Thurs, Thu, TH, 4

Friday, Fri, FR, 5

Saturday, Sat, SA, 6

Contiguous ranges of weekdays may be specified. For example, `mon..fri`
corresponds to every work day. Ranges may wrap around, so `fri..sun`
corresponds to Friday, Saturday and Sunday.

Multiple weekdays or ranges can be specified with repeated use of this flag,
or by separating values with a comma. For example, `sun,tue..thu,sat`
corresponds to every day of the week except for Monday and Friday.

When this flag is used together with `-r/--record`, the days given replace
the days in the record.

A weekly rule without any days of the week generates nothing.
"#,
    );

    /// Returns every weekday in this range, in order from `start`.
    pub fn weekdays(&self) -> impl Iterator<Item = civil::Weekday> {
        // `until` is always in `0..=6`, and the range is inclusive.
        let len = self.start.until(self.end).unsigned_abs();
        self.start.cycle_forward().take(1 + usize::from(len))
    }
}

impl std::str::FromStr for WeekdayRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<WeekdayRange> {
        let Some((start, end)) = s.split_once("..") else {
            let weekday = s
                .parse::<Weekday>()
                .with_context(|| {
                    format!("failed to parse `{s}` as a single weekday")
                })?
                .get();
            return Ok(WeekdayRange { start: weekday, end: weekday });
        };
        let start = start.parse::<Weekday>().with_context(|| {
            format!(
                "failed to parse `{start}` \
                 as a single weekday within the range `{s}`"
            )
        })?;
        let end = end.parse::<Weekday>().with_context(|| {
            format!(
                "failed to parse `{end}` \
                 as a single weekday within the range `{s}`"
            )
        })?;
        Ok(WeekdayRange { start: start.get(), end: end.get() })
    }
}

/// Collects every weekday from the given sequences of ranges into a set.
pub fn weekday_set<'a>(
    seqs: impl IntoIterator<Item = &'a CommaSequence<WeekdayRange>>,
) -> WeekdaySet {
    seqs.into_iter().flatten().flat_map(|range| range.weekdays()).collect()
}
