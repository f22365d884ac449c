use std::{
    ffi::{OsStr, OsString},
    io::BufReader,
    path::{Path, PathBuf},
};

use {anyhow::Context, jiff::civil};

use crate::{
    args::{
        self, Configurable, Usage,
        flags::{self, CommaSequence, WeekdayRange},
    },
    date::DateFlexible,
    draft::RuleDraft,
    parse::OsStrExt,
    record::RuleRecord,
    rule::{Field, Kind, RecurrenceRule},
};

/// The CLI parsing configuration for a recurrence rule.
///
/// This consumes the `<type>` and `<start>` positional arguments along with
/// every flag that edits a rule. It's shared by every command that needs a
/// rule.
///
/// When `-r/--record` is given, the record is loaded first and everything
/// else on the command line is applied on top of it.
#[derive(Debug, Default)]
pub struct RuleArgs {
    kind: Option<Kind>,
    start: Option<civil::Date>,
    end: Option<civil::Date>,
    interval: Option<i64>,
    weekdays: Vec<CommaSequence<WeekdayRange>>,
    day: Option<i64>,
    cap: Option<usize>,
    record: Option<PathBuf>,
}

impl RuleArgs {
    /// Builds the draft described on the command line.
    pub fn draft(&self) -> anyhow::Result<RuleDraft> {
        let mut draft = match self.record {
            Some(ref path) => {
                let record = read_record(path)?;
                RuleDraft::from_record(&record).with_context(|| {
                    format!("invalid record from {}", path.display())
                })?
            }
            None => {
                let kind = self.kind.context("missing required <type>")?;
                let mut draft = RuleDraft::new(*crate::TODAY);
                draft.set_kind(kind);
                draft
            }
        };
        if let Some(kind) = self.kind {
            draft.set_kind(kind);
        }
        if let Some(start) = self.start {
            draft.set_start(start);
        }
        if let Some(end) = self.end {
            draft.set_end(Some(end));
        }
        if let Some(interval) = self.interval {
            draft.set_interval(interval).context("-i/--interval")?;
        }
        if !self.weekdays.is_empty() {
            draft.set_weekdays(flags::weekday_set(&self.weekdays));
        }
        if let Some(day) = self.day {
            draft.set_day_of_month(Some(day)).context("-d/--day")?;
        }
        Ok(draft)
    }

    /// Validates the draft described on the command line into a rule.
    pub fn rule(&self) -> anyhow::Result<RecurrenceRule> {
        let draft = self.draft()?;
        match draft.snapshot() {
            Ok(rule) => Ok(rule),
            // Point at the flag when the end date came from it.
            Err(err)
                if err.field() == Some(Field::EndDate) && self.end.is_some() =>
            {
                Err(anyhow::Error::from(err).context("-e/--end"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The maximum number of occurrences to generate.
    pub fn cap(&self) -> usize {
        self.cap.unwrap_or(*crate::CAP)
    }
}

impl RuleArgs {
    /// Claims `<type>`, then `<start>`.
    fn positional(&mut self, v: &OsStr) -> anyhow::Result<bool> {
        if self.kind.is_none() {
            self.kind = Some(OsStrExt::to_str(v)?.parse()?);
        } else if self.start.is_none() {
            let date: DateFlexible = v.parse().context("<start>")?;
            self.start = Some(date.into());
        } else {
            return Ok(false);
        }
        Ok(true)
    }
}

impl Configurable for RuleArgs {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        use lexopt::Arg::*;

        match *arg {
            Value(ref v) => return self.positional(v),
            // Relative dates in the past, like `-2w`, look like a cluster of
            // short flags. So digits (and `P`, for `-P2W`) can never be
            // flags of their own.
            Short(c) if c.is_ascii_digit() || c == 'P' => {
                let mut value = OsString::from(format!("-{c}"));
                if let Some(rest) = p.optional_value() {
                    value.push(rest);
                }
                return self.positional(&value);
            }
            Short('e') | Long("end") => {
                let end: DateFlexible = args::parse(p, "-e/--end")?;
                self.end = Some(end.into());
            }
            Short('i') | Long("interval") => {
                self.interval = Some(args::parse(p, "-i/--interval")?);
            }
            Short('w') | Long("week-day") => {
                self.weekdays.push(args::parse(p, "-w/--week-day")?);
            }
            Short('d') | Long("day") => {
                self.day = Some(args::parse(p, "-d/--day")?);
            }
            Short('c') | Long("cap") => {
                self.cap = Some(args::parse(p, "-c/--cap")?);
            }
            Short('r') | Long("record") => {
                let path = p.value().context("-r/--record")?;
                self.record = Some(PathBuf::from(path));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const INTERVAL: Usage = Usage::flag(
            "-i/--interval <number>",
            "Sets the number of days, months or years between repetitions.",
            r#"
Sets the number of days, months or years between repetitions. The default is
`1`.

The interval must be at least `1`. For daily rules it counts days, for monthly
rules it counts months and for yearly rules it counts years.

Weekly rules accept an interval, but ignore it: every week from the start date
onwards is considered.
"#,
        );
        const DAY: Usage = Usage::flag(
            "-d/--day <number>",
            "The day of the month (monthly and yearly rules only).",
            r#"
The day of the month on which monthly and yearly rules fall. The default is
`1`.

Legal values are the integers 1 through 31. When a month doesn't have the day
given, the last day of that month is used instead. For example, `-d31` selects
April 30 and, in leap years, February 29.
"#,
        );
        const CAP: Usage = Usage::flag(
            "-c/--cap <number>",
            "The maximum number of occurrences to generate.",
            r#"
The maximum number of occurrences to generate.

The default is `30`, and it can be changed with the `CADENCE_CAP` environment
variable. This flag takes priority over the environment.

Generation also gives up after scanning `366` days for each occurrence in the
cap, which can only happen for weekly rules with few (or no) days of the week.
"#,
        );
        const RECORD: Usage = Usage::flag(
            "-r/--record <path>",
            "Load a rule from a JSON record, or from stdin with `-`.",
            r#"
Load a rule from a JSON record. Use `-` to read the record from stdin.

A record is what `cadence rule` prints. For example:

{"startDate": "2024-01-01", "recurrenceType": "weekly", "daysOfWeek": [1, 5]}

Missing fields besides `startDate` and `recurrenceType` take on their default
values. Everything else given on the command line, including `<type>` and
`<start>`, replaces the corresponding value in the record. When a record is
given, `<type>` is optional.
"#,
        );
        &[
            Kind::USAGE,
            DateFlexible::ARG_START,
            CAP,
            DAY,
            DateFlexible::FLAG_END,
            INTERVAL,
            RECORD,
            WeekdayRange::USAGE,
        ]
    }
}

/// Reads a JSON record from the path given, or from stdin when the path is
/// `-`.
fn read_record(path: &Path) -> anyhow::Result<RuleRecord> {
    if path == Path::new("-") {
        let rdr = std::io::stdin().lock();
        return serde_json::from_reader(rdr)
            .context("failed to read rule record from stdin");
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| {
        format!("failed to read rule record from {}", path.display())
    })
}
