use jiff::civil::{self, Weekday};

use crate::{
    args::Usage,
    generate::{Occurrences, Preview},
};

/// A validated recurrence rule.
///
/// A rule is a start date, an optional (inclusive) end date and a
/// [`Recurrence`] describing how dates repeat. Every value of this type
/// is valid: it can only be built through [`RecurrenceRule::new`] (or
/// indirectly via a draft or record), so generating occurrences from it
/// never fails.
///
/// Rules are plain owned values. Generation borrows a rule immutably, so a
/// rule can't change while its occurrences are being computed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RecurrenceRule {
    start: civil::Date,
    end: Option<civil::Date>,
    recurrence: Recurrence,
}

impl RecurrenceRule {
    /// Create a new rule, checking that `end` (when present) doesn't
    /// precede `start`.
    pub fn new(
        start: civil::Date,
        end: Option<civil::Date>,
        recurrence: Recurrence,
    ) -> Result<RecurrenceRule, RuleError> {
        if let Some(end) = end {
            if end < start {
                return Err(RuleError::invalid(
                    Field::EndDate,
                    end,
                    format!("must not precede the start date `{start}`"),
                ));
            }
        }
        Ok(RecurrenceRule { start, end, recurrence })
    }

    pub fn start(&self) -> civil::Date {
        self.start
    }

    pub fn end(&self) -> Option<civil::Date> {
        self.end
    }

    pub fn recurrence(&self) -> &Recurrence {
        &self.recurrence
    }

    pub fn kind(&self) -> Kind {
        self.recurrence.kind()
    }

    pub fn interval(&self) -> Interval {
        self.recurrence.interval()
    }

    /// Returns an iterator over at most `cap` occurrences of this rule.
    pub fn occurrences(&self, cap: usize) -> Occurrences<'_> {
        Occurrences::new(self, cap)
    }

    /// Collects at most `cap` occurrences into a preview that can answer
    /// whether a particular date is an occurrence.
    pub fn preview(&self, cap: usize) -> Preview {
        Preview::new(self, cap)
    }
}

/// How a rule repeats, along with exactly the parameters that matter for
/// each kind of repetition.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Recurrence {
    /// Every `interval` days.
    Daily { interval: Interval },
    /// Every day that falls on one of `days`.
    ///
    /// The interval is carried along, but weekly generation doesn't skip
    /// weeks with it. Every week from the start date is scanned.
    Weekly { interval: Interval, days: WeekdaySet },
    /// On `day` (or the 1st) of every `interval` months, starting with the
    /// month `interval` months after the start date's month.
    Monthly { interval: Interval, day: Option<DayOfMonth> },
    /// On `day` (or the 1st) of January every `interval` years, starting
    /// with the start date's year.
    Yearly { interval: Interval, day: Option<DayOfMonth> },
}

impl Recurrence {
    pub fn kind(&self) -> Kind {
        match *self {
            Recurrence::Daily { .. } => Kind::Daily,
            Recurrence::Weekly { .. } => Kind::Weekly,
            Recurrence::Monthly { .. } => Kind::Monthly,
            Recurrence::Yearly { .. } => Kind::Yearly,
        }
    }

    pub fn interval(&self) -> Interval {
        match *self {
            Recurrence::Daily { interval }
            | Recurrence::Weekly { interval, .. }
            | Recurrence::Monthly { interval, .. }
            | Recurrence::Yearly { interval, .. } => interval,
        }
    }

    /// The selected days of the week, for weekly rules.
    pub fn weekdays(&self) -> Option<WeekdaySet> {
        match *self {
            Recurrence::Weekly { days, .. } => Some(days),
            _ => None,
        }
    }

    /// The anchor day of the month, for monthly and yearly rules.
    pub fn day_of_month(&self) -> Option<DayOfMonth> {
        match *self {
            Recurrence::Monthly { day, .. }
            | Recurrence::Yearly { day, .. } => day,
            _ => None,
        }
    }
}

/// The kind of a recurrence, without any of its parameters.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Kind {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Kind {
    pub const USAGE: Usage = Usage::arg(
        "<type>",
        "How often the rule repeats: daily, weekly, monthly or yearly.",
        r#"
How often the rule repeats.

Valid values are:

daily, day, d

weekly, week, wk, w

monthly, month, mo

yearly, year, yr, y

A daily rule generates the start date and then every `-i/--interval` days
after it.

A weekly rule generates every date on or after the start date that falls on
one of the days given to `-w/--week-day`.

A monthly rule generates the day given to `-d/--day` (default 1) in every
`-i/--interval` months, beginning `-i/--interval` months after the start
date's month.

A yearly rule generates the day given to `-d/--day` (default 1) in January of
the start date's year, and then every `-i/--interval` years after that.

When the day of the month doesn't exist in a particular month, the last day
of that month is used instead.
"#,
    );

    pub fn as_str(&self) -> &'static str {
        match *self {
            Kind::Daily => "daily",
            Kind::Weekly => "weekly",
            Kind::Monthly => "monthly",
            Kind::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for Kind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Kind, RuleError> {
        let kind = match &*s.to_lowercase() {
            "daily" | "day" | "d" => Kind::Daily,
            "weekly" | "week" | "wk" | "w" => Kind::Weekly,
            "monthly" | "month" | "mo" => Kind::Monthly,
            "yearly" | "year" | "yr" | "y" => Kind::Yearly,
            _ => return Err(RuleError::UnknownType(s.to_string())),
        };
        Ok(kind)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The number of days, months or years between repetitions. Always `>= 1`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Interval(i32);

impl Interval {
    pub const ONE: Interval = Interval(1);

    pub fn new(interval: i64) -> Result<Interval, RuleError> {
        match i32::try_from(interval) {
            Ok(n) if n >= 1 => Ok(Interval(n)),
            _ => Err(RuleError::invalid(
                Field::Interval,
                interval,
                format!(
                    "must be greater than or equal to 1 and at most {}",
                    i32::MAX,
                ),
            )),
        }
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl Default for Interval {
    fn default() -> Interval {
        Interval::ONE
    }
}

/// An anchor day of the month, in the range `1..=31`.
///
/// Whether the day actually exists depends on the month it's applied to.
/// Generation clamps it to the last day of shorter months.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DayOfMonth(i8);

impl DayOfMonth {
    pub fn new(day: i64) -> Result<DayOfMonth, RuleError> {
        match i8::try_from(day) {
            Ok(d) if 1 <= d && d <= 31 => Ok(DayOfMonth(d)),
            _ => Err(RuleError::invalid(
                Field::DayOfMonth,
                day,
                "must be in range 1..=31",
            )),
        }
    }

    pub fn get(&self) -> i8 {
        self.0
    }
}

/// A set of days of the week.
///
/// Iteration always goes from Sunday to Saturday, regardless of insertion
/// order.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> WeekdaySet {
        WeekdaySet(0)
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & bit(weekday) != 0
    }

    /// Insert `weekday`, returning false when it was already present.
    pub fn insert(&mut self, weekday: Weekday) -> bool {
        let had = self.contains(weekday);
        self.0 |= bit(weekday);
        !had
    }

    /// Insert `weekday` if it's absent and remove it otherwise. Returns
    /// whether `weekday` is in the set afterwards.
    #[cfg_attr(not(test), expect(dead_code))]
    pub fn toggle(&mut self, weekday: Weekday) -> bool {
        self.0 ^= bit(weekday);
        self.contains(weekday)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        // At most 7.
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + use<> {
        let set = *self;
        Weekday::Sunday
            .cycle_forward()
            .take(7)
            .filter(move |&wd| set.contains(wd))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(it: I) -> WeekdaySet {
        let mut set = WeekdaySet::empty();
        for weekday in it {
            set.insert(weekday);
        }
        set
    }
}

fn bit(weekday: Weekday) -> u8 {
    1 << weekday.to_sunday_zero_offset()
}

/// Converts a weekday index, where `0` is Sunday and `6` is Saturday.
pub fn weekday_from_index(index: i64) -> Result<Weekday, RuleError> {
    i8::try_from(index)
        .ok()
        .and_then(|i| Weekday::from_sunday_zero_offset(i).ok())
        .ok_or_else(|| {
            RuleError::invalid(
                Field::DayOfWeek,
                index,
                "must be in range 0..=6, where 0 is Sunday",
            )
        })
}

/// The inverse of [`weekday_from_index`].
pub fn weekday_index(weekday: Weekday) -> i64 {
    i64::from(weekday.to_sunday_zero_offset())
}

/// A field of a recurrence rule, for error reporting.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Field {
    Interval,
    DayOfWeek,
    DayOfMonth,
    EndDate,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match *self {
            Field::Interval => "interval",
            Field::DayOfWeek => "day of the week",
            Field::DayOfMonth => "day of the month",
            Field::EndDate => "end date",
        };
        f.write_str(label)
    }
}

/// An error describing why a recurrence rule is invalid.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("invalid {field} value `{value}` ({expected})")]
    InvalidField { field: Field, value: String, expected: String },
    #[error(
        "unrecognized recurrence type `{0}` \
         (expected daily, weekly, monthly or yearly)"
    )]
    UnknownType(String),
}

impl RuleError {
    pub(crate) fn invalid(
        field: Field,
        value: impl std::fmt::Display,
        expected: impl Into<String>,
    ) -> RuleError {
        RuleError::InvalidField {
            field,
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// The field that is invalid, if the error is about a particular field.
    pub fn field(&self) -> Option<Field> {
        match *self {
            RuleError::InvalidField { field, .. } => Some(field),
            RuleError::UnknownType(_) => None,
        }
    }
}
