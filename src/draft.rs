use jiff::civil::{self, Weekday};

use crate::{
    record::RuleRecord,
    rule::{
        DayOfMonth, Field, Interval, Kind, Recurrence, RecurrenceRule,
        RuleError, WeekdaySet, weekday_from_index,
    },
};

/// A recurrence rule that is still being edited.
///
/// Each setter validates only the field it touches. Cross-field checks (the
/// end date not preceding the start date) happen in
/// [`RuleDraft::snapshot`], which copies the draft into a fresh
/// [`RecurrenceRule`].
///
/// Changing the kind of a draft never clears fields that only apply to other
/// kinds. For example, a draft's days of the week survive a switch from
/// weekly to monthly and back again. The snapshot only carries the fields
/// that apply to the draft's current kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuleDraft {
    kind: Kind,
    start: civil::Date,
    end: Option<civil::Date>,
    interval: Interval,
    weekdays: WeekdaySet,
    day_of_month: Option<DayOfMonth>,
}

impl RuleDraft {
    /// A daily draft starting on `today`, with no end date and an interval
    /// of `1`.
    pub fn new(today: civil::Date) -> RuleDraft {
        RuleDraft {
            kind: Kind::default(),
            start: today,
            end: None,
            interval: Interval::ONE,
            weekdays: WeekdaySet::empty(),
            day_of_month: None,
        }
    }

    /// Builds a draft from every field of a record, including fields that
    /// don't apply to the record's type.
    pub fn from_record(record: &RuleRecord) -> Result<RuleDraft, RuleError> {
        let mut draft = RuleDraft::new(record.start_date);
        draft.set_kind(record.recurrence_type.parse()?);
        draft.set_end(record.end_date);
        draft.set_interval(record.recurrence_interval)?;
        let mut weekdays = WeekdaySet::empty();
        for &index in record.days_of_week.iter() {
            if !weekdays.insert(weekday_from_index(index)?) {
                return Err(RuleError::invalid(
                    Field::DayOfWeek,
                    index,
                    "must not be repeated",
                ));
            }
        }
        draft.set_weekdays(weekdays);
        draft.set_day_of_month(record.nth_day_of_month)?;
        Ok(draft)
    }

    pub fn set_kind(&mut self, kind: Kind) {
        self.kind = kind;
    }

    pub fn set_start(&mut self, start: civil::Date) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: Option<civil::Date>) {
        self.end = end;
    }

    pub fn set_interval(&mut self, interval: i64) -> Result<(), RuleError> {
        self.interval = Interval::new(interval)?;
        Ok(())
    }

    pub fn set_weekdays(&mut self, weekdays: WeekdaySet) {
        self.weekdays = weekdays;
    }

    /// Sets or clears the anchor day of the month.
    ///
    /// On error, the previous value is left as it was.
    pub fn set_day_of_month(
        &mut self,
        day: Option<i64>,
    ) -> Result<(), RuleError> {
        self.day_of_month = day.map(DayOfMonth::new).transpose()?;
        Ok(())
    }

    /// Validates this draft and copies it into a new rule.
    pub fn snapshot(&self) -> Result<RecurrenceRule, RuleError> {
        let interval = self.interval;
        let recurrence = match self.kind {
            Kind::Daily => Recurrence::Daily { interval },
            Kind::Weekly => {
                Recurrence::Weekly { interval, days: self.weekdays }
            }
            Kind::Monthly => {
                Recurrence::Monthly { interval, day: self.day_of_month }
            }
            Kind::Yearly => {
                Recurrence::Yearly { interval, day: self.day_of_month }
            }
        };
        if recurrence.weekdays().is_none() && !self.weekdays.is_empty() {
            log::debug!(
                "ignoring {len} days of the week for {kind} rule",
                len = self.weekdays.len(),
                kind = self.kind,
            );
        }
        if recurrence.day_of_month().is_none() {
            if let Some(day) = self.day_of_month {
                log::debug!(
                    "ignoring day of the month {day} for {kind} rule",
                    day = day.get(),
                    kind = self.kind,
                );
            }
        }
        RecurrenceRule::new(self.start, self.end, recurrence)
    }
}

#[cfg_attr(not(test), expect(dead_code))]
impl RuleDraft {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn start(&self) -> civil::Date {
        self.start
    }

    pub fn end(&self) -> Option<civil::Date> {
        self.end
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn weekdays(&self) -> WeekdaySet {
        self.weekdays
    }

    pub fn day_of_month(&self) -> Option<DayOfMonth> {
        self.day_of_month
    }

    /// Adds `weekday` when absent, removes it otherwise. Returns whether it
    /// is selected afterwards.
    pub fn toggle_weekday(&mut self, weekday: Weekday) -> bool {
        self.weekdays.toggle(weekday)
    }
}
