/*!
Expansion of a recurrence rule into the dates it denotes.

Every sequence produced here is bounded three ways, and ends at whichever
comes first:

* The end date of the rule, if it has one. The end date is inclusive.
* The cap given by the caller, which bounds the number of dates produced.
* A safety limit of `366` iterations per date in the cap. This only matters
  for weekly rules, which scan one day at a time and can go a long time
  (forever, when no days are selected) without finding a match.

Dates that can't be represented by Jiff also end a sequence.
*/

use jiff::{Span, civil};

use crate::{
    date,
    rule::{DayOfMonth, Recurrence, RecurrenceRule},
};

/// The number of occurrences generated when a caller doesn't say otherwise.
pub const DEFAULT_CAP: usize = 30;

/// The number of iterations allowed for each occurrence in the cap.
const ITERATIONS_PER_OCCURRENCE: usize = 366;

/// Returns at most `cap` occurrences of `rule`, in order.
pub fn generate(rule: &RecurrenceRule, cap: usize) -> Vec<civil::Date> {
    rule.occurrences(cap).collect()
}

/// An iterator over the occurrences of a rule.
///
/// The dates yielded are non-decreasing. Yearly rules are the only ones
/// whose first date may precede the start date of the rule, since they
/// always fall in January.
#[derive(Clone, Debug)]
pub struct Occurrences<'r> {
    rule: &'r RecurrenceRule,
    cap: usize,
    limit: usize,
    emitted: usize,
    iteration: usize,
    done: bool,
}

/// What a single iteration of generation decided.
enum Step {
    Emit(civil::Date),
    Skip,
    /// The date for this iteration is after the rule's end date.
    Ended,
    /// The date for this iteration can't be represented.
    OutOfRange,
}

impl<'r> Occurrences<'r> {
    pub(crate) fn new(
        rule: &'r RecurrenceRule,
        cap: usize,
    ) -> Occurrences<'r> {
        Occurrences {
            rule,
            cap,
            limit: cap.saturating_mul(ITERATIONS_PER_OCCURRENCE),
            emitted: 0,
            iteration: 0,
            done: false,
        }
    }

    fn step(&self, i: usize) -> Step {
        let Ok(i) = i64::try_from(i) else { return Step::OutOfRange };
        let start = self.rule.start();
        let mut selected = true;
        let date = match *self.rule.recurrence() {
            Recurrence::Daily { interval } => i
                .checked_mul(i64::from(interval.get()))
                .and_then(|days| add_days(start, days)),
            Recurrence::Weekly { days, .. } => {
                let date = add_days(start, i);
                selected = date.is_some_and(|d| days.contains(d.weekday()));
                date
            }
            Recurrence::Monthly { interval, day } => i
                .checked_add(1)
                .and_then(|n| n.checked_mul(i64::from(interval.get())))
                .and_then(|months| {
                    date::add_months_clamped(start, months, anchor(day))
                }),
            Recurrence::Yearly { interval, day } => i
                .checked_mul(i64::from(interval.get()))
                .and_then(|years| years.checked_add(i64::from(start.year())))
                .and_then(|year| i16::try_from(year).ok())
                .and_then(|year| date::clamped(year, 1, anchor(day))),
        };
        let Some(date) = date else { return Step::OutOfRange };
        // Dates only ever increase, so nothing after this can be emitted
        // either. This is checked before `selected` so that weekly scans
        // stop at the end date even when no weekday matches.
        if self.rule.end().is_some_and(|end| date > end) {
            Step::Ended
        } else if selected {
            Step::Emit(date)
        } else {
            Step::Skip
        }
    }
}

impl<'r> Iterator for Occurrences<'r> {
    type Item = civil::Date;

    fn next(&mut self) -> Option<civil::Date> {
        while !self.done {
            if self.emitted >= self.cap {
                self.done = true;
                break;
            }
            if self.iteration >= self.limit {
                log::debug!(
                    "stopping {kind} rule after {limit} iterations \
                     with {emitted} of at most {cap} occurrences",
                    kind = self.rule.kind(),
                    limit = self.limit,
                    emitted = self.emitted,
                    cap = self.cap,
                );
                self.done = true;
                break;
            }
            let i = self.iteration;
            self.iteration += 1;
            match self.step(i) {
                Step::Skip => continue,
                Step::Emit(date) => {
                    self.emitted += 1;
                    return Some(date);
                }
                Step::Ended => {
                    log::trace!(
                        "stopping {kind} rule at iteration {i} since the \
                         end date has passed",
                        kind = self.rule.kind(),
                    );
                    self.done = true;
                }
                Step::OutOfRange => {
                    log::debug!(
                        "stopping {kind} rule at iteration {i} since \
                         the next date is out of range",
                        kind = self.rule.kind(),
                    );
                    self.done = true;
                }
            }
        }
        None
    }
}

impl<'r> std::iter::FusedIterator for Occurrences<'r> {}

/// A generated sequence of occurrences that can be queried for membership.
///
/// This is what a calendar view uses to decide which days to mark.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Preview {
    dates: Vec<civil::Date>,
}

impl Preview {
    pub fn new(rule: &RecurrenceRule, cap: usize) -> Preview {
        Preview { dates: generate(rule, cap) }
    }

    /// Returns true when `date` is the same calendar day as one of the
    /// occurrences in this preview.
    ///
    /// Callers with a datetime should compare its date, e.g., via
    /// `Zoned::date`.
    pub fn contains(&self, date: civil::Date) -> bool {
        // Generated dates are always sorted.
        self.dates.binary_search(&date).is_ok()
    }

    #[cfg_attr(not(test), expect(dead_code))]
    pub fn dates(&self) -> &[civil::Date] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[cfg_attr(not(test), expect(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn add_days(date: civil::Date, days: i64) -> Option<civil::Date> {
    let span = Span::new().try_days(days).ok()?;
    date.checked_add(span).ok()
}

fn anchor(day: Option<DayOfMonth>) -> i8 {
    day.map_or(1, |day| day.get())
}

#[cfg(test)]
mod tests {
    use jiff::civil::{Weekday::*, date};

    use crate::rule::{Interval, WeekdaySet};

    use super::*;

    fn snapshot<T>(it: impl IntoIterator<Item = T>) -> String
    where
        T: ToString,
    {
        it.into_iter()
            .map(|item| item.to_string())
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn rule(
        start: civil::Date,
        end: Option<civil::Date>,
        recurrence: Recurrence,
    ) -> RecurrenceRule {
        RecurrenceRule::new(start, end, recurrence).unwrap()
    }

    fn interval(n: i64) -> Interval {
        Interval::new(n).unwrap()
    }

    fn day(n: i64) -> Option<DayOfMonth> {
        Some(DayOfMonth::new(n).unwrap())
    }

    fn days(weekdays: &[civil::Weekday]) -> WeekdaySet {
        weekdays.iter().copied().collect()
    }

    #[test]
    fn daily_every_week() {
        let r = rule(
            date(2024, 3, 1),
            None,
            Recurrence::Daily { interval: interval(7) },
        );
        insta::assert_snapshot!(
            snapshot(generate(&r, 3)),
            @r"
        2024-03-01
        2024-03-08
        2024-03-15
        ",
        );
    }

    #[test]
    fn daily_across_leap_day() {
        let r = rule(
            date(2024, 2, 27),
            None,
            Recurrence::Daily { interval: Interval::ONE },
        );
        insta::assert_snapshot!(
            snapshot(generate(&r, 4)),
            @r"
        2024-02-27
        2024-02-28
        2024-02-29
        2024-03-01
        ",
        );
    }

    #[test]
    fn weekly_monday_friday() {
        let r = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Weekly {
                interval: Interval::ONE,
                days: days(&[Monday, Friday]),
            },
        );
        insta::assert_snapshot!(
            snapshot(generate(&r, 4)),
            @r"
        2024-01-01
        2024-01-05
        2024-01-08
        2024-01-12
        ",
        );
    }

    #[test]
    fn weekly_ignores_interval() {
        let every = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Weekly {
                interval: Interval::ONE,
                days: days(&[Wednesday]),
            },
        );
        let every_other = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Weekly {
                interval: interval(2),
                days: days(&[Wednesday]),
            },
        );
        assert_eq!(generate(&every, 5), generate(&every_other, 5));
    }

    #[test]
    fn weekly_without_days() {
        let r = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Weekly {
                interval: Interval::ONE,
                days: WeekdaySet::empty(),
            },
        );
        assert_eq!(generate(&r, 30), vec![]);
        assert_eq!(generate(&r, 0), vec![]);
    }

    #[test]
    fn daily_spacing_is_interval() {
        let starts = [date(2024, 1, 1), date(2023, 2, 28), date(1999, 12, 31)];
        for start in starts {
            for n in [1, 2, 7, 30, 365] {
                let r = rule(
                    start,
                    None,
                    Recurrence::Daily { interval: interval(n) },
                );
                let dates = generate(&r, 20);
                assert_eq!(dates.len(), 20);
                assert_eq!(dates[0], start);
                for w in dates.windows(2) {
                    let gap = w[0].until(w[1]).unwrap().get_days();
                    assert_eq!(i64::from(gap), n, "{r:?}");
                }
            }
        }
    }

    #[test]
    fn weekly_misses_no_matching_day() {
        let starts = [date(2024, 1, 1), date(2024, 2, 27), date(2023, 12, 30)];
        let masks: [u8; 6] =
            [0b0000001, 0b1000000, 0b0100010, 0b0010101, 0b1011011, 0b1111111];
        for start in starts {
            for mask in masks {
                let set: WeekdaySet = Sunday
                    .cycle_forward()
                    .take(7)
                    .enumerate()
                    .filter(|&(i, _)| (mask >> i) & 1 == 1)
                    .map(|(_, wd)| wd)
                    .collect();
                let r = rule(
                    start,
                    None,
                    Recurrence::Weekly { interval: Interval::ONE, days: set },
                );
                let dates = generate(&r, 25);
                assert_eq!(dates.len(), 25, "{r:?}");
                let last = dates[dates.len() - 1];
                // Every matching day from the start up to the last date
                // generated shows up, and nothing else does.
                let expected: Vec<civil::Date> = start
                    .series(Span::new().days(1))
                    .take_while(|&d| d <= last)
                    .filter(|d| set.contains(d.weekday()))
                    .collect();
                assert_eq!(dates, expected, "{r:?}");
            }
        }
    }

    #[test]
    fn weekly_scan_stops_at_end() {
        let r = rule(
            date(2024, 1, 1),
            Some(date(2024, 1, 7)),
            Recurrence::Weekly {
                interval: Interval::ONE,
                days: WeekdaySet::empty(),
            },
        );
        let mut it = r.occurrences(usize::MAX);
        assert_eq!(it.next(), None);
        // Seven days up to and including the end, plus the one after it.
        assert_eq!(it.iteration, 8);

        let r = rule(
            date(2024, 1, 1),
            Some(date(2024, 1, 31)),
            Recurrence::Weekly {
                interval: Interval::ONE,
                days: days(&[Thursday]),
            },
        );
        let mut it = r.occurrences(usize::MAX);
        assert_eq!(it.by_ref().count(), 4);
        assert_eq!(it.iteration, 32);
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        let r = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Monthly { interval: Interval::ONE, day: day(31) },
        );
        insta::assert_snapshot!(
            snapshot(generate(&r, 3)),
            @r"
        2024-02-29
        2024-03-31
        2024-04-30
        ",
        );
    }

    #[test]
    fn monthly_skips_start_month() {
        // Even when the start date falls before the anchor day, the start
        // month is never part of the sequence.
        let r = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Monthly { interval: Interval::ONE, day: day(15) },
        );
        assert_eq!(generate(&r, 1), vec![date(2024, 2, 15)]);

        let r = rule(
            date(2024, 1, 20),
            None,
            Recurrence::Monthly { interval: Interval::ONE, day: None },
        );
        assert_eq!(generate(&r, 1), vec![date(2024, 2, 1)]);
    }

    #[test]
    fn monthly_rolls_into_next_year() {
        let r = rule(
            date(2023, 11, 10),
            None,
            Recurrence::Monthly { interval: interval(5), day: day(30) },
        );
        insta::assert_snapshot!(
            snapshot(generate(&r, 4)),
            @r"
        2024-04-30
        2024-09-30
        2025-02-28
        2025-07-30
        ",
        );
    }

    #[test]
    fn yearly_in_january() {
        let r = rule(
            date(2024, 6, 15),
            None,
            Recurrence::Yearly { interval: interval(2), day: day(31) },
        );
        // The first occurrence precedes the start date.
        insta::assert_snapshot!(
            snapshot(generate(&r, 3)),
            @r"
        2024-01-31
        2026-01-31
        2028-01-31
        ",
        );

        let r = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Yearly { interval: Interval::ONE, day: None },
        );
        assert_eq!(
            generate(&r, 2),
            vec![date(2024, 1, 1), date(2025, 1, 1)],
        );
    }

    #[test]
    fn end_is_inclusive() {
        let r = rule(
            date(2024, 3, 1),
            Some(date(2024, 3, 15)),
            Recurrence::Daily { interval: interval(7) },
        );
        assert_eq!(
            generate(&r, 30),
            vec![date(2024, 3, 1), date(2024, 3, 8), date(2024, 3, 15)],
        );

        let r = rule(
            date(2024, 1, 1),
            Some(date(2024, 1, 1)),
            Recurrence::Weekly {
                interval: Interval::ONE,
                days: days(&[Monday]),
            },
        );
        assert_eq!(generate(&r, 30), vec![date(2024, 1, 1)]);

        // The end date may fall before the first monthly occurrence.
        let r = rule(
            date(2024, 1, 1),
            Some(date(2024, 1, 31)),
            Recurrence::Monthly { interval: Interval::ONE, day: None },
        );
        assert_eq!(generate(&r, 30), vec![]);
    }

    #[test]
    fn cap_bounds_length() {
        let r = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Weekly {
                interval: Interval::ONE,
                days: Sunday.cycle_forward().take(7).collect(),
            },
        );
        for cap in [0, 1, 7, 30, 100] {
            assert_eq!(generate(&r, cap).len(), cap);
        }
    }

    #[test]
    fn out_of_range_ends_sequence() {
        let r = rule(
            date(9999, 12, 30),
            None,
            Recurrence::Daily { interval: Interval::ONE },
        );
        assert_eq!(
            generate(&r, 5),
            vec![date(9999, 12, 30), date(9999, 12, 31)],
        );

        let r = rule(
            date(9999, 10, 1),
            None,
            Recurrence::Monthly { interval: Interval::ONE, day: None },
        );
        assert_eq!(
            generate(&r, 5),
            vec![date(9999, 11, 1), date(9999, 12, 1)],
        );

        let r = rule(
            date(9998, 1, 1),
            None,
            Recurrence::Yearly {
                interval: interval(i64::from(i32::MAX)),
                day: None,
            },
        );
        assert_eq!(generate(&r, 5), vec![date(9998, 1, 1)]);
    }

    #[test]
    fn sequences_are_sorted_and_deterministic() {
        let rules = [
            rule(
                date(2024, 1, 31),
                None,
                Recurrence::Monthly { interval: interval(1), day: day(31) },
            ),
            rule(
                date(2023, 5, 5),
                Some(date(2026, 1, 1)),
                Recurrence::Weekly {
                    interval: Interval::ONE,
                    days: days(&[Tuesday, Saturday, Sunday]),
                },
            ),
            rule(
                date(2000, 2, 29),
                None,
                Recurrence::Yearly { interval: interval(1), day: day(29) },
            ),
        ];
        for r in rules.iter() {
            let dates = generate(r, 50);
            assert!(dates.windows(2).all(|w| w[0] <= w[1]), "{r:?}");
            assert_eq!(dates, generate(r, 50));
        }
    }

    #[test]
    fn iterator_is_lazy_and_fused() {
        let r = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Daily { interval: Interval::ONE },
        );
        let mut it = r.occurrences(2);
        assert_eq!(it.next(), Some(date(2024, 1, 1)));
        assert_eq!(it.next(), Some(date(2024, 1, 2)));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn preview_membership() {
        let r = rule(
            date(2024, 1, 1),
            None,
            Recurrence::Monthly { interval: Interval::ONE, day: day(31) },
        );
        let preview = r.preview(3);
        assert_eq!(preview.len(), 3);
        assert!(!preview.is_empty());
        assert!(preview.contains(date(2024, 2, 29)));
        assert!(preview.contains(date(2024, 4, 30)));
        assert!(!preview.contains(date(2024, 1, 31)));
        assert!(!preview.contains(date(2024, 5, 31)));

        // Only the calendar day matters, not the time.
        let zdt = date(2024, 3, 31).at(23, 59, 0, 0).in_tz("UTC").unwrap();
        assert!(preview.contains(zdt.date()));

        let empty = Preview::default();
        assert!(empty.is_empty());
        assert!(!empty.contains(date(2024, 2, 29)));
    }
}
