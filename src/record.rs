use jiff::civil;

use crate::{
    draft::RuleDraft,
    rule::{RecurrenceRule, RuleError, weekday_index},
};

/// A recurrence rule as it is handed to (and read back from) storage.
///
/// The fields mirror a rule one-to-one, but nothing about them is checked
/// until [`RuleRecord::validate`] is called. In particular, the recurrence
/// type is a plain string so that an unknown type is reported as a
/// [`RuleError`] instead of a decoding error.
///
/// Optional fields default to their empty values when missing, and the
/// interval defaults to `1`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    pub start_date: civil::Date,
    #[serde(default)]
    pub end_date: Option<civil::Date>,
    pub recurrence_type: String,
    #[serde(default = "default_interval")]
    pub recurrence_interval: i64,
    #[serde(default)]
    pub days_of_week: Vec<i64>,
    #[serde(default)]
    pub nth_day_of_month: Option<i64>,
}

impl RuleRecord {
    /// Checks every field of this record and builds a rule from it.
    ///
    /// Fields that don't apply to the record's type are still checked, but
    /// are otherwise ignored.
    pub fn validate(&self) -> Result<RecurrenceRule, RuleError> {
        RuleDraft::from_record(self)?.snapshot()
    }
}

impl TryFrom<&RuleRecord> for RecurrenceRule {
    type Error = RuleError;

    fn try_from(record: &RuleRecord) -> Result<RecurrenceRule, RuleError> {
        record.validate()
    }
}

impl From<&RecurrenceRule> for RuleRecord {
    fn from(rule: &RecurrenceRule) -> RuleRecord {
        let recurrence = rule.recurrence();
        RuleRecord {
            start_date: rule.start(),
            end_date: rule.end(),
            recurrence_type: rule.kind().as_str().to_string(),
            recurrence_interval: i64::from(rule.interval().get()),
            days_of_week: recurrence
                .weekdays()
                .map(|set| set.iter().map(weekday_index).collect())
                .unwrap_or_default(),
            nth_day_of_month: recurrence
                .day_of_month()
                .map(|day| i64::from(day.get())),
        }
    }
}

fn default_interval() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use crate::rule::{Field, Kind};

    use super::*;

    fn decode(json: &str) -> RuleRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn decode_with_defaults() {
        let record = decode(
            r#"{"startDate": "2024-01-01", "recurrenceType": "monthly"}"#,
        );
        assert_eq!(record.end_date, None);
        assert_eq!(record.recurrence_interval, 1);
        assert!(record.days_of_week.is_empty());
        assert_eq!(record.nth_day_of_month, None);

        let rule = record.validate().unwrap();
        assert_eq!(rule.kind(), Kind::Monthly);
        assert_eq!(rule.start(), date(2024, 1, 1));
    }

    #[test]
    fn validate_weekly() {
        let record = decode(
            r#"{
                "startDate": "2024-01-01",
                "endDate": "2024-06-30",
                "recurrenceType": "weekly",
                "recurrenceInterval": 2,
                "daysOfWeek": [5, 1],
                "nthDayOfMonth": 31
            }"#,
        );
        let rule = RecurrenceRule::try_from(&record).unwrap();
        assert_eq!(rule.kind(), Kind::Weekly);
        assert_eq!(rule.end(), Some(date(2024, 6, 30)));
        assert_eq!(rule.interval().get(), 2);
        // The day of the month doesn't apply to weekly rules.
        assert_eq!(rule.recurrence().day_of_month(), None);

        // Going back to a record only keeps what applies, with the days in
        // order.
        let back = RuleRecord::from(&rule);
        assert_eq!(back.days_of_week, vec![1, 5]);
        assert_eq!(back.nth_day_of_month, None);
    }

    #[test]
    fn validate_errors() {
        let base = r#""startDate": "2024-01-01""#;
        let check = |rest: &str| -> RuleError {
            decode(&format!("{{{base}, {rest}}}")).validate().unwrap_err()
        };

        let err = check(r#""recurrenceType": "hourly""#);
        insta::assert_snapshot!(
            err,
            @"unrecognized recurrence type `hourly` (expected daily, weekly, monthly or yearly)",
        );

        let err =
            check(r#""recurrenceType": "daily", "recurrenceInterval": 0"#);
        assert_eq!(err.field(), Some(Field::Interval));

        let err = check(r#""recurrenceType": "weekly", "daysOfWeek": [7]"#);
        assert_eq!(err.field(), Some(Field::DayOfWeek));

        let err =
            check(r#""recurrenceType": "weekly", "daysOfWeek": [1, 3, 1]"#);
        insta::assert_snapshot!(
            err,
            @"invalid day of the week value `1` (must not be repeated)",
        );

        // Irrelevant fields are still checked.
        let err = check(r#""recurrenceType": "daily", "nthDayOfMonth": 0"#);
        assert_eq!(err.field(), Some(Field::DayOfMonth));

        let err =
            check(r#""recurrenceType": "daily", "endDate": "2023-12-31""#);
        assert_eq!(err.field(), Some(Field::EndDate));
    }

    #[test]
    fn encode() {
        let record = decode(
            r#"{
                "startDate": "2024-01-01",
                "recurrenceType": "Month",
                "daysOfWeek": [2],
                "nthDayOfMonth": 31
            }"#,
        );
        let rule = record.validate().unwrap();
        let json = serde_json::to_string(&RuleRecord::from(&rule)).unwrap();
        insta::assert_snapshot!(
            json,
            @r#"{"startDate":"2024-01-01","endDate":null,"recurrenceType":"monthly","recurrenceInterval":1,"daysOfWeek":[],"nthDayOfMonth":31}"#,
        );
    }
}
