use std::io::Write;

use crate::{
    args::{self, rule::RuleArgs},
    record::RuleRecord,
};

const USAGE: &'static str = r#"
Print a recurrence rule as a JSON record.

The rule is validated first, so this command fails on rules that `cadence seq`
would reject. Only the fields that apply to the type of the rule are
included. The others are empty.

The record printed can be given back to any command with `-r/--record`.

USAGE:
    cadence rule <type> [<start>]
    cadence rule -r <path> [<type> [<start>]]

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Save a rule for every work day and use it later:

        $ cadence rule weekly -w mon..fri 2024-01-01 > workdays.json
        $ cadence seq -r workdays.json -c3
        2024-01-01
        2024-01-02
        2024-01-03

    %snip-start%

    Change the type of a saved rule. Fields that no longer apply are
    dropped:

        $ cadence rule -r workdays.json monthly -d 15
        {
          "startDate": "2024-01-01",
          "endDate": null,
          "recurrenceType": "monthly",
          "recurrenceInterval": 1,
          "daysOfWeek": [],
          "nthDayOfMonth": 15
        }

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = RuleArgs::default();
    args::configure(p, USAGE, &mut [&mut config])?;

    let rule = config.rule()?;
    let mut wtr = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut wtr, &RuleRecord::from(&rule))?;
    writeln!(wtr)?;
    Ok(())
}
