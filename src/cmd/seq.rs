use std::io::Write;

use crate::args::{self, rule::RuleArgs};

const USAGE: &'static str = r#"
Print the occurrences of a recurrence rule, one date per line.

Dates are printed in chronological order, beginning from the start date of
the rule. If a start date is not given, then the current date is used.

At most `-c/--cap` dates are printed (30 by default). Fewer are printed when
the rule has an end date, or when a weekly rule runs out of matching days.

USAGE:
    cadence seq <type> [<start>]
    cadence seq -r <path> [<type> [<start>]]

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Print the first four Mondays and Fridays of 2024:

        $ cadence seq weekly -w mon,fri -c4 2024-01-01
        2024-01-01
        2024-01-05
        2024-01-08
        2024-01-12

    %snip-start%

    Print the last day of the month for three months. Months that are too
    short for the day given use their last day instead:

        $ cadence seq monthly -d31 -c3 2024-01-01
        2024-02-29
        2024-03-31
        2024-04-30

    Print every week, up to and including an end date:

        $ cadence seq daily -i7 -e 2024-03-15 2024-03-01
        2024-03-01
        2024-03-08
        2024-03-15

    Yearly rules always fall in January, even when that's before the start
    date:

        $ cadence seq yearly -i2 -d15 -c3 2024-06-01
        2024-01-15
        2026-01-15
        2028-01-15

    Print the occurrences of a saved rule, but starting from today:

        $ cadence seq -r rule.json weekly today

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
    for date in rule.occurrences(config.cap()) {
        writeln!(wtr, "{date}")?;
    }
    Ok(())
}
