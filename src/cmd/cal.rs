use std::io::Write;

use jiff::civil;

use crate::{
    args::{self, Configurable, Usage, rule::RuleArgs},
    date,
    generate::Preview,
    style::Theme,
};

const USAGE: &'static str = r#"
Print month calendars with the occurrences of a recurrence rule marked.

Calendars begin with the month containing the start date of the rule. Each
day that is an occurrence of the rule is followed by a `*`. When printing to
a terminal, occurrences are also highlighted.

Only the first `-c/--cap` occurrences (30 by default) are marked.

USAGE:
    cadence cal <type> [<start>]
    cadence cal -r <path> [<type> [<start>]]

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Show every Monday and Friday in January 2024:

        $ cadence cal weekly -w mon,fri 2024-01-01
        January 2024
        Su  Mo  Tu  We  Th  Fr  Sa
             1*  2   3   4   5*  6
         7   8*  9  10  11  12* 13
        14  15* 16  17  18  19* 20
        21  22* 23  24  25  26* 27
        28  29* 30  31

    %snip-start%

    Show the next three months of a rule falling on the 31st, which is moved
    to the last day of shorter months:

        $ cadence cal monthly -d31 -m3 2024-02-01
        February 2024
        Su  Mo  Tu  We  Th  Fr  Sa
                         1   2   3
         4   5   6   7   8   9  10
        11  12  13  14  15  16  17
        18  19  20  21  22  23  24
        25  26  27  28  29

        March 2024
        Su  Mo  Tu  We  Th  Fr  Sa
                             1   2
         3   4   5   6   7   8   9
        10  11  12  13  14  15  16
        17  18  19  20  21  22  23
        24  25  26  27  28  29  30
        31*

        April 2024
        Su  Mo  Tu  We  Th  Fr  Sa
             1   2   3   4   5   6
         7   8   9  10  11  12  13
        14  15  16  17  18  19  20
        21  22  23  24  25  26  27
        28  29  30*

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

/// The weekday labels, aligned with the day cells below them.
const HEADER: &str = "Su  Mo  Tu  We  Th  Fr  Sa";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut rule_args = RuleArgs::default();
    args::configure(p, USAGE, &mut [&mut config, &mut rule_args])?;

    let rule = rule_args.rule()?;
    let preview = rule.preview(rule_args.cap());
    log::debug!(
        "marking {len} occurrences of {kind} rule",
        len = preview.len(),
        kind = rule.kind(),
    );
    let mut wtr = std::io::stdout().lock();
    for i in 0..config.months() {
        let Some(first) = date::add_months_clamped(rule.start(), i, 1) else {
            log::debug!("stopping after {i} months since dates ran out");
            break;
        };
        if i > 0 {
            writeln!(wtr)?;
        }
        write_month(&mut wtr, first, &preview)?;
    }
    Ok(())
}

/// Writes the calendar for the month beginning with `first`.
fn write_month<W: Write>(
    mut wtr: W,
    first: civil::Date,
    preview: &Preview,
) -> anyhow::Result<()> {
    let theme = Theme::stdout();
    writeln!(wtr, "{}", first.strftime("%B %Y"))?;
    writeln!(wtr, "{HEADER}")?;

    let blank = usize::try_from(first.weekday().to_sunday_zero_offset())?;
    let mut cells: Vec<String> = vec!["   ".to_string(); blank];
    for day in 1..=first.days_in_month() {
        let date = civil::Date::new(first.year(), first.month(), day)?;
        let cell = if preview.contains(date) {
            format!("{}*", theme.occurrence(format!("{day:>2}")))
        } else {
            format!("{day:>2} ")
        };
        cells.push(cell);
        if cells.len() == 7 {
            write_week(&mut wtr, &cells)?;
            cells.clear();
        }
    }
    if !cells.is_empty() {
        write_week(&mut wtr, &cells)?;
    }
    Ok(())
}

fn write_week<W: Write>(mut wtr: W, cells: &[String]) -> anyhow::Result<()> {
    writeln!(wtr, "{}", cells.join(" ").trim_end())?;
    Ok(())
}

#[derive(Debug, Default)]
struct Config {
    months: Option<i64>,
}

impl Config {
    fn months(&self) -> i64 {
        self.months.unwrap_or(1)
    }
}

impl Configurable for Config {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        use lexopt::Arg::*;

        match *arg {
            Short('m') | Long("months") => {
                let months: i64 = args::parse(p, "-m/--months")?;
                anyhow::ensure!(
                    months >= 1,
                    "-m/--months must be at least 1, but got {months}",
                );
                self.months = Some(months);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const MONTHS: Usage = Usage::flag(
            "-m/--months <number>",
            "The number of months to print.",
            r#"
The number of months to print, beginning with the month containing the start
date. The default is `1`.
"#,
        );
        &[MONTHS]
    }
}
