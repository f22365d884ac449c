mod cal;
mod rule;
mod seq;

const USAGE: &'static str = "\
Preview the dates of a repeating schedule.

USAGE:
    cadence <command> ...

COMMANDS:
    cal   Print month calendars with the occurrences of a rule marked
    rule  Print a rule as a JSON record
    seq   Print the occurrences of a rule, one per line
";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let cmd = crate::args::next_as_command(USAGE, p)?;
    match &*cmd {
        "cal" => cal::run(p),
        "rule" => rule::run(p),
        "seq" => seq::run(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}
