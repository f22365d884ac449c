use std::{
    fmt::{Debug, Display, Write},
    str::FromStr,
    sync::LazyLock,
};

use {
    anyhow::Context,
    lexopt::{Arg, Parser, ValueExt},
    regex::{Captures, Regex},
};

pub mod flags;
pub mod rule;

/// Something that claims command line arguments.
///
/// A command hands every argument it sees to each of its targets in turn.
/// The first target to return `true` from `configure` owns the argument.
pub trait Configurable: Debug {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool>;

    /// Docs for the flags and positional arguments this target claims.
    fn usage(&self) -> &[Usage] {
        &[]
    }
}

/// Feeds every remaining argument in `p` to `targets`.
///
/// `-h` and `--help` are handled here by rendering `usage` (with `%args%`
/// and `%flags%` filled in from the targets) into a `Help` error.
pub fn configure(
    p: &mut Parser,
    usage: &str,
    targets: &mut [&mut dyn Configurable],
) -> anyhow::Result<()> {
    while let Some(arg) = p.next()? {
        let mut name = String::new();
        let mut arg = detach(arg, &mut name);
        if let Arg::Short('h') | Arg::Long("help") = arg {
            let verbose = matches!(arg, Arg::Long(_));
            return Err(Help::render(usage, targets, verbose).into());
        }
        let mut claimed = false;
        for target in targets.iter_mut() {
            claimed = target.configure(p, &mut arg)?;
            if claimed {
                break;
            }
        }
        if !claimed {
            return Err(arg.unexpected().into());
        }
    }
    Ok(())
}

/// Copies a long flag name out of the parser's buffer so that the parser
/// can be borrowed again while `arg` is alive.
fn detach<'n>(arg: Arg<'_>, name: &'n mut String) -> Arg<'n> {
    match arg {
        Arg::Short(c) => Arg::Short(c),
        Arg::Long(long) => {
            name.push_str(long);
            Arg::Long(name.as_str())
        }
        Arg::Value(value) => Arg::Value(value),
    }
}

/// Reads the command name at the front of `p`.
///
/// With no arguments at all, the top-level usage is returned as an error.
pub fn next_as_command(usage: &str, p: &mut Parser) -> anyhow::Result<String> {
    let usage = usage.trim();
    match p.next()? {
        None => anyhow::bail!("{usage}"),
        Some(Arg::Value(cmd)) => Ok(cmd.string()?),
        Some(Arg::Short('h') | Arg::Long("help")) => {
            Err(Help(usage.to_string()).into())
        }
        Some(Arg::Long("version")) => Err(Version.into()),
        Some(arg) => Err(arg.unexpected().into()),
    }
}

/// Parses the value of the flag `flag_name`, naming the flag in any error.
pub fn parse<T>(p: &mut Parser, flag_name: &'static str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: Display + Debug + Send + Sync + 'static,
{
    let value = p.value().context(flag_name)?;
    let value = value
        .into_string()
        .map_err(lexopt::Error::NonUnicodeValue)
        .context(flag_name)?;
    // `anyhow::Error` isn't a `std::error::Error`, so `FromStr` errors are
    // wrapped as plain messages.
    value.parse().map_err(|err| anyhow::Error::msg(err).context(flag_name))
}

/// Docs for one flag or positional argument.
#[derive(Clone, Copy, Debug)]
pub struct Usage {
    /// Flags are optional and listed under OPTIONS. Everything else is a
    /// positional argument.
    pub flag: bool,
    /// For example, `-i/--interval <number>`.
    pub format: &'static str,
    /// One line, shown by `-h`.
    pub short: &'static str,
    /// Paragraphs separated by blank lines, shown by `--help`.
    pub long: &'static str,
}

impl Usage {
    pub const fn flag(
        format: &'static str,
        short: &'static str,
        long: &'static str,
    ) -> Usage {
        Usage { flag: true, format, short, long }
    }

    pub const fn arg(
        format: &'static str,
        short: &'static str,
        long: &'static str,
    ) -> Usage {
        Usage { flag: false, format, short, long }
    }

    /// Flags are listed by their long name, ignoring the short one.
    fn sort_key(&self) -> &'static str {
        self.format.split_once("--").map_or(self.format, |(_, long)| long)
    }

    /// A two column table of formats and short descriptions.
    pub fn short(usages: &[Usage]) -> String {
        let width = usages.iter().map(|u| u.format.len()).max().unwrap_or(0);
        let mut out = String::new();
        for u in usages.iter() {
            let _ = writeln!(out, "    {:width$}  {}", u.format, u.short);
        }
        out
    }

    /// Each format followed by its long description, wrapped and indented
    /// beneath it.
    pub fn long(usages: &[Usage]) -> String {
        let wrap = textwrap::Options::new(79)
            .initial_indent("        ")
            .subsequent_indent("        ");
        let blocks: Vec<String> = usages
            .iter()
            .map(|u| {
                let paragraphs: Vec<String> = u
                    .long
                    .trim()
                    .split("\n\n")
                    .map(|para| {
                        textwrap::wrap(&para.replace('\n', " "), &wrap)
                            .join("\n")
                    })
                    .collect();
                format!("    {}\n{}\n", u.format, paragraphs.join("\n\n"))
            })
            .collect();
        blocks.join("\n")
    }
}

/// Removes `%snip-start%`/`%snip-end%` sections from a command's usage.
///
/// The short docs drop the sections entirely. The long docs keep their
/// contents and only drop the marker lines.
fn strip_snips(usage: &str, verbose: bool) -> String {
    static SNIP: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?ms)^\s*%snip-start%\s*$(.*?)^\s*%snip-end%\s*$")
            .unwrap()
    });
    SNIP.replace_all(usage, |caps: &Captures| {
        if verbose { caps[1].to_string() } else { String::new() }
    })
    .into_owned()
}

/// Help output, raised as an error so that `main` prints it to stdout and
/// exits successfully.
#[derive(Debug)]
pub struct Help(String);

impl Help {
    const USAGE: Usage = Usage::flag(
        "-h/--help",
        "Print help. Use --help for the complete docs.",
        r#"
Print help and exit.

-h prints one line for each argument and flag. --help prints everything,
including additional examples.
"#,
    );

    fn render(
        usage: &str,
        targets: &[&mut dyn Configurable],
        verbose: bool,
    ) -> Help {
        let mut flags = vec![Help::USAGE, Version::USAGE];
        let mut args = vec![];
        for target in targets.iter() {
            for u in target.usage() {
                if u.flag { flags.push(*u) } else { args.push(*u) }
            }
        }
        // Positional arguments stay in the order they're parsed.
        flags.sort_by_key(Usage::sort_key);
        let table = if verbose { Usage::long } else { Usage::short };
        let text = strip_snips(usage, verbose)
            .replace("%args%", &table(&args))
            .replace("%flags%", &table(&flags));
        Help(text.trim().to_string())
    }
}

impl Display for Help {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Help {}

/// `--version` output, raised as an error the same way as `Help`.
#[derive(Debug)]
pub struct Version;

impl Version {
    const USAGE: Usage = Usage::flag(
        "--version",
        "Print the version of Cadence.",
        "Print the version of Cadence and exit.",
    );
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let semver = option_env!("CARGO_PKG_VERSION").unwrap_or("N/A");
        match option_env!("CADENCE_BUILD_GIT_HASH") {
            None => write!(f, "Cadence {semver}"),
            Some(hash) => write!(f, "Cadence {semver} (rev {hash})"),
        }
    }
}

impl std::error::Error for Version {}
