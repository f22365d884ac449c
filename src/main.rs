use std::{env, io::Write, process::ExitCode, sync::LazyLock};

use {
    anyhow::Context,
    jiff::{Zoned, civil, tz::TimeZone},
};

mod args;
mod cmd;
mod date;
mod draft;
mod generate;
mod logger;
mod parse;
mod record;
mod rule;
mod style;

static TZ: LazyLock<TimeZone> = LazyLock::new(|| TimeZone::system());

static TODAY: LazyLock<civil::Date> = LazyLock::new(|| {
    match read_env_cadence_today() {
        Ok(Some(date)) => {
            log::trace!(
                "setting current date to `{date}` from `CADENCE_TODAY` \
                 environment variable",
            );
            date
        }
        Ok(None) => {
            let today = Zoned::now().with_time_zone(TZ.clone()).date();
            log::trace!(
                "`CADENCE_TODAY` environment variable not set, using \
                 current date `{today}`",
            );
            today
        }
        Err(err) => {
            let today = Zoned::now().with_time_zone(TZ.clone()).date();
            log::warn!(
                "reading `CADENCE_TODAY` failed, using current date \
                 `{today}`: {err:#}",
            );
            today
        }
    }
});

static CAP: LazyLock<usize> = LazyLock::new(|| match read_env_cadence_cap() {
    Ok(Some(cap)) => {
        log::trace!(
            "setting default cap to `{cap}` from `CADENCE_CAP` \
             environment variable",
        );
        cap
    }
    Ok(None) => generate::DEFAULT_CAP,
    Err(err) => {
        log::warn!(
            "reading `CADENCE_CAP` failed, using default cap \
             `{cap}`: {err:#}",
            cap = generate::DEFAULT_CAP,
        );
        generate::DEFAULT_CAP
    }
});

/// Every so often, again.
fn main() -> ExitCode {
    let err = match run() {
        Ok(code) => return code,
        Err(err) => err,
    };
    if let Some(help) = err.root_cause().downcast_ref::<args::Help>() {
        writeln!(&mut std::io::stdout(), "{help}").unwrap();
        return ExitCode::SUCCESS;
    }
    if let Some(version) = err.root_cause().downcast_ref::<args::Version>() {
        writeln!(&mut std::io::stdout(), "{version}").unwrap();
        return ExitCode::SUCCESS;
    }
    // A closed pipe on stdout (e.g., `cadence seq daily | head -n1`) is not
    // a failure. Rust ignores SIGPIPE, so we see it as an I/O error instead.
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<std::io::Error>() {
            if err.kind() == std::io::ErrorKind::BrokenPipe {
                return ExitCode::from(0);
            }
        }
        // `serde_json` hides the `std::io::Error` it hit while writing a
        // record, so ask it for the kind explicitly.
        if let Some(err) = cause.downcast_ref::<serde_json::Error>() {
            if let Some(kind) = err.io_error_kind() {
                if kind == std::io::ErrorKind::BrokenPipe {
                    return ExitCode::from(0);
                }
            }
        }
    }
    if std::env::var("RUST_BACKTRACE").map_or(false, |v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        writeln!(&mut std::io::stderr(), "{:?}", err).unwrap();
    } else {
        writeln!(&mut std::io::stderr(), "{:#}", err).unwrap();
    }
    ExitCode::from(1)
}

fn run() -> anyhow::Result<ExitCode> {
    let rustlog = env::var("CADENCE_LOG").unwrap_or_else(|_| String::new());
    let level = match &*rustlog {
        "" | "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        unk => anyhow::bail!("unrecognized log level '{}'", unk),
    };
    log::set_max_level(level);
    // The logger starts out in UTC so that `TimeZone::system()` can emit
    // log messages of its own while `TZ` is being initialized.
    let logger = logger::Logger::init()?;
    logger.set_time_zone(TZ.clone());
    cmd::run(&mut lexopt::Parser::from_env())?;
    Ok(ExitCode::SUCCESS)
}

fn read_env_cadence_today() -> anyhow::Result<Option<civil::Date>> {
    let Some(val) = std::env::var_os("CADENCE_TODAY") else {
        return Ok(None);
    };
    let Some(val) = val.to_str() else {
        anyhow::bail!(
            "`CADENCE_TODAY` environment variable is not valid UTF-8: {val:?}"
        )
    };
    val.parse::<civil::Date>()
        .context(
            "`CADENCE_TODAY` environment variable is not a valid \
             ISO 8601 date",
        )
        .map(Some)
}

fn read_env_cadence_cap() -> anyhow::Result<Option<usize>> {
    std::env::var_os("CADENCE_CAP").map(|val| parse_cap(&val)).transpose()
}

fn parse_cap(val: &std::ffi::OsStr) -> anyhow::Result<usize> {
    let Some(val) = val.to_str() else {
        anyhow::bail!(
            "`CADENCE_CAP` environment variable is not valid UTF-8: {val:?}"
        )
    };
    val.parse::<usize>()
        .context("failed to parse `CADENCE_CAP` environment variable")
}
