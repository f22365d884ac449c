use std::{ffi::OsStr, path::Path};


/// The current date in every test. It's a Saturday.
const TODAY: &str = "2024-07-20";

/// A temporary directory for tests that need files, like rule records.
#[derive(Debug)]
struct TempDir(tempfile::TempDir);

impl TempDir {
    fn new() -> TempDir {
        TempDir(tempfile::tempdir().unwrap())
    }

    /// Create a new `cadence` command, with the given arguments, whose CWD
    /// is this directory.
    fn cadence<T: AsRef<OsStr>>(
        &self,
        args: impl IntoIterator<Item = T>,
    ) -> crate::command::Command {
        cadence(args).current_dir(self.0.path())
    }

    /// Create a new file in this directory with the given relative path and
    /// contents.
    fn create(
        &self,
        relative_path: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) {
        let path = self.0.path().join(relative_path.as_ref());
        std::fs::write(&path, contents).unwrap();
    }
}

/// Return a command for the `cadence` binary and no arguments.
fn cadence_bare() -> crate::command::Command {
    crate::command::bin("cadence")
        .env("TZ", "America/New_York")
        .env("CADENCE_TODAY", TODAY)
}

/// Return a command for the `cadence` binary with the given arguments
/// appended to it.
fn cadence<T: AsRef<OsStr>>(
    args: impl IntoIterator<Item = T>,
) -> crate::command::Command {
    cadence_bare().args(args)
}

#[test]
fn no_args() {
    crate::command::assert_cmd_snapshot!(
        cadence_bare(),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    Preview the dates of a repeating schedule.

    USAGE:
        cadence <command> ...

    COMMANDS:
        cal   Print month calendars with the occurrences of a rule marked
        rule  Print a rule as a JSON record
        seq   Print the occurrences of a rule, one per line
    ",
    );
}

#[test]
fn version() {
    crate::command::assert_cmd_snapshot!(
        cadence(["--version"]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    Cadence 0.1.0

    ----- stderr -----
    ",
    );
}

#[test]
fn unknown_command() {
    crate::command::assert_cmd_snapshot!(
        cadence(["frob"]),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    unrecognized command 'frob'
    ",
    );
}

#[test]
fn invalid_log_level() {
    crate::command::assert_cmd_snapshot!(
        cadence(["seq", "daily"]).env("CADENCE_LOG", "loud"),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    unrecognized log level 'loud'
    ",
    );
}
