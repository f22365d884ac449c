use std::{fmt::Display, io::IsTerminal, sync::LazyLock};

use anstyle::{AnsiColor, Color, Style};

/// Timestamps in log lines.
const HIGHLIGHT: Style =
    Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Magenta)));

/// Days in a calendar that are occurrences of a rule.
const OCCURRENCE: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::BrightWhite)))
    .bg_color(Some(Color::Ansi(AnsiColor::Blue)));

/// Whether output to a particular stream gets styled.
///
/// Styling is off when the stream isn't a terminal, when `NO_COLOR` is set
/// to anything non-empty or when `TERM=dumb`.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    enabled: bool,
}

impl Theme {
    pub fn stdout() -> Theme {
        static ENABLED: LazyLock<bool> = LazyLock::new(|| {
            std::io::stdout().is_terminal() && colors_allowed()
        });
        Theme { enabled: *ENABLED }
    }

    pub fn stderr() -> Theme {
        static ENABLED: LazyLock<bool> = LazyLock::new(|| {
            std::io::stderr().is_terminal() && colors_allowed()
        });
        Theme { enabled: *ENABLED }
    }

    pub fn highlight<T: Display>(&self, data: T) -> Styled<T> {
        self.paint(HIGHLIGHT, data)
    }

    pub fn occurrence<T: Display>(&self, data: T) -> Styled<T> {
        self.paint(OCCURRENCE, data)
    }

    fn paint<T: Display>(&self, style: Style, data: T) -> Styled<T> {
        Styled { data, style: self.enabled.then_some(style) }
    }
}

/// Data that renders with its style, if it has one.
#[derive(Clone, Debug)]
pub struct Styled<T> {
    data: T,
    style: Option<Style>,
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.style {
            None => self.data.fmt(f),
            Some(style) => write!(f, "{style}{}{style:#}", self.data),
        }
    }
}

fn colors_allowed() -> bool {
    let no_color =
        std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    let dumb = std::env::var_os("TERM").is_some_and(|v| v == "dumb");
    !no_color && !dumb
}
