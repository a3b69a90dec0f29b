use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::schedule::Shift;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "turni",
    version,
    about = "Turni: weekly shift calendar and hour tracker",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "turnirc", global = true)]
    pub turnirc: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the week containing DATE (default: today).
    Week(DateArg),
    /// Show the month grid containing DATE, or jump with --month/--year.
    Month(MonthArgs),
    /// Show the shifts of a single day.
    Day { date: String },
    /// Print the label of the week containing DATE.
    Range(DateArg),
    /// Print the worked hours of the week containing DATE.
    Hours(DateArg),
    /// Print a one-line summary of the week containing DATE.
    Summary(DateArg),
    /// Import an extraction result (JSON) into the history.
    Import { file: PathBuf },
    /// List saved extraction results.
    History,
    /// Delete a saved extraction result.
    Delete { id: i64 },
    /// Edit one day of a saved extraction result.
    SetDay(SetDayArgs),
    /// Print a saved extraction result as JSON.
    Export { id: i64 },
    /// Show the effective configuration.
    Config,
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DateArg {
    pub date: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MonthArgs {
    pub date: Option<String>,

    /// 1-12; the year defaults to that of DATE.
    #[arg(long = "month", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[arg(long = "year", value_parser = clap::value_parser!(i32).range(1..=9999))]
    pub year: Option<i32>,
}

#[derive(Args, Debug, Clone)]
pub struct SetDayArgs {
    pub date: String,

    #[arg(long = "entry")]
    pub entry: i64,

    #[arg(long = "rest", conflicts_with_all = ["empty", "shifts"])]
    pub rest: bool,

    #[arg(long = "empty", conflicts_with = "shifts")]
    pub empty: bool,

    /// Repeatable, e.g. --shift 08:00-12:00 --shift 13:00-17:00.
    #[arg(
        long = "shift",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Shift>()),
        action = ArgAction::Append
    )]
    pub shifts: Vec<Shift>,

    #[arg(long = "uncertain")]
    pub uncertain: bool,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` (or `rc.key:value`) overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use clap::Parser;

    use super::{Command, GlobalCli, preprocess_args};

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn strips_positional_overrides() {
        let pre = preprocess_args(&args(&["turni", "rc.locale=en", "week", "rc.color:off"]))
            .expect("preprocess");
        assert_eq!(pre.cleaned_args, args(&["turni", "week"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.locale".to_string(), "en".to_string()),
                ("rc.color".to_string(), "off".to_string()),
            ]
        );
    }

    #[test]
    fn parses_set_day_shifts() {
        let cli = GlobalCli::try_parse_from([
            "turni",
            "set-day",
            "2024-10-28",
            "--entry",
            "12",
            "--shift",
            "08:00-12:00",
            "--shift",
            "13:00-17:00",
        ])
        .expect("parse");
        let Some(Command::SetDay(set)) = cli.command else {
            panic!("expected set-day");
        };
        assert_eq!(set.entry, 12);
        assert_eq!(set.shifts.len(), 2);
        assert!(!set.rest);
    }

    #[test]
    fn rest_conflicts_with_shifts() {
        let parsed = GlobalCli::try_parse_from([
            "turni",
            "set-day",
            "2024-10-28",
            "--entry",
            "1",
            "--rest",
            "--shift",
            "08:00-12:00",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn month_jump_flags() {
        let cli = GlobalCli::try_parse_from(["turni", "month", "--month", "2", "--year", "2025"])
            .expect("parse");
        let Some(Command::Month(month)) = cli.command else {
            panic!("expected month");
        };
        assert_eq!(month.month, Some(2));
        assert_eq!(month.year, Some(2025));
        assert_eq!(month.date, None);

        assert!(GlobalCli::try_parse_from(["turni", "month", "--month", "13"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = GlobalCli::try_parse_from(["turni", "week", "tomorrow", "-vv", "--rc", "locale=en"])
            .expect("parse");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides[0].key, "locale");
        let Some(Command::Week(arg)) = cli.command else {
            panic!("expected week");
        };
        assert_eq!(arg.date.as_deref(), Some("tomorrow"));
    }
}
