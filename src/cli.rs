use std::env;
use std::path::PathBuf;

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Aggregate every group and write its series.
    Run,
    /// Write an auto-derived group file.
    GroupsHelper,
}

#[derive(Debug)]
pub struct CliOptions {
    pub command: Command,
    pub config: Option<PathBuf>,
    pub scenario: Option<PathBuf>,
    pub groups: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub help: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let (command, rest) = match args.first().map(String::as_str) {
        Some("run") => (Command::Run, &args[1..]),
        Some("groups-helper") => (Command::GroupsHelper, &args[1..]),
        _ => (Command::Run, &args[..]),
    };
    parse_options(command, rest)
}

fn set_once(slot: &mut Option<PathBuf>, flag: &str, value: &str) -> Result<(), String> {
    if slot.replace(PathBuf::from(value)).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

fn parse_options(command: Command, args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions {
        command,
        config: None,
        scenario: None,
        groups: None,
        output: None,
        report: None,
        help: false,
    };

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file)")?;
                set_once(&mut opts.config, flag, path)?;
            }
            "--scenario" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --scenario (expected a directory)")?;
                set_once(&mut opts.scenario, flag, path)?;
            }
            "--groups" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --groups (expected a CSV file)")?;
                set_once(&mut opts.groups, flag, path)?;
            }
            "--output" if command == Command::Run => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --output (expected a directory)")?;
                set_once(&mut opts.output, flag, path)?;
            }
            "--report" if command == Command::Run => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --report (expected a JSON file path)")?;
                set_once(&mut opts.report, flag, path)?;
            }
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("heat-rejection: hourly heat rejected to the environment per building group");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  heat-rejection [run] [--config <toml>] [--scenario <dir>] [--groups <csv>] \
         [--output <dir>] [--report <json>]"
    );
    eprintln!("  heat-rejection groups-helper [--config <toml>] [--scenario <dir>] [--groups <csv>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <toml>    Load settings from a TOML file");
    eprintln!("  --scenario <dir>   Scenario root; relative paths resolve against it");
    eprintln!("  --groups <csv>     Group file to read (run) or write (groups-helper)");
    eprintln!("  --output <dir>     Directory for per-group CSV files");
    eprintln!("  --report <json>    Write a JSON run report");
    eprintln!("  --help             Show this help message");
    eprintln!();
    eprintln!("Log level: HEAT_REJECTION_LOG (default heat_rejection=info)");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_run_without_subcommand() {
        let opts = parse_args_from(args(&["--scenario", "/data/s1"])).expect("parse should succeed");
        assert_eq!(opts.command, Command::Run);
        assert_eq!(
            opts.scenario.as_deref().and_then(|p| p.to_str()),
            Some("/data/s1")
        );
        assert!(opts.config.is_none());
    }

    #[test]
    fn supports_run_with_report() {
        let opts = parse_args_from(args(&[
            "run", "--output", "out", "--report", "report.json",
        ]))
        .expect("parse should succeed");
        assert_eq!(opts.command, Command::Run);
        assert_eq!(opts.output, Some(PathBuf::from("out")));
        assert_eq!(opts.report, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn supports_groups_helper() {
        let opts = parse_args_from(args(&["groups-helper", "--groups", "g.csv"]))
            .expect("parse should succeed");
        assert_eq!(opts.command, Command::GroupsHelper);
        assert_eq!(opts.groups, Some(PathBuf::from("g.csv")));
    }

    #[test]
    fn groups_helper_rejects_run_only_flags() {
        let err = parse_args_from(args(&["groups-helper", "--report", "r.json"]));
        assert!(err.is_err());
    }

    #[test]
    fn repeated_flag_is_an_error() {
        let err = parse_args_from(args(&["--config", "a.toml", "--config", "b.toml"]));
        assert_eq!(
            err.err().as_deref(),
            Some("--config provided more than once")
        );
    }

    #[test]
    fn missing_value_is_an_error() {
        assert!(parse_args_from(args(&["--output"])).is_err());
    }

    #[test]
    fn help_flag_is_recognised() {
        let opts = parse_args_from(args(&["-h"])).expect("parse should succeed");
        assert!(opts.help);
    }
}
