//! Heat-rejection entry point: CLI wiring and config-driven pipeline runs.

use std::path::{self, Path, PathBuf};
use std::process;

use heat_rejection::cli::{self, Command};
use heat_rejection::config::RunConfig;
use heat_rejection::logging::init_tracing;
use heat_rejection::runner::{run, run_groups_helper};

/// Exit code when some groups failed but the others were written.
const EXIT_PARTIAL: i32 = 2;

fn absolute(p: &Path) -> PathBuf {
    path::absolute(p).unwrap_or_else(|_| p.to_path_buf())
}

fn main() {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };
    if opts.help {
        cli::print_usage();
        process::exit(0);
    }

    init_tracing();

    let mut config = match opts.config {
        Some(ref path) => match RunConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => RunConfig::default(),
    };

    // CLI overrides; paths given on the command line are relative to the cwd
    if let Some(ref dir) = opts.scenario {
        config.paths.scenario = absolute(dir);
    }
    if let Some(ref file) = opts.groups {
        config.paths.group_file = absolute(file);
    }
    if let Some(ref dir) = opts.output {
        config.paths.output_dir = absolute(dir);
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    match opts.command {
        Command::GroupsHelper => match run_groups_helper(&config) {
            Ok(assignment) => {
                println!(
                    "Wrote {} groups covering {} buildings to {}",
                    assignment.len(),
                    assignment.building_count(),
                    config.group_file().display()
                );
            }
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        },
        Command::Run => {
            let report = match run(&config) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            };

            println!("{report}");

            if let Some(ref path) = opts.report {
                if let Err(e) = report.write_json(path) {
                    eprintln!("error: failed to write report: {e}");
                    process::exit(1);
                }
                eprintln!("Report written to {}", path.display());
            }

            if !report.is_success() {
                process::exit(EXIT_PARTIAL);
            }
        }
    }
}
