//! `sweep`: expand search-space templates from the command line

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

mod commands;
mod logging;

use commands::ExpandOptions;
use logging::{init_tracing, level_for_verbosity, LogFormat};

fn template_arg() -> Arg {
    Arg::new("template")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Template file (.json, or .yaml/.yml)")
}

fn build_cli() -> Command {
    Command::new("sweep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Expand hierarchical search-space templates into concrete variants")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(value_parser!(LogFormat))
                .help("Log output format: text or json"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (RUST_LOG overrides)"),
        )
        .subcommand(
            Command::new("expand")
                .about("Print every variant as a JSON line")
                .arg(template_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Generator configuration file (JSON or YAML)"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducible sampling"),
                )
                .arg(
                    Arg::new("constant-grid")
                        .long("constant-grid")
                        .action(ArgAction::SetTrue)
                        .help("Sample domains once and reuse them across grid combinations"),
                )
                .arg(
                    Arg::new("max-passes")
                        .long("max-passes")
                        .value_parser(value_parser!(usize))
                        .help("Resolution passes before a dependency is declared unresolvable"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Stop after this many variants"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("List resolved, grid and domain paths")
                .arg(template_arg()),
        )
        .subcommand(
            Command::new("count")
                .about("Print the number of top-level grid combinations")
                .arg(template_arg()),
        )
}

fn expand_options(args: &ArgMatches) -> ExpandOptions {
    ExpandOptions {
        config_file: args.get_one::<PathBuf>("config").cloned(),
        seed: args.get_one::<u64>("seed").copied(),
        constant_grid: args.get_flag("constant-grid"),
        max_passes: args.get_one::<usize>("max-passes").copied(),
        limit: args.get_one::<usize>("limit").copied(),
    }
}

fn template_path(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("template")
        .ok_or_else(|| anyhow::anyhow!("missing template argument"))
}

fn run(matches: &ArgMatches) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match matches.subcommand() {
        Some(("expand", args)) => {
            commands::expand(template_path(args)?, &expand_options(args), &mut out)?;
        }
        Some(("inspect", args)) => commands::inspect(template_path(args)?, &mut out)?,
        Some(("count", args)) => {
            commands::count(template_path(args)?, &mut out)?;
        }
        _ => anyhow::bail!("unknown subcommand"),
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();

    // Global flags are visible on the subcommand.
    let scope = matches.subcommand().map_or(&matches, |(_, sub)| sub);
    let format = scope
        .get_one::<LogFormat>("log-format")
        .copied()
        .unwrap_or_default();
    let level = level_for_verbosity(scope.get_count("verbose"));
    init_tracing(format, level);

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn parses_expand_flags() {
        let matches = build_cli()
            .try_get_matches_from([
                "sweep",
                "--log-format",
                "json",
                "expand",
                "space.yaml",
                "--seed",
                "7",
                "--constant-grid",
                "--limit",
                "3",
                "-vv",
            ])
            .unwrap();

        assert_eq!(matches.get_one::<LogFormat>("log-format"), Some(&LogFormat::Json));
        let Some(("expand", args)) = matches.subcommand() else {
            panic!("expected expand");
        };
        let options = expand_options(args);
        assert_eq!(options.seed, Some(7));
        assert!(options.constant_grid);
        assert_eq!(options.limit, Some(3));
        assert_eq!(options.max_passes, None);
        assert_eq!(args.get_count("verbose"), 2);
        assert_eq!(template_path(args).unwrap(), &PathBuf::from("space.yaml"));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let result = build_cli().try_get_matches_from(["sweep", "--log-format", "xml", "count", "a.json"]);
        assert!(result.is_err());
    }
}
