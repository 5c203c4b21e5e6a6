use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};

fn file_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn cli() -> Command {
    Command::new("soc-sync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("SOC maturity assessment scoring and state migration")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Store configuration (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("score")
                .about("Compute aspect, domain and overall maturity scores")
                .arg(file_arg("framework", "Framework taxonomy JSON"))
                .arg(file_arg("answers", "Answers JSON")),
        )
        .subcommand(
            Command::new("progress")
                .about("Report answered questions per domain")
                .arg(file_arg("framework", "Framework taxonomy JSON"))
                .arg(file_arg("answers", "Answers JSON")),
        )
        .subcommand(
            Command::new("hydrate")
                .about("Migrate a persisted state blob of any version to the current schema")
                .arg(file_arg("input", "Persisted state JSON")),
        )
        .subcommand(
            Command::new("parse-plan")
                .about("Split action plan markdown into report sections")
                .arg(file_arg("input", "Plan markdown")),
        )
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a Path> {
    args.get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .with_context(|| format!("--{name} is required"))
}

fn framework(args: &ArgMatches) -> Result<soc_model::Framework> {
    let path = path(args, "framework")?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("framework");
    soc_cli::parse_framework(id, &soc_cli::read(path)?)
}

fn run(matches: &ArgMatches) -> Result<String> {
    let config = soc_cli::load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    config.validate()?;

    match matches.subcommand() {
        Some(("score", args)) => {
            soc_cli::score(&framework(args)?, &soc_cli::read(path(args, "answers")?)?)
        }
        Some(("progress", args)) => {
            soc_cli::progress(&framework(args)?, &soc_cli::read(path(args, "answers")?)?)
        }
        Some(("hydrate", args)) => soc_cli::hydrate(&soc_cli::read(path(args, "input")?)?, &config),
        Some(("parse-plan", args)) => soc_cli::parse_plan(&soc_cli::read(path(args, "input")?)?),
        _ => anyhow::bail!("unknown command"),
    }
}

fn main() {
    let matches = cli().get_matches();
    soc_cli::init_tracing(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(output) => println!("{output}"),
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "command failed");
            eprintln!("error: {error:#}");
            std::process::exit(1);
        }
    }
}
