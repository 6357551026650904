//! Mediasync CLI entry point.

use clap::Parser;
use mediasync::cli::commands;
use mediasync::cli::{Cli, Commands};
use mediasync::config::DEFAULT_MARK_PLAYED_AT;
use mediasync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli, cli.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Version => commands::version::execute(json),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::SplitPath { url } => commands::split_path::execute(url, json),

        Commands::Init { force } => {
            let settings = cli.sync_settings(DEFAULT_MARK_PLAYED_AT)?;
            commands::init::execute(&cli.store_paths()?, &settings, *force, json)
        }
        Commands::Status => {
            let settings = cli.sync_settings(DEFAULT_MARK_PLAYED_AT)?;
            commands::status::execute(&cli.store_paths()?, &settings, json)
        }
        Commands::Link(args) => {
            let settings = cli.sync_settings(DEFAULT_MARK_PLAYED_AT)?;
            commands::link::execute(args, &cli.store_paths()?, &settings, json)
        }

        // Reconciliation
        Commands::Userdata { file } => {
            let settings = cli.sync_settings(DEFAULT_MARK_PLAYED_AT)?;
            commands::userdata::execute(file, &cli.store_paths()?, &settings, json)
        }
        Commands::Playstate(args) => {
            let settings = cli.sync_settings(args.mark_played_at)?;
            commands::playstate::execute(&args.file, &cli.store_paths()?, &settings, json)
        }
        Commands::Artwork(args) => {
            let settings = cli.sync_settings(DEFAULT_MARK_PLAYED_AT)?;
            commands::artwork::execute(args, &cli.store_paths()?, &settings, json)
        }
    }
}
