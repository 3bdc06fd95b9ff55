#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! flowctl: the CLI tool for managing Flowdapt.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{CommandFactory, Parser};

use flowctl::cli::{Cli, Command, init_logging, write_error};
use flowctl::commands::{self, Context, Outcome};
use flowctl::config::{Configuration, DISABLED_CONFIG_FILE, LoadOptions, resolve_app_dir};
use flowctl::errors::FlowctlError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("flowctl version: {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    let Some(command) = &cli.command else {
        let _ = Cli::command().print_help();
        return;
    };

    init_logging(cli.dev_mode);

    match run(&cli, command).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(err) => {
            write_error(&err, cli.dev_mode);
            let code = err
                .downcast_ref::<FlowctlError>()
                .map_or(1, FlowctlError::exit_code);
            std::process::exit(code);
        }
    }
}

async fn run(cli: &Cli, command: &Command) -> anyhow::Result<Outcome> {
    let app_dir = resolve_app_dir(cli.app_dir.as_deref())?;
    let opts = LoadOptions {
        app_dir,
        config_file: (cli.config_file != DISABLED_CONFIG_FILE).then(|| PathBuf::from(&cli.config_file)),
        dotenv_files: cli.dotenv.clone(),
        server: cli.server.clone(),
    };
    let config = Configuration::load(&opts).context("Failed to load the configuration")?;

    let mut ctx = Context::new(config);
    Ok(commands::dispatch(command, &mut ctx).await?)
}
