// file: src/main.rs
// version: 1.0.0
// guid: 48f1c7b9-0d62-4e85-a3f4-91b58d20c6e7

//! Incus Provision - Main entry point

use clap::{CommandFactory, Parser};
use incus_provision::{
    cli::{
        args::{Cli, Commands},
        commands::{install_command, uninstall_command, update_command},
        menu::{self, MenuChoice},
    },
    config::RunConfig,
    logging::logger,
    Result,
};
use std::io::IsTerminal;
use tokio::signal;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_logger(cli.verbose, cli.quiet) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let config = cli.run_config();

    let flow = dispatch(cli.command, &config);
    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    let result = tokio::select! {
        result = flow => result,
        _ = shutdown => {
            warn!("Interrupted, partial state is recoverable by re-running");
            std::process::exit(130);
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn dispatch(command: Option<Commands>, config: &RunConfig) -> Result<()> {
    match command {
        Some(Commands::Install) => install_command(config).await,
        Some(Commands::Uninstall) => uninstall_command(config).await,
        Some(Commands::Update) => update_command(config).await,
        None if std::io::stdin().is_terminal() => run_menu(config).await,
        None => {
            // Non-interactive context with no subcommand: default install
            let config = RunConfig {
                assume_yes: true,
                ..config.clone()
            };
            install_command(&config).await
        }
    }
}

async fn run_menu(config: &RunConfig) -> Result<()> {
    match menu::prompt()? {
        MenuChoice::Install => install_command(config).await,
        MenuChoice::Uninstall => uninstall_command(config).await,
        MenuChoice::Update => update_command(config).await,
        MenuChoice::Help => {
            Cli::command().print_help()?;
            Ok(())
        }
        MenuChoice::Exit => Ok(()),
    }
}
