use std::process;

use clap::Parser as _;
use tracing::debug;

use crate::{
    cli::Cli,
    commands::run::{handle_run_command, RunArgs},
    config::{self, Overrides},
    setup_tracing::setup_tracing,
};

/// Entry point: parse the command line, resolve the configuration fresh
/// for this invocation, initialize logging, and hand off to the run
/// command.
///
/// Exit codes: 0 on success, 1 when the session failed or the environment
/// could not be acquired, 2 on configuration and usage errors.
pub async fn boot() {
    let cli = Cli::parse();

    let overrides = Overrides {
        config: cli.config.clone(),
        database: cli.database.clone(),
        log_level: cli.log_level,
        logfile: cli.logfile.clone(),
        modules_path: cli.modules_path.clone(),
    };

    let app_config = match config::resolve(&overrides) {
        Ok(app_config) => app_config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    };

    if let Err(e) = setup_tracing(&app_config.tracing) {
        eprintln!("Error: cannot open log file: {e}");
        process::exit(2);
    }

    config::report(&app_config);
    debug!("Configuration loaded: {:?}", app_config);

    handle_run_command(
        &app_config,
        RunArgs {
            script: cli.script,
            script_args: cli.script_args,
            interactive: cli.interactive,
            rollback: cli.rollback,
        },
    )
    .await;
}
