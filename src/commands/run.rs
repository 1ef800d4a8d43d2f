use std::{
    io::{self, IsTerminal as _, Read as _},
    path::PathBuf,
    process,
};

use rhai::{Dynamic, Scope};
use tracing::{error, info};

use crate::{
    config::Config,
    console::Console,
    database,
    environment::{self, BoxError, Environment},
    script,
};

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub script: Option<PathBuf>,
    pub script_args: Vec<String>,
    pub interactive: bool,
    pub rollback: bool,
}

/// Run a script, stdin code or an interactive console, inside an
/// environment when a database is selected and without one otherwise.
pub async fn handle_run_command(config: &Config, args: RunArgs) {
    match select_database(config).await {
        Ok(Some(database)) => {
            let result =
                environment::with_environment(&config.database, &database, args.rollback, |env| {
                    run_session(config, Some(env), &args)
                })
                .await;

            if let Err(e) = result {
                // Detail is already in the log; the user gets one line.
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
        Ok(None) => {
            if let Err(e) = run_session(config, None, &args).await {
                error!("Uncaught error in session: {e}");
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Which database this invocation targets, if any.
///
/// The resolved configuration already applied flag-over-file precedence.
/// With `must_exist` unset, a named database that is absent degrades to a
/// no-environment session instead of failing.
async fn select_database(config: &Config) -> Result<Option<String>, BoxError> {
    let Some(name) = config.database.name.clone() else {
        return Ok(None);
    };

    if config.database.must_exist || database::database_exists(&config.database, &name).await? {
        Ok(Some(name))
    } else {
        info!("Database {name} does not exist, continuing without an environment");
        Ok(None)
    }
}

async fn run_session(
    config: &Config,
    env: Option<Environment>,
    args: &RunArgs,
) -> Result<(), BoxError> {
    let engine = script::engine(&config.scripting, env.as_ref());
    let database = config.database.name.clone();
    let script_path = args.script.clone();
    let script_args = args.script_args.clone();
    let interactive = args.interactive;

    // The script engine is synchronous; environment functions re-enter the
    // runtime through the handle, which is only legal on a blocking-aware
    // worker thread.
    tokio::task::block_in_place(move || -> Result<(), BoxError> {
        let mut scope = Scope::new();

        if let Some(path) = &script_path {
            script::run_file(&engine, &mut scope, path, &script_args)?;
        }

        if script_path.is_none() || interactive {
            if io::stdin().is_terminal() {
                if env.is_none() {
                    info!("No environment set, use -d <database> to get one.");
                }
                Console::new(engine, database).run(&mut scope)?;
                if let Some(env) = &env {
                    // Interactive sessions never auto-commit: whatever the
                    // console left pending is discarded here, before the
                    // lifecycle finalizes.
                    script::block_on(env.cursor().rollback())?;
                }
            } else {
                let mut source = String::new();
                io::stdin().read_to_string(&mut source)?;
                scope.push("argv", vec![Dynamic::from(String::new())]);
                script::run_source(&engine, &mut scope, &source)?;
            }
        }

        Ok(())
    })
}
