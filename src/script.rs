use std::{fs, future::Future, io, path::Path, path::PathBuf};

use rhai::{module_resolvers::FileModuleResolver, Dynamic, Engine, EvalAltResult, Scope};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{config::ScriptingConfig, environment::Environment};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read script {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("script error: {0}")]
    Eval(#[from] Box<EvalAltResult>),
}

/// Build the script engine for one session.
///
/// `print` goes to stdout so piped script output stays byte-exact;
/// everything else (logging functions, `debug`) goes to the log channel.
/// Environment functions are registered only when an environment exists;
/// scripts probe with `has_env()`.
pub fn engine(scripting: &ScriptingConfig, env: Option<&Environment>) -> Engine {
    let mut engine = Engine::new();

    engine.on_print(|text| println!("{text}"));
    engine.on_debug(|text, _, pos| debug!("script: {text} ({pos})"));

    if let Some(path) = &scripting.modules_path {
        engine.set_module_resolver(FileModuleResolver::new_with_path(path));
    }

    register_logging_functions(&mut engine);
    register_utility_functions(&mut engine);

    match env {
        Some(env) => register_environment_functions(&mut engine, env),
        None => {
            engine.register_fn("has_env", || false);
        }
    }

    engine
}

/// Run a script file with `argv` in scope (script path, then its own
/// arguments). Must be called from within `tokio::task::block_in_place`,
/// as the registered environment functions re-enter the runtime.
pub fn run_file(
    engine: &Engine,
    scope: &mut Scope,
    path: &Path,
    args: &[String],
) -> Result<(), ScriptError> {
    let source = fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut argv: rhai::Array = vec![Dynamic::from(path.display().to_string())];
    argv.extend(args.iter().map(|arg| Dynamic::from(arg.clone())));
    scope.push("argv", argv);

    run_source(engine, scope, &source)
}

/// Run script source already in memory (stdin mode).
pub fn run_source(engine: &Engine, scope: &mut Scope, source: &str) -> Result<(), ScriptError> {
    engine.run_with_scope(scope, source)?;
    Ok(())
}

/// Bridge from the synchronous script engine back into the async runtime.
/// Only valid on a runtime worker thread inside `block_in_place`.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Handle::current().block_on(future)
}

fn db_result<T>(
    result: Result<T, sea_orm::DbErr>,
) -> Result<T, Box<EvalAltResult>> {
    result.map_err(|e| e.to_string().into())
}

fn register_environment_functions(engine: &mut Engine, env: &Environment) {
    engine.register_fn("has_env", || true);

    let e = env.clone();
    engine.register_fn("uid", move || i64::from(e.uid()));

    let e = env.clone();
    engine.register_fn("lang", move || e.context().lang.clone());

    let e = env.clone();
    engine.register_fn("get_param", move |key: &str| -> Result<Dynamic, Box<EvalAltResult>> {
        let value = db_result(block_on(e.get_param(key)))?;
        Ok(value.map_or(Dynamic::UNIT, Dynamic::from))
    });

    let e = env.clone();
    engine.register_fn(
        "set_param",
        move |key: &str, value: &str| -> Result<(), Box<EvalAltResult>> {
            db_result(block_on(e.set_param(key, value)))
        },
    );

    let e = env.clone();
    engine.register_fn("commit", move || -> Result<(), Box<EvalAltResult>> {
        db_result(block_on(e.cursor().commit()))
    });

    let e = env.clone();
    engine.register_fn("rollback", move || -> Result<(), Box<EvalAltResult>> {
        db_result(block_on(e.cursor().rollback()))
    });
}

fn register_logging_functions(engine: &mut Engine) {
    engine.register_fn("info", |msg: &str| {
        info!("{}", msg);
    });

    engine.register_fn("warn", |msg: &str| {
        warn!("{}", msg);
    });

    engine.register_fn("error", |msg: &str| {
        error!("{}", msg);
    });
}

fn register_utility_functions(engine: &mut Engine) {
    engine.register_fn("now", || chrono::Utc::now().timestamp());

    engine.register_fn("today", || {
        chrono::Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    });
}
