use std::{fs::OpenOptions, io, sync::Mutex};

use time::format_description::parse;
use tracing_subscriber::fmt::{time::OffsetTime, writer::BoxMakeWriter};

use crate::config::TracingConfig;

/// Initialize the tracing subscriber for one invocation.
///
/// The log never goes to stdout: script output on the primary stream must
/// stay byte-exact, so diagnostics are written to stderr, or to the
/// configured log file. Users can override the level with the `RUST_LOG`
/// environment variable (e.g. `RUST_LOG=debug`).
pub fn setup_tracing(tracing_config: &TracingConfig) -> io::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(tracing_config.log_level.to_string())
        })
        // Filter out noisy third-party logs
        .add_directive("sqlx::postgres::notice=warn".parse().unwrap())
        .add_directive("sea_orm_migration::migrator=warn".parse().unwrap());

    let (writer, ansi) = match &tracing_config.logfile {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(false) // Remove module paths for cleaner output
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_ansi(ansi)
        .with_timer(OffsetTime::new(
            time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC),
            parse("[hour]:[minute]:[second].[subsecond digits:2]").unwrap(),
        ))
        .compact()
        .init();

    Ok(())
}
