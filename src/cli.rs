use std::path::PathBuf;

use clap::Parser;

use crate::config::LogLevel;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version)]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(
    long_about = "Execute a script in an initialized database environment. \
                  The script has access to the environment through the \
                  get_param/set_param/commit/rollback functions, initialized \
                  for the given database. If no script is provided, the \
                  script is read from stdin, or an interactive console is \
                  started if stdin appears to be a terminal."
)]
pub struct Cli {
    /// Path to the configuration file. Can also be provided through the
    /// SEASHELL_CONFIG environment variable.
    #[arg(short, long, env = "SEASHELL_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database name. If present, this parameter takes precedence over the
    /// database named in the configuration file.
    #[arg(short, long, env = "PGDATABASE")]
    pub database: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Write the log to this file instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub logfile: Option<PathBuf>,

    /// Base directory for `import` statements in scripts. If present, this
    /// parameter takes precedence over the modules path in the
    /// configuration file.
    #[arg(long, env = "SEASHELL_MODULES_PATH", value_name = "DIR")]
    pub modules_path: Option<PathBuf>,

    /// Roll back the transaction even if the script does not raise an
    /// error. Note that if the script itself commits, this option has no
    /// effect, which is why it is not named dry-run. This option is
    /// implied when an interactive console is started.
    #[arg(long)]
    pub rollback: bool,

    /// Inspect interactively after running the script.
    #[arg(short, long)]
    pub interactive: bool,

    /// Script to execute. When omitted, code is read from stdin, or an
    /// interactive console is started if stdin is a terminal.
    pub script: Option<PathBuf>,

    /// Arguments exposed to the script as `argv`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub script_args: Vec<String>,
}
