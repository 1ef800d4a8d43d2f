use rhai::{Dynamic, Engine, Scope};
use rustyline::{error::ReadlineError, DefaultEditor, Result as RustyResult};
use tracing::error;

/// Interactive console over the session's script engine.
///
/// Works on the same scope the script ran with, so `-i` sessions can
/// inspect whatever the script left behind.
pub struct Console {
    engine: Engine,
    database: Option<String>,
}

impl Console {
    #[must_use]
    pub fn new(engine: Engine, database: Option<String>) -> Self {
        Self { engine, database }
    }

    pub fn run(&self, scope: &mut Scope) -> RustyResult<()> {
        println!("🐚 SeaShell console");
        match &self.database {
            Some(name) => println!("Database: {name}"),
            None => println!("No database selected, environment functions are unavailable"),
        }
        println!("Type 'help' for available commands, 'exit' to quit");
        println!();

        let mut rl = DefaultEditor::new()?;

        loop {
            let readline = rl.readline("sea> ");

            match readline {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line)?;
                    match line {
                        "exit" | "quit" => {
                            println!("Goodbye! 👋");
                            break;
                        }
                        "help" => {
                            Self::show_help();
                        }
                        "clear" => {
                            print!("\x1B[2J\x1B[1;1H"); // Clear screen
                        }
                        _ => {
                            self.eval_line(line, scope);
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C pressed, exiting...");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D pressed, exiting...");
                    break;
                }
                Err(err) => {
                    error!("Error reading line: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    fn eval_line(&self, code: &str, scope: &mut Scope<'_>) {
        match self.engine.eval_with_scope::<Dynamic>(scope, code) {
            Ok(result) => {
                // Only print if result is not unit type
                if !result.is_unit() {
                    println!("=> {result}");
                }
            }
            Err(e) => {
                error!("Script error: {}", e);
            }
        }
    }

    fn show_help() {
        println!("🐚 SeaShell console");
        println!();
        println!("Built-in Commands:");
        println!("  help              - Show this help message");
        println!("  clear             - Clear the screen");
        println!("  exit/quit         - Exit the console");
        println!();
        println!("Environment Functions (require a database):");
        println!("  has_env()         - Whether an environment is available");
        println!("  uid()             - Acting user id");
        println!("  lang()            - Language of the acting user");
        println!("  get_param(key)    - Read a system parameter");
        println!("  set_param(k, v)   - Write a system parameter");
        println!("  commit()          - Commit and start a fresh transaction");
        println!("  rollback()        - Discard and start a fresh transaction");
        println!();
        println!("Utility Functions:");
        println!("  info/warn/error(msg) - Log a message");
        println!("  now()             - Current timestamp");
        println!("  today()           - Start of today");
        println!();
        println!("Note: the session is rolled back when the console exits;");
        println!("call commit() to persist your changes.");
        println!();
    }
}
