//! Purpose: `rdb` CLI entry point over the public `rdb::api` surface.
//! Role: Binary crate root; parses args, runs one command against one database, emits JSON on stdout.
//! Invariants: Commands emit one JSON value per line on stdout.
//! Invariants: Errors go to stderr (JSON unless stderr is a terminal).
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: The database is always closed before the process exits.
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use bstr::ByteSlice;
use clap::{Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use rdb::api::{Database, Error, ErrorKind, to_exit_code};

#[derive(Parser)]
#[command(
    name = "rdb",
    version,
    about = "Inspect and edit an rdb key-value database",
    long_about = None,
    after_help = r#"EXAMPLES
  $ rdb --db ./app.rdb set greeting hello
  $ rdb --db ./app.rdb get greeting
  $ RDB_PATH=./app.rdb rdb list --limit 10"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, env = "RDB_PATH", help = "Path to the database file")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the value stored under KEY.
    Get { key: String },
    /// Store VALUE under KEY, replacing any previous value.
    Set { key: String, value: String },
    /// Delete KEY.
    Remove { key: String },
    /// Print every entry as one JSON line.
    List {
        #[arg(long, help = "Stop after this many entries")]
        limit: Option<u64>,
    },
    /// Print the number of entries.
    Count,
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Unexpected)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage).with_message(err.to_string().trim()));
            }
        },
    };

    let path = cli.db.ok_or_else(|| {
        Error::new(ErrorKind::Usage).with_message("no database given; pass --db or set RDB_PATH")
    })?;

    let db = Database::open(&path)?;
    let result = dispatch(&db, cli.command);
    let closed = db.close();
    result?;
    closed?;
    Ok(0)
}

fn dispatch(db: &Database, command: Command) -> Result<(), Error> {
    let mut out = io::stdout().lock();
    match command {
        Command::Get { key } => {
            let value = db.get(key.as_bytes())?;
            emit(&mut out, &entry_json(key.as_bytes(), &value))
        }
        Command::Set { key, value } => {
            db.set(key.as_bytes(), value.as_bytes())?;
            emit(&mut out, &json!({ "set": key }))
        }
        Command::Remove { key } => {
            db.remove(key.as_bytes())?;
            emit(&mut out, &json!({ "removed": key }))
        }
        Command::List { limit } => {
            // Lines are built inside the visitor, then written once the engine call returns.
            let mut lines = Vec::new();
            db.for_each(|key, value| {
                if limit.is_some_and(|limit| lines.len() as u64 >= limit) {
                    return false;
                }
                lines.push(entry_json(key, value));
                true
            })?;
            for line in &lines {
                emit(&mut out, line)?;
            }
            Ok(())
        }
        Command::Count => {
            let count = db.count()?;
            emit(&mut out, &json!({ "count": count }))
        }
    }
}

fn entry_json(key: &[u8], value: &[u8]) -> Value {
    json!({
        "key": key.to_str_lossy(),
        "value": value.to_str_lossy(),
    })
}

fn emit(out: &mut impl Write, value: &Value) -> Result<(), Error> {
    writeln!(out, "{value}").map_err(|err| {
        Error::new(ErrorKind::BrokenPipe)
            .with_message("failed to write output")
            .with_source(err)
    })
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        return;
    }
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Unexpected\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(err.kind().as_str()));
    if let Some(message) = err.message() {
        inner.insert("message".to_string(), json!(message));
    }
    if let Some(code) = err.code() {
        inner.insert("code".to_string(), json!(code));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}
