use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use wal_kv::config::Config;
use wal_kv::error::{Error, Result};
use wal_kv::logger::Logger;
use wal_kv::storage::{FileLedger, Ledger};
use wal_kv::store::Store;

const USAGE: &str = "Commands: put {key} {value} | get {key} | print | exit";

#[derive(Parser)]
#[command(name = "wal-kv")]
#[command(about = "wal-kv - key-value store backed by a write-ahead ledger")]
pub struct Cli {
    /// Defaults to the interactive shell
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format: "human" or "json"
    #[arg(short, long, default_value = "human")]
    pub format: String,

    /// Ledger file path (default: $WAL_KV_LEDGER_PATH or ./wal.log)
    #[arg(short, long)]
    pub ledger: Option<String>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set a key to a value
    Put {
        key: String,
        value: String,
    },

    /// Show the value of a key
    Get {
        key: String,
    },

    /// Show every key-value pair
    Print,

    /// Interactive session reading commands from stdin
    Shell,
}

/// One line of shell input
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Put(String, String),
    Get(String),
    Print,
    Exit,
}

impl ShellCommand {
    fn parse(input: &str) -> Result<ShellCommand> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("exit") {
            return Ok(ShellCommand::Exit);
        }
        if input.eq_ignore_ascii_case("print") {
            return Ok(ShellCommand::Print);
        }

        let tokens: Vec<&str> = input.split_whitespace().collect();
        match tokens.as_slice() {
            ["get", key] => Ok(ShellCommand::Get(key.to_string())),
            ["put", key, value] => Ok(ShellCommand::Put(key.to_string(), value.to_string())),
            _ => Err(Error::InvalidCommand(input.to_string())),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(path) = cli.ledger {
        config.set_ledger_path(PathBuf::from(path));
    }
    config.set_output_format(cli.format);
    config.set_log_level(cli.log_level);

    Logger::init(config.get_log_level());

    let ledger = FileLedger::open(config.get_ledger_path())?;
    let mut store = Store::new(ledger)?;
    let format = config.get_output_format();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Put { key, value } => store
            .put(key, value)
            .and_then(|()| emit(&mut out, "OK")),
        Commands::Get { key } => print_value(&store, &key, format, &mut out),
        Commands::Print => print_store(&store, format, &mut out),
        Commands::Shell => {
            let stdin = io::stdin();
            shell(&mut store, stdin.lock(), &mut out, format)
        }
    };

    let closed = store.close();
    result.and(closed)
}

/// Interactive loop: one command per line until `exit` or end of input.
///
/// A failed `put` is reported and the session continues; the value is not applied.
fn shell<L, R, W>(store: &mut Store<L>, input: R, out: &mut W, format: &str) -> Result<()>
where
    L: Ledger,
    R: BufRead,
    W: Write,
{
    emit(out, "Simple Write-Ahead Log Based Key-Value Store")?;
    emit(out, "Type 'put {key} {value}', 'get {key}', 'print', or 'exit'")?;

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            // Not UTF-8; the bytes are consumed, so the session can go on
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                emit(out, USAGE)?;
                continue;
            }
            Err(e) => return Err(Error::Input(e)),
        };

        match ShellCommand::parse(&line) {
            Ok(ShellCommand::Exit) => break,
            Ok(ShellCommand::Print) => print_store(store, format, out)?,
            Ok(ShellCommand::Get(key)) => print_value(store, &key, format, out)?,
            Ok(ShellCommand::Put(key, value)) => match store.put(key, value) {
                Ok(()) => emit(out, "OK")?,
                Err(e) => emit(out, &format!("Error: {}", e))?,
            },
            Err(_) => emit(out, USAGE)?,
        }
    }

    Ok(())
}

fn print_value<L: Ledger, W: Write>(
    store: &Store<L>,
    key: &str,
    format: &str,
    out: &mut W,
) -> Result<()> {
    let value = store.get(key);
    let text = match format {
        "json" => format_json(&ValueOutput {
            key,
            value,
            present: value.is_some(),
        })?,
        _ => format!("Value: {}", value.unwrap_or("(absent)")),
    };
    emit(out, &text)
}

fn print_store<L: Ledger, W: Write>(store: &Store<L>, format: &str, out: &mut W) -> Result<()> {
    // Sorted so repeated prints are comparable
    let entries: BTreeMap<&str, &str> = store.entries().collect();

    match format {
        "json" => emit(out, &format_json(&entries)?),
        _ => {
            emit(out, "In-memory store ->")?;
            for (key, value) in entries {
                emit(out, &format!("{}={}", key, value))?;
            }
            Ok(())
        }
    }
}

fn format_json<T: serde::Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| Error::Output(format!("Failed to serialize JSON: {}", e)))
}

fn emit<W: Write>(out: &mut W, line: &str) -> Result<()> {
    writeln!(out, "{}", line).map_err(|e| Error::Output(format!("Failed to write output: {}", e)))
}

#[derive(Debug, serde::Serialize)]
struct ValueOutput<'a> {
    key: &'a str,
    value: Option<&'a str>,
    present: bool,
}
