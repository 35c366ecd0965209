use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use envkeep::{EnvStore, Prompt};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILE: &str = ".env";

#[derive(Debug, Parser)]
#[command(
    name = "envkeep",
    version,
    about = "Store and retrieve plaintext, single-key values in a .env file"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// The .env file to read and write.
    #[arg(
        short,
        long,
        global = true,
        env = "ENVKEEP_FILE",
        default_value = DEFAULT_FILE
    )]
    path: PathBuf,

    /// Print store diagnostics to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the resolved value for a key
    Get(GetArgs),
    /// Store a value, prompting for it when omitted
    Set(SetArgs),
    /// Remove a key from the file
    Remove(RemoveArgs),
    /// List the entries stored in the file
    List(ListArgs),
}

#[derive(Debug, Args)]
struct GetArgs {
    /// The key to look up (e.g. PORT, API_KEY).
    key: String,

    /// Value to print when the key is not set anywhere.
    #[arg(long)]
    default: Option<String>,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// The key to store (e.g. PORT, API_KEY).
    key: String,

    /// The value to store. Read from stdin when omitted.
    value: Option<String>,

    /// Replace a value that is already set.
    #[arg(long)]
    overwrite: bool,

    /// Message shown when asking for the value.
    #[arg(long)]
    prompt: Option<String>,
}

#[derive(Debug, Args)]
struct RemoveArgs {
    /// The key to remove.
    key: String,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    yes: bool,

    /// Exit with an error when the key is not in the file.
    #[arg(long)]
    fail: bool,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Print only the keys.
    #[arg(long)]
    keys: bool,
}

/// Reads answers from stdin, writing the question to stderr so stdout stays
/// clean for captured values.
struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        let mut stderr = io::stderr().lock();
        let _ = match default {
            Some(default) => write!(stderr, "{message} [{default}]: "),
            None => write!(stderr, "{message}: "),
        };
        let _ = stderr.flush();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return default.map(str::to_owned);
        }

        let answer = line.trim_end_matches(['\r', '\n']);
        if answer.is_empty() {
            return default.map(str::to_owned);
        }
        Some(answer.to_owned())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli, &mut StdinPrompt) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("envkeep: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("envkeep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, prompt: &mut dyn Prompt) -> Result<ExitCode> {
    let mut store = EnvStore::at(&cli.path);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::Get(args) => match store.resolve(&args.key, args.default.as_deref()) {
            Some(value) => writeln!(stdout, "{value}")?,
            None => {
                eprintln!("error: key '{}' not found", args.key);
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Set(args) => {
            if let Some(existing) = store.get(&args.key)
                && !args.overwrite
            {
                eprintln!(
                    "Existing value kept for [{}]; pass --overwrite to replace it.",
                    args.key
                );
                writeln!(stdout, "{existing}")?;
                return Ok(ExitCode::SUCCESS);
            }

            let stored = store.assign_with(
                &args.key,
                args.value.as_deref(),
                args.prompt.as_deref(),
                args.overwrite,
                prompt,
            );
            match stored {
                Some(value) => {
                    eprintln!("Stored [{}] successfully.", args.key);
                    writeln!(stdout, "{value}")?;
                }
                None => {
                    eprintln!("error: failed to set value for [{}]", args.key);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Remove(args) => {
            if !args.yes && !confirm(prompt, &args.key) {
                eprintln!("Operation cancelled.");
                return Ok(ExitCode::SUCCESS);
            }

            if store.erase(&args.key) {
                eprintln!("Removed value for key: {}", args.key);
            } else if args.fail {
                eprintln!("error: no value found for key: {}", args.key);
                return Ok(ExitCode::FAILURE);
            } else {
                eprintln!("No value found for key: {}", args.key);
            }
        }
        Command::List(args) => {
            if args.keys {
                for key in store.enumerate() {
                    writeln!(stdout, "{key}")?;
                }
                return Ok(ExitCode::SUCCESS);
            }

            let entries = store.parse();
            let keys = entries.sorted_keys();
            let width = keys.iter().map(String::len).max().unwrap_or(0);
            writeln!(stdout, "Stored values ({})", store.file_path().display())?;
            for key in &keys {
                let value = entries.get(key).unwrap_or_default();
                writeln!(stdout, "{key:<width$}  {value}")?;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn confirm(prompt: &mut dyn Prompt, key: &str) -> bool {
    let message = format!("Remove value for key {key}? [y/N]");
    prompt
        .ask(&message, None)
        .is_some_and(|answer| {
            matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
}
