//! livekv CLI - inspect and edit a persistent livekv store.
//!
//! # Usage
//!
//! ```text
//! livekv set my-current-language '"en"'
//! livekv set my-authentication-token abc123 --text
//! livekv get my-current-language
//! livekv keys
//! livekv remove my-authentication-token
//! livekv clear
//! livekv demo --no-persist
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use livekv::config::{BackendKind, StorageConfig};
use livekv::{LiveStore, paths};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "livekv", version, about = "Reactive string-keyed storage")]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct StorageArgs {
    /// Config file (default: <data dir>/livekv/livekv.toml, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file to use instead of the configured one
    #[arg(long, global = true, conflicts_with_all = ["memory", "no_persist"])]
    path: Option<PathBuf>,

    /// Use a process-local store
    #[arg(long, global = true, conflicts_with = "no_persist")]
    memory: bool,

    /// Run without any physical store
    #[arg(long, global = true)]
    no_persist: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the JSON value stored under a key (`null` when unset)
    Get { key: String },
    /// Store a value under a key
    Set {
        key: String,
        /// JSON value, e.g. '"en"', 42 or '{"a":1}'
        value: String,
        /// Store VALUE as a plain string instead of parsing it as JSON
        #[arg(long)]
        text: bool,
    },
    /// Remove a key
    Remove { key: String },
    /// Remove every key
    Clear,
    /// List stored keys
    Keys,
    /// Subscribe to two keys and print every emission while editing them
    Demo,
}

fn main() {
    init_logging();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Initialize stderr logging, keeping stdout for command output.
fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli.storage)?;
    let store = LiveStore::detect(&config)?;

    match cli.command {
        Command::Get { key } => match store.get::<Value>(&key).value() {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => println!("null"),
            Err(e) => anyhow::bail!("{e}"),
        },
        Command::Set { key, value, text } => {
            let value = if text {
                Value::String(value)
            } else {
                serde_json::from_str(&value).with_context(|| {
                    format!("Invalid JSON value: {value}\n  Use --text to store it as a string")
                })?
            };
            store.set(&key, &value)?;
        },
        Command::Remove { key } => store.remove(&key)?,
        Command::Clear => store.clear()?,
        Command::Keys => {
            let mut keys = store.backend().keys()?;
            keys.sort();
            for key in keys {
                println!("{key}");
            }
        },
        Command::Demo => demo(&store)?,
    }

    Ok(())
}

/// Build the store config: file, then `LIVEKV_*` variables, then flags.
fn resolve_config(args: &StorageArgs) -> Result<StorageConfig> {
    let config = match &args.config {
        Some(path) => StorageConfig::load_from(path)?,
        None => match paths::default_config_path() {
            Ok(path) if path.exists() => StorageConfig::load_from(&path)?,
            _ => StorageConfig::default(),
        },
    };
    let mut config = config.with_overrides(|name| std::env::var(name).ok())?;

    if let Some(path) = &args.path {
        config = StorageConfig::file(path);
    } else if args.memory {
        config.backend = BackendKind::Memory;
    } else if args.no_persist {
        config.backend = BackendKind::None;
    }

    for warning in config.validate()?.warnings {
        tracing::warn!("{warning}");
    }
    Ok(config)
}

/// Walk through the store's reactive behavior on two keys.
fn demo(store: &LiveStore) -> Result<()> {
    const LANGUAGE: &str = "my-current-language";
    const TOKEN: &str = "my-authentication-token";

    let watch = |key: &'static str| {
        store.get::<String>(key).subscribe(move |emission| match emission {
            Ok(Some(value)) => println!("  {key} -> {value:?}"),
            Ok(None) => println!("  {key} -> null"),
            Err(e) => println!("  {key} !! {e}"),
        })
    };

    println!("subscribe");
    let _language = watch(LANGUAGE);
    let _token = watch(TOKEN);

    println!("set {LANGUAGE} = en");
    store.set(LANGUAGE, "en")?;
    println!("set {LANGUAGE} = en (unchanged)");
    store.set(LANGUAGE, "en")?;
    println!("set {TOKEN} = abc123");
    store.set(TOKEN, "abc123")?;
    println!("remove {TOKEN}");
    store.remove(TOKEN)?;
    println!("remove {TOKEN} (already unset)");
    store.remove(TOKEN)?;
    println!("clear");
    store.clear()?;

    Ok(())
}
