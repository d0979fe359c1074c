//! contextos: replay a JSON-lines event file through the engine.
//!
//! Usage: `contextos [EVENTS.jsonl] [--store PATH]`
//!
//! Each non-blank line is an `EngineCommand`. Lines starting with `#` are
//! skipped. The store is loaded from and saved back to `~/.contextos/store.json`
//! unless `--store` points elsewhere. The resulting snapshot is printed as
//! JSON on stdout. `RUST_LOG=debug` shows per-command outcomes.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use contextos_lib::commands::{apply, EngineCommand, EngineSnapshot};
use contextos_lib::config::{load_config, state_dir};
use contextos_lib::engine::ContextEngine;
use contextos_lib::error::EngineError;
use contextos_lib::persistence::JsonFileRepository;

#[derive(Parser)]
#[command(name = "contextos", version, about = "Replay context events through the engine")]
struct Cli {
    /// JSON-lines file of engine commands to replay.
    events: Option<PathBuf>,

    /// Store file to load from and save back to.
    #[arg(long)]
    store: Option<PathBuf>,
}

fn run(args: Cli) -> Result<(), EngineError> {
    let config = load_config()?;
    let store_path = match args.store {
        Some(path) => path,
        None => state_dir()?.join("store.json"),
    };

    let mut engine = ContextEngine::builder(config)
        .repository(Arc::new(JsonFileRepository::new(store_path)))
        .build()?;

    if let Some(events) = args.events {
        let content = fs::read_to_string(&events)?;
        let mut applied = 0usize;
        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let command: EngineCommand = match serde_json::from_str(line) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("{}:{}: skipping unparseable command: {}", events.display(), n + 1, e);
                    continue;
                }
            };
            match apply(&mut engine, command) {
                Ok(outcome) => {
                    applied += 1;
                    log::debug!("{}:{}: {:?}", events.display(), n + 1, outcome);
                }
                Err(e) if e.is_caller_bug() => {
                    log::warn!("{}:{}: {} ({})", events.display(), n + 1, e, e.recovery_suggestion());
                }
                Err(e) => return Err(e),
            }
        }
        log::info!("Replayed {} commands from {}", applied, events.display());
    }

    engine.tick();

    let snapshot = EngineSnapshot::capture(&engine);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    engine.save()
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("contextos: {}", e);
        eprintln!("{}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_events_and_store() {
        let cli = Cli::try_parse_from(["contextos", "day.jsonl", "--store", "/tmp/store.json"]).unwrap();
        assert_eq!(cli.events, Some(PathBuf::from("day.jsonl")));
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/store.json")));

        let bare = Cli::try_parse_from(["contextos"]).unwrap();
        assert!(bare.events.is_none() && bare.store.is_none());
    }

    #[test]
    fn test_cli_rejects_missing_store_value_and_extra_positionals() {
        assert!(Cli::try_parse_from(["contextos", "--store"]).is_err());
        assert!(Cli::try_parse_from(["contextos", "a.jsonl", "b.jsonl"]).is_err());
    }
}
