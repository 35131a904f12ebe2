//! `secretgift` command-line front end.
//!
//! # Responsibility
//! - Parse commands and configuration overrides.
//! - Drive the boundary API and print its JSON envelope to stdout.
//!
//! # Invariants
//! - Exit code is 0 only for `ok` envelopes.

use clap::{Args, Parser, Subcommand};
use secretgift_api::{ApiResponse, GiftExchangeApi, ParticipantDto};
use secretgift_core::{init_logging, CoreConfig, StorageBackend};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "secretgift")]
#[command(about = "Secret gift exchange roster and assignment tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Roster storage file (overrides SECRETGIFT_DATA_PATH)
    #[arg(long, global = true)]
    data_path: Option<PathBuf>,

    /// Storage backend: sqlite or json (overrides SECRETGIFT_STORAGE)
    #[arg(long, global = true)]
    storage: Option<String>,

    /// Log level (overrides SECRETGIFT_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute log directory; logging is off without one
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ParticipantArgs {
    /// Display name, unique ignoring case
    #[arg(short, long)]
    name: String,

    /// Contact email
    #[arg(short, long, default_value = "")]
    email: String,
}

impl ParticipantArgs {
    fn into_dto(self) -> ParticipantDto {
        ParticipantDto {
            name: self.name,
            email: self.email,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a participant
    Add(ParticipantArgs),

    /// Change a participant's name and email
    Update {
        /// Participant ID (UUID)
        id: String,

        #[command(flatten)]
        participant: ParticipantArgs,
    },

    /// Remove one participant
    Remove {
        /// Participant ID (UUID)
        id: String,
    },

    /// Remove every participant
    RemoveAll,

    /// List participants with their assignment links
    List,

    /// Run a new assignment round
    Assign,

    /// Show who gives to whom
    Assignments,

    /// Print the core version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("secretgift_core version={}", secretgift_core::core_version());
        return ExitCode::SUCCESS;
    }

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let api = match GiftExchangeApi::from_config(&config) {
        Ok(api) => api,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Add(participant) => print_response(&api.add_participant(&participant.into_dto())),
        Commands::Update { id, participant } => {
            print_response(&api.update_participant(&id, &participant.into_dto()))
        }
        Commands::Remove { id } => print_response(&api.remove_participant(&id)),
        Commands::RemoveAll => print_response(&api.remove_all_participants()),
        Commands::List => print_response(&api.get_all_participants()),
        Commands::Assign => print_response(&api.assign_gifts()),
        Commands::Assignments => print_response(&api.get_gift_assignments()),
        Commands::Version => ExitCode::SUCCESS,
    }
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, String> {
    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;

    if let Some(raw) = &cli.storage {
        let storage = raw.parse::<StorageBackend>().map_err(|err| err.to_string())?;
        if storage != config.storage && cli.data_path.is_none() {
            config.data_path = secretgift_core::config::default_data_path(storage);
        }
        config.storage = storage;
    }
    if let Some(path) = &cli.data_path {
        config.data_path = path.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }

    Ok(config)
}

fn print_response<T: Serialize>(response: &ApiResponse<T>) -> ExitCode {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to encode response: {err}");
            return ExitCode::FAILURE;
        }
    }

    if response.status.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, Cli, Commands};
    use clap::{CommandFactory, Parser};
    use secretgift_core::StorageBackend;
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_parses_positional_id_and_flags() {
        let cli = Cli::parse_from([
            "secretgift",
            "update",
            "3f2504e0-4f89-41d3-9a0c-0305e82c3301",
            "--name",
            "Jane",
            "--email",
            "jane@x.com",
        ]);
        match cli.command {
            Commands::Update { id, participant } => {
                assert_eq!(id, "3f2504e0-4f89-41d3-9a0c-0305e82c3301");
                assert_eq!(participant.name, "Jane");
                assert_eq!(participant.email, "jane@x.com");
            }
            _ => panic!("expected update command"),
        }
    }

    #[test]
    fn command_line_overrides_storage_and_path() {
        let cli = Cli::parse_from([
            "secretgift",
            "list",
            "--storage",
            "json",
            "--data-path",
            "/tmp/roster.json",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.storage, StorageBackend::Json);
        assert_eq!(config.data_path, PathBuf::from("/tmp/roster.json"));
    }

    #[test]
    fn unknown_storage_is_reported() {
        let cli = Cli::parse_from(["secretgift", "list", "--storage", "redis"]);
        assert!(resolve_config(&cli).unwrap_err().contains("redis"));
    }
}
