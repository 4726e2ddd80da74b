//! Administrative command surface for roomwarden.
//!
//! Operates directly on the durable documents (trust list, blacklist,
//! room registry) in the data directory. A live platform connection is
//! not required; permission reapplication happens when the service next
//! observes the owner's rooms.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roomwarden_core::core_registry::RoomRegistry;
use roomwarden_core::core_trust::TrustStore;
use roomwarden_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use roomwarden_core::model::UserId;
use roomwarden_core::store::DocumentStore;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "roomwarden")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Directory holding the trust and registry documents
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a member to an owner's trusted list
    AddTrusted { owner: String, member: String },
    /// Remove a member from an owner's trusted list
    RemoveTrusted { owner: String, member: String },
    /// List an owner's trusted members
    ListTrusted { owner: String },
    /// Add a member to the global blacklist
    AddBlacklist { member: String },
    /// Remove a member from the global blacklist
    RemoveBlacklist { member: String },
    /// List the global blacklist
    ListBlacklist,
    /// List the currently tracked rooms
    Rooms,
}

fn open_trust(data_dir: &Path) -> Result<TrustStore> {
    let store = DocumentStore::open(data_dir.join("data.json"))
        .context("opening trust document")?;
    TrustStore::open(store).context("loading trust document")
}

fn open_registry(data_dir: &Path) -> Result<RoomRegistry> {
    let store = DocumentStore::open(data_dir.join("active_rooms.json"))
        .context("opening registry document")?;
    RoomRegistry::open(store).context("loading registry document")
}

fn format_members(mut members: Vec<UserId>) -> String {
    if members.is_empty() {
        return "None".to_string();
    }
    members.sort();
    members
        .iter()
        .map(|m| m.as_str().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_command(command: Command, data_dir: &Path) -> Result<String> {
    Ok(match command {
        Command::AddTrusted { owner, member } => {
            let mut trust = open_trust(data_dir)?;
            let owner = UserId::new(owner);
            let member = UserId::new(member);
            if trust.add_trusted(&owner, &member)? {
                format!("{} has been added to your trusted list.", member)
            } else {
                format!("{} is already in your trusted list.", member)
            }
        }
        Command::RemoveTrusted { owner, member } => {
            let mut trust = open_trust(data_dir)?;
            let owner = UserId::new(owner);
            let member = UserId::new(member);
            if trust.remove_trusted(&owner, &member)? {
                format!("{} has been removed from your trusted list.", member)
            } else {
                format!("{} is not in your trusted list.", member)
            }
        }
        Command::ListTrusted { owner } => {
            let trust = open_trust(data_dir)?;
            let members: Vec<UserId> =
                trust.list_trusted(&UserId::new(owner)).cloned().collect();
            format!("Your trusted users: {}", format_members(members))
        }
        Command::AddBlacklist { member } => {
            let mut trust = open_trust(data_dir)?;
            let member = UserId::new(member);
            if trust.add_blacklist(&member)? {
                format!("{} has been added to the blacklist.", member)
            } else {
                format!("{} is already blacklisted.", member)
            }
        }
        Command::RemoveBlacklist { member } => {
            let mut trust = open_trust(data_dir)?;
            let member = UserId::new(member);
            if trust.remove_blacklist(&member)? {
                format!("{} has been removed from the blacklist.", member)
            } else {
                format!("{} is not blacklisted.", member)
            }
        }
        Command::ListBlacklist => {
            let trust = open_trust(data_dir)?;
            let members: Vec<UserId> = trust.list_blacklist().cloned().collect();
            format!("Blacklisted users: {}", format_members(members))
        }
        Command::Rooms => {
            let registry = open_registry(data_dir)?;
            let mut rooms = registry.snapshot();
            rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));
            serde_json::to_string_pretty(&rooms).context("encoding room list")?
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = LogLevel::from_str(&args.log_level).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}', using 'info'", args.log_level);
        LogLevel::Info
    });
    init_logging_with_config(LogConfig::new(log_level).json_format(args.json_logs))?;

    info!(data_dir = %args.data_dir.display(), "roomwarden admin command");
    let output = run_command(args.command, &args.data_dir)?;
    println!("{}", output);

    Ok(())
}
