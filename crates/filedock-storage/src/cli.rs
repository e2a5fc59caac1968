use std::path::PathBuf;

use clap::{Parser, Subcommand};
use filedock_storage_core::UserId;

/// Process configuration of the `filedock` admin tool.
#[derive(Parser, Debug, Clone)]
#[command(name = "filedock")]
#[command(about = "Manage filedock storage mode and WebDAV profiles")]
pub struct Cli {
    /// Path of the persisted storage config
    #[arg(long, default_value = "data/config.json", env = "FILEDOCK_CONFIG")]
    pub config_path: PathBuf,

    /// Root directory of the local backend
    #[arg(long, default_value = "data/uploads", env = "FILEDOCK_UPLOADS_DIR")]
    pub uploads_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show or change the active storage mode
    Mode {
        #[command(subcommand)]
        action: ModeCommand,
    },
    /// Manage per-user WebDAV profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ModeCommand {
    /// Print the persisted storage mode
    Show,
    /// Persist a new storage mode (local, telegram or webdav)
    Set { mode: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// List configured profiles with passwords masked
    List,
    /// Add or replace the profile of a user
    Set {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        url: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "FILEDOCK_WEBDAV_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Remove the profile of a user
    Remove {
        #[arg(long)]
        user_id: UserId,
    },
    /// Check the stored credentials against the remote root
    Check {
        #[arg(long)]
        user_id: UserId,
    },
}
