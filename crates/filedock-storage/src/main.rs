mod cli;

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use filedock_storage::{ConfigStore, StorageService};
use filedock_storage_core::{InMemoryMetadataStore, UserId, WebDavProfile};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ModeCommand, ProfileCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Using config {}", cli.config_path.display());

    // File records live in the host application; the admin tool only touches config
    let service = StorageService::new(
        ConfigStore::new(cli.config_path.as_path()),
        cli.uploads_dir.as_path(),
        Arc::new(InMemoryMetadataStore::new()),
    );

    match cli.command {
        Command::Mode { action } => run_mode(&service, action).await,
        Command::Profile { action } => run_profile(&service, action).await,
    }
}

async fn run_mode(service: &StorageService, action: ModeCommand) -> anyhow::Result<()> {
    match action {
        ModeCommand::Show => {
            let config = service.read_config().await;
            println!("{}", config.storage_mode);
        }
        ModeCommand::Set { mode } => {
            if !service.set_storage_mode(&mode).await {
                bail!(
                    "could not set storage mode '{}' (expected local, telegram or webdav)",
                    mode
                );
            }
            println!("{}", mode);
        }
    }
    Ok(())
}

async fn run_profile(service: &StorageService, action: ProfileCommand) -> anyhow::Result<()> {
    match action {
        ProfileCommand::List => {
            let config = service.read_config().await;
            if config.webdav_profiles.is_empty() {
                println!("No WebDAV profiles configured");
            }
            if !config.unparsed_profiles.is_empty() {
                println!(
                    "{} malformed WebDAV profile(s) kept as-is in {}",
                    config.unparsed_profiles.len(),
                    service.config_store().path().display()
                );
            }
            for profile in &config.webdav_profiles {
                println!(
                    "{}\t{}\t{}\t{}",
                    profile.user_id,
                    profile.url,
                    profile.username,
                    mask(&profile.password)
                );
            }
        }
        ProfileCommand::Set {
            user_id,
            url,
            username,
            password,
        } => {
            let profile = WebDavProfile {
                user_id,
                url,
                username,
                password,
            };
            if !service.upsert_webdav_profile(profile).await {
                bail!("failed to write {}", service.config_store().path().display());
            }
            println!("Saved WebDAV profile for user {}", user_id);
        }
        ProfileCommand::Remove { user_id } => {
            if !service.remove_webdav_profile(user_id).await {
                bail!("no WebDAV profile removed for user {}", user_id);
            }
            println!("Removed WebDAV profile for user {}", user_id);
        }
        ProfileCommand::Check { user_id } => check_profile(service, user_id).await?,
    }
    Ok(())
}

async fn check_profile(service: &StorageService, user_id: UserId) -> anyhow::Result<()> {
    let config = service.read_config().await;
    let profile = config
        .profile_for(user_id)
        .ok_or_else(|| anyhow!("no WebDAV profile configured for user {}", user_id))?;

    let client = service.client_cache().get_or_connect(profile)?;
    let stat = client
        .stat("/")
        .await
        .with_context(|| format!("PROPFIND {} failed", client.base_url()))?;

    if !stat.is_collection {
        bail!("{} is not a collection", client.base_url());
    }
    println!(
        "OK: {} as {} (last modified {})",
        client.base_url(),
        client.username(),
        stat.last_modified.to_rfc3339()
    );
    Ok(())
}

fn mask(password: &str) -> &'static str {
    if password.is_empty() {
        "(none)"
    } else {
        "********"
    }
}
