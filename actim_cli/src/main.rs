mod commands;

use actim_core::{AppContext, Config, StaticCatalog};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "actim", version, about = "Inspect and drive local ACTIM learning state")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory from the configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the catalog file from the configuration
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Mark a module complete within a pathway
    Complete {
        #[arg(long)]
        pathway: String,
        #[arg(long)]
        module: String,
    },
    /// Show per-pathway and overall progress
    Progress {
        /// Only show this pathway
        #[arg(long)]
        pathway: Option<String>,
    },
    /// Manage favorite modules
    #[command(subcommand)]
    Favorite(FavoriteCommand),
    /// Manage notes
    #[command(subcommand)]
    Note(NoteCommand),
    /// Audio resume positions
    #[command(subcommand)]
    Playback(PlaybackCommand),
    /// List recorded analytics events
    Events {
        /// Only show events of this type
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Summarize usage from the analytics log
    Report,
}

#[derive(Debug, Subcommand)]
enum FavoriteCommand {
    /// Flip the favorite state of a module
    Toggle { module: String },
    /// List favorites with module details
    List,
}

#[derive(Debug, Subcommand)]
enum NoteCommand {
    /// Save a text note
    Add {
        module: String,
        #[arg(long)]
        text: String,
    },
    /// Save an audio note from an existing recording
    Record {
        module: String,
        #[arg(long)]
        audio_path: String,
        /// Recording length in seconds
        #[arg(long)]
        duration: f64,
        /// Save even when the recording is shorter than the minimum
        #[arg(long)]
        force: bool,
    },
    /// List notes, newest first
    List {
        #[arg(long)]
        module: Option<String>,
    },
    /// Replace the text of a note
    Update {
        id: String,
        #[arg(long)]
        text: String,
    },
    /// Delete a note
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum PlaybackCommand {
    /// Remember a playback position (milliseconds)
    Save {
        module: String,
        #[arg(long)]
        position: u64,
        #[arg(long)]
        duration: u64,
    },
    /// Show the saved position for a module
    Show { module: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(catalog) = cli.catalog {
        config.catalog = Some(catalog);
    }
    debug!(?config, "Resolved configuration");

    let catalog = match &config.catalog {
        Some(path) => StaticCatalog::load(path)
            .await
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => {
            warn!("No catalog configured; joins will find no modules");
            StaticCatalog::default()
        }
    };

    let app = AppContext::open(&config)
        .await
        .with_context(|| format!("failed to open {}", config.data_dir.display()))?;

    commands::run(&app, &catalog, cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_record() {
        let cli = Cli::try_parse_from([
            "actim",
            "--data-dir",
            "/tmp/state",
            "note",
            "record",
            "m1",
            "--audio-path",
            "rec.m4a",
            "--duration",
            "3.5",
            "--force",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/state")));
        match cli.command {
            Commands::Note(NoteCommand::Record {
                module,
                duration,
                force,
                ..
            }) => {
                assert_eq!(module, "m1");
                assert_eq!(duration, 3.5);
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_events_filter() {
        let cli = Cli::try_parse_from(["actim", "events", "--type", "audio_play"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Events { kind: Some(ref k) } if k == "audio_play"
        ));
    }

    #[test]
    fn test_complete_requires_pathway() {
        assert!(Cli::try_parse_from(["actim", "complete", "--module", "m1"]).is_err());
    }
}
