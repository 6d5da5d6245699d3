//! `atelier` command line: inspect and prune persisted collections.

mod render;

use anyhow::{Context, bail};
use atelier_rs::store::{ALL_TAGS, RecordId};
use atelier_rs::{AtelierConfig, Studio};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::path::PathBuf;

/// Command-line options for the atelier CLI.
#[derive(Parser)]
#[command(name = "atelier", version)]
struct Cli {
    /// Optional path to an atelier.json5 config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Storage directory, overriding the configured root
    #[arg(long)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Saved gallery images.
    Gallery {
        #[command(subcommand)]
        action: GalleryAction,
    },
    /// Generation history.
    History {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Prompt history.
    Prompts {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Chat conversations.
    Conversations {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Record counts and stored sizes.
    Stats,
}

#[derive(Subcommand)]
enum GalleryAction {
    /// List images, newest first.
    List,
    /// Images whose prompt or tags contain the query.
    Search { query: String },
    /// Images carrying a tag (`all` lists everything).
    Tag { tag: String },
    /// Delete one image by id.
    Delete { id: String },
    /// Delete every image.
    Clear,
}

#[derive(Subcommand)]
enum ListAction {
    /// List entries, newest first.
    List,
}

fn main() -> anyhow::Result<()> {
    atelier_rs::init_logging();
    let cli = Cli::parse();
    info!(
        "starting atelier (config_set={}, root_set={})",
        cli.config.is_some(),
        cli.root.is_some()
    );

    let mut config = if let Some(path) = cli.config.as_ref() {
        AtelierConfig::load_from_path(path).context("failed to load config")?
    } else {
        let cwd = std::env::current_dir().context("cwd")?;
        let layered = AtelierConfig::load_layered(&cwd).context("failed to load layered config")?;
        debug!("layered config loaded (layers={})", layered.layers.len());
        layered.config
    };
    if let Some(root) = cli.root {
        config.storage.root = Some(root);
    }

    let studio = Studio::open_dir(config).context("failed to open storage")?;
    let output = match cli.command {
        Command::Gallery { action } => run_gallery(&studio, action)?,
        Command::History {
            action: ListAction::List,
        } => render::history(studio.image_history().list()),
        Command::Prompts {
            action: ListAction::List,
        } => render::prompts(studio.prompts().list()),
        Command::Conversations {
            action: ListAction::List,
        } => {
            let book = studio.conversations();
            render::conversations(book.conversations(), book.active_id())
        }
        Command::Stats => render::stats(&studio.stats()),
    };
    print!("{output}");
    Ok(())
}

fn run_gallery<A>(studio: &Studio<A>, action: GalleryAction) -> anyhow::Result<String>
where
    A: atelier_rs::store::PersistenceAdapter,
{
    let mut gallery = studio.gallery();
    let output = match action {
        GalleryAction::List => render::gallery(gallery.filter_by_tag(Some(ALL_TAGS))),
        GalleryAction::Search { query } => render::gallery(gallery.search(Some(&query))),
        GalleryAction::Tag { tag } => render::gallery(gallery.filter_by_tag(Some(&tag))),
        GalleryAction::Delete { id } => {
            let id = RecordId::from(id);
            if gallery.get(&id).is_none() {
                bail!("no gallery image with id {id}");
            }
            let status = gallery.delete(&id);
            render::persisted(&format!("deleted {id}"), &status)
        }
        GalleryAction::Clear => {
            let count = gallery.len();
            let status = gallery.clear();
            render::persisted(&format!("cleared {count} images"), &status)
        }
    };
    Ok(output)
}
