use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use spdlog::{info, warn};

use blog_archive::config::Config;
use blog_archive::error::{ErrorKind, IndexKind};
use blog_archive::logger::configure_logger;
use blog_archive::persistent_archive::PersistentArchive;
use blog_archive::post::Post;

use crate::config::open_config;

mod config;

const CFG_FILE_NAME: &str = "blog-archive.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuilds both indexes from the content directory and rewrites the snapshots
    Index,
    /// Copies drafts into the content directory and refreshes the snapshots
    Publish {
        /// Draft files, published one second apart in the given order
        #[arg(required = true)]
        drafts: Vec<PathBuf>,
        /// Publish time of the first draft. Defaults to now
        #[arg(short, long, conflicts_with = "use_mtime")]
        time: Option<i64>,
        /// Publishes each draft at its last modification time
        #[arg(short, long)]
        use_mtime: bool,
    },
    /// Lists posts published between two unix timestamps, inclusive
    Range {
        from: i64,
        to: i64,
    },
    /// Lists posts carrying any of the tags
    Tags {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Lists posts published in a year, month or day
    Date {
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
    },
}

fn open_archive(config: &Config, cfg_path: &str) -> Result<PersistentArchive> {
    let archive_config = config.archive_config(Path::new(cfg_path))?;
    Ok(PersistentArchive::new(archive_config)?)
}

/// Loads an index from its snapshot, generating the snapshot when there is none yet.
fn load(archive: &mut PersistentArchive, kind: IndexKind) -> Result<()> {
    let loaded = match kind {
        IndexKind::Flat => archive.load_flat_archive().map(|_| ()),
        IndexKind::Ymd => archive.load_ymd_archive().map(|_| ()),
    };

    match loaded {
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("{}. Generating the {} snapshot", err, kind);
            match kind {
                IndexKind::Flat => archive.generate_flat_archive().map(|_| ())?,
                IndexKind::Ymd => archive.generate_ymd_archive().map(|_| ())?,
            }
            Ok(())
        }
        other => Ok(other?),
    }
}

fn print_posts<'a>(posts: impl IntoIterator<Item = &'a Post>) {
    for post in posts {
        println!("{}", post);
    }
}

fn run(command: Command, archive: &mut PersistentArchive) -> Result<()> {
    match command {
        Command::Index => {
            let posts = archive.generate_flat_archive()?.len();
            archive.generate_ymd_archive()?;
            println!("Indexed {} posts", posts);
        }
        Command::Publish { drafts, time, use_mtime } => {
            let published = if use_mtime {
                archive.publish_using_mtime(&drafts[..])
            } else {
                archive.publish_all(&drafts[..], time)
            };

            // Drafts published before a failure are already in the content directory
            archive.generate_flat_archive()?;
            archive.generate_ymd_archive()?;

            for post in published? {
                println!("Published {}", post.location().display());
            }
        }
        Command::Range { from, to } => {
            load(archive, IndexKind::Flat)?;
            print_posts(archive.posts_by_range(from, to)?);
        }
        Command::Tags { tags } => {
            load(archive, IndexKind::Flat)?;
            print_posts(archive.posts_by_tags(&tags[..])?);
        }
        Command::Date { year, month, day } => {
            load(archive, IndexKind::Ymd)?;
            print_posts(archive.get_posts_from(year, month, day)?.flatten());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path.map(PathBuf::from);

    let config = match open_config(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:#}", err);
            eprintln!("Please run blog-archive --help");
            return Ok(());
        }
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let cfg_path = config_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| CFG_FILE_NAME.to_string());
    let mut archive = open_archive(&config, &cfg_path)?;
    info!("Using content directory {}", archive.content_dir().display());

    run(args.command, &mut archive)
}
