use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use crossbeam_channel::select;

use pollwatch::{Digest, PollWatcher, Settings, WatchedFile, WatcherConfig};

#[derive(Parser)]
#[command(name = "pollwatch")]
#[command(about = "Watch files for content changes by polling", version)]
struct Cli {
    /// Settings file (defaults to .pollwatch/settings.toml, searched upwards)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch files and print changes as they are detected
    Watch {
        /// Files to watch
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Milliseconds between scans (overrides config)
        #[arg(short, long, env = "PW_INTERVAL_MS")]
        interval_ms: Option<u64>,

        /// Compare SHA-256 digests instead of raw content (overrides config)
        #[arg(short, long, overrides_with = "no_digest")]
        digest: bool,

        /// Compare raw content even if config enables digests
        #[arg(long, overrides_with = "digest")]
        no_digest: bool,

        /// Tag attached to every watched file
        #[arg(short, long, default_value = "")]
        tag: String,

        /// Exit after this many change events
        #[arg(long)]
        max_events: Option<usize>,
    },

    /// Show effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow!("Failed to load settings: {e}"))?;

    pollwatch::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Config => {
            let rendered = toml::to_string_pretty(&settings).context("Failed to render settings")?;
            print!("{rendered}");
            Ok(())
        }
        Commands::Watch {
            files,
            interval_ms,
            digest,
            no_digest,
            tag,
            max_events,
        } => {
            let config = match interval_ms {
                Some(ms) => WatcherConfig::new(Duration::from_millis(ms)),
                None => WatcherConfig::from_settings(&settings),
            }
            .context("Invalid poll interval")?;

            let use_digest = resolve_digest(digest, no_digest, settings.watcher.digest);
            watch(config, &files, use_digest, &tag, max_events)
        }
    }
}

/// Command-line flags win over the configured default.
fn resolve_digest(digest: bool, no_digest: bool, configured: bool) -> bool {
    if no_digest {
        false
    } else {
        digest || configured
    }
}

fn watch(
    config: WatcherConfig,
    paths: &[PathBuf],
    digest: bool,
    tag: &str,
    max_events: Option<usize>,
) -> Result<()> {
    let mut watcher = PollWatcher::builder().config(config).build()?;

    for path in paths {
        let mut builder = WatchedFile::builder(path).tag(tag);
        if digest {
            builder = builder.strategy(Digest);
        }
        let file = builder
            .build()
            .with_context(|| format!("Cannot watch {}", path.display()))?;
        watcher.add_file(file);
    }

    let (events, errors) = watcher.start()?;
    eprintln!(
        "Watching {} file(s) every {:?}",
        watcher.len(),
        config.poll_interval()
    );

    let mut received = 0usize;
    loop {
        select! {
            recv(events) -> msg => {
                let Ok(event) = msg else { break };
                for file in event.files() {
                    let file_tag = file.tag();
                    if file_tag.is_empty() {
                        println!("changed {}", file.path().display());
                    } else {
                        println!("changed {} [{file_tag}]", file.path().display());
                    }
                }
                received += 1;
                if max_events.is_some_and(|max| received >= max) {
                    break;
                }
            }
            recv(errors) -> msg => {
                let Ok(err) = msg else { break };
                eprintln!("error: {err}");
            }
        }
    }

    watcher.stop()?;
    Ok(())
}
