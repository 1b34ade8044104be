//! Baget device - a file that is never the same twice.

use anyhow::Context;
use baget_fs::{MountConfig, MountLifecycle, SharedRng};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "baget")]
#[command(author, version, long_about = None)]
#[command(
    about = "Mount a file that holds a new random baget every time it is read",
    long_about = "Mounts a single read-only FUSE file under a private temporary directory and \
                  publishes it through a symlink. Every open generates new content."
)]
struct Cli {
    /// Where to create the baget device symlink
    #[arg(long)]
    path: PathBuf,

    /// Directory to create the private mount root in (default: system temp dir)
    #[arg(long)]
    mount_parent: Option<PathBuf>,

    /// Name of the file inside the mount root
    #[arg(long, default_value = baget_fs::config::DEFAULT_FILE_NAME)]
    name: String,

    /// Allow other users to read the device (needs user_allow_other in /etc/fuse.conf)
    #[arg(long)]
    allow_other: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "baget_fs=debug,baget=debug,warn"
    } else {
        "baget_fs=info,baget=info,warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = MountConfig::new(cli.path)
        .with_file_name(cli.name)
        .with_allow_other(cli.allow_other);
    if let Some(dir) = cli.mount_parent {
        config = config.with_mount_parent(dir);
    }

    let link = config.link_path.clone();
    let mut lifecycle = MountLifecycle::new(config, Arc::new(SharedRng::from_time()));
    let shutdown = lifecycle
        .run()
        .with_context(|| format!("baget device at {}", link.display()))?;

    tracing::debug!(?shutdown, "exiting");
    Ok(shutdown.exit_code())
}
