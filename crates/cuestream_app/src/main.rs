// SPDX-License-Identifier: MIT OR Apache-2.0
//! `cuestream` - play a cue sheet headlessly
//!
//! Usage: `cuestream [config.ron]`
//!
//! Without a config the built-in demo sheet runs at 60 frames per second.
//! Set `RUST_LOG` to change the log filter.

use cuestream_app::{AppConfig, CueSheet, CueSheetError, Host};
use cuestream_sequencer::ConfigError;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load cue sheet: {0}")]
    CueSheet(#[from] CueSheetError),
}

fn run(config_path: Option<PathBuf>) -> Result<(), RunError> {
    let config = match config_path {
        Some(path) => {
            tracing::info!("Loading config from {:?}", path);
            AppConfig::load(&path)?
        }
        None => AppConfig::default(),
    };

    let sheet = match &config.cue_sheet {
        Some(path) => {
            tracing::info!("Loading cue sheet from {:?}", path);
            CueSheet::load(path)?
        }
        None => {
            tracing::info!("No cue sheet configured, playing the demo");
            CueSheet::demo()?
        }
    };

    let mut host = Host::new(config);
    host.load(&sheet)?;
    let summary = host.run();
    tracing::info!(
        "Played {} frames, {:.2}s simulated, {} unfinished",
        summary.frames,
        summary.elapsed.as_secs_f32(),
        summary.unfinished
    );
    Ok(())
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cuestream_app=debug,cuestream_sequencer=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cuestream v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(std::env::args_os().nth(1).map(PathBuf::from)) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
