// SPDX-License-Identifier: MIT OR Apache-2.0
//! `vknodes` - node editor for Vulkan pipeline-state objects
//!
//! Opens a canvas with a small demo graph: an attachment description, a
//! color target and a viewer. Press `A` to add nodes, drag between pins to
//! link them, Ctrl+S / Ctrl+L to save and load node positions.
//!
//! Usage: `vknodes [config.ron]`

mod app;
mod config;

use app::EditorApp;
use config::{EditorConfig, CONFIG_FILE_NAME};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter};

fn main() {
    // Logging starts before the config is read; the configured filter is
    // swapped in afterwards unless RUST_LOG is set.
    let from_env = EnvFilter::try_from_default_env().ok();
    let env_override = from_env.is_some();
    let initial = from_env.unwrap_or_else(|| EnvFilter::new(EditorConfig::default().log_filter));
    let (filter, filter_handle) = reload::Layer::new(initial);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), PathBuf::from);

    let config = match EditorConfig::load_or_default(&config_path) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load config {:?}: {err}", config_path);
            std::process::exit(1);
        }
    };

    if !env_override {
        match EnvFilter::try_new(&config.log_filter) {
            Ok(configured) => {
                if let Err(err) = filter_handle.reload(configured) {
                    tracing::warn!("Could not apply log filter: {err}");
                }
            }
            Err(err) => tracing::warn!("Invalid log filter {:?}: {err}", config.log_filter),
        }
    }

    tracing::info!("Starting vknodes v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = EditorApp::run(config) {
        tracing::error!("Editor crashed: {e}");
        std::process::exit(1);
    }
}
