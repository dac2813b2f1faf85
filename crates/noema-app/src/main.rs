//! Noema viewer: one knowledge graph, four live projections.
//!
//! Loads a graph snapshot (the `{ nodes, links }` document produced by
//! the conversation backend) and renders it as a force-directed 3D
//! scene, a drill-down hierarchy, a dense adjacency matrix, and a
//! banded timeline. Keys 1–4 switch views; F5 reloads the snapshot.

use bevy::prelude::*;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod snapshot;
mod theme;
mod ui;

/// Command-line options.
#[derive(Parser, Debug)]
#[command(name = "noema", about = "Knowledge graph viewer")]
struct Args {
    /// Path to a graph snapshot JSON file ({ nodes, links }).
    graph: Option<std::path::PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up file logging
    let log_dir = std::env::var("NOEMA_LOG_DIR").unwrap_or_else(|_| "/tmp".to_string());
    let file_appender = tracing_appender::rolling::never(&log_dir, "noema.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to debug for our crates, warn for others
            "noema_app=debug,noema_graph=debug,warn".into()
        }))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting noema - logging to {}/noema.log", log_dir);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "noema".into(),
                resolution: (1280, 800).into(),
                ..default()
            }),
            ..default()
        }))
        .init_resource::<theme::Theme>()
        .insert_resource(snapshot::GraphSource::new(args.graph))
        .add_plugins(snapshot::SnapshotPlugin)
        .add_plugins(ui::ViewShellPlugin)
        .run();

    Ok(())
}
