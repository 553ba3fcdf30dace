use std::path::PathBuf;
use std::process::ExitCode;

use bevy::prelude::*;
use tracing::{error, info, warn};

use cartograpy::config::{AddRecentMapRequest, ConfigPlugin, EditorConfig};
use cartograpy::editor::EditorPlugin;
use cartograpy::editor::history::MAX_HISTORY_SIZE;
use cartograpy::geometry::Viewport;
use cartograpy::map::{MapDocument, MapPlugin, load_map};
use cartograpy::paths;
use cartograpy::render::{AssetHandle, AssetNotFound, AssetProvider, collect_draw_instructions};

/// Set up stdout and file logging for debug builds
#[cfg(debug_assertions)]
fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use tracing_subscriber::prelude::*;

    let logs_dir = paths::logs_dir();
    if std::fs::create_dir_all(&logs_dir).is_err() {
        eprintln!("Failed to create logs directory");
        return None;
    }

    let log_file_path = logs_dir.join("cartograpy.log");

    // Append session separator to existing log file
    if let Ok(mut file) = OpenOptions::new().append(true).open(&log_file_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let separator = "=".repeat(80);
        let _ = writeln!(
            file,
            "\n\n{}\n=== New Session Started at {} ===\n{}\n",
            separator, timestamp, separator
        );
    }

    let file_appender = tracing_appender::rolling::never(&logs_dir, "cartograpy.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // No ANSI colors in the file
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_level(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,cartograpy=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(guard)
}

/// Stdout logging only for release builds
#[cfg(not(debug_assertions))]
fn setup_logging() -> Option<()> {
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();
    None
}

/// Treats every tile reference as loaded; the command line has no image data
struct HeadlessTiles;

impl AssetProvider for HeadlessTiles {
    fn resolve_asset(&self, tileset: u32, tile: u32) -> Result<AssetHandle, AssetNotFound> {
        Ok(AssetHandle(((tileset as u64) << 32) | tile as u64))
    }
}

fn log_summary(doc: &MapDocument) {
    let bounds = doc.bounds();
    info!(
        "Map {:?}: {}x{} cells of {} px, {} layers, {} elements",
        doc.name,
        bounds.width,
        bounds.height,
        doc.cell_size(),
        doc.layer_count(),
        doc.element_count()
    );
    for (index, layer) in doc.layers().iter().enumerate() {
        info!(
            "  [{}] {} (id {}): {} elements{}{}{}",
            index,
            layer.name,
            layer.id(),
            layer.element_count(),
            if layer.visible { "" } else { ", hidden" },
            if layer.locked { ", locked" } else { "" },
            if layer.is_exclusive() { ", exclusive" } else { "" },
        );
    }
    let instructions = collect_draw_instructions(doc, &Viewport::default(), &HeadlessTiles);
    info!("{} draw instructions in the default viewport", instructions.len());
}

fn main() -> ExitCode {
    // Keep the guard alive for the duration of the program
    let _log_guard = setup_logging();

    if let Err(e) = paths::ensure_directories() {
        warn!("Failed to create data directories: {}", e);
    }

    let map_path = std::env::args_os().nth(1).map(PathBuf::from);

    let mut app = App::new();
    app.add_plugins(ConfigPlugin);

    if let Some(path) = &map_path {
        let history_depth = app
            .world()
            .get_resource::<EditorConfig>()
            .map(|config| config.data.history_depth)
            .unwrap_or(MAX_HISTORY_SIZE);
        match load_map(path, history_depth) {
            Ok(doc) => {
                app.insert_resource(doc);
            }
            Err(e) => {
                error!("Failed to load {:?}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    }

    app.add_plugins((MapPlugin, EditorPlugin));

    if let Some(doc) = app.world().get_resource::<MapDocument>() {
        log_summary(doc);
    }

    // One frame runs the config systems, which record the map and save
    if let Some(path) = map_path {
        app.world_mut().write_message(AddRecentMapRequest { path });
        app.update();
    }

    ExitCode::SUCCESS
}
