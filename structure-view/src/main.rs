//! Application entry point for the plant structure viewer.
//!
//! This binary sets up logging and eframe/egui, and delegates the
//! simulated season and its plots to [`Viewer`] from the `viewer` module.

mod host;
mod viewer;

use tracing_subscriber::EnvFilter;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// Logging goes through `tracing`; set `RUST_LOG` (e.g.
/// `RUST_LOG=structure_core=debug`) to see branching and mortality events.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting plant structure viewer");

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Plant Structure",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new()))),
    )
}
