mod app;
mod model;
mod util;

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Workspace snapshot JSON. Falls back to a built-in sample workspace.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "notegraph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::GraphViewerApp::new(
                cc,
                args.snapshot.clone(),
            )))
        }),
    )
}
