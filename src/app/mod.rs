use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};

use crate::model::{self, GraphSnapshot, SnapshotFile};

mod graph;
mod highlight;
mod render_utils;
mod scene;
mod sim;
mod ui;

use highlight::HighlightState;
use render_utils::parse_hex_color;
use scene::VisualConfig;
use sim::Simulation;

/// Invoked with `Some(id)` when a node is clicked and `None` on deselect.
pub type SelectionCallback = Box<dyn FnMut(Option<&str>)>;

pub struct GraphViewerApp {
    snapshot_path: Option<PathBuf>,
    state: AppState,
    reload_rx: Option<Receiver<Result<SnapshotFile, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<SnapshotFile, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragState {
    Idle,
    /// Primary drag started on a node: the node is pinned to the pointer.
    Node { node: usize },
    /// Primary drag started on empty canvas.
    Pan,
}

/// Per-session state for one mounted graph view. The simulation (when
/// present) is the sole writer of positions/velocities; the interaction
/// handlers are the sole writers of pins, pan/zoom, and highlight state.
struct ViewModel {
    snapshot: GraphSnapshot,
    config: VisualConfig,
    selected: Option<String>,
    hovered: Option<usize>,
    highlight: Option<HighlightState>,
    pan: Vec2,
    zoom: f32,
    drag: DragState,
    simulation: Option<Simulation>,
    /// Set when the node/connection set (or another force-affecting input)
    /// changed; the next frame replaces the solver instance wholesale.
    simulation_dirty: bool,
    view_seeded: bool,
    on_select: Option<SelectionCallback>,
}

impl ViewModel {
    fn new(file: SnapshotFile, on_select: Option<SelectionCallback>) -> Self {
        let config = visual_config_from(&file);
        let snapshot = GraphSnapshot::new(file.nodes, file.connections);

        Self {
            snapshot,
            config,
            selected: None,
            hovered: None,
            highlight: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            drag: DragState::Idle,
            simulation: None,
            simulation_dirty: true,
            view_seeded: false,
            on_select,
        }
    }

    fn apply_selection(&mut self, selection: Option<String>) {
        if let Some(callback) = &mut self.on_select {
            callback(selection.as_deref());
        }
        log::debug!("selection changed to {selection:?}");
        self.selected = selection;
    }

    fn show(
        &mut self,
        ctx: &Context,
        snapshot_path: Option<&PathBuf>,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        self.side_panel(ctx, snapshot_path, reload_requested, is_reloading);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_graph(ui);
            });
    }
}

fn visual_config_from(file: &SnapshotFile) -> VisualConfig {
    let mut category_colors = HashMap::new();
    for (category, raw) in &file.category_colors {
        if let Some(color) = parse_hex_color(raw) {
            category_colors.insert(category.to_ascii_lowercase(), color);
        } else {
            log::warn!("ignoring unparseable category color {raw:?} for {category:?}");
        }
    }

    let mut connection_colors = HashMap::new();
    for (kind, raw) in &file.connection_colors {
        let Ok(kind) = serde_json::from_value(serde_json::Value::String(kind.clone())) else {
            log::warn!("ignoring color for unknown connection kind {kind:?}");
            continue;
        };
        if let Some(color) = parse_hex_color(raw) {
            connection_colors.insert(kind, color);
        } else {
            log::warn!("ignoring unparseable connection color {raw:?}");
        }
    }

    VisualConfig {
        show_connection_labels: file.show_connection_labels,
        category_colors,
        connection_colors,
    }
}

impl GraphViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, snapshot_path: Option<PathBuf>) -> Self {
        let state = Self::start_load(snapshot_path.clone());
        Self {
            snapshot_path,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(snapshot_path: Option<PathBuf>) -> Receiver<Result<SnapshotFile, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = match snapshot_path {
                Some(path) => model::load_snapshot(&path).map_err(|error| format!("{error:#}")),
                None => Ok(model::sample_workspace()),
            };
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(snapshot_path: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(snapshot_path),
        }
    }

    fn ready_model(file: SnapshotFile) -> AppState {
        let on_select: SelectionCallback =
            Box::new(|selection| log::info!("node selected: {selection:?}"));
        AppState::Ready(Box::new(ViewModel::new(file, Some(on_select))))
    }
}

impl eframe::App for GraphViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(file) => Self::ready_model(file),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading workspace snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load workspace snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.snapshot_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(
                    ctx,
                    self.snapshot_path.as_ref(),
                    &mut reload_requested,
                    is_reloading,
                );

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.snapshot_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(file) => Self::ready_model(file),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
