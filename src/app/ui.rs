use std::path::PathBuf;

use eframe::egui::{self, Context, RichText, Ui, Vec2};

use crate::model::Node;

use super::graph::{ZOOM_MAX, ZOOM_MIN};
use super::scene::display_name;
use super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn side_panel(
        &mut self,
        ctx: &Context,
        snapshot_path: Option<&PathBuf>,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        egui::SidePanel::right("workspace_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Workspace Graph");
                ui.add_space(6.0);

                match snapshot_path {
                    Some(path) => ui.small(format!("snapshot: {}", path.display())),
                    None => ui.small("snapshot: built-in sample workspace"),
                };
                ui.label(format!("entities: {}", self.snapshot.nodes.len()));
                ui.label(format!("connections: {}", self.snapshot.connections.len()));

                ui.separator();
                ui.checkbox(
                    &mut self.config.show_connection_labels,
                    "Show connection labels",
                );

                ui.horizontal(|ui| {
                    ui.label("Zoom");
                    ui.add(
                        egui::Slider::new(&mut self.zoom, ZOOM_MIN..=ZOOM_MAX).logarithmic(true),
                    );
                });
                if ui.button("Reset view").clicked() {
                    self.pan = Vec2::ZERO;
                    self.zoom = 1.0;
                }

                if snapshot_path.is_some() {
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                }

                ui.separator();
                self.draw_details(ui);

                ui.separator();
                ui.small("drag node: reposition (pins while held)");
                ui.small("drag canvas / right drag: pan");
                ui.small("scroll: zoom at pointer");
                ui.small("click: select, Esc: cancel gesture");
            });
    }

    fn draw_details(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Selection").strong());
        ui.add_space(4.0);

        let Some(index) = self
            .selected
            .as_ref()
            .and_then(|id| self.snapshot.index_by_id.get(id).copied())
        else {
            ui.label("Click a node to inspect it.");
            return;
        };
        let Some(node) = self.snapshot.nodes.get(index) else {
            ui.label("Selected node is no longer in the snapshot.");
            return;
        };

        let name = node.name.clone();
        let id = node.id.clone();
        let kind = node.kind;
        let category = node.category.clone();
        let size = node.size;
        let neighbors = self.neighbor_entries(index);

        ui.label(RichText::new(name).strong());
        ui.small(id);
        ui.label(format!("kind: {kind:?}"));
        ui.label(format!("category: {category}"));
        ui.label(format!("size: {size:.0}"));

        ui.add_space(4.0);
        ui.label(RichText::new("Connected entities").strong());
        let mut pending = None;
        if neighbors.is_empty() {
            ui.label("No connections.");
        }
        for (neighbor_id, label) in neighbors {
            if ui.button(label).clicked() {
                pending = Some(neighbor_id);
            }
        }

        if ui.button("Close").clicked() {
            self.apply_selection(None);
        } else if let Some(neighbor_id) = pending {
            self.apply_selection(Some(neighbor_id));
        }
    }

    fn neighbor_entries(&self, index: usize) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .snapshot
            .neighbors(index)
            .into_iter()
            .filter_map(|neighbor| self.snapshot.nodes.get(neighbor))
            .map(|node: &Node| (node.id.clone(), display_name(node.kind, &node.name)))
            .collect();
        entries.sort();
        entries.dedup();
        entries
    }
}
