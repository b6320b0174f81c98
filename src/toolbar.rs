//! Tool selection panel.

use egui::Ui;

use crate::annotation::Tool;

pub fn ui(ui: &mut Ui, tool: &mut Tool) {
    ui.heading("Tools");
    for candidate in Tool::ALL {
        let response = ui
            .selectable_value(tool, candidate, candidate.label())
            .on_hover_text(candidate.description());
        if response.clicked() {
            tracing::debug!(tool = candidate.label(), "tool selected");
        }
    }
}
