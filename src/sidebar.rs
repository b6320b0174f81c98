//! Measurement list: one numbered entry per annotation, with delete and
//! export actions reported back to the coordinator.

use egui::{ScrollArea, Ui};

use crate::annotation::Annotation;
use crate::geometry::Scale;

pub enum SidebarEvent {
    Delete(String),
    ExportReport,
    ExportImage,
}

pub fn ui(ui: &mut Ui, annotations: &[Annotation], scale: &Scale) -> Option<SidebarEvent> {
    let mut event = None;

    ui.heading("Measurements");
    ui.small(format!(
        "{} annotation{}",
        annotations.len(),
        if annotations.len() == 1 { "" } else { "s" }
    ));
    ui.separator();

    ScrollArea::vertical()
        .id_salt("measurements")
        .max_height((ui.available_height() - 60.0).max(120.0))
        .show(ui, |ui| {
            if annotations.is_empty() {
                ui.weak("No measurements yet");
            }
            for (index, ann) in annotations.iter().enumerate() {
                ui.group(|ui| {
                    ui.strong(format!("{} {}", index + 1, ann.kind_label()));
                    for line in ann.detail_lines(scale) {
                        ui.label(line);
                    }
                    if ui.small_button("Delete").clicked() {
                        event = Some(SidebarEvent::Delete(ann.id.clone()));
                    }
                });
            }
        });

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Export report…").clicked() {
            event = Some(SidebarEvent::ExportReport);
        }
        if ui.button("Export image…").clicked() {
            event = Some(SidebarEvent::ExportImage);
        }
    });

    event
}
