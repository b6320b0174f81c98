//! Two-phase calibration: arm, draw a distance line of known real length,
//! confirm. Publishing sets the shared scale's pixels-per-unit.

use egui::{ComboBox, TextEdit, Ui};
use tracing::info;

use crate::geometry::{Scale, Unit};

/// Parses the entered known distance and divides the drawn pixel length by
/// it. Non-numeric, zero, or negative inputs are rejected so the scale can
/// never become infinite or negative.
fn compute_pixels_per_unit(pixel_distance: f32, known_distance: &str) -> Option<f32> {
    let known: f32 = known_distance.trim().parse().ok()?;
    if known > 0.0 && pixel_distance > 0.0 {
        Some(pixel_distance / known)
    } else {
        None
    }
}

#[derive(Default)]
pub struct CalibrationPanel {
    armed: bool,
    known_distance: String,
}

impl CalibrationPanel {
    /// `last_distance_px` is the most recently drawn distance line; it is
    /// what confirmation measures against.
    pub fn ui(&mut self, ui: &mut Ui, scale: &mut Scale, last_distance_px: Option<f32>) {
        ui.heading("Calibration");

        ui.horizontal(|ui| {
            ComboBox::from_id_salt("calibration-unit")
                .selected_text(scale.unit.suffix())
                .width(60.0)
                .show_ui(ui, |ui| {
                    for unit in Unit::ALL {
                        ui.selectable_value(&mut scale.unit, unit, unit.suffix());
                    }
                });

            let label = if self.armed {
                "Confirm Calibration"
            } else {
                "Start Calibration"
            };
            if ui.button(label).clicked() {
                if !self.armed {
                    self.armed = true;
                } else if let Some(px) = last_distance_px {
                    // Invalid input is silently ignored; the panel stays
                    // armed so the user can fix it.
                    if let Some(ppu) = compute_pixels_per_unit(px, &self.known_distance) {
                        scale.pixels_per_unit = ppu;
                        info!(
                            pixels_per_unit = ppu,
                            unit = scale.unit.suffix(),
                            "calibration set"
                        );
                        self.armed = false;
                        self.known_distance.clear();
                    }
                }
            }
        });

        if self.armed {
            ui.add(
                TextEdit::singleline(&mut self.known_distance)
                    .hint_text(format!("Known distance ({})", scale.unit.suffix())),
            );
            match last_distance_px {
                Some(px) => {
                    ui.small(format!("Measured line: {px:.1}px"));
                }
                None => {
                    ui.small("Draw a distance line matching the known length");
                }
            }
        } else if scale.is_calibrated() {
            ui.small(format!(
                "{:.2} px per {}",
                scale.pixels_per_unit,
                scale.unit.suffix()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_distance_over_drawn_line() {
        // 10 mm drawn over 100 px -> 10 px per mm.
        assert_eq!(compute_pixels_per_unit(100.0, "10"), Some(10.0));
        assert_eq!(compute_pixels_per_unit(100.0, " 2.5 "), Some(40.0));
    }

    #[test]
    fn invalid_known_distances_are_rejected() {
        assert_eq!(compute_pixels_per_unit(100.0, ""), None);
        assert_eq!(compute_pixels_per_unit(100.0, "abc"), None);
        assert_eq!(compute_pixels_per_unit(100.0, "0"), None);
        assert_eq!(compute_pixels_per_unit(100.0, "-4"), None);
    }

    #[test]
    fn zero_pixel_distance_is_rejected() {
        assert_eq!(compute_pixels_per_unit(0.0, "10"), None);
    }
}
