//! Exports: annotations stamped into the raster, and a JSON measurement
//! report.

use std::path::Path;

use image::{Rgba, RgbaImage};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::annotation::{Annotation, AnnotationKind};
use crate::geometry::Scale;

const STAMP_COLOR: [u8; 4] = [255, 59, 48, 255];
const STAMP_THICKNESS: f32 = 3.0;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes a copy of the displayed raster with every annotation outline
/// stamped in. Labels and badges stay on screen; the export carries the
/// shapes only.
pub fn annotated_png(
    image: &RgbaImage,
    annotations: &[Annotation],
    path: &Path,
) -> Result<(), ExportError> {
    let mut out = image.clone();
    for ann in annotations {
        stamp(&mut out, &ann.kind);
    }
    out.save(path)?;
    info!(path = %path.display(), count = annotations.len(), "exported annotated image");
    Ok(())
}

fn stamp(img: &mut RgbaImage, kind: &AnnotationKind) {
    match *kind {
        AnnotationKind::Circle { center, radius } => stamp_circle(img, center, radius),
        AnnotationKind::Rectangle { origin, extent } => {
            let (x0, y0) = origin;
            let (x1, y1) = (origin.0 + extent.0, origin.1 + extent.1);
            stamp_line(img, (x0, y0), (x1, y0));
            stamp_line(img, (x1, y0), (x1, y1));
            stamp_line(img, (x1, y1), (x0, y1));
            stamp_line(img, (x0, y1), (x0, y0));
        }
        AnnotationKind::Angle {
            vertex,
            reference,
            arm,
        } => {
            stamp_line(img, reference, vertex);
            stamp_line(img, vertex, arm);
        }
        AnnotationKind::Distance { start, end } => stamp_line(img, start, end),
    }
}

/// Steps along the segment stamping a square brush; clipped at the image
/// edges.
fn stamp_line(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32)) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let len = (dx * dx + dy * dy).sqrt();
    let steps = (len * 2.0) as i32;
    let half = (STAMP_THICKNESS / 2.0).max(0.5) as i32;
    let (w, h) = (img.width() as i32, img.height() as i32);

    for i in 0..=steps {
        let t = i as f32 / steps.max(1) as f32;
        let cx = (from.0 + dx * t) as i32;
        let cy = (from.1 + dy * t) as i32;
        for oy in -half..=half {
            for ox in -half..=half {
                let px = cx + ox;
                let py = cy + oy;
                if px >= 0 && px < w && py >= 0 && py < h {
                    img.put_pixel(px as u32, py as u32, Rgba(STAMP_COLOR));
                }
            }
        }
    }
}

/// Approximates the circle with short chords.
fn stamp_circle(img: &mut RgbaImage, center: (f32, f32), radius: f32) {
    let segments = ((radius * 2.0) as usize).clamp(16, 256);
    let mut prev = (center.0 + radius, center.1);
    for i in 1..=segments {
        let theta = std::f32::consts::TAU * i as f32 / segments as f32;
        let next = (
            center.0 + radius * theta.cos(),
            center.1 + radius * theta.sin(),
        );
        stamp_line(img, prev, next);
        prev = next;
    }
}

#[derive(Serialize)]
struct Report<'a> {
    pixels_per_unit: f32,
    unit: &'static str,
    annotations: &'a [Annotation],
}

/// Serializes the full annotation collection plus the calibration in use.
pub fn write_report(
    path: &Path,
    annotations: &[Annotation],
    scale: &Scale,
) -> Result<(), ExportError> {
    let report = Report {
        pixels_per_unit: scale.pixels_per_unit,
        unit: if scale.is_calibrated() {
            scale.unit.suffix()
        } else {
            "px"
        },
        annotations,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), count = annotations.len(), "exported measurement report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Tool;
    use crate::geometry::Unit;
    use egui::pos2;

    fn annotation(tool: Tool, end: (f32, f32)) -> Annotation {
        let kind = AnnotationKind::from_drag(tool, pos2(4.0, 4.0), pos2(end.0, end.1))
            .expect("drawing tool");
        Annotation::new("t".into(), kind)
    }

    #[test]
    fn stamping_clips_at_image_edges() {
        let mut img = RgbaImage::new(8, 8);
        // Way out of bounds in every direction.
        stamp_line(&mut img, (-50.0, -50.0), (50.0, 50.0));
        stamp_circle(&mut img, (0.0, 0.0), 100.0);
        assert_eq!(img.width(), 8);
    }

    #[test]
    fn stamp_marks_pixels_on_the_segment() {
        let mut img = RgbaImage::new(16, 16);
        stamp(
            &mut img,
            &AnnotationKind::Distance {
                start: (2.0, 8.0),
                end: (13.0, 8.0),
            },
        );
        assert_eq!(img.get_pixel(7, 8).0, STAMP_COLOR);
        assert_eq!(img.get_pixel(7, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn report_serializes_ids_and_scale() {
        let anns = vec![
            annotation(Tool::Circle, (7.0, 8.0)),
            annotation(Tool::Rectangle, (10.0, 12.0)),
        ];
        let scale = Scale {
            pixels_per_unit: 2.0,
            unit: Unit::Cm,
        };
        let report = Report {
            pixels_per_unit: scale.pixels_per_unit,
            unit: scale.unit.suffix(),
            annotations: &anns,
        };
        let json = serde_json::to_string(&report).expect("serializable");
        assert!(json.contains("\"pixels_per_unit\":2.0"));
        assert!(json.contains("\"type\":\"circle\""));
        assert!(json.contains("\"radius\""));
    }
}
