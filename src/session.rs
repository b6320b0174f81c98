//! Coordinator-owned state: the ordered annotation collection and the
//! shared calibration scale. Panels get read-only snapshots; mutations all
//! come back through here.

use tracing::debug;

use crate::annotation::Annotation;
use crate::geometry::Scale;

#[derive(Default)]
pub struct Session {
    annotations: Vec<Annotation>,
    pub scale: Scale,
}

impl Session {
    /// Insertion order defines the on-canvas numbering (1-based position).
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn push(&mut self, annotation: Annotation) {
        debug!(id = %annotation.id, kind = annotation.kind_label(), "annotation committed");
        self.annotations.push(annotation);
    }

    pub fn delete(&mut self, id: &str) {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        if self.annotations.len() != before {
            debug!(id, "annotation deleted");
        }
    }

    /// Drops all annotations and the calibration; used when the image is
    /// cleared or replaced.
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.scale = Scale::default();
    }

    /// Pixel length of the most recently drawn distance line, if any.
    /// Calibration confirms against this value.
    pub fn last_distance_px(&self) -> Option<f32> {
        self.annotations
            .iter()
            .rev()
            .find_map(|a| a.measurements.distance)
    }
}
