//! Annotation records: typed shapes in image-pixel space plus the
//! measurements derived once at commit time.

use egui::{pos2, Pos2};
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Scale};

/// Length of the fixed horizontal reference arm for the angle tool, in
/// image pixels. The arm always points left from the drag-start point, so
/// angles are measured against a horizontal reference.
pub const ANGLE_REFERENCE_ARM: f32 = 50.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    Move,
    Circle,
    Rectangle,
    Angle,
    Distance,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Move,
        Tool::Circle,
        Tool::Rectangle,
        Tool::Angle,
        Tool::Distance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Move => "Move",
            Tool::Circle => "Circle",
            Tool::Rectangle => "Rectangle",
            Tool::Angle => "Angle",
            Tool::Distance => "Distance",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::Move => "Pan and zoom the view",
            Tool::Circle => "Measure radius and circumference",
            Tool::Rectangle => "Measure width, height and area",
            Tool::Angle => "Measure angles against horizontal",
            Tool::Distance => "Measure straight-line distances",
        }
    }

    /// The move tool creates no shapes.
    pub fn draws(self) -> bool {
        self != Tool::Move
    }
}

/// Shape payloads, all in image-pixel coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationKind {
    Circle {
        center: (f32, f32),
        radius: f32,
    },
    /// `extent` keeps the signed drag direction; display paths take
    /// absolute values.
    Rectangle {
        origin: (f32, f32),
        extent: (f32, f32),
    },
    /// `reference` is the synthetic horizontal arm endpoint, `arm` the
    /// user-controlled one.
    Angle {
        vertex: (f32, f32),
        reference: (f32, f32),
        arm: (f32, f32),
    },
    Distance {
        start: (f32, f32),
        end: (f32, f32),
    },
}

fn p(t: (f32, f32)) -> Pos2 {
    pos2(t.0, t.1)
}

impl AnnotationKind {
    /// Shape for a drag from `start` to `end`. `None` for the move tool.
    /// Zero-length drags are valid and yield zero-measure shapes.
    pub fn from_drag(tool: Tool, start: Pos2, end: Pos2) -> Option<Self> {
        let kind = match tool {
            Tool::Move => return None,
            Tool::Circle => AnnotationKind::Circle {
                center: (start.x, start.y),
                radius: geometry::distance(start, end),
            },
            Tool::Rectangle => AnnotationKind::Rectangle {
                origin: (start.x, start.y),
                extent: (end.x - start.x, end.y - start.y),
            },
            Tool::Angle => AnnotationKind::Angle {
                vertex: (start.x, start.y),
                reference: (start.x - ANGLE_REFERENCE_ARM, start.y),
                arm: (end.x, end.y),
            },
            Tool::Distance => AnnotationKind::Distance {
                start: (start.x, start.y),
                end: (end.x, end.y),
            },
        };
        Some(kind)
    }

    /// Derives the measurement set from the stored shape. Committed records
    /// cache the result; the two must always agree.
    pub fn measure(&self) -> Measurements {
        match *self {
            AnnotationKind::Circle { radius, .. } => Measurements {
                radius: Some(radius),
                circumference: Some(geometry::circumference(radius)),
                ..Measurements::default()
            },
            AnnotationKind::Rectangle { extent, .. } => Measurements {
                width: Some(extent.0.abs()),
                height: Some(extent.1.abs()),
                ..Measurements::default()
            },
            AnnotationKind::Angle {
                vertex,
                reference,
                arm,
            } => Measurements {
                angle: Some(geometry::sweep_angle(p(vertex), p(reference), p(arm))),
                ..Measurements::default()
            },
            AnnotationKind::Distance { start, end } => Measurements {
                distance: Some(geometry::distance(p(start), p(end))),
                ..Measurements::default()
            },
        }
    }

    /// Anchor point for the numbered badge: circle top-left of the bounding
    /// box, rectangle anchor corner, angle vertex, line start.
    pub fn badge_anchor(&self) -> Pos2 {
        match *self {
            AnnotationKind::Circle { center, radius } => {
                pos2(center.0 - radius, center.1 - radius)
            }
            AnnotationKind::Rectangle { origin, .. } => p(origin),
            AnnotationKind::Angle { vertex, .. } => p(vertex),
            AnnotationKind::Distance { start, .. } => p(start),
        }
    }

    /// One-line readout shown while the shape is being dragged out.
    pub fn readout(&self, scale: &Scale) -> String {
        let m = self.measure();
        match self {
            AnnotationKind::Circle { .. } => format!(
                "Radius: {}, Circumference: {}",
                scale.format_length(m.radius.unwrap_or(0.0)),
                scale.format_length(m.circumference.unwrap_or(0.0)),
            ),
            AnnotationKind::Rectangle { .. } => {
                let w = m.width.unwrap_or(0.0);
                let h = m.height.unwrap_or(0.0);
                format!(
                    "Width: {}, Height: {}, Area: {}",
                    scale.format_length(w),
                    scale.format_length(h),
                    scale.format_area(w * h),
                )
            }
            AnnotationKind::Angle { .. } => {
                format!("Angle: {}", geometry::format_degrees(m.angle.unwrap_or(0.0)))
            }
            AnnotationKind::Distance { .. } => {
                format!("Distance: {}", scale.format_length(m.distance.unwrap_or(0.0)))
            }
        }
    }
}

/// Derived scalar measurements, precomputed at commit time. Area is never
/// stored; it is always recomputed from the absolute extents on demand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circumference: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// A committed annotation. Immutable once created; deleted only by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    #[serde(flatten)]
    pub kind: AnnotationKind,
    pub measurements: Measurements,
}

impl Annotation {
    pub fn new(id: String, kind: AnnotationKind) -> Self {
        let measurements = kind.measure();
        Self {
            id,
            kind,
            measurements,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            AnnotationKind::Circle { .. } => "Circle",
            AnnotationKind::Rectangle { .. } => "Rectangle",
            AnnotationKind::Angle { .. } => "Angle",
            AnnotationKind::Distance { .. } => "Distance",
        }
    }

    /// Short label lines drawn next to the shape on the canvas.
    pub fn label_lines(&self, scale: &Scale) -> Vec<String> {
        let m = &self.measurements;
        match self.kind {
            AnnotationKind::Circle { .. } => vec![
                format!("r: {}", scale.format_length(m.radius.unwrap_or(0.0))),
                format!("c: {}", scale.format_length(m.circumference.unwrap_or(0.0))),
            ],
            AnnotationKind::Rectangle { .. } => {
                let w = m.width.unwrap_or(0.0);
                let h = m.height.unwrap_or(0.0);
                vec![
                    format!("{} × {}", scale.format_length(w), scale.format_length(h)),
                    format!("Area: {}", scale.format_area(w * h)),
                ]
            }
            AnnotationKind::Angle { .. } => {
                vec![geometry::format_degrees(m.angle.unwrap_or(0.0))]
            }
            AnnotationKind::Distance { .. } => {
                vec![scale.format_length(m.distance.unwrap_or(0.0))]
            }
        }
    }

    /// Long-form lines for the sidebar list.
    pub fn detail_lines(&self, scale: &Scale) -> Vec<String> {
        let m = &self.measurements;
        match self.kind {
            AnnotationKind::Circle { .. } => vec![
                format!("Radius: {}", scale.format_length(m.radius.unwrap_or(0.0))),
                format!(
                    "Circumference: {}",
                    scale.format_length(m.circumference.unwrap_or(0.0))
                ),
            ],
            AnnotationKind::Rectangle { .. } => {
                let w = m.width.unwrap_or(0.0);
                let h = m.height.unwrap_or(0.0);
                vec![
                    format!("Width: {}", scale.format_length(w)),
                    format!("Height: {}", scale.format_length(h)),
                    format!("Area: {}", scale.format_area(w * h)),
                ]
            }
            AnnotationKind::Angle { .. } => {
                vec![format!(
                    "Angle: {}",
                    geometry::format_degrees(m.angle.unwrap_or(0.0))
                )]
            }
            AnnotationKind::Distance { .. } => {
                vec![format!(
                    "Distance: {}",
                    scale.format_length(m.distance.unwrap_or(0.0))
                )]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Unit;
    use egui::pos2;

    #[test]
    fn move_tool_creates_nothing() {
        assert_eq!(
            AnnotationKind::from_drag(Tool::Move, pos2(1.0, 2.0), pos2(3.0, 4.0)),
            None
        );
    }

    #[test]
    fn circle_drag_measures_radius_and_circumference() {
        let kind = AnnotationKind::from_drag(Tool::Circle, pos2(0.0, 0.0), pos2(3.0, 4.0))
            .expect("circle tool draws");
        let ann = Annotation::new("1".into(), kind);
        assert_eq!(ann.measurements.radius, Some(5.0));
        let c = ann.measurements.circumference.expect("circumference set");
        assert!((c - 31.4).abs() < 0.02);
    }

    #[test]
    fn rectangle_keeps_signed_extent_but_measures_absolute() {
        let kind = AnnotationKind::from_drag(Tool::Rectangle, pos2(10.0, 10.0), pos2(4.0, 30.0))
            .expect("rectangle tool draws");
        match kind {
            AnnotationKind::Rectangle { origin, extent } => {
                assert_eq!(origin, (10.0, 10.0));
                assert_eq!(extent, (-6.0, 20.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
        let m = kind.measure();
        assert_eq!(m.width, Some(6.0));
        assert_eq!(m.height, Some(20.0));
    }

    #[test]
    fn zero_drag_rectangle_is_empty_not_a_panic() {
        let kind = AnnotationKind::from_drag(Tool::Rectangle, pos2(10.0, 10.0), pos2(10.0, 10.0))
            .expect("rectangle tool draws");
        let m = kind.measure();
        assert_eq!(m.width, Some(0.0));
        assert_eq!(m.height, Some(0.0));
    }

    #[test]
    fn angle_drag_synthesizes_horizontal_reference_arm() {
        let kind = AnnotationKind::from_drag(Tool::Angle, pos2(100.0, 100.0), pos2(100.0, 50.0))
            .expect("angle tool draws");
        match &kind {
            AnnotationKind::Angle {
                vertex,
                reference,
                arm,
            } => {
                assert_eq!(*vertex, (100.0, 100.0));
                assert_eq!(*reference, (50.0, 100.0));
                assert_eq!(*arm, (100.0, 50.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
        let deg = kind.measure().angle.expect("angle set");
        assert!((deg - 90.0).abs() < 1e-3, "{deg}");
    }

    #[test]
    fn stored_measurements_match_rederivation() {
        let drags = [
            (Tool::Circle, pos2(5.0, 6.0), pos2(9.0, 9.0)),
            (Tool::Rectangle, pos2(0.0, 0.0), pos2(-8.0, 3.0)),
            (Tool::Angle, pos2(40.0, 40.0), pos2(70.0, 10.0)),
            (Tool::Distance, pos2(1.0, 1.0), pos2(7.0, 9.0)),
        ];
        for (tool, start, end) in drags {
            let kind = AnnotationKind::from_drag(tool, start, end).expect("drawing tool");
            let ann = Annotation::new("x".into(), kind.clone());
            assert_eq!(ann.measurements, kind.measure(), "{tool:?}");
        }
    }

    #[test]
    fn badge_anchor_per_shape() {
        let circle = AnnotationKind::Circle {
            center: (50.0, 60.0),
            radius: 10.0,
        };
        assert_eq!(circle.badge_anchor(), pos2(40.0, 50.0));

        let rect = AnnotationKind::Rectangle {
            origin: (5.0, 6.0),
            extent: (-4.0, -4.0),
        };
        assert_eq!(rect.badge_anchor(), pos2(5.0, 6.0));

        let line = AnnotationKind::Distance {
            start: (1.0, 2.0),
            end: (3.0, 4.0),
        };
        assert_eq!(line.badge_anchor(), pos2(1.0, 2.0));
    }

    #[test]
    fn label_text_uses_the_calibrated_scale() {
        let scale = Scale {
            pixels_per_unit: 10.0,
            unit: Unit::Mm,
        };
        let kind = AnnotationKind::from_drag(Tool::Distance, pos2(0.0, 0.0), pos2(50.0, 0.0))
            .expect("distance tool draws");
        let ann = Annotation::new("1".into(), kind);
        assert_eq!(ann.label_lines(&scale), vec!["5.0mm".to_string()]);
        assert_eq!(ann.detail_lines(&scale), vec!["Distance: 5.0mm".to_string()]);
    }

    #[test]
    fn readout_is_stable_across_evaluations() {
        let scale = Scale::default();
        let kind = AnnotationKind::from_drag(Tool::Rectangle, pos2(0.0, 0.0), pos2(10.0, 20.0))
            .expect("rectangle tool draws");
        assert_eq!(kind.readout(&scale), kind.readout(&scale));
        assert_eq!(
            kind.readout(&scale),
            "Width: 10.0px, Height: 20.0px, Area: 200.0px²"
        );
    }
}
