//! Pure measurement math over image-space points, plus the calibration
//! scale used by every display path.

use egui::Pos2;
use serde::{Deserialize, Serialize};

/// Euclidean distance between two points.
pub fn distance(p1: Pos2, p2: Pos2) -> f32 {
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt()
}

/// Signed sweep from the bearing `center -> a` to the bearing `center -> b`,
/// in degrees, normalized into `[0, 360)`.
///
/// This is the full sweep, not the minimal interior angle; callers must
/// accept values up to 360. Degenerate arms are fine: `atan2(0, 0)` is 0.
pub fn sweep_angle(center: Pos2, a: Pos2, b: Pos2) -> f32 {
    let bearing_a = (a.y - center.y).atan2(a.x - center.x);
    let bearing_b = (b.y - center.y).atan2(b.x - center.x);
    let mut deg = (bearing_b - bearing_a).to_degrees();
    if deg < 0.0 {
        deg += 360.0;
    }
    deg
}

pub fn circumference(radius: f32) -> f32 {
    std::f32::consts::TAU * radius
}

pub fn format_degrees(deg: f32) -> String {
    format!("{deg:.1}°")
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Mm,
    Cm,
    In,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Mm, Unit::Cm, Unit::In];

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
        }
    }
}

/// Calibration scale. `pixels_per_unit == 0.0` means uncalibrated and every
/// formatter falls back to raw pixel units.
///
/// Stored values stay in image pixels at full precision; conversion and the
/// one-decimal rounding happen here, at display time only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub pixels_per_unit: f32,
    pub unit: Unit,
}

impl Scale {
    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_unit > 0.0
    }

    pub fn format_length(&self, px: f32) -> String {
        if self.is_calibrated() {
            format!("{:.1}{}", px / self.pixels_per_unit, self.unit.suffix())
        } else {
            format!("{px:.1}px")
        }
    }

    /// Area conversion divides by the squared scale.
    pub fn format_area(&self, px2: f32) -> String {
        if self.is_calibrated() {
            let ppu = self.pixels_per_unit;
            format!("{:.1}{}²", px2 / (ppu * ppu), self.unit.suffix())
        } else {
            format!("{px2:.1}px²")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;
    use pretty_assertions::assert_eq;

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (pos2(0.0, 0.0), pos2(3.0, 4.0)),
            (pos2(-2.5, 7.0), pos2(1.0, -1.0)),
            (pos2(100.0, 100.0), pos2(100.0, 50.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a));
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(distance(pos2(12.5, -3.0), pos2(12.5, -3.0)), 0.0);
    }

    #[test]
    fn three_four_five_triangle() {
        let r = distance(pos2(0.0, 0.0), pos2(3.0, 4.0));
        assert_eq!(r, 5.0);
        assert!((circumference(r) - 31.4).abs() < 0.02);
    }

    #[test]
    fn sweep_angle_stays_in_range() {
        let center = pos2(10.0, 10.0);
        let spots = [
            pos2(20.0, 10.0),
            pos2(10.0, 20.0),
            pos2(0.0, 10.0),
            pos2(10.0, 0.0),
            pos2(3.0, -7.0),
            pos2(-15.0, 22.0),
            pos2(10.0, 10.0),
        ];
        for a in spots {
            for b in spots {
                let deg = sweep_angle(center, a, b);
                assert!((0.0..360.0).contains(&deg), "{a:?} {b:?} -> {deg}");
            }
        }
    }

    #[test]
    fn sweep_angle_from_horizontal_reference_straight_up() {
        // Screen-space y grows downward; "up" from the vertex is -y.
        let deg = sweep_angle(pos2(100.0, 100.0), pos2(50.0, 100.0), pos2(100.0, 50.0));
        assert!((deg - 90.0).abs() < 1e-3, "{deg}");
        assert_eq!(format_degrees(deg), "90.0°");
    }

    #[test]
    fn degenerate_arms_do_not_panic() {
        let p = pos2(5.0, 5.0);
        assert_eq!(sweep_angle(p, p, p), 0.0);
    }

    #[test]
    fn uncalibrated_scale_formats_pixels() {
        let scale = Scale::default();
        assert!(!scale.is_calibrated());
        assert_eq!(scale.format_length(50.0), "50.0px");
        assert_eq!(scale.format_area(24.0), "24.0px²");
    }

    #[test]
    fn calibrated_scale_converts_lengths() {
        // 100 px over a known 10 mm distance -> 10 px per mm.
        let scale = Scale {
            pixels_per_unit: 10.0,
            unit: Unit::Mm,
        };
        assert_eq!(scale.format_length(50.0), "5.0mm");
        assert_eq!(scale.format_area(200.0), "2.0mm²");
    }

    #[test]
    fn unit_suffixes() {
        assert_eq!(Unit::Mm.suffix(), "mm");
        assert_eq!(Unit::Cm.suffix(), "cm");
        assert_eq!(Unit::In.suffix(), "in");
    }
}
