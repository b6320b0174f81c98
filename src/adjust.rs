//! Brightness/contrast/orientation adjustments applied to the base image
//! before it is uploaded as a texture.

use egui::{Slider, Ui};
use image::{DynamicImage, RgbaImage};

/// Adjustment settings. Brightness and contrast are percentages with 100 as
/// neutral; orientation is quarter turns clockwise plus flips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adjustments {
    pub brightness: i32,
    pub contrast: i32,
    pub quarter_turns: u8,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100,
            contrast: 100,
            quarter_turns: 0,
            flip_h: false,
            flip_v: false,
        }
    }
}

impl Adjustments {
    pub fn rotate_cw(&mut self) {
        self.quarter_turns = (self.quarter_turns + 1) % 4;
    }

    pub fn rotate_ccw(&mut self) {
        self.quarter_turns = (self.quarter_turns + 3) % 4;
    }

    fn tone_is_neutral(&self) -> bool {
        self.brightness == 100 && self.contrast == 100
    }

    /// Renders the adjusted pixels. Tone mapping runs through a single
    /// 256-entry lookup table (brightness offset, then contrast around the
    /// midpoint); orientation uses the `image` crate transforms.
    pub fn apply(&self, source: &DynamicImage) -> RgbaImage {
        let mut img = source.to_rgba8();

        if !self.tone_is_neutral() {
            let lut = self.tone_lut();
            for px in img.pixels_mut() {
                for channel in &mut px.0[..3] {
                    *channel = lut[*channel as usize];
                }
            }
        }

        let mut out = DynamicImage::ImageRgba8(img);
        out = match self.quarter_turns % 4 {
            1 => out.rotate90(),
            2 => out.rotate180(),
            3 => out.rotate270(),
            _ => out,
        };
        if self.flip_h {
            out = out.fliph();
        }
        if self.flip_v {
            out = out.flipv();
        }
        out.into_rgba8()
    }

    fn tone_lut(&self) -> [u8; 256] {
        let offset = (self.brightness - 100) as f32 * 2.55;
        // Remap 0..=200% onto the -255..=255 range the contrast curve
        // expects, with 100% as identity.
        let c = (self.contrast - 100) as f32 * 2.55;
        let factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));

        let mut lut = [0u8; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            let v = i as f32 + offset;
            let v = factor * (v - 128.0) + 128.0;
            *slot = v.clamp(0.0, 255.0) as u8;
        }
        lut
    }
}

/// Adjustment strip above the canvas. Returns true when any setting
/// changed and the texture needs a rebuild.
pub fn panel_ui(ui: &mut Ui, adjustments: &mut Adjustments) -> bool {
    let before = *adjustments;

    ui.horizontal(|ui| {
        if ui.button("⟳").on_hover_text("Rotate clockwise").clicked() {
            adjustments.rotate_cw();
        }
        if ui.button("⟲").on_hover_text("Rotate counter-clockwise").clicked() {
            adjustments.rotate_ccw();
        }
        if ui.button("⇋").on_hover_text("Flip horizontal").clicked() {
            adjustments.flip_h = !adjustments.flip_h;
        }
        if ui.button("⇅").on_hover_text("Flip vertical").clicked() {
            adjustments.flip_v = !adjustments.flip_v;
        }
        ui.separator();
        ui.label("Brightness");
        ui.add(Slider::new(&mut adjustments.brightness, 0..=200).suffix("%"));
        ui.label("Contrast");
        ui.add(Slider::new(&mut adjustments.contrast, 0..=200).suffix("%"));
        ui.separator();
        if ui.button("Reset").clicked() {
            *adjustments = Adjustments::default();
        }
    });

    *adjustments != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> DynamicImage {
        let mut img = RgbaImage::new(2, 3);
        img.put_pixel(0, 0, Rgba([10, 100, 200, 255]));
        img.put_pixel(1, 2, Rgba([50, 50, 50, 128]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn neutral_settings_are_an_identity() {
        let src = sample();
        let out = Adjustments::default().apply(&src);
        assert_eq!(out, src.to_rgba8());
    }

    #[test]
    fn brightness_raises_channels_and_clamps() {
        let adj = Adjustments {
            brightness: 200,
            ..Adjustments::default()
        };
        let out = adj.apply(&sample());
        let px = out.get_pixel(0, 0);
        assert_eq!(px.0[0], 255); // 10 + 255, clamped
        assert_eq!(px.0[3], 255); // alpha untouched
    }

    #[test]
    fn zero_contrast_flattens_to_midpoint() {
        let adj = Adjustments {
            contrast: 0,
            ..Adjustments::default()
        };
        let out = adj.apply(&sample());
        let px = out.get_pixel(0, 0);
        // Every channel collapses near 128.
        for channel in &px.0[..3] {
            assert!((*channel as i32 - 128).abs() <= 1, "{channel}");
        }
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let adj = Adjustments {
            quarter_turns: 1,
            ..Adjustments::default()
        };
        let out = adj.apply(&sample());
        assert_eq!((out.width(), out.height()), (3, 2));
    }

    #[test]
    fn four_turns_wrap_to_identity() {
        let mut adj = Adjustments::default();
        for _ in 0..4 {
            adj.rotate_cw();
        }
        assert_eq!(adj.quarter_turns, 0);
        adj.rotate_ccw();
        assert_eq!(adj.quarter_turns, 3);
    }
}
