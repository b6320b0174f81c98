//! Thin wrapper over the dicom-rs toolkit: metadata extraction and
//! window-level display. No decoding logic lives in this crate; failures
//! degrade to an absent image and are logged, never propagated as panics.

use std::path::Path;

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::{open_file, DefaultDicomObject};
use dicom_pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption, WindowLevel};
use egui::{Slider, TextureHandle, TextureOptions, Ui};
use egui_extras::{Column, TableBuilder};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum DicomError {
    #[error("failed to read DICOM file: {0}")]
    Read(#[from] dicom_object::ReadError),
    #[error("failed to decode pixel data: {0}")]
    Pixels(#[from] dicom_pixeldata::Error),
}

/// The tag subset shown in the metadata panel.
#[derive(Clone, Debug, Default)]
pub struct DicomMetadata {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub study_date: Option<String>,
    pub modality: Option<String>,
    pub study_description: Option<String>,
}

impl DicomMetadata {
    fn read(object: &DefaultDicomObject) -> Self {
        Self {
            patient_name: string_tag(object, tags::PATIENT_NAME),
            patient_id: string_tag(object, tags::PATIENT_ID),
            study_date: string_tag(object, tags::STUDY_DATE),
            modality: string_tag(object, tags::MODALITY),
            study_description: string_tag(object, tags::STUDY_DESCRIPTION),
        }
    }

    fn rows(&self) -> [(&'static str, Option<&String>); 5] {
        [
            ("Patient name", self.patient_name.as_ref()),
            ("Patient ID", self.patient_id.as_ref()),
            ("Study date", self.study_date.as_ref()),
            ("Modality", self.modality.as_ref()),
            ("Study description", self.study_description.as_ref()),
        ]
    }
}

fn string_tag(object: &DefaultDicomObject, tag: Tag) -> Option<String> {
    object
        .element(tag)
        .ok()
        .and_then(|e| e.to_str().ok())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn float_tag(object: &DefaultDicomObject, tag: Tag) -> Option<f32> {
    object.element(tag).ok().and_then(|e| e.to_float32().ok())
}

/// One loaded DICOM file: metadata panel plus a window-leveled slice.
pub struct DicomView {
    object: DefaultDicomObject,
    pub metadata: DicomMetadata,
    window_width: f32,
    window_center: f32,
    texture: Option<TextureHandle>,
    rendered_for: Option<(f32, f32)>,
    decode_failed: bool,
}

impl DicomView {
    pub fn open(path: &Path) -> Result<Self, DicomError> {
        let object = open_file(path)?;
        let metadata = DicomMetadata::read(&object);
        // Fall back to generic soft-tissue-ish defaults when the file
        // carries no VOI attributes.
        let window_width = float_tag(&object, tags::WINDOW_WIDTH).unwrap_or(400.0);
        let window_center = float_tag(&object, tags::WINDOW_CENTER).unwrap_or(200.0);
        info!(
            path = %path.display(),
            modality = metadata.modality.as_deref().unwrap_or("?"),
            "opened DICOM file"
        );
        Ok(Self {
            object,
            metadata,
            window_width,
            window_center,
            texture: None,
            rendered_for: None,
            decode_failed: false,
        })
    }

    /// Re-renders the slice through the toolkit's VOI LUT for the current
    /// window. A decode failure is logged once and latched; the panel then
    /// shows metadata only.
    fn ensure_texture(&mut self, ctx: &egui::Context) {
        let window = (self.window_width, self.window_center);
        if self.decode_failed || self.rendered_for == Some(window) {
            return;
        }
        match self.render(ctx) {
            Ok(()) => self.rendered_for = Some(window),
            Err(e) => {
                error!(error = %e, "DICOM pixel data unavailable");
                self.decode_failed = true;
            }
        }
    }

    fn render(&mut self, ctx: &egui::Context) -> Result<(), DicomError> {
        let decoded = self.object.decode_pixel_data()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::Custom(WindowLevel {
            width: f64::from(self.window_width),
            center: f64::from(self.window_center),
        }));
        let image = decoded.to_dynamic_image_with_options(0, &options)?;
        let rgba = image.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let pixels = rgba.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        self.texture = Some(ctx.load_texture("dicom", color_image, TextureOptions::LINEAR));
        Ok(())
    }

    pub fn ui(&mut self, ui: &mut Ui) {
        ui.heading("DICOM Metadata");
        TableBuilder::new(ui)
            .column(Column::auto().at_least(120.0))
            .column(Column::remainder())
            .body(|mut body| {
                for (label, value) in self.metadata.rows() {
                    if let Some(value) = value {
                        body.row(18.0, |mut row| {
                            row.col(|ui| {
                                ui.label(label);
                            });
                            row.col(|ui| {
                                ui.strong(value);
                            });
                        });
                    }
                }
            });

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Window width");
            ui.add(Slider::new(&mut self.window_width, 1.0..=4000.0));
            ui.label("Window center");
            ui.add(Slider::new(&mut self.window_center, -1000.0..=1000.0));
        });

        self.ensure_texture(ui.ctx());
        match &self.texture {
            Some(texture) => {
                ui.add(egui::Image::new(texture).shrink_to_fit());
            }
            None => {
                ui.weak("No image available");
            }
        }
    }
}
