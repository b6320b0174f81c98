//! Top-level coordinator: owns the loaded image, the session state, and
//! the panel layout. Child panels receive snapshots and report events back
//! up; nothing below this level mutates shared state directly.

use std::path::{Path, PathBuf};

use egui::{vec2, Color32, TextureHandle, TextureOptions, Vec2};
use image::{DynamicImage, RgbaImage};
use thiserror::Error;
use tracing::{error, info};

use crate::adjust::{self, Adjustments};
use crate::annotation::Tool;
use crate::calibration::CalibrationPanel;
use crate::canvas::{CanvasContents, CanvasView};
use crate::dicom::{DicomError, DicomView};
use crate::export;
use crate::session::Session;
use crate::sidebar::{self, SidebarEvent};
use crate::toolbar;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not decode {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Dicom(#[from] DicomError),
}

fn is_dicom_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
}

// ── Raster image state ──────────────────────────────────────────────────────

struct RasterState {
    path: PathBuf,
    source: DynamicImage,
    adjustments: Adjustments,
    adjusted: RgbaImage,
    adjusted_for: Adjustments,
    texture: Option<TextureHandle>,
}

impl RasterState {
    fn new(path: PathBuf, source: DynamicImage) -> Self {
        let adjusted = source.to_rgba8();
        Self {
            path,
            source,
            adjustments: Adjustments::default(),
            adjusted,
            adjusted_for: Adjustments::default(),
            texture: None,
        }
    }

    /// Rebuilds the adjusted pixels and the GPU texture only when the
    /// settings actually changed.
    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.adjusted_for != self.adjustments {
            self.adjusted = self.adjustments.apply(&self.source);
            self.adjusted_for = self.adjustments;
            self.texture = None;
        }
        if self.texture.is_none() {
            let size = [self.adjusted.width() as usize, self.adjusted.height() as usize];
            let pixels = self.adjusted.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture = Some(ctx.load_texture("image", color_image, TextureOptions::LINEAR));
        }
    }

    fn image_size(&self) -> Vec2 {
        vec2(self.adjusted.width() as f32, self.adjusted.height() as f32)
    }

    fn export_name(&self, suffix: &str) -> String {
        format!(
            "{}{suffix}",
            self.path
                .file_stem()
                .unwrap_or_default()
                .to_str()
                .unwrap_or("image")
        )
    }
}

enum Loaded {
    None,
    Raster(RasterState),
    Dicom(DicomView),
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct MedimarkApp {
    loaded: Loaded,
    session: Session,
    tool: Tool,
    canvas: CanvasView,
    calibration: CalibrationPanel,
    status: Option<String>,
}

impl MedimarkApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, initial: Option<PathBuf>) -> Self {
        let mut app = Self {
            loaded: Loaded::None,
            session: Session::default(),
            tool: Tool::default(),
            canvas: CanvasView::default(),
            calibration: CalibrationPanel::default(),
            status: None,
        };
        if let Some(path) = initial {
            app.open_path(path);
        }
        app
    }

    /// Replacing the image destroys all annotations and the calibration.
    fn open_path(&mut self, path: PathBuf) {
        let result = if is_dicom_path(&path) {
            DicomView::open(&path)
                .map(Loaded::Dicom)
                .map_err(LoadError::from)
        } else {
            image::open(&path)
                .map(|img| Loaded::Raster(RasterState::new(path.clone(), img)))
                .map_err(|source| LoadError::Image {
                    path: path.display().to_string(),
                    source,
                })
        };

        match result {
            Ok(loaded) => {
                info!(path = %path.display(), "opened file");
                self.session.clear();
                self.canvas.reset_view();
                self.tool = Tool::Move;
                self.status = None;
                self.loaded = loaded;
            }
            Err(e) => {
                error!(error = %e, "failed to open file");
                self.status = Some(e.to_string());
            }
        }
    }

    fn clear(&mut self) {
        // Dropping the state drops the texture handles with it.
        self.loaded = Loaded::None;
        self.session.clear();
        self.canvas.reset_view();
        self.tool = Tool::Move;
        self.status = None;
    }
}

fn pick_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(
            "Images",
            &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"],
        )
        .add_filter("DICOM", &["dcm"])
        .pick_file()
}

impl eframe::App for MedimarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut open_request: Option<PathBuf> = None;
        let mut clear_request = false;

        // Drag-and-drop works anywhere in the window.
        let dropped = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .next()
        });
        if let Some(path) = dropped {
            open_request = Some(path);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Medimark");
                ui.separator();
                if ui.button("Open…").clicked() {
                    open_request = pick_file();
                }
                if !matches!(self.loaded, Loaded::None) && ui.button("Clear image").clicked() {
                    clear_request = true;
                }
                if matches!(self.loaded, Loaded::Raster(_)) {
                    ui.separator();
                    ui.label(format!("Zoom: {:.0}%", self.canvas.zoom() * 100.0));
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.colored_label(Color32::LIGHT_RED, status);
                }
            });
        });

        match &mut self.loaded {
            Loaded::None => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(ui.available_height() * 0.35);
                        ui.heading("Open an image to begin");
                        ui.label("Raster images get annotation tools; .dcm files open in the DICOM viewer");
                        ui.add_space(8.0);
                        if ui.button("Open image…").clicked() {
                            open_request = pick_file();
                        }
                        ui.small("…or drop a file anywhere in this window");
                    });
                });
            }

            Loaded::Raster(raster) => {
                let mut sidebar_event = None;
                egui::SidePanel::left("tools")
                    .default_width(240.0)
                    .show(ctx, |ui| {
                        toolbar::ui(ui, &mut self.tool);
                        ui.separator();
                        let last_distance_px = self.session.last_distance_px();
                        self.calibration
                            .ui(ui, &mut self.session.scale, last_distance_px);
                        ui.separator();
                        sidebar_event =
                            sidebar::ui(ui, self.session.annotations(), &self.session.scale);
                    });

                egui::CentralPanel::default().show(ctx, |ui| {
                    if adjust::panel_ui(ui, &mut raster.adjustments) {
                        ctx.request_repaint();
                    }
                    raster.ensure_texture(ctx);
                    if let Some(texture) = &raster.texture {
                        let contents = CanvasContents {
                            texture,
                            image_size: raster.image_size(),
                            annotations: self.session.annotations(),
                            tool: self.tool,
                            scale: &self.session.scale,
                        };
                        if let Some(annotation) = self.canvas.ui(ui, &contents) {
                            self.session.push(annotation);
                        }
                    }
                });

                match sidebar_event {
                    Some(SidebarEvent::Delete(id)) => self.session.delete(&id),
                    Some(SidebarEvent::ExportReport) => {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .set_file_name(raster.export_name("_measurements.json"))
                            .save_file()
                        {
                            if let Err(e) = export::write_report(
                                &path,
                                self.session.annotations(),
                                &self.session.scale,
                            ) {
                                error!(error = %e, "report export failed");
                                self.status = Some(format!("Export failed: {e}"));
                            }
                        }
                    }
                    Some(SidebarEvent::ExportImage) => {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("PNG image", &["png"])
                            .set_file_name(raster.export_name("_annotated.png"))
                            .save_file()
                        {
                            if let Err(e) = export::annotated_png(
                                &raster.adjusted,
                                self.session.annotations(),
                                &path,
                            ) {
                                error!(error = %e, "image export failed");
                                self.status = Some(format!("Export failed: {e}"));
                            }
                        }
                    }
                    None => {}
                }
            }

            Loaded::Dicom(view) => {
                egui::CentralPanel::default().show(ctx, |ui| view.ui(ui));
            }
        }

        if clear_request {
            self.clear();
        }
        if let Some(path) = open_request {
            self.open_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dicom_routing_is_extension_based() {
        assert!(is_dicom_path(Path::new("scan.dcm")));
        assert!(is_dicom_path(Path::new("scan.DCM")));
        assert!(!is_dicom_path(Path::new("scan.png")));
        assert!(!is_dicom_path(Path::new("dcm")));
    }

    #[test]
    fn raster_state_tracks_adjusted_dimensions() {
        let source = DynamicImage::ImageRgba8(RgbaImage::new(4, 2));
        let mut raster = RasterState::new(PathBuf::from("x.png"), source);
        assert_eq!(raster.image_size(), vec2(4.0, 2.0));

        raster.adjustments.rotate_cw();
        raster.adjusted = raster.adjustments.apply(&raster.source);
        assert_eq!(
            (raster.adjusted.width(), raster.adjusted.height()),
            (2, 4)
        );
    }

    #[test]
    fn export_names_derive_from_the_source_file() {
        let raster = RasterState::new(
            PathBuf::from("/tmp/xray.png"),
            DynamicImage::ImageRgba8(RgbaImage::new(1, 1)),
        );
        assert_eq!(raster.export_name("_annotated.png"), "xray_annotated.png");
    }
}
