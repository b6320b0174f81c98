//! Canvas: base image, committed overlays, live preview, and the drag
//! state machine.
//!
//! Immediate mode repaints everything from scratch each frame: base image,
//! then every committed annotation in order, then the in-progress preview.
//! Rendering is idempotent no matter how many pointer events fired in
//! between.

use egui::{
    pos2, vec2, Align2, Color32, FontId, Painter, PointerButton, Pos2, Rect, Sense, Stroke,
    StrokeKind, TextureHandle, Ui, Vec2,
};

use crate::annotation::{Annotation, AnnotationKind, Tool};
use crate::geometry::Scale;

/// Everything the overlays draw with, passed explicitly into the draw
/// routines. There is no ambient styling state to mutate in the wrong
/// order.
#[derive(Clone, Debug)]
pub struct OverlayStyle {
    pub stroke: Stroke,
    pub shadow_offset: Vec2,
    pub shadow_color: Color32,
    pub label_font: FontId,
    pub label_color: Color32,
    pub label_backdrop: Color32,
    pub badge_fill: Color32,
    pub badge_text: Color32,
    pub badge_font: FontId,
    pub badge_radius: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke: Stroke::new(3.0, Color32::from_rgb(0xFF, 0x3B, 0x30)),
            shadow_offset: vec2(2.0, 2.0),
            shadow_color: Color32::from_black_alpha(96),
            label_font: FontId::proportional(14.0),
            label_color: Color32::WHITE,
            label_backdrop: Color32::from_black_alpha(191),
            badge_fill: Color32::from_rgb(0xFF, 0x3B, 0x30),
            badge_text: Color32::WHITE,
            badge_font: FontId::proportional(12.0),
            badge_radius: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum DragState {
    #[default]
    Idle,
    /// Start point in image space.
    Dragging { start: Pos2 },
}

/// Read-only snapshot handed to the canvas each frame.
pub struct CanvasContents<'a> {
    pub texture: &'a TextureHandle,
    pub image_size: Vec2,
    pub annotations: &'a [Annotation],
    pub tool: Tool,
    pub scale: &'a Scale,
}

pub struct CanvasView {
    pan: Vec2,
    zoom: f32,
    drag: DragState,
    next_id: u64,
    style: OverlayStyle,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            drag: DragState::Idle,
            next_id: 0,
            style: OverlayStyle::default(),
        }
    }
}

impl CanvasView {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Back to a centered, unzoomed view; abandons any in-progress drag.
    /// Called when the image changes. Ids keep counting up.
    pub fn reset_view(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
        self.drag = DragState::Idle;
    }

    fn alloc_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    /// Convert image-space coords to screen-space.
    fn image_to_screen(&self, canvas: Rect, image_size: Vec2, img: Pos2) -> Pos2 {
        canvas.center() + self.pan + (img.to_vec2() - image_size * 0.5) * self.zoom
    }

    /// Convert screen-space coords to image-space.
    fn screen_to_image(&self, canvas: Rect, image_size: Vec2, screen: Pos2) -> Pos2 {
        let rel = screen - canvas.center() - self.pan;
        pos2(
            rel.x / self.zoom + image_size.x * 0.5,
            rel.y / self.zoom + image_size.y * 0.5,
        )
    }

    /// Draws the frame and runs the drag state machine. Returns the
    /// annotation committed by a drag that ended this frame, if any.
    pub fn ui(&mut self, ui: &mut Ui, contents: &CanvasContents) -> Option<Annotation> {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let canvas = response.rect;
        let image_size = contents.image_size;

        painter.rect_filled(canvas, 0.0, Color32::from_gray(40));

        let img_rect = Rect::from_min_max(
            self.image_to_screen(canvas, image_size, Pos2::ZERO),
            self.image_to_screen(canvas, image_size, image_size.to_pos2()),
        );
        painter.image(
            contents.texture.id(),
            img_rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );

        for (i, ann) in contents.annotations.iter().enumerate() {
            self.draw_annotation(&painter, canvas, image_size, i + 1, ann, contents.scale);
        }

        // Live preview of the in-progress shape plus a floating readout.
        if let DragState::Dragging { start } = self.drag {
            if let Some(hover) = response.hover_pos() {
                let current = self.screen_to_image(canvas, image_size, hover);
                if let Some(kind) = AnnotationKind::from_drag(contents.tool, start, current) {
                    self.draw_kind(&painter, canvas, image_size, &kind);
                    self.draw_readout(&painter, canvas, &kind.readout(contents.scale));
                }
            }
        }

        // Middle-mouse pan.
        if response.hovered() && ui.ctx().input(|i| i.pointer.middle_down()) {
            self.pan += ui.ctx().input(|i| i.pointer.delta());
        }

        // Cursor-anchored scroll zoom.
        let scroll = ui.ctx().input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 && response.hovered() {
            let new_zoom = (self.zoom * (1.0 + scroll * 0.002)).clamp(0.1, 10.0);
            if let Some(cursor) = response.hover_pos() {
                let rel = cursor - canvas.center() - self.pan;
                self.pan -= rel * (new_zoom / self.zoom - 1.0);
            }
            self.zoom = new_zoom;
        }

        // Drag state machine. The move tool never enters Dragging, and a
        // fresh press implicitly abandons any stale start point.
        if response.drag_started_by(PointerButton::Primary) && contents.tool.draws() {
            if let Some(pos) = response.hover_pos() {
                self.drag = DragState::Dragging {
                    start: self.screen_to_image(canvas, image_size, pos),
                };
            }
        }

        let mut committed = None;
        if response.drag_stopped_by(PointerButton::Primary) {
            if let DragState::Dragging { start } = self.drag {
                let end = response
                    .hover_pos()
                    .or(ui.ctx().input(|i| i.pointer.latest_pos()));
                if let Some(end) = end {
                    let end = self.screen_to_image(canvas, image_size, end);
                    if let Some(kind) = AnnotationKind::from_drag(contents.tool, start, end) {
                        committed = Some(Annotation::new(self.alloc_id(), kind));
                    }
                }
            }
            self.drag = DragState::Idle;
        }
        committed
    }

    fn draw_annotation(
        &self,
        painter: &Painter,
        canvas: Rect,
        image_size: Vec2,
        number: usize,
        ann: &Annotation,
        scale: &Scale,
    ) {
        self.draw_kind(painter, canvas, image_size, &ann.kind);
        let (anchor, centered) = self.label_anchor(canvas, image_size, &ann.kind);
        self.draw_label(painter, anchor, &ann.label_lines(scale), centered);
        self.draw_badge(painter, canvas, image_size, number, &ann.kind);
    }

    /// Shape outlines, each with a drop-shadow pass underneath.
    fn draw_kind(&self, painter: &Painter, canvas: Rect, image_size: Vec2, kind: &AnnotationKind) {
        let style = &self.style;
        let shadow = Stroke::new(style.stroke.width, style.shadow_color);
        let to_screen = |p: (f32, f32)| self.image_to_screen(canvas, image_size, pos2(p.0, p.1));

        match *kind {
            AnnotationKind::Circle { center, radius } => {
                let c = to_screen(center);
                let r = radius * self.zoom;
                painter.circle_stroke(c + style.shadow_offset, r, shadow);
                painter.circle_stroke(c, r, style.stroke);
                painter.circle_filled(c, 4.0, style.stroke.color);
            }
            AnnotationKind::Rectangle { origin, extent } => {
                let a = to_screen(origin);
                let b = to_screen((origin.0 + extent.0, origin.1 + extent.1));
                let rect = Rect::from_two_pos(a, b);
                painter.rect_stroke(
                    rect.translate(style.shadow_offset),
                    0.0,
                    shadow,
                    StrokeKind::Middle,
                );
                painter.rect_stroke(rect, 0.0, style.stroke, StrokeKind::Middle);
            }
            AnnotationKind::Angle {
                vertex,
                reference,
                arm,
            } => {
                let v = to_screen(vertex);
                let r = to_screen(reference);
                let a = to_screen(arm);
                for seg in [[r, v], [v, a]] {
                    painter.line_segment(
                        [seg[0] + style.shadow_offset, seg[1] + style.shadow_offset],
                        shadow,
                    );
                }
                painter.line_segment([r, v], style.stroke);
                painter.line_segment([v, a], style.stroke);
            }
            AnnotationKind::Distance { start, end } => {
                let s = to_screen(start);
                let e = to_screen(end);
                painter.line_segment([s + style.shadow_offset, e + style.shadow_offset], shadow);
                painter.line_segment([s, e], style.stroke);
            }
        }
    }

    /// Screen position for the measurement label. Distance labels sit
    /// centered above the midpoint, everything else hangs off a corner.
    fn label_anchor(&self, canvas: Rect, image_size: Vec2, kind: &AnnotationKind) -> (Pos2, bool) {
        let to_screen = |p: (f32, f32)| self.image_to_screen(canvas, image_size, pos2(p.0, p.1));
        match *kind {
            AnnotationKind::Circle { center, .. } => (to_screen(center) + vec2(8.0, -10.0), false),
            AnnotationKind::Rectangle { origin, .. } => {
                (to_screen(origin) + vec2(8.0, -10.0), false)
            }
            AnnotationKind::Angle { vertex, .. } => (to_screen(vertex) + vec2(12.0, 12.0), false),
            AnnotationKind::Distance { start, end } => {
                let mid = (
                    (start.0 + end.0) * 0.5,
                    (start.1 + end.1) * 0.5,
                );
                (to_screen(mid) + vec2(0.0, -30.0), true)
            }
        }
    }

    /// Semi-opaque backdrop sized to the laid-out text extents, then the
    /// text lines on top.
    fn draw_label(&self, painter: &Painter, anchor: Pos2, lines: &[String], centered: bool) {
        if lines.is_empty() {
            return;
        }
        let galleys: Vec<_> = lines
            .iter()
            .map(|l| {
                painter.layout_no_wrap(l.clone(), self.style.label_font.clone(), self.style.label_color)
            })
            .collect();
        let width = galleys.iter().map(|g| g.size().x).fold(0.0, f32::max);
        let line_height = galleys[0].size().y;
        let pad = vec2(6.0, 4.0);
        let size = vec2(width, line_height * lines.len() as f32) + pad * 2.0;
        let top_left = if centered {
            anchor - vec2(size.x * 0.5, 0.0)
        } else {
            anchor
        };
        painter.rect_filled(Rect::from_min_size(top_left, size), 3.0, self.style.label_backdrop);
        let mut cursor = top_left + pad;
        for galley in galleys {
            painter.galley(cursor, galley, self.style.label_color);
            cursor.y += line_height;
        }
    }

    /// Numbered badge at the shape-specific anchor. The number is the
    /// annotation's 1-based position in the collection, re-derived every
    /// redraw.
    fn draw_badge(
        &self,
        painter: &Painter,
        canvas: Rect,
        image_size: Vec2,
        number: usize,
        kind: &AnnotationKind,
    ) {
        let anchor = self.image_to_screen(canvas, image_size, kind.badge_anchor());
        let center = anchor - vec2(10.0, 10.0);
        painter.circle_filled(
            center + self.style.shadow_offset,
            self.style.badge_radius,
            self.style.shadow_color,
        );
        painter.circle_filled(center, self.style.badge_radius, self.style.badge_fill);
        painter.text(
            center,
            Align2::CENTER_CENTER,
            number.to_string(),
            self.style.badge_font.clone(),
            self.style.badge_text,
        );
    }

    fn draw_readout(&self, painter: &Painter, canvas: Rect, text: &str) {
        let galley = painter.layout_no_wrap(
            text.to_owned(),
            self.style.label_font.clone(),
            Color32::WHITE,
        );
        let pad = vec2(10.0, 6.0);
        let size = galley.size() + pad * 2.0;
        let rect = Rect::from_min_size(
            pos2(canvas.right() - size.x - 12.0, canvas.top() + 12.0),
            size,
        );
        painter.rect_filled(rect, 6.0, Color32::from_black_alpha(220));
        painter.galley(rect.min + pad, galley, Color32::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_image_roundtrip_survives_pan_and_zoom() {
        let mut view = CanvasView::default();
        view.pan = vec2(31.0, -12.0);
        view.zoom = 2.5;
        let canvas = Rect::from_min_size(pos2(50.0, 80.0), vec2(900.0, 600.0));
        let image_size = vec2(640.0, 480.0);

        for img in [pos2(0.0, 0.0), pos2(320.0, 240.0), pos2(639.0, 1.0)] {
            let screen = view.image_to_screen(canvas, image_size, img);
            let back = view.screen_to_image(canvas, image_size, screen);
            assert!((back - img).length() < 1e-3, "{img:?} -> {back:?}");
        }
    }

    #[test]
    fn ids_are_monotonically_distinct() {
        let mut view = CanvasView::default();
        let a = view.alloc_id();
        let b = view.alloc_id();
        let c = view.alloc_id();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(c, "3");
    }

    #[test]
    fn reset_view_keeps_the_id_counter() {
        let mut view = CanvasView::default();
        view.alloc_id();
        view.pan = vec2(10.0, 10.0);
        view.zoom = 3.0;
        view.reset_view();
        assert_eq!(view.zoom, 1.0);
        assert_eq!(view.pan, Vec2::ZERO);
        assert_eq!(view.alloc_id(), "2");
    }
}
