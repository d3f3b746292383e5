//! Rendering: repaints the whole editor scene onto a [`Surface`].
//!
//! The scene is a pure function of the layer stack and UI state: background,
//! visible layers in paint order, selection chrome for the selected layer,
//! and the outline of a shape or freehand drag in progress. Nothing here mutates editor
//! state.
//!
//! Backends implement [`Surface`]; [`crate::raster::RasterSurface`] is the
//! native one and `web::WebSurface` draws into a browser canvas.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::color::{Rgba, parse_color_or};
use crate::consts::{HANDLE_SIZE, SELECTION_COLOR, SELECTION_DASH, SELECTION_LINE_WIDTH, SELECTION_PADDING};
use crate::doc::{Layer, LayerKind, LayerStack, ShapeType, TextAlign};
use crate::geom::{Path, Point};
use crate::input::{DragBox, Preview, UiState};

/// Errors raised by drawing backends.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("unsupported image source: {0}")]
    InvalidSource(String),
    #[error("image not loaded yet: {0}")]
    NotLoaded(String),
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Outline stroke parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
    /// Equal on/off dash length, `None` for a solid line.
    pub dash: Option<f64>,
}

impl Stroke {
    #[must_use]
    pub fn solid(color: Rgba, width: f64) -> Self {
        Self { color, width, dash: None }
    }
}

/// Font selection for text calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font<'a> {
    pub size: f64,
    pub family: &'a str,
}

impl Font<'_> {
    /// CSS font shorthand, e.g. `"20px Arial"`.
    #[must_use]
    pub fn css(&self) -> String {
        format!("{}px {}", self.size, self.family)
    }
}

/// A 2D drawing target with a canvas-like state stack.
///
/// Transforms and alpha are part of the saved state: `restore` undoes every
/// `translate`, `rotate` and `set_alpha` since the matching `save`.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn save(&mut self);
    fn restore(&mut self);

    /// Global alpha applied to every subsequent draw.
    fn set_alpha(&mut self, alpha: f64);
    fn translate(&mut self, dx: f64, dy: f64);
    fn rotate(&mut self, radians: f64);

    /// Paint the whole surface with `color`, ignoring transform and alpha.
    fn clear(&mut self, color: Rgba);

    /// Fill a closed path.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend rejects the call.
    fn fill_path(&mut self, path: &Path, color: Rgba) -> Result<(), SurfaceError>;

    /// Stroke a path. Closed paths join their last vertex to the first;
    /// [`Path::Polyline`] is drawn open with round joins and caps.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend rejects the call.
    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) -> Result<(), SurfaceError>;

    /// Draw one line of text vertically centred on `y`, horizontally anchored at `x` per `align`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend rejects the call.
    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: Font<'_>,
        align: TextAlign,
        color: Rgba,
    ) -> Result<(), SurfaceError>;

    /// Advance width of `text` in pixels.
    fn measure_text(&mut self, text: &str, font: Font<'_>) -> f64;

    /// Draw an image scaled into the given box.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the source cannot be resolved or decoded.
    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError>;

    /// Natural pixel size of an image source.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the source cannot be resolved or decoded.
    fn image_size(&mut self, src: &str) -> Result<(f64, f64), SurfaceError>;

    /// Encode the current pixels as a PNG `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns `Err` if encoding fails.
    fn to_data_url(&mut self) -> Result<String, SurfaceError>;
}

/// Draw the full scene: background, layers, selection chrome, gesture preview.
///
/// A layer that fails to draw (an undecodable image, say) is logged and
/// skipped so the rest of the scene still renders.
///
/// # Errors
///
/// Returns `Err` if drawing the selection chrome or the preview fails.
pub fn draw<S: Surface + ?Sized>(
    surface: &mut S,
    layers: &LayerStack,
    ui: &UiState,
    preview: Option<Preview<'_>>,
) -> Result<(), SurfaceError> {
    surface.clear(parse_color_or(&ui.background, Rgba::WHITE));

    for layer in layers.iter().filter(|l| l.visible) {
        surface.save();
        let result = draw_layer(surface, layer);
        surface.restore();
        if let Err(error) = result {
            tracing::warn!(layer = %layer.id, kind = layer.kind.name(), %error, "layer draw failed");
        }
    }

    if !ui.hide_selection
        && let Some(layer) = ui.selected_id.and_then(|id| layers.get(&id)).filter(|l| l.visible)
    {
        surface.save();
        let result = draw_selection(surface, layer);
        surface.restore();
        result?;
    }

    match preview {
        Some(Preview::Shape { shape, bounds }) => {
            draw_preview(surface, shape, bounds, &ui.settings.color, ui.settings.brush_size)?;
        }
        Some(Preview::Stroke { points, eraser }) => {
            let style = ui.settings.stroke_style(eraser, &ui.background);
            surface.save();
            surface.set_alpha(style.opacity());
            let result = surface.stroke_path(
                &Path::Polyline(points.to_vec()),
                &Stroke::solid(style.stroke(), style.stroke_width()),
            );
            surface.restore();
            result?;
        }
        None => {}
    }

    Ok(())
}

// =============================================================
// Layer dispatch
// =============================================================

fn draw_layer<S: Surface + ?Sized>(surface: &mut S, layer: &Layer) -> Result<(), SurfaceError> {
    surface.set_alpha(layer.style.opacity());
    translate_and_rotate(surface, layer);

    let hw = layer.width / 2.0;
    let hh = layer.height / 2.0;

    match &layer.kind {
        LayerKind::Shape { shape } => {
            let path = shape_path(*shape, -hw, -hh, layer.width, layer.height);
            let fill = layer.style.shape_fill();
            if !fill.is_transparent() {
                surface.fill_path(&path, fill)?;
            }
            surface.stroke_path(&path, &Stroke::solid(layer.style.stroke(), layer.style.stroke_width()))
        }
        LayerKind::Text { text, align } => {
            let font = Font { size: layer.style.font_size(), family: layer.style.font_family() };
            surface.fill_text(text, 0.0, 0.0, font, *align, layer.style.text_fill())
        }
        LayerKind::Image { src } => surface.draw_image(src, -hw, -hh, layer.width, layer.height),
        LayerKind::Stroke { points } => {
            let line = points
                .iter()
                .map(|p| Point::new(-hw + p.x * layer.width, -hh + p.y * layer.height))
                .collect();
            surface.stroke_path(&Path::Polyline(line), &Stroke::solid(layer.style.stroke(), layer.style.stroke_width()))
        }
    }
}

/// Outline of a shape inside the box at `(x, y)`.
#[must_use]
pub fn shape_path(shape: ShapeType, x: f64, y: f64, width: f64, height: f64) -> Path {
    match shape {
        ShapeType::Rectangle => Path::Rect { x, y, width, height },
        ShapeType::Circle => Path::Circle { cx: x + width / 2.0, cy: y + height / 2.0, radius: width.min(height) / 2.0 },
        ShapeType::Triangle => Path::Polygon(vec![
            Point::new(x + width / 2.0, y),
            Point::new(x, y + height),
            Point::new(x + width, y + height),
        ]),
    }
}

// =============================================================
// Selection chrome
// =============================================================

fn draw_selection<S: Surface + ?Sized>(surface: &mut S, layer: &Layer) -> Result<(), SurfaceError> {
    translate_and_rotate(surface, layer);

    let color = parse_color_or(SELECTION_COLOR, Rgba::BLACK);
    let x = -layer.width / 2.0;
    let y = -layer.height / 2.0;

    let border = Path::Rect {
        x: x - SELECTION_PADDING,
        y: y - SELECTION_PADDING,
        width: layer.width + SELECTION_PADDING * 2.0,
        height: layer.height + SELECTION_PADDING * 2.0,
    };
    surface.stroke_path(&border, &Stroke { color, width: SELECTION_LINE_WIDTH, dash: Some(SELECTION_DASH) })?;

    let half = HANDLE_SIZE / 2.0;
    let handle_stroke = Stroke::solid(color, SELECTION_LINE_WIDTH);
    for (cx, cy) in [(x, y), (x + layer.width, y), (x, y + layer.height), (x + layer.width, y + layer.height)] {
        let handle = Path::Rect { x: cx - half, y: cy - half, width: HANDLE_SIZE, height: HANDLE_SIZE };
        surface.fill_path(&handle, Rgba::WHITE)?;
        surface.stroke_path(&handle, &handle_stroke)?;
    }
    Ok(())
}

fn draw_preview<S: Surface + ?Sized>(
    surface: &mut S,
    shape: ShapeType,
    bounds: DragBox,
    color: &str,
    width: f64,
) -> Result<(), SurfaceError> {
    let path = shape_path(shape, bounds.x, bounds.y, bounds.width, bounds.height);
    let stroke = Stroke::solid(parse_color_or(color, Rgba::BLACK), if width > 0.0 { width } else { 1.0 });
    surface.stroke_path(&path, &stroke)
}

// =============================================================
// Helpers
// =============================================================

/// Move the origin to the layer center and apply its rotation.
fn translate_and_rotate<S: Surface + ?Sized>(surface: &mut S, layer: &Layer) {
    let center = layer.center();
    surface.translate(center.x, center.y);
    if layer.rotation.abs() >= f64::EPSILON {
        surface.rotate(layer.rotation.to_radians());
    }
}
