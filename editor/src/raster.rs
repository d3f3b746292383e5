//! Native RGBA backend for [`Surface`].
//!
//! Pixels live in an [`image::RgbaImage`]. Paths are flattened to polygons,
//! mapped through the current transform, and scan-filled per pixel center
//! with an even-odd test; strokes mark every pixel within half the line width
//! of an outline segment. Images and text are rasterised in their own local
//! frame and inverse-mapped onto the surface, so rotation works the same way
//! for both.
//!
//! Text needs a font: without one, [`Surface::fill_text`] draws nothing and
//! measurement falls back to an average glyph width. Glyph coverage is only
//! computed for the part of the text box that lands on the surface, and font
//! sizes are capped at [`MAX_FONT_SIZE`].

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path as FsPath;

use ab_glyph::{Font as _, FontArc, PxScale, ScaleFont as _, point};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};

use crate::color::Rgba;
use crate::consts::{FALLBACK_ADVANCE, MAX_FONT_SIZE};
use crate::doc::TextAlign;
use crate::geom::{Affine, Path, Point};
use crate::render::{Font, Stroke, Surface, SurfaceError};

/// Surface backed by an in-memory RGBA buffer.
pub struct RasterSurface {
    pixels: RgbaImage,
    transform: Affine,
    alpha: f64,
    stack: Vec<(Affine, f64)>,
    images: HashMap<String, RgbaImage>,
    font: Option<FontArc>,
}

impl RasterSurface {
    /// A transparent surface of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            transform: Affine::IDENTITY,
            alpha: 1.0,
            stack: Vec::new(),
            images: HashMap::new(),
            font: None,
        }
    }

    /// Use `font` for text drawing and measurement.
    #[must_use]
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn set_font(&mut self, font: Option<FontArc>) {
        self.font = font;
    }

    #[must_use]
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Colour of one pixel, `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.pixels.get_pixel_checked(x, y).map(|p| Rgba::new(p[0], p[1], p[2], p[3]))
    }

    /// The backing buffer.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Decode `src` into the cache if it is not there yet.
    fn ensure_decoded(&mut self, src: &str) -> Result<(), SurfaceError> {
        if !self.images.contains_key(src) {
            let bytes = data_url_bytes(src)?;
            let decoded = image::load_from_memory(&bytes)?.to_rgba8();
            tracing::debug!(width = decoded.width(), height = decoded.height(), "decoded image source");
            self.images.insert(src.to_owned(), decoded);
        }
        Ok(())
    }
}

/// Load a TrueType/OpenType font from disk.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or is not a valid font.
pub fn load_font(path: &FsPath) -> Result<FontArc, SurfaceError> {
    let bytes = std::fs::read(path).map_err(|e| SurfaceError::Backend(format!("{}: {e}", path.display())))?;
    FontArc::try_from_vec(bytes).map_err(|e| SurfaceError::Backend(format!("{}: {e}", path.display())))
}

/// Payload bytes of a base64 `data:` URL.
///
/// # Errors
///
/// Returns `SurfaceError::InvalidSource` for anything other than a base64 data URL.
pub fn data_url_bytes(src: &str) -> Result<Vec<u8>, SurfaceError> {
    let rest = src.strip_prefix("data:").ok_or_else(|| SurfaceError::InvalidSource(truncate(src)))?;
    let (meta, payload) = rest.split_once(',').ok_or_else(|| SurfaceError::InvalidSource(truncate(src)))?;
    if !meta.ends_with(";base64") {
        return Err(SurfaceError::InvalidSource(truncate(src)));
    }
    STANDARD.decode(payload.trim()).map_err(|e| SurfaceError::InvalidSource(e.to_string()))
}

/// Encode PNG bytes as a `data:` URL.
#[must_use]
pub fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// Sources can be whole images; keep log and error text short.
fn truncate(src: &str) -> String {
    src.chars().take(48).collect()
}

impl Surface for RasterSurface {
    fn width(&self) -> f64 {
        f64::from(self.pixels.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.pixels.height())
    }

    fn save(&mut self) {
        self.stack.push((self.transform, self.alpha));
    }

    fn restore(&mut self) {
        if let Some((transform, alpha)) = self.stack.pop() {
            self.transform = transform;
            self.alpha = alpha;
        }
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform = self.transform.then_translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.transform = self.transform.then_rotate(radians);
    }

    fn clear(&mut self, color: Rgba) {
        let px = image::Rgba([color.r, color.g, color.b, color.a]);
        for p in self.pixels.pixels_mut() {
            *p = px;
        }
    }

    fn fill_path(&mut self, path: &Path, color: Rgba) -> Result<(), SurfaceError> {
        let poly: Vec<Point> = path.to_polygon().into_iter().map(|p| self.transform.apply(p)).collect();
        let Some(bounds) = PixelBounds::around(&poly, 0.0, &self.pixels) else {
            return Ok(());
        };
        for y in bounds.y0..bounds.y1 {
            for x in bounds.x0..bounds.x1 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if point_in_polygon(center, &poly) {
                    blend(&mut self.pixels, x, y, color, self.alpha);
                }
            }
        }
        Ok(())
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) -> Result<(), SurfaceError> {
        let poly: Vec<Point> = path.to_polygon().into_iter().map(|p| self.transform.apply(p)).collect();
        if poly.len() < 2 {
            return Ok(());
        }
        let scale = self.transform.scale();
        let half = (stroke.width * scale / 2.0).max(0.5);
        let segments = dash_segments(&poly, stroke.dash.map(|d| d * scale), path.is_closed());

        let Some(bounds) = PixelBounds::around(&poly, half, &self.pixels) else {
            return Ok(());
        };
        let mut mask = vec![false; bounds.area()];
        for (a, b) in &segments {
            let Some(seg) = PixelBounds::around(&[*a, *b], half, &self.pixels) else {
                continue;
            };
            for y in seg.y0..seg.y1 {
                for x in seg.x0..seg.x1 {
                    let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                    if segment_distance(center, *a, *b) <= half {
                        mask[bounds.index(x, y)] = true;
                    }
                }
            }
        }
        for y in bounds.y0..bounds.y1 {
            for x in bounds.x0..bounds.x1 {
                if mask[bounds.index(x, y)] {
                    blend(&mut self.pixels, x, y, stroke.color, self.alpha);
                }
            }
        }
        Ok(())
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: Font<'_>,
        align: TextAlign,
        color: Rgba,
    ) -> Result<(), SurfaceError> {
        let Some(face) = self.font.clone() else {
            tracing::debug!(family = font.family, "no font loaded, skipping text");
            return Ok(());
        };
        if !font.size.is_finite() || font.size <= 0.0 {
            return Ok(());
        }
        let size = font.size.min(MAX_FONT_SIZE);
        let scaled = face.as_scaled(PxScale::from(size as f32));
        let ascent = f64::from(scaled.ascent());
        let descent = f64::from(scaled.descent());
        let width = layout_width(&face, text, size);
        let height = ascent - descent;
        if width <= 0.0 || height <= 0.0 {
            return Ok(());
        }

        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let top = y - height / 2.0;
        let transform = self.transform.then_translate(left, top);
        let Some(region) = visible_region(transform, &self.pixels, width.ceil() + 1.0, height.ceil() + 1.0) else {
            return Ok(());
        };

        let mut coverage = vec![0.0_f32; region.area()];
        let mut caret = 0.0_f32;
        let mut prev = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scaled.scale(), point(caret, ascent as f32));
            caret += scaled.h_advance(id);
            prev = Some(id);
            let Some(outlined) = face.outline_glyph(glyph) else {
                continue;
            };
            let b = outlined.px_bounds();
            if !region.overlaps(f64::from(b.min.x), f64::from(b.min.y), f64::from(b.max.x), f64::from(b.max.y)) {
                continue;
            }
            outlined.draw(|gx, gy, cov| {
                let px = i64::from(gx) + b.min.x as i64;
                let py = i64::from(gy) + b.min.y as i64;
                if let Some(idx) = region.checked_index(px, py) {
                    coverage[idx] = coverage[idx].max(cov);
                }
            });
        }

        let (region_w, region_h) = (region.x1 - region.x0, region.y1 - region.y0);
        let transform = transform.then_translate(f64::from(region.x0), f64::from(region.y0));
        let alpha = self.alpha;
        blit(&mut self.pixels, transform, region_w, region_h, f64::from(region_w), f64::from(region_h), |sx, sy| {
            let cov = coverage[sy as usize * region_w as usize + sx as usize];
            (cov > 0.0).then(|| color.with_alpha_factor(f64::from(cov) * alpha))
        });
        Ok(())
    }

    fn measure_text(&mut self, text: &str, font: Font<'_>) -> f64 {
        match &self.font {
            Some(face) => layout_width(face, text, font.size),
            None => FALLBACK_ADVANCE * font.size * text.chars().count() as f64,
        }
    }

    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError> {
        if width <= 0.0 || height <= 0.0 {
            return Ok(());
        }
        let transform = self.transform.then_translate(x, y);
        let alpha = self.alpha;
        self.ensure_decoded(src)?;
        let source = self.images.get(src).ok_or_else(|| SurfaceError::NotLoaded(truncate(src)))?;
        let (sw, sh) = source.dimensions();
        if sw == 0 || sh == 0 {
            return Ok(());
        }
        blit(&mut self.pixels, transform, sw, sh, width, height, |sx, sy| {
            let p = source.get_pixel(sx, sy);
            let c = Rgba::new(p[0], p[1], p[2], p[3]);
            (!c.is_transparent()).then(|| c.with_alpha_factor(alpha))
        });
        Ok(())
    }

    fn image_size(&mut self, src: &str) -> Result<(f64, f64), SurfaceError> {
        self.ensure_decoded(src)?;
        let img = self.images.get(src).ok_or_else(|| SurfaceError::NotLoaded(truncate(src)))?;
        Ok((f64::from(img.width()), f64::from(img.height())))
    }

    fn to_data_url(&mut self) -> Result<String, SurfaceError> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(self.pixels.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .map_err(|e| SurfaceError::Encode(e.to_string()))?;
        Ok(png_data_url(&bytes))
    }
}

// =============================================================
// Rasterisation helpers
// =============================================================

/// Clipped pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy)]
struct PixelBounds {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelBounds {
    /// Bounding box of `points` grown by `pad`, clipped to the image. `None` when empty.
    fn around(points: &[Point], pad: f64, img: &RgbaImage) -> Option<Self> {
        Self::within(points, pad, f64::from(img.width()), f64::from(img.height()))
    }

    /// Bounding box of `points` grown by `pad`, clipped to `[0, max_x) x [0, max_y)`.
    fn within(points: &[Point], pad: f64, max_x_limit: f64, max_y_limit: f64) -> Option<Self> {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if !min_x.is_finite() || !max_x.is_finite() || !min_y.is_finite() || !max_y.is_finite() {
            return None;
        }
        let x0 = (min_x - pad).floor().clamp(0.0, max_x_limit) as u32;
        let y0 = (min_y - pad).floor().clamp(0.0, max_y_limit) as u32;
        let x1 = (max_x + pad).ceil().clamp(0.0, max_x_limit) as u32;
        let y1 = (max_y + pad).ceil().clamp(0.0, max_y_limit) as u32;
        (x0 < x1 && y0 < y1).then_some(Self { x0, y0, x1, y1 })
    }

    /// Whether the box `[min, max)` in the same space touches these bounds.
    fn overlaps(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
        min_x < f64::from(self.x1) && max_x > f64::from(self.x0) && min_y < f64::from(self.y1) && max_y > f64::from(self.y0)
    }

    /// Buffer index of a signed pixel position, `None` outside the bounds.
    fn checked_index(&self, x: i64, y: i64) -> Option<usize> {
        let inside = x >= i64::from(self.x0) && x < i64::from(self.x1) && y >= i64::from(self.y0) && y < i64::from(self.y1);
        inside.then(|| self.index(x as u32, y as u32))
    }

    fn area(&self) -> usize {
        (self.x1 - self.x0) as usize * (self.y1 - self.y0) as usize
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y - self.y0) as usize * (self.x1 - self.x0) as usize + (x - self.x0) as usize
    }
}

/// Source-over blend of `color` scaled by `alpha` into one pixel.
fn blend(img: &mut RgbaImage, x: u32, y: u32, color: Rgba, alpha: f64) {
    let sa = f64::from(color.a) / 255.0 * alpha;
    if sa <= 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x, y);
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: u8, d: u8| ((f64::from(s) * sa + f64::from(d) * da * (1.0 - sa)) / out_a).round() as u8;
    *dst = image::Rgba([
        mix(color.r, dst[0]),
        mix(color.g, dst[1]),
        mix(color.b, dst[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

/// Map a `src_w x src_h` source onto the local box `[0, width] x [0, height]`
/// under `transform`, sampling nearest-neighbour from the inverse-mapped
/// pixel center.
fn blit<F>(img: &mut RgbaImage, transform: Affine, src_w: u32, src_h: u32, width: f64, height: f64, sample: F)
where
    F: Fn(u32, u32) -> Option<Rgba>,
{
    let Some(inverse) = transform.inverse() else {
        return;
    };
    let corners = [
        transform.apply(Point::new(0.0, 0.0)),
        transform.apply(Point::new(width, 0.0)),
        transform.apply(Point::new(width, height)),
        transform.apply(Point::new(0.0, height)),
    ];
    let Some(bounds) = PixelBounds::around(&corners, 0.0, img) else {
        return;
    };
    let sx_scale = f64::from(src_w) / width;
    let sy_scale = f64::from(src_h) / height;
    for y in bounds.y0..bounds.y1 {
        for x in bounds.x0..bounds.x1 {
            let local = inverse.apply(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5));
            if local.x < 0.0 || local.y < 0.0 || local.x >= width || local.y >= height {
                continue;
            }
            let sx = ((local.x * sx_scale) as u32).min(src_w - 1);
            let sy = ((local.y * sy_scale) as u32).min(src_h - 1);
            if let Some(c) = sample(sx, sy) {
                blend(img, x, y, c, 1.0);
            }
        }
    }
}

/// Pixels of the local box `[0, width) x [0, height)` that `transform` can
/// map onto the surface, found by inverse-mapping the surface corners.
fn visible_region(transform: Affine, img: &RgbaImage, width: f64, height: f64) -> Option<PixelBounds> {
    let inverse = transform.inverse()?;
    let (w, h) = (f64::from(img.width()), f64::from(img.height()));
    let corners = [Point::new(0.0, 0.0), Point::new(w, 0.0), Point::new(w, h), Point::new(0.0, h)].map(|p| inverse.apply(p));
    PixelBounds::within(&corners, 1.0, width, height)
}

/// Sum of advances and kerning for `text` at `size` pixels.
fn layout_width(face: &FontArc, text: &str, size: f64) -> f64 {
    let scaled = face.as_scaled(PxScale::from(size as f32));
    let mut width = 0.0_f32;
    let mut prev = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    f64::from(width)
}

/// Even-odd point-in-polygon test.
fn point_in_polygon(p: Point, poly: &[Point]) -> bool {
    let mut inside = false;
    let mut j = poly.len().wrapping_sub(1);
    for (i, a) in poly.iter().enumerate() {
        let b = poly[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance from `p` to the segment `a..b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Split the outline into visible segments, alternating `dash` on and off
/// along its length. A solid stroke returns every edge. Open outlines skip the
/// closing edge.
fn dash_segments(poly: &[Point], dash: Option<f64>, closed: bool) -> Vec<(Point, Point)> {
    let count = if closed { poly.len() } else { poly.len().saturating_sub(1) };
    let edges = (0..count).map(|i| (poly[i], poly[(i + 1) % poly.len()]));
    let Some(dash) = dash.filter(|d| *d > 0.0) else {
        return edges.collect();
    };

    let mut out = Vec::new();
    let mut on = true;
    let mut remaining = dash;
    for (a, b) in edges {
        let len = a.distance(b);
        let mut t = 0.0;
        while t < len {
            let step = remaining.min(len - t);
            if on {
                let p0 = lerp(a, b, t / len);
                let p1 = lerp(a, b, (t + step) / len);
                out.push((p0, p1));
            }
            t += step;
            remaining -= step;
            if remaining <= f64::EPSILON {
                on = !on;
                remaining = dash;
            }
        }
    }
    out
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}
