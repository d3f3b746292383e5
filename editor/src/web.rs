//! Browser backend: draws into a `CanvasRenderingContext2d`.
//!
//! This module is the only place that touches `web_sys`. [`WebSurface`]
//! implements [`Surface`] over a 2D context, and [`WebEditor`] exposes the
//! engine to JavaScript with JSON-encoded commands and actions.
//!
//! Images are `HtmlImageElement`s cached by source. A freshly created
//! element decodes asynchronously, so the first draw of a new source reports
//! [`SurfaceError::NotLoaded`]; the host repaints once the image has loaded.

use std::collections::HashMap;
use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::color::Rgba;
use crate::consts::FALLBACK_ADVANCE;
use crate::doc::TextAlign;
use crate::engine::{EditorConfig, Engine};
use crate::geom::{Path, Point};
use crate::input::{Button, Key, Modifiers};
use crate::render::{Font, Stroke, Surface, SurfaceError};

fn js_error(err: &JsValue) -> SurfaceError {
    SurfaceError::Backend(format!("{err:?}"))
}

fn css(color: Rgba) -> String {
    format!("rgba({}, {}, {}, {})", color.r, color.g, color.b, f64::from(color.a) / 255.0)
}

/// Surface over a browser canvas element.
pub struct WebSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<String, HtmlImageElement>,
}

impl WebSurface {
    /// Bind to `canvas`, acquiring its 2D context.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SurfaceError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| js_error(&e))?
            .ok_or_else(|| SurfaceError::Backend("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|e| js_error(&e))?;
        Ok(Self { canvas, ctx, images: HashMap::new() })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// The cached element for `src`, created on first use. Errors until it has decoded.
    fn loaded_image(&mut self, src: &str) -> Result<&HtmlImageElement, SurfaceError> {
        if !self.images.contains_key(src) {
            let img = HtmlImageElement::new().map_err(|e| js_error(&e))?;
            img.set_src(src);
            self.images.insert(src.to_owned(), img);
        }
        match self.images.get(src) {
            Some(img) if img.complete() && img.natural_width() > 0 => Ok(img),
            _ => Err(SurfaceError::NotLoaded(src.chars().take(48).collect())),
        }
    }

    fn trace_path(&self, path: &Path) -> Result<(), SurfaceError> {
        self.ctx.begin_path();
        if let Path::Circle { cx, cy, radius } = path {
            self.ctx.arc(*cx, *cy, *radius, 0.0, TAU).map_err(|e| js_error(&e))?;
            return Ok(());
        }
        let points = path.to_polygon();
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        self.ctx.move_to(first.x, first.y);
        for Point { x, y } in rest {
            self.ctx.line_to(*x, *y);
        }
        if path.is_closed() {
            self.ctx.close_path();
        }
        Ok(())
    }
}

impl Surface for WebSurface {
    fn width(&self) -> f64 {
        f64::from(self.canvas.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.canvas.height())
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        if let Err(e) = self.ctx.translate(dx, dy) {
            tracing::warn!(error = ?e, "translate failed");
        }
    }

    fn rotate(&mut self, radians: f64) {
        if let Err(e) = self.ctx.rotate(radians) {
            tracing::warn!(error = ?e, "rotate failed");
        }
    }

    fn clear(&mut self, color: Rgba) {
        self.ctx.save();
        if let Err(e) = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0) {
            tracing::warn!(error = ?e, "reset transform failed");
        }
        self.ctx.set_global_alpha(1.0);
        let (w, h) = (self.width(), self.height());
        self.ctx.clear_rect(0.0, 0.0, w, h);
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.fill_rect(0.0, 0.0, w, h);
        self.ctx.restore();
    }

    fn fill_path(&mut self, path: &Path, color: Rgba) -> Result<(), SurfaceError> {
        self.trace_path(path)?;
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.fill();
        Ok(())
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) -> Result<(), SurfaceError> {
        self.trace_path(path)?;
        self.ctx.set_stroke_style_str(&css(stroke.color));
        self.ctx.set_line_width(stroke.width);
        let (join, cap) = if path.is_closed() { ("miter", "butt") } else { ("round", "round") };
        self.ctx.set_line_join(join);
        self.ctx.set_line_cap(cap);
        let dash_array = js_sys::Array::new();
        if let Some(dash) = stroke.dash {
            dash_array.push(&dash.into());
            dash_array.push(&dash.into());
        }
        self.ctx.set_line_dash(&dash_array).map_err(|e| js_error(&e))?;
        self.ctx.stroke();
        self.ctx.set_line_dash(&js_sys::Array::new()).map_err(|e| js_error(&e))
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
        self.ctx.set_font(&font.css());
        self.ctx.set_text_align(align.as_str());
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.fill_text(text, x, y).map_err(|e| js_error(&e))
    }

    fn measure_text(&mut self, text: &str, font: Font<'_>) -> f64 {
        self.ctx.set_font(&font.css());
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(_) => FALLBACK_ADVANCE * font.size * text.chars().count() as f64,
        }
    }

    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError> {
        let img = self.loaded_image(src)?.clone();
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(&img, x, y, width, height)
            .map_err(|e| js_error(&e))
    }

    fn image_size(&mut self, src: &str) -> Result<(f64, f64), SurfaceError> {
        let img = self.loaded_image(src)?;
        Ok((f64::from(img.natural_width()), f64::from(img.natural_height())))
    }

    fn to_data_url(&mut self) -> Result<String, SurfaceError> {
        self.canvas.to_data_url().map_err(|e| SurfaceError::Encode(format!("{e:?}")))
    }
}

// =============================================================
// JavaScript bindings
// =============================================================

fn to_js(err: &SurfaceError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// DOM `MouseEvent.button` to [`Button`].
fn dom_button(button: i16) -> Button {
    match button {
        1 => Button::Middle,
        2 => Button::Secondary,
        _ => Button::Primary,
    }
}

/// The editor as seen from JavaScript. Every handler returns the resulting
/// actions as a JSON array.
#[wasm_bindgen]
pub struct WebEditor {
    engine: Engine<WebSurface>,
}

#[wasm_bindgen]
impl WebEditor {
    /// Bind an editor to `canvas`. `config` is an optional JSON `EditorConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: Option<String>) -> Result<WebEditor, JsValue> {
        let config: EditorConfig = match config {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => EditorConfig::default(),
        };
        canvas.set_width(config.width);
        canvas.set_height(config.height);
        let surface = WebSurface::new(canvas).map_err(|e| to_js(&e))?;
        let engine = Engine::new(surface, &config).map_err(|e| to_js(&e))?;
        Ok(Self { engine })
    }

    /// Receive the PNG data URL whenever the design is saved.
    pub fn set_on_save(&mut self, callback: js_sys::Function) {
        self.engine.set_on_save(move |url| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&url)) {
                tracing::warn!(error = ?e, "save callback failed");
            }
        });
    }

    #[allow(clippy::fn_params_excessive_bools)]
    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16, shift: bool, ctrl: bool, alt: bool, meta: bool) -> Result<String, JsValue> {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        let actions = self.engine.on_pointer_down(Point::new(x, y), dom_button(button), modifiers).map_err(|e| to_js(&e))?;
        to_json(&actions)
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<String, JsValue> {
        let actions = self.engine.on_pointer_move(Point::new(x, y), Modifiers::default()).map_err(|e| to_js(&e))?;
        to_json(&actions)
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, button: i16) -> Result<String, JsValue> {
        let actions = self
            .engine
            .on_pointer_up(Point::new(x, y), dom_button(button), Modifiers::default())
            .map_err(|e| to_js(&e))?;
        to_json(&actions)
    }

    #[allow(clippy::fn_params_excessive_bools)]
    pub fn key_down(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> Result<String, JsValue> {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        let actions = self.engine.on_key_down(&Key::new(key), modifiers).map_err(|e| to_js(&e))?;
        to_json(&actions)
    }

    pub fn key_up(&mut self, key: &str) -> Result<String, JsValue> {
        let actions = self.engine.on_key_up(&Key::new(key), Modifiers::default()).map_err(|e| to_js(&e))?;
        to_json(&actions)
    }

    /// Apply one JSON-encoded `Command`.
    pub fn command(&mut self, command: &str) -> Result<String, JsValue> {
        let command = serde_json::from_str(command).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let actions = self.engine.command(command).map_err(|e| to_js(&e))?;
        to_json(&actions)
    }

    /// Repaint, e.g. after an image finished loading.
    pub fn render(&mut self) -> Result<(), JsValue> {
        self.engine.render().map_err(|e| to_js(&e))
    }

    /// The layer stack as JSON.
    pub fn layers(&self) -> Result<String, JsValue> {
        to_json(self.engine.core.layers())
    }
}
