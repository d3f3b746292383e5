//! Document model: layers, their styles, and the ordered layer stack.
//!
//! This module defines what is on the canvas (`Layer`, `LayerKind`), sparse
//! update types for incremental edits (`StylePatch`, `TransformPatch`), and
//! the runtime store that owns all live layers (`LayerStack`).
//!
//! Order is the only z-information: index 0 is painted first and the last
//! layer is topmost for both painting and hit-testing. Every mutation here is
//! plain data manipulation; the engine decides when a mutation becomes a
//! history entry.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::{Rgba, parse_color_or};
use crate::consts::{DUPLICATE_OFFSET, MAX_FONT_SIZE};
use crate::geom::Point;

/// Unique identifier for a layer.
pub type LayerId = Uuid;

/// Outline drawn by a shape layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// The layer box itself.
    #[default]
    Rectangle,
    /// Circle of radius `min(width, height) / 2` centred in the box.
    Circle,
    /// Apex at top-center, base along the bottom edge.
    Triangle,
}

/// Horizontal text anchoring relative to the box center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    /// The canvas `textAlign` keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Kind-specific payload of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Shape { shape: ShapeType },
    Text { text: String, align: TextAlign },
    Image { src: String },
    /// Freehand brush or eraser line. Points are fractions of the layer box,
    /// so moving and resizing the layer carry the line along.
    Stroke { points: Vec<Point> },
}

impl LayerKind {
    /// The kind tag as it appears on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shape { .. } => "shape",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Stroke { .. } => "stroke",
        }
    }
}

/// Style attributes. Absent fields fall back to per-kind defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Style {
    /// Fill colour for shapes. Transparent when absent.
    #[must_use]
    pub fn shape_fill(&self) -> Rgba {
        self.fill
            .as_deref()
            .map_or(Rgba::TRANSPARENT, |c| parse_color_or(c, Rgba::TRANSPARENT))
    }

    /// Fill colour for text. Black when absent.
    #[must_use]
    pub fn text_fill(&self) -> Rgba {
        self.fill
            .as_deref()
            .map_or(Rgba::BLACK, |c| parse_color_or(c, Rgba::BLACK))
    }

    /// Stroke colour. Black when absent.
    #[must_use]
    pub fn stroke(&self) -> Rgba {
        self.stroke
            .as_deref()
            .map_or(Rgba::BLACK, |c| parse_color_or(c, Rgba::BLACK))
    }

    /// Stroke width in pixels. Defaults to `1.0`.
    #[must_use]
    pub fn stroke_width(&self) -> f64 {
        self.stroke_width.filter(|w| *w > 0.0).unwrap_or(1.0)
    }

    /// Font size in pixels, capped at [`MAX_FONT_SIZE`]. Defaults to `20.0`.
    #[must_use]
    pub fn font_size(&self) -> f64 {
        self.font_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .map_or(20.0, |s| s.min(MAX_FONT_SIZE))
    }

    /// Font family. Defaults to `"Arial"`.
    #[must_use]
    pub fn font_family(&self) -> &str {
        self.font_family.as_deref().unwrap_or("Arial")
    }

    /// Opacity clamped to `0..=1`. Defaults to `1.0`.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.opacity.map_or(1.0, |o| o.clamp(0.0, 1.0))
    }

    /// CSS font shorthand, e.g. `"20px Arial"`.
    #[must_use]
    pub fn font(&self) -> String {
        format!("{}px {}", self.font_size(), self.font_family())
    }
}

/// Sparse style update. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl StylePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Sparse geometry update. Only present fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl TransformPatch {
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    #[must_use]
    pub fn size(width: f64, height: f64) -> Self {
        Self { width: Some(width), height: Some(height), ..Self::default() }
    }

    #[must_use]
    pub fn rotation(degrees: f64) -> Self {
        Self { rotation: Some(degrees), ..Self::default() }
    }
}

/// One drawable unit in the z-ordered stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier for this layer.
    pub id: LayerId,
    /// Kind tag and kind-specific payload.
    #[serde(flatten)]
    pub kind: LayerKind,
    /// Left edge of the unrotated box.
    pub x: f64,
    /// Top edge of the unrotated box.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees around the box center.
    pub rotation: f64,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    /// A new unlocked, visible, unrotated layer with a fresh id.
    #[must_use]
    pub fn new(kind: LayerKind, x: f64, y: f64, width: f64, height: f64, style: Style) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            style,
            locked: false,
            visible: true,
        }
    }

    /// A stroke layer through `points` (canvas space), boxed to the line plus
    /// half the stroke width on every side. `None` for fewer than two points.
    #[must_use]
    pub fn freehand(points: &[Point], style: Style) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let pad = style.stroke_width() / 2.0;
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let (x, y) = (min_x - pad, min_y - pad);
        let width = max_x - min_x + pad * 2.0;
        let height = max_y - min_y + pad * 2.0;
        let unit = points.iter().map(|p| Point::new((p.x - x) / width, (p.y - y) / height)).collect();
        Some(Self::new(LayerKind::Stroke { points: unit }, x, y, width, height, style))
    }

    /// Center of the layer box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn apply_transform(&mut self, patch: &TransformPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(w) = patch.width {
            self.width = w;
        }
        if let Some(h) = patch.height {
            self.height = h;
        }
        if let Some(r) = patch.rotation {
            self.rotation = r;
        }
    }

    fn apply_style(&mut self, patch: &StylePatch) {
        if let Some(fill) = &patch.fill {
            self.style.fill = Some(fill.clone());
        }
        if let Some(stroke) = &patch.stroke {
            self.style.stroke = Some(stroke.clone());
        }
        if let Some(w) = patch.stroke_width {
            self.style.stroke_width = Some(w);
        }
        if let Some(s) = patch.font_size {
            self.style.font_size = Some(s);
        }
        if let Some(family) = &patch.font_family {
            self.style.font_family = Some(family.clone());
        }
        if let Some(o) = patch.opacity {
            self.style.opacity = Some(o.clamp(0.0, 1.0));
        }
    }
}

/// Ordered store of layers. Index order is paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Build a stack from layers in paint order.
    #[must_use]
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// Push a layer on top and return its id.
    pub fn push(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.layers.push(layer);
        id
    }

    /// Remove a layer by id, returning it if it was present.
    pub fn remove(&mut self, id: &LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        Some(self.layers.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == *id)
    }

    pub fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == *id)
    }

    /// Position of a layer in paint order.
    #[must_use]
    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == *id)
    }

    /// Layers bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Layers bottom to top as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Swap a layer with the one above it. Returns false at the top or when missing.
    pub fn move_up(&mut self, id: &LayerId) -> bool {
        match self.index_of(id) {
            Some(i) if i + 1 < self.layers.len() => {
                self.layers.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }

    /// Swap a layer with the one below it. Returns false at the bottom or when missing.
    pub fn move_down(&mut self, id: &LayerId) -> bool {
        match self.index_of(id) {
            Some(i) if i > 0 => {
                self.layers.swap(i, i - 1);
                true
            }
            _ => false,
        }
    }

    /// Move a layer to the top of the stack.
    pub fn bring_to_front(&mut self, id: &LayerId) -> bool {
        match self.index_of(id) {
            Some(i) if i + 1 < self.layers.len() => {
                let layer = self.layers.remove(i);
                self.layers.push(layer);
                true
            }
            _ => false,
        }
    }

    /// Move a layer to the bottom of the stack.
    pub fn send_to_back(&mut self, id: &LayerId) -> bool {
        match self.index_of(id) {
            Some(i) if i > 0 => {
                let layer = self.layers.remove(i);
                self.layers.insert(0, layer);
                true
            }
            _ => false,
        }
    }

    /// Flip the locked flag. Returns the new value, or `None` when missing.
    pub fn toggle_locked(&mut self, id: &LayerId) -> Option<bool> {
        let layer = self.get_mut(id)?;
        layer.locked = !layer.locked;
        Some(layer.locked)
    }

    /// Flip the visible flag. Returns the new value, or `None` when missing.
    pub fn toggle_visible(&mut self, id: &LayerId) -> Option<bool> {
        let layer = self.get_mut(id)?;
        layer.visible = !layer.visible;
        Some(layer.visible)
    }

    /// Merge a style patch into a layer. Returns false when missing.
    pub fn update_style(&mut self, id: &LayerId, patch: &StylePatch) -> bool {
        let Some(layer) = self.get_mut(id) else {
            return false;
        };
        layer.apply_style(patch);
        true
    }

    /// Merge a transform patch into a layer. Returns false when missing.
    pub fn update_transform(&mut self, id: &LayerId, patch: &TransformPatch) -> bool {
        let Some(layer) = self.get_mut(id) else {
            return false;
        };
        layer.apply_transform(patch);
        true
    }

    /// Copy a layer under a fresh id, offset diagonally, and push it on top.
    pub fn duplicate(&mut self, id: &LayerId) -> Option<LayerId> {
        let mut copy = self.get(id)?.clone();
        copy.id = Uuid::new_v4();
        copy.x += DUPLICATE_OFFSET;
        copy.y += DUPLICATE_OFFSET;
        Some(self.push(copy))
    }

    /// Remove every layer.
    pub fn clear(&mut self) {
        self.layers.clear();
    }
}
