//! Input model: tools, modifier keys, tool settings, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! or key event. `ToolSettings` holds the palette values new layers are
//! created with. `InputState` is the active gesture tracked between
//! pointer-down and pointer-up, carrying the context needed to apply
//! incremental changes and decide on release whether a history entry is due.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::color::{Rgba, parse_color_or};
use crate::consts::{DEFAULT_BACKGROUND, DEFAULT_TEXT, ERASER_WIDTH_FACTOR};
use crate::doc::{LayerId, ShapeType, Style, TextAlign};
use crate::geom::Point;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum Tool {
    /// Pick the topmost layer under the pointer and drag it (default).
    #[default]
    Select,
    /// Drag the current selection from anywhere on the canvas.
    Move,
    /// Grow or shrink the current selection by the drag delta.
    Resize,
    /// Turn the current selection to follow the pointer angle.
    Rotate,
    /// Draw a new shape layer of the given outline.
    Shape { shape: ShapeType },
    /// Click to place a text layer.
    Text,
    /// Freehand line in the tool colour.
    Brush,
    /// Freehand line in the background colour, twice the brush width.
    Eraser,
}

impl Tool {
    /// Whether this tool operates on the existing selection rather than creating layers.
    #[must_use]
    pub fn edits_selection(self) -> bool {
        matches!(self, Self::Move | Self::Resize | Self::Rotate)
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Delete"`, `"ArrowLeft"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Unit direction for arrow keys, `None` otherwise.
    #[must_use]
    pub fn arrow_direction(&self) -> Option<(f64, f64)> {
        match self.0.as_str() {
            "ArrowLeft" => Some((-1.0, 0.0)),
            "ArrowRight" => Some((1.0, 0.0)),
            "ArrowUp" => Some((0.0, -1.0)),
            "ArrowDown" => Some((0.0, 1.0)),
            _ => None,
        }
    }

    /// Case-insensitive comparison for letter shortcuts.
    #[must_use]
    pub fn is_letter(&self, letter: char) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.eq_ignore_ascii_case(&letter))
    }
}

/// Palette values applied to newly created layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Stroke colour for shapes, fill colour for text.
    pub color: String,
    /// Stroke width for shapes and brush lines.
    pub brush_size: f64,
    pub font_family: String,
    pub font_size: f64,
    pub text_align: TextAlign,
    pub opacity: f64,
    /// Text placed by the next text-tool click. Empty means the default label.
    pub text_input: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: "#000000".into(),
            brush_size: 5.0,
            font_family: "Arial".into(),
            font_size: 20.0,
            text_align: TextAlign::Center,
            opacity: 1.0,
            text_input: String::new(),
        }
    }
}

impl ToolSettings {
    /// Style for a new shape: transparent fill, current stroke.
    #[must_use]
    pub fn shape_style(&self) -> Style {
        Style {
            fill: Some("transparent".into()),
            stroke: Some(self.color.clone()),
            stroke_width: Some(self.brush_size),
            opacity: Some(self.opacity.clamp(0.0, 1.0)),
            ..Style::default()
        }
    }

    /// Style for a new text layer.
    #[must_use]
    pub fn text_style(&self) -> Style {
        Style {
            fill: Some(self.color.clone()),
            font_size: Some(self.font_size),
            font_family: Some(self.font_family.clone()),
            opacity: Some(self.opacity.clamp(0.0, 1.0)),
            ..Style::default()
        }
    }

    /// Style for a freehand line. The eraser paints `background` at
    /// [`ERASER_WIDTH_FACTOR`] times the brush size.
    #[must_use]
    pub fn stroke_style(&self, eraser: bool, background: &str) -> Style {
        let (color, width) = if eraser {
            (parse_color_or(background, Rgba::WHITE).to_hex(), self.brush_size * ERASER_WIDTH_FACTOR)
        } else {
            (self.color.clone(), self.brush_size)
        };
        Style {
            stroke: Some(color),
            stroke_width: Some(width),
            opacity: Some(if eraser { 1.0 } else { self.opacity.clamp(0.0, 1.0) }),
            ..Style::default()
        }
    }

    /// Style for a new image layer.
    #[must_use]
    pub fn image_style(&self) -> Style {
        Style { opacity: Some(self.opacity.clamp(0.0, 1.0)), ..Style::default() }
    }

    /// The text a text-tool click will place.
    #[must_use]
    pub fn pending_text(&self) -> &str {
        if self.text_input.is_empty() { DEFAULT_TEXT } else { &self.text_input }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// The id of the currently selected layer, if any.
    pub selected_id: Option<LayerId>,
    /// CSS colour painted under every layer.
    pub background: String,
    pub settings: ToolSettings,
    /// Hide selection chrome while rendering for export.
    pub hide_selection: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            selected_id: None,
            background: DEFAULT_BACKGROUND.into(),
            settings: ToolSettings::default(),
            hide_selection: false,
        }
    }
}

/// Normalised box spanned by two corner points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DragBox {
    /// Min corner plus absolute size, regardless of drag direction.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { x: a.x.min(b.x), y: a.y.min(b.y), width: (b.x - a.x).abs(), height: (b.y - a.y).abs() }
    }
}

/// Internal state for the input state machine.
///
/// Each active variant carries gesture context needed to apply deltas and
/// decide on pointer-up whether the gesture produced a history entry.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Moving an existing layer across the canvas.
    DraggingLayer {
        /// Id of the layer being dragged.
        id: LayerId,
        /// Pointer position at the previous event.
        last: Point,
        /// Whether any move event changed the layer.
        moved: bool,
    },
    /// Growing or shrinking a layer by the drag delta.
    ResizingLayer {
        id: LayerId,
        /// Pointer position at the start of the resize.
        start: Point,
        /// Layer width at the start of the resize.
        orig_w: f64,
        /// Layer height at the start of the resize.
        orig_h: f64,
        moved: bool,
    },
    /// Turning a layer around its center.
    RotatingLayer {
        id: LayerId,
        /// Center of the layer; the rotation pivot.
        center: Point,
        /// Pointer angle in degrees at the start of the gesture.
        start_angle: f64,
        /// Rotation in degrees at the start of the gesture, used to compute delta.
        orig_rotation: f64,
        moved: bool,
    },
    /// Dragging out a new shape; the layer is created on release.
    DrawingShape {
        shape: ShapeType,
        /// Where the drag started.
        anchor: Point,
        /// Latest pointer position.
        current: Point,
    },
    /// Dragging a freehand line; the layer is created on release.
    DrawingStroke {
        /// Pointer positions so far, in canvas space.
        points: Vec<Point>,
        eraser: bool,
    },
}

/// What the renderer draws for a creation gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preview<'a> {
    Shape { shape: ShapeType, bounds: DragBox },
    Stroke { points: &'a [Point], eraser: bool },
}

impl InputState {
    /// The outline to preview while a shape drag is in progress.
    #[must_use]
    pub fn shape_preview(&self) -> Option<(ShapeType, DragBox)> {
        match self {
            Self::DrawingShape { shape, anchor, current } => Some((*shape, DragBox::from_corners(*anchor, *current))),
            _ => None,
        }
    }

    /// Everything a creation gesture needs drawn before it becomes a layer.
    #[must_use]
    pub fn preview(&self) -> Option<Preview<'_>> {
        if let Some((shape, bounds)) = self.shape_preview() {
            return Some(Preview::Shape { shape, bounds });
        }
        match self {
            Self::DrawingStroke { points, eraser } => Some(Preview::Stroke { points, eraser: *eraser }),
            _ => None,
        }
    }

    /// The layer a transform gesture is acting on.
    #[must_use]
    pub fn target(&self) -> Option<LayerId> {
        match self {
            Self::DraggingLayer { id, .. } | Self::ResizingLayer { id, .. } | Self::RotatingLayer { id, .. } => {
                Some(*id)
            }
            Self::Idle | Self::DrawingShape { .. } | Self::DrawingStroke { .. } => None,
        }
    }
}

/// Pointer angle around `center` in degrees, clockwise from the positive x axis.
#[must_use]
pub fn angle_degrees(center: Point, pt: Point) -> f64 {
    (pt.y - center.y).atan2(pt.x - center.x).to_degrees()
}
