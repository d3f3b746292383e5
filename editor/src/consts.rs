//! Shared numeric constants for the editor crate.

// ── Canvas ──────────────────────────────────────────────────────

/// Default canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 800;

/// Default canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 600;

/// Default background colour.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Maximum number of history entries kept before the oldest is dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

// ── Layer creation ──────────────────────────────────────────────

/// Shapes drawn smaller than this in either dimension are discarded.
pub const MIN_SHAPE_SIZE: f64 = 10.0;

/// Resizing never shrinks a layer below this width or height.
pub const MIN_RESIZE_SIZE: f64 = 10.0;

/// Offset applied to both axes when duplicating a layer.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Text layers are this many times wider than the measured text.
pub const TEXT_BOX_WIDTH_FACTOR: f64 = 1.5;

/// Text layers are this many times taller than the font size.
pub const TEXT_BOX_HEIGHT_FACTOR: f64 = 1.5;

/// Horizontal offset from the canvas center for centred text.
pub const CENTERED_TEXT_X_OFFSET: f64 = 100.0;

/// Added images fit within this fraction of each canvas dimension.
pub const IMAGE_FIT_FRACTION: f64 = 0.5;

/// Placeholder text used when the text tool is clicked with no pending input.
pub const DEFAULT_TEXT: &str = "Text";

/// Average glyph advance as a fraction of font size, for measuring without a font.
pub const FALLBACK_ADVANCE: f64 = 0.6;

/// Largest font size accepted, in pixels.
pub const MAX_FONT_SIZE: f64 = 1000.0;

/// Eraser strokes are this many times wider than the brush.
pub const ERASER_WIDTH_FACTOR: f64 = 2.0;

// ── Keyboard ────────────────────────────────────────────────────

/// Arrow-key nudge distance in pixels.
pub const NUDGE_STEP: f64 = 1.0;

/// Arrow-key nudge distance with Shift held.
pub const NUDGE_STEP_SHIFT: f64 = 10.0;

// ── Selection chrome ────────────────────────────────────────────

/// Selection border colour.
pub const SELECTION_COLOR: &str = "#4285f4";

/// Selection border width in pixels.
pub const SELECTION_LINE_WIDTH: f64 = 2.0;

/// Dash and gap length of the selection border.
pub const SELECTION_DASH: f64 = 5.0;

/// Gap between the layer box and the selection border.
pub const SELECTION_PADDING: f64 = 2.0;

/// Side length of the square corner handles.
pub const HANDLE_SIZE: f64 = 8.0;

// ── Geometry ────────────────────────────────────────────────────

/// Segments used when flattening a circle for backends without arcs.
pub const CIRCLE_SEGMENTS: usize = 64;
