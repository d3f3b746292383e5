//! Editor engine: input handling, commands, history, and repainting.
//!
//! [`EngineCore`] holds all editor state and the logic that mutates it. It
//! never encodes pixels, so it can be driven directly in tests; operations
//! that need text metrics or image sizes take the surface as a read-only
//! helper. [`Engine`] owns the surface, repaints after every mutation, and
//! turns [`Action::Commit`] into a history entry carrying the rendered bitmap.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CANVAS_HEIGHT, CANVAS_WIDTH, CENTERED_TEXT_X_OFFSET, DEFAULT_BACKGROUND, DEFAULT_HISTORY_LIMIT,
    IMAGE_FIT_FRACTION, MAX_FONT_SIZE, MIN_RESIZE_SIZE, MIN_SHAPE_SIZE, NUDGE_STEP, NUDGE_STEP_SHIFT, TEXT_BOX_HEIGHT_FACTOR,
    TEXT_BOX_WIDTH_FACTOR,
};
use crate::doc::{Layer, LayerId, LayerKind, LayerStack, ShapeType, StylePatch, TextAlign, TransformPatch};
use crate::geom::Point;
use crate::history::{History, HistoryEntry};
use crate::hit;
use crate::input::{Button, DragBox, InputState, Key, Modifiers, Tool, UiState, angle_degrees};
use crate::render::{self, Font, Surface, SurfaceError};

/// Editor construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Initial background colour.
    pub background: String,
    /// Maximum number of history entries kept.
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            background: DEFAULT_BACKGROUND.into(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// The selected layer changed. Carries the new selection for style controls.
    SelectionChanged { layer: Option<Layer> },
    LayerCreated { id: LayerId },
    LayerDeleted { id: LayerId },
    /// The document reached a state worth a history entry.
    Commit,
    /// The history cursor moved or grew.
    HistoryChanged { can_undo: bool, can_redo: bool },
    RenderNeeded,
}

/// Discrete editor commands, as issued by toolbars and the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SetTool { tool: Tool },
    SetColor { color: String },
    SetBrushSize { size: f64 },
    SetFontFamily { family: String },
    SetFontSize { size: f64 },
    SetTextAlign { align: TextAlign },
    SetOpacity { opacity: f64 },
    SetTextInput { text: String },
    SetBackground { color: String },
    /// Add text at the canvas center. Without `text`, the pending text input is used.
    AddText {
        #[serde(default)]
        text: Option<String>,
    },
    /// Add an image fitted into the canvas. Missing dimensions are read from the surface.
    AddImage {
        src: String,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
    Select { id: Option<LayerId> },
    Delete { id: LayerId },
    DeleteSelected,
    DuplicateSelected,
    MoveUp { id: LayerId },
    MoveDown { id: LayerId },
    BringToFront { id: LayerId },
    SendToBack { id: LayerId },
    ToggleLocked { id: LayerId },
    ToggleVisible { id: LayerId },
    UpdateStyle { id: LayerId, patch: StylePatch },
    UpdateTransform { id: LayerId, patch: TransformPatch },
    Clear,
    Undo,
    Redo,
    Save,
}

/// What a key press means, independent of state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Undo,
    Redo,
    Duplicate,
    Deselect,
    Delete,
    Nudge { dx: f64, dy: f64 },
}

impl KeyAction {
    /// Map a key press to an editor action, if it has one.
    #[must_use]
    pub fn from_key(key: &Key, modifiers: Modifiers) -> Option<Self> {
        if modifiers.command() {
            if key.is_letter('z') {
                return Some(if modifiers.shift { Self::Redo } else { Self::Undo });
            }
            if key.is_letter('y') {
                return Some(Self::Redo);
            }
            if key.is_letter('d') {
                return Some(Self::Duplicate);
            }
            return None;
        }
        match key.0.as_str() {
            "Escape" => Some(Self::Deselect),
            "Delete" | "Backspace" => Some(Self::Delete),
            _ => key.arrow_direction().map(|(ux, uy)| {
                let step = if modifiers.shift { NUDGE_STEP_SHIFT } else { NUDGE_STEP };
                Self::Nudge { dx: ux * step, dy: uy * step }
            }),
        }
    }
}

/// Core engine state: all logic that doesn't encode pixels.
pub struct EngineCore {
    pub doc: LayerStack,
    pub ui: UiState,
    pub input: InputState,
    pub history: History,
    pub width: f64,
    pub height: f64,
    /// Arrow-key moves applied since the last history entry.
    nudge_pending: bool,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            doc: LayerStack::new(),
            ui: UiState { background: config.background.clone(), ..UiState::default() },
            input: InputState::Idle,
            history: History::new(config.history_limit),
            width: f64::from(config.width),
            height: f64::from(config.height),
            nudge_pending: false,
        }
    }

    // --- History ---

    /// Record the current state with its rendered bitmap.
    pub fn checkpoint(&mut self, bitmap: String) -> Action {
        self.nudge_pending = false;
        self.history.record(HistoryEntry {
            bitmap,
            layers: self.doc.clone(),
            selected_id: self.ui.selected_id,
            background: self.ui.background.clone(),
        });
        self.history_changed()
    }

    /// Whether arrow nudges are waiting for a history entry. Clears the flag.
    pub fn take_pending_nudge(&mut self) -> bool {
        std::mem::take(&mut self.nudge_pending)
    }

    #[must_use]
    pub fn nudge_pending(&self) -> bool {
        self.nudge_pending
    }

    /// Step back one history entry.
    pub fn undo(&mut self) -> Vec<Action> {
        let Some(entry) = self.history.undo().cloned() else {
            return Vec::new();
        };
        self.restore(entry)
    }

    /// Step forward one history entry.
    pub fn redo(&mut self) -> Vec<Action> {
        let Some(entry) = self.history.redo().cloned() else {
            return Vec::new();
        };
        self.restore(entry)
    }

    fn restore(&mut self, entry: HistoryEntry) -> Vec<Action> {
        let previous = self.ui.selected_id;
        self.doc = entry.layers;
        self.ui.background = entry.background;
        self.ui.selected_id = entry.selected_id.filter(|id| self.doc.get(id).is_some());
        self.input = InputState::Idle;
        self.nudge_pending = false;

        let mut actions = vec![self.history_changed()];
        if self.ui.selected_id != previous {
            actions.push(self.selection_action());
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() }
    }

    // --- Selection ---

    /// Change the selection. Unknown ids clear it.
    pub fn select(&mut self, id: Option<LayerId>) -> Vec<Action> {
        let id = id.filter(|id| self.doc.get(id).is_some());
        if id == self.ui.selected_id {
            return Vec::new();
        }
        self.ui.selected_id = id;
        vec![self.selection_action(), Action::RenderNeeded]
    }

    fn selection_action(&self) -> Action {
        Action::SelectionChanged { layer: self.selected_layer().cloned() }
    }

    /// The selected layer when it exists and is not locked.
    fn editable_selection(&self) -> Option<&Layer> {
        self.selected_layer().filter(|l| !l.locked)
    }

    // --- Tool settings ---

    /// Set the active tool. Any gesture in progress is abandoned.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.ui.tool = tool;
        let had_preview = self.input.preview().is_some();
        self.input = InputState::Idle;
        if had_preview { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn set_background(&mut self, color: String) -> Vec<Action> {
        self.ui.background = color;
        vec![Action::Commit, Action::RenderNeeded]
    }

    // --- Document mutations ---

    /// Push a layer, select it, and request a history entry.
    fn insert(&mut self, layer: Layer) -> Vec<Action> {
        let id = self.doc.push(layer);
        tracing::debug!(%id, "layer added");
        let mut actions = vec![Action::LayerCreated { id }];
        actions.extend(self.select(Some(id)));
        actions.push(Action::Commit);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Add a shape layer styled from the current tool settings.
    pub fn add_shape(&mut self, shape: ShapeType, x: f64, y: f64, width: f64, height: f64) -> Vec<Action> {
        let style = self.ui.settings.shape_style();
        self.insert(Layer::new(LayerKind::Shape { shape }, x, y, width, height, style))
    }

    /// Add a freehand line through `points`. Fewer than two points add nothing.
    ///
    /// The new layer is not selected, so painting several lines in a row
    /// keeps the canvas free of selection chrome.
    pub fn add_stroke(&mut self, points: &[Point], eraser: bool) -> Vec<Action> {
        let style = self.ui.settings.stroke_style(eraser, &self.ui.background);
        let Some(layer) = Layer::freehand(points, style) else {
            return vec![Action::RenderNeeded];
        };
        let id = self.doc.push(layer);
        tracing::debug!(%id, eraser, points = points.len(), "stroke added");
        vec![Action::LayerCreated { id }, Action::Commit, Action::RenderNeeded]
    }

    /// Add a text layer with its top-left corner at `(x, y)`, sized from the measured text.
    pub fn add_text_at(&mut self, text: &str, x: f64, y: f64, metrics: &mut dyn Surface) -> Vec<Action> {
        let settings = &self.ui.settings;
        let font = Font { size: settings.font_size, family: &settings.font_family };
        let width = metrics.measure_text(text, font) * TEXT_BOX_WIDTH_FACTOR;
        let height = settings.font_size * TEXT_BOX_HEIGHT_FACTOR;
        let kind = LayerKind::Text { text: text.to_owned(), align: settings.text_align };
        let style = settings.text_style();
        self.insert(Layer::new(kind, x, y, width, height, style))
    }

    /// Add text near the canvas center. Empty text is ignored.
    pub fn add_text(&mut self, text: Option<String>, metrics: &mut dyn Surface) -> Vec<Action> {
        let text = text.unwrap_or_else(|| self.ui.settings.text_input.clone());
        if text.is_empty() {
            return Vec::new();
        }
        let x = self.width / 2.0 - CENTERED_TEXT_X_OFFSET;
        let y = self.height / 2.0 - self.ui.settings.font_size / 2.0;
        self.ui.settings.text_input.clear();
        self.add_text_at(&text, x, y, metrics)
    }

    /// Add an image at an explicit box.
    pub fn add_image_at(&mut self, src: String, x: f64, y: f64, width: f64, height: f64) -> Vec<Action> {
        let style = self.ui.settings.image_style();
        self.insert(Layer::new(LayerKind::Image { src }, x, y, width, height, style))
    }

    /// Add an image scaled to fit half the canvas, keeping its aspect ratio, centred.
    pub fn add_image(&mut self, src: String, natural_width: f64, natural_height: f64) -> Vec<Action> {
        if natural_width <= 0.0 || natural_height <= 0.0 {
            tracing::warn!(natural_width, natural_height, "ignoring image with empty size");
            return Vec::new();
        }
        let aspect = natural_width / natural_height;
        let mut width = self.width * IMAGE_FIT_FRACTION;
        let mut height = width / aspect;
        if height > self.height * IMAGE_FIT_FRACTION {
            height = self.height * IMAGE_FIT_FRACTION;
            width = height * aspect;
        }
        let x = (self.width - width) / 2.0;
        let y = (self.height - height) / 2.0;
        self.add_image_at(src, x, y, width, height)
    }

    /// Remove a layer. Locked layers can still be removed explicitly.
    /// A gesture acting on the removed layer is abandoned.
    pub fn remove(&mut self, id: &LayerId) -> Vec<Action> {
        if self.doc.remove(id).is_none() {
            return Vec::new();
        }
        if self.input.target() == Some(*id) {
            self.input = InputState::Idle;
        }
        let mut actions = vec![Action::LayerDeleted { id: *id }];
        if self.ui.selected_id == Some(*id) {
            self.ui.selected_id = None;
            actions.push(self.selection_action());
        }
        actions.push(Action::Commit);
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn delete_selected(&mut self) -> Vec<Action> {
        match self.ui.selected_id {
            Some(id) => self.remove(&id),
            None => Vec::new(),
        }
    }

    /// Copy the selection, offset it, and select the copy.
    pub fn duplicate_selected(&mut self) -> Vec<Action> {
        let Some(id) = self.ui.selected_id else {
            return Vec::new();
        };
        let Some(copy) = self.doc.duplicate(&id) else {
            return Vec::new();
        };
        let mut actions = vec![Action::LayerCreated { id: copy }];
        actions.extend(self.select(Some(copy)));
        actions.push(Action::Commit);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Remove every layer and clear the selection.
    pub fn clear(&mut self) -> Vec<Action> {
        let mut actions: Vec<Action> = self.doc.iter().map(|l| Action::LayerDeleted { id: l.id }).collect();
        self.doc.clear();
        self.input = InputState::Idle;
        actions.extend(self.select(None));
        actions.push(Action::Commit);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Wrap a stack edit that reports whether it changed anything.
    fn edited(changed: bool) -> Vec<Action> {
        if changed { vec![Action::Commit, Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn move_up(&mut self, id: &LayerId) -> Vec<Action> {
        Self::edited(self.doc.move_up(id))
    }

    pub fn move_down(&mut self, id: &LayerId) -> Vec<Action> {
        Self::edited(self.doc.move_down(id))
    }

    pub fn bring_to_front(&mut self, id: &LayerId) -> Vec<Action> {
        Self::edited(self.doc.bring_to_front(id))
    }

    pub fn send_to_back(&mut self, id: &LayerId) -> Vec<Action> {
        Self::edited(self.doc.send_to_back(id))
    }

    pub fn toggle_locked(&mut self, id: &LayerId) -> Vec<Action> {
        Self::edited(self.doc.toggle_locked(id).is_some())
    }

    pub fn toggle_visible(&mut self, id: &LayerId) -> Vec<Action> {
        Self::edited(self.doc.toggle_visible(id).is_some())
    }

    pub fn update_style(&mut self, id: &LayerId, patch: &StylePatch) -> Vec<Action> {
        Self::edited(!patch.is_empty() && self.doc.update_style(id, patch))
    }

    pub fn update_transform(&mut self, id: &LayerId, patch: &TransformPatch) -> Vec<Action> {
        Self::edited(*patch != TransformPatch::default() && self.doc.update_transform(id, patch))
    }

    // --- Commands ---

    /// Apply one command.
    ///
    /// `Undo`, `Redo` and `Save` are handled here only as far as state goes;
    /// [`Engine::command`] is the entry point that also repaints and saves.
    ///
    /// # Errors
    ///
    /// Returns `Err` if an image without explicit dimensions cannot be read.
    pub fn apply(&mut self, command: Command, metrics: &mut dyn Surface) -> Result<Vec<Action>, SurfaceError> {
        let actions = match command {
            Command::SetTool { tool } => self.set_tool(tool),
            Command::SetColor { color } => {
                self.ui.settings.color = color;
                Vec::new()
            }
            Command::SetBrushSize { size } => {
                if size.is_finite() && size > 0.0 {
                    self.ui.settings.brush_size = size;
                } else {
                    tracing::warn!(size, "ignoring invalid brush size");
                }
                Vec::new()
            }
            Command::SetFontFamily { family } => {
                self.ui.settings.font_family = family;
                Vec::new()
            }
            Command::SetFontSize { size } => {
                if size.is_finite() && size > 0.0 {
                    self.ui.settings.font_size = size.min(MAX_FONT_SIZE);
                } else {
                    tracing::warn!(size, "ignoring invalid font size");
                }
                Vec::new()
            }
            Command::SetTextAlign { align } => {
                self.ui.settings.text_align = align;
                Vec::new()
            }
            Command::SetOpacity { opacity } => {
                self.ui.settings.opacity = opacity.clamp(0.0, 1.0);
                Vec::new()
            }
            Command::SetTextInput { text } => {
                self.ui.settings.text_input = text;
                Vec::new()
            }
            Command::SetBackground { color } => self.set_background(color),
            Command::AddText { text } => self.add_text(text, metrics),
            Command::AddImage { src, width, height } => {
                let (w, h) = match (width, height) {
                    (Some(w), Some(h)) => (w, h),
                    _ => metrics.image_size(&src)?,
                };
                self.add_image(src, w, h)
            }
            Command::Select { id } => self.select(id),
            Command::Delete { id } => self.remove(&id),
            Command::DeleteSelected => self.delete_selected(),
            Command::DuplicateSelected => self.duplicate_selected(),
            Command::MoveUp { id } => self.move_up(&id),
            Command::MoveDown { id } => self.move_down(&id),
            Command::BringToFront { id } => self.bring_to_front(&id),
            Command::SendToBack { id } => self.send_to_back(&id),
            Command::ToggleLocked { id } => self.toggle_locked(&id),
            Command::ToggleVisible { id } => self.toggle_visible(&id),
            Command::UpdateStyle { id, patch } => self.update_style(&id, &patch),
            Command::UpdateTransform { id, patch } => self.update_transform(&id, &patch),
            Command::Clear => self.clear(),
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::Save => Vec::new(),
        };
        Ok(actions)
    }

    // --- Pointer input ---

    pub fn on_pointer_down(
        &mut self,
        pt: Point,
        button: Button,
        _modifiers: Modifiers,
        metrics: &mut dyn Surface,
    ) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        if self.ui.tool.edits_selection() && self.editable_selection().is_none() {
            tracing::debug!(tool = ?self.ui.tool, "no editable selection");
            return Vec::new();
        }
        match self.ui.tool {
            Tool::Select => {
                let hit = hit::layer_at(&self.doc, pt).map(|l| (l.id, l.locked));
                match hit {
                    Some((_, true)) => Vec::new(),
                    Some((id, false)) => {
                        self.input = InputState::DraggingLayer { id, last: pt, moved: false };
                        self.select(Some(id))
                    }
                    None => self.select(None),
                }
            }
            Tool::Move => {
                if let Some(id) = self.editable_selection().map(|l| l.id) {
                    self.input = InputState::DraggingLayer { id, last: pt, moved: false };
                }
                Vec::new()
            }
            Tool::Resize => {
                if let Some((id, orig_w, orig_h)) = self.editable_selection().map(|l| (l.id, l.width, l.height)) {
                    self.input = InputState::ResizingLayer { id, start: pt, orig_w, orig_h, moved: false };
                }
                Vec::new()
            }
            Tool::Rotate => {
                if let Some((id, center, orig_rotation)) =
                    self.editable_selection().map(|l| (l.id, l.center(), l.rotation))
                {
                    self.input = InputState::RotatingLayer {
                        id,
                        center,
                        start_angle: angle_degrees(center, pt),
                        orig_rotation,
                        moved: false,
                    };
                }
                Vec::new()
            }
            Tool::Shape { shape } => {
                self.input = InputState::DrawingShape { shape, anchor: pt, current: pt };
                Vec::new()
            }
            Tool::Text => {
                let text = self.ui.settings.pending_text().to_owned();
                self.ui.settings.text_input.clear();
                self.add_text_at(&text, pt.x, pt.y, metrics)
            }
            Tool::Brush | Tool::Eraser => {
                self.input = InputState::DrawingStroke { points: vec![pt], eraser: self.ui.tool == Tool::Eraser };
                Vec::new()
            }
        }
    }

    pub fn on_pointer_move(&mut self, pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::DraggingLayer { id, last, moved } => {
                let (dx, dy) = (pt.x - last.x, pt.y - last.y);
                *last = pt;
                if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
                    return Vec::new();
                }
                let id = *id;
                *moved = true;
                if let Some(layer) = self.doc.get(&id) {
                    let patch = TransformPatch::position(layer.x + dx, layer.y + dy);
                    self.doc.update_transform(&id, &patch);
                }
                vec![Action::RenderNeeded]
            }
            InputState::ResizingLayer { id, start, orig_w, orig_h, moved } => {
                let width = (*orig_w + pt.x - start.x).max(MIN_RESIZE_SIZE);
                let height = (*orig_h + pt.y - start.y).max(MIN_RESIZE_SIZE);
                *moved = true;
                let id = *id;
                self.doc.update_transform(&id, &TransformPatch::size(width, height));
                vec![Action::RenderNeeded]
            }
            InputState::RotatingLayer { id, center, start_angle, orig_rotation, moved } => {
                let rotation = (*orig_rotation + angle_degrees(*center, pt) - *start_angle).rem_euclid(360.0);
                *moved = true;
                let id = *id;
                self.doc.update_transform(&id, &TransformPatch::rotation(rotation));
                vec![Action::RenderNeeded]
            }
            InputState::DrawingShape { current, .. } => {
                *current = pt;
                vec![Action::RenderNeeded]
            }
            InputState::DrawingStroke { points, .. } => {
                if points.last() == Some(&pt) {
                    return Vec::new();
                }
                points.push(pt);
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::DraggingLayer { moved, .. }
            | InputState::ResizingLayer { moved, .. }
            | InputState::RotatingLayer { moved, .. } => {
                if moved {
                    vec![Action::Commit, Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            InputState::DrawingShape { shape, anchor, .. } => {
                let bounds = DragBox::from_corners(anchor, pt);
                if bounds.width < MIN_SHAPE_SIZE || bounds.height < MIN_SHAPE_SIZE {
                    return vec![Action::RenderNeeded];
                }
                self.add_shape(shape, bounds.x, bounds.y, bounds.width, bounds.height)
            }
            InputState::DrawingStroke { mut points, eraser } => {
                if points.last() != Some(&pt) {
                    points.push(pt);
                }
                self.add_stroke(&points, eraser)
            }
        }
    }

    // --- Keyboard input ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        match KeyAction::from_key(key, modifiers) {
            Some(KeyAction::Undo) => self.undo(),
            Some(KeyAction::Redo) => self.redo(),
            Some(KeyAction::Duplicate) => self.duplicate_selected(),
            Some(KeyAction::Deselect) => self.select(None),
            Some(KeyAction::Delete) => self.delete_selected(),
            Some(KeyAction::Nudge { dx, dy }) => self.nudge(dx, dy),
            None => Vec::new(),
        }
    }

    /// Releasing an arrow key closes the current run of nudges.
    pub fn on_key_up(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if key.arrow_direction().is_some() && self.nudge_pending {
            vec![Action::Commit]
        } else {
            Vec::new()
        }
    }

    fn nudge(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        let Some(layer) = self.editable_selection() else {
            return Vec::new();
        };
        let (id, patch) = (layer.id, TransformPatch::position(layer.x + dx, layer.y + dy));
        self.doc.update_transform(&id, &patch);
        self.nudge_pending = true;
        vec![Action::RenderNeeded]
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> Option<LayerId> {
        self.ui.selected_id
    }

    #[must_use]
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.ui.selected_id.and_then(|id| self.doc.get(&id))
    }

    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.doc.get(id)
    }

    #[must_use]
    pub fn layers(&self) -> &LayerStack {
        &self.doc
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

/// Callback receiving the exported PNG data URL.
pub type SaveCallback = Box<dyn FnMut(String)>;

/// The full editor. Wraps `EngineCore` and owns the drawing surface.
pub struct Engine<S: Surface> {
    surface: S,
    pub core: EngineCore,
    on_save: Option<SaveCallback>,
}

impl<S: Surface> Engine<S> {
    /// Create an editor over `surface`, paint it, and record the blank canvas as the first history entry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the initial paint or encode fails.
    pub fn new(surface: S, config: &EditorConfig) -> Result<Self, SurfaceError> {
        let mut engine = Self { surface, core: EngineCore::new(config), on_save: None };
        engine.checkpoint()?;
        engine.render()?;
        Ok(engine)
    }

    /// Create an editor whose first layer is `src` at the origin with its natural size.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the image cannot be read or the surface fails.
    pub fn with_initial_image(surface: S, config: &EditorConfig, src: &str) -> Result<Self, SurfaceError> {
        let mut engine = Self::new(surface, config)?;
        let (width, height) = engine.surface.image_size(src)?;
        let actions = engine.core.add_image_at(src.to_owned(), 0.0, 0.0, width, height);
        engine.settle(actions)?;
        Ok(engine)
    }

    /// Set the callback that receives the PNG data URL on save.
    pub fn set_on_save(&mut self, callback: impl FnMut(String) + 'static) {
        self.on_save = Some(Box::new(callback));
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    // --- Input events ---

    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn on_pointer_down(&mut self, pt: Point, button: Button, modifiers: Modifiers) -> Result<Vec<Action>, SurfaceError> {
        let mut actions = self.flush_nudge()?;
        let more = self.core.on_pointer_down(pt, button, modifiers, &mut self.surface);
        actions.extend(self.settle(more)?);
        Ok(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn on_pointer_move(&mut self, pt: Point, modifiers: Modifiers) -> Result<Vec<Action>, SurfaceError> {
        let actions = self.core.on_pointer_move(pt, modifiers);
        self.settle(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn on_pointer_up(&mut self, pt: Point, button: Button, modifiers: Modifiers) -> Result<Vec<Action>, SurfaceError> {
        let actions = self.core.on_pointer_up(pt, button, modifiers);
        self.settle(actions)
    }

    /// Arrow keys accumulate into the pending nudge; any other editor key
    /// first closes it.
    ///
    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Result<Vec<Action>, SurfaceError> {
        let mut actions = match KeyAction::from_key(key, modifiers) {
            Some(KeyAction::Nudge { .. }) | None => Vec::new(),
            Some(_) => self.flush_nudge()?,
        };
        let more = self.core.on_key_down(key, modifiers);
        actions.extend(self.settle(more)?);
        Ok(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn on_key_up(&mut self, key: &Key, modifiers: Modifiers) -> Result<Vec<Action>, SurfaceError> {
        let actions = self.core.on_key_up(key, modifiers);
        self.settle(actions)
    }

    /// Apply a toolbar or layer-panel command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if an image cannot be read or repainting fails.
    pub fn command(&mut self, command: Command) -> Result<Vec<Action>, SurfaceError> {
        let mut actions = self.flush_nudge()?;
        if matches!(command, Command::Save) {
            self.save()?;
            return Ok(actions);
        }
        let more = self.core.apply(command, &mut self.surface)?;
        actions.extend(self.settle(more)?);
        Ok(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn undo(&mut self) -> Result<Vec<Action>, SurfaceError> {
        self.command(Command::Undo)
    }

    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn redo(&mut self) -> Result<Vec<Action>, SurfaceError> {
        self.command(Command::Redo)
    }

    // --- Render / export ---

    /// Repaint the current state, selection chrome included.
    ///
    /// # Errors
    ///
    /// Returns `Err` if drawing fails.
    pub fn render(&mut self) -> Result<(), SurfaceError> {
        render::draw(&mut self.surface, &self.core.doc, &self.core.ui, self.core.input.preview())
    }

    /// Encode the scene without selection chrome or preview.
    fn export(&mut self) -> Result<String, SurfaceError> {
        self.core.ui.hide_selection = true;
        let drawn = render::draw(&mut self.surface, &self.core.doc, &self.core.ui, None);
        self.core.ui.hide_selection = false;
        drawn?;
        self.surface.to_data_url()
    }

    /// Export the design, hand it to the save callback, and restore the on-screen view.
    ///
    /// # Errors
    ///
    /// Returns `Err` if drawing or encoding fails.
    pub fn save(&mut self) -> Result<String, SurfaceError> {
        let url = self.export()?;
        tracing::info!(bytes = url.len(), "design exported");
        if let Some(callback) = self.on_save.as_mut() {
            callback(url.clone());
        }
        self.render()?;
        Ok(url)
    }

    /// Record a history entry for the current state.
    fn checkpoint(&mut self) -> Result<Action, SurfaceError> {
        let bitmap = self.export()?;
        Ok(self.core.checkpoint(bitmap))
    }

    /// Commit nudges still waiting for a history entry.
    fn flush_nudge(&mut self) -> Result<Vec<Action>, SurfaceError> {
        if !self.core.take_pending_nudge() {
            return Ok(Vec::new());
        }
        let action = self.checkpoint()?;
        self.render()?;
        Ok(vec![Action::Commit, action])
    }

    /// Record history for `Commit` and repaint when anything changed.
    fn settle(&mut self, mut actions: Vec<Action>) -> Result<Vec<Action>, SurfaceError> {
        if actions.is_empty() {
            return Ok(actions);
        }
        if actions.contains(&Action::Commit) {
            let action = self.checkpoint()?;
            actions.push(action);
        }
        self.render()?;
        Ok(actions)
    }
}
