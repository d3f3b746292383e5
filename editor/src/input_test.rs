#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn tool_default_is_select() {
    assert_eq!(Tool::default(), Tool::Select);
}

#[test]
fn tool_edits_selection() {
    assert!(Tool::Move.edits_selection());
    assert!(Tool::Resize.edits_selection());
    assert!(Tool::Rotate.edits_selection());
    assert!(!Tool::Select.edits_selection());
    assert!(!Tool::Text.edits_selection());
    assert!(!Tool::Shape { shape: ShapeType::Circle }.edits_selection());
    assert!(!Tool::Brush.edits_selection());
    assert!(!Tool::Eraser.edits_selection());
}

#[test]
fn tool_serde_shape_carries_kind() {
    let tool: Tool = serde_json::from_str(r#"{"tool":"shape","shape":"triangle"}"#).unwrap();
    assert_eq!(tool, Tool::Shape { shape: ShapeType::Triangle });
    let select: Tool = serde_json::from_str(r#"{"tool":"select"}"#).unwrap();
    assert_eq!(select, Tool::Select);
    let eraser: Tool = serde_json::from_str(r#"{"tool":"eraser"}"#).unwrap();
    assert_eq!(eraser, Tool::Eraser);
}

#[test]
fn modifiers_command_accepts_ctrl_or_meta() {
    assert!(!Modifiers::default().command());
    assert!(Modifiers { ctrl: true, ..Default::default() }.command());
    assert!(Modifiers { meta: true, ..Default::default() }.command());
    assert!(!Modifiers { shift: true, alt: true, ..Default::default() }.command());
}

#[test]
fn key_arrow_direction() {
    assert_eq!(Key::new("ArrowLeft").arrow_direction(), Some((-1.0, 0.0)));
    assert_eq!(Key::new("ArrowRight").arrow_direction(), Some((1.0, 0.0)));
    assert_eq!(Key::new("ArrowUp").arrow_direction(), Some((0.0, -1.0)));
    assert_eq!(Key::new("ArrowDown").arrow_direction(), Some((0.0, 1.0)));
    assert_eq!(Key::new("Delete").arrow_direction(), None);
}

#[test]
fn key_is_letter_ignores_case() {
    assert!(Key::new("z").is_letter('z'));
    assert!(Key::new("Z").is_letter('z'));
    assert!(!Key::new("zz").is_letter('z'));
    assert!(!Key::new("Escape").is_letter('e'));
}

#[test]
fn tool_settings_defaults() {
    let s = ToolSettings::default();
    assert_eq!(s.color, "#000000");
    assert_eq!(s.brush_size, 5.0);
    assert_eq!(s.font_family, "Arial");
    assert_eq!(s.font_size, 20.0);
    assert_eq!(s.text_align, TextAlign::Center);
    assert_eq!(s.opacity, 1.0);
    assert_eq!(s.pending_text(), DEFAULT_TEXT);
}

#[test]
fn shape_style_uses_stroke_settings() {
    let s = ToolSettings { color: "#ff0000".into(), brush_size: 3.0, opacity: 0.5, ..Default::default() };
    let style = s.shape_style();
    assert_eq!(style.stroke.as_deref(), Some("#ff0000"));
    assert_eq!(style.stroke_width, Some(3.0));
    assert_eq!(style.opacity, Some(0.5));
    assert!(style.shape_fill().is_transparent());
}

#[test]
fn text_style_uses_font_settings() {
    let s = ToolSettings { color: "#00ff00".into(), font_size: 32.0, font_family: "Georgia".into(), ..Default::default() };
    let style = s.text_style();
    assert_eq!(style.fill.as_deref(), Some("#00ff00"));
    assert_eq!(style.font(), "32px Georgia");
}

#[test]
fn pending_text_prefers_input() {
    let s = ToolSettings { text_input: "Hello".into(), ..Default::default() };
    assert_eq!(s.pending_text(), "Hello");
}

#[test]
fn ui_state_default_background() {
    let ui = UiState::default();
    assert_eq!(ui.background, DEFAULT_BACKGROUND);
    assert!(ui.selected_id.is_none());
    assert!(!ui.hide_selection);
}

#[test]
fn drag_box_normalises_any_direction() {
    let b = DragBox::from_corners(Point::new(50.0, 80.0), Point::new(10.0, 20.0));
    assert_eq!(b, DragBox { x: 10.0, y: 20.0, width: 40.0, height: 60.0 });
}

#[test]
fn shape_preview_only_while_drawing() {
    assert!(InputState::Idle.shape_preview().is_none());
    let state = InputState::DrawingShape {
        shape: ShapeType::Circle,
        anchor: Point::new(0.0, 0.0),
        current: Point::new(20.0, 30.0),
    };
    let (shape, b) = state.shape_preview().unwrap();
    assert_eq!(shape, ShapeType::Circle);
    assert_eq!((b.width, b.height), (20.0, 30.0));
}

#[test]
fn target_of_transform_gestures() {
    let id = uuid::Uuid::new_v4();
    let drag = InputState::DraggingLayer { id, last: Point::default(), moved: false };
    assert_eq!(drag.target(), Some(id));
    assert_eq!(InputState::Idle.target(), None);
}

#[test]
fn angle_degrees_is_clockwise_on_screen() {
    let c = Point::new(0.0, 0.0);
    assert!((angle_degrees(c, Point::new(1.0, 0.0))).abs() < 1e-9);
    assert!((angle_degrees(c, Point::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
    assert!((angle_degrees(c, Point::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
}

#[test]
fn preview_covers_shape_and_stroke_drags() {
    assert!(InputState::Idle.preview().is_none());
    let shape = InputState::DrawingShape { shape: ShapeType::Rectangle, anchor: Point::default(), current: Point::new(4.0, 4.0) };
    assert!(matches!(shape.preview(), Some(Preview::Shape { shape: ShapeType::Rectangle, .. })));
    let points = vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
    let stroke = InputState::DrawingStroke { points: points.clone(), eraser: true };
    assert_eq!(stroke.preview(), Some(Preview::Stroke { points: &points, eraser: true }));
    assert_eq!(stroke.target(), None);
}

#[test]
fn brush_style_uses_tool_colour_and_size() {
    let settings = ToolSettings { color: "#ff0000".into(), brush_size: 6.0, opacity: 0.5, ..ToolSettings::default() };
    let style = settings.stroke_style(false, "#ffffff");
    assert_eq!(style.stroke.as_deref(), Some("#ff0000"));
    assert_eq!(style.stroke_width, Some(6.0));
    assert_eq!(style.opacity, Some(0.5));
}

#[test]
fn eraser_style_paints_background_at_double_size() {
    let settings = ToolSettings { brush_size: 6.0, opacity: 0.5, ..ToolSettings::default() };
    let style = settings.stroke_style(true, "rgb(0, 128, 255)");
    assert_eq!(style.stroke.as_deref(), Some("#0080ff"));
    assert_eq!(style.stroke_width, Some(12.0));
    assert_eq!(style.opacity, Some(1.0));
}
