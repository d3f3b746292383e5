use std::f64::consts::FRAC_PI_2;

use super::*;

const RED: Rgba = Rgba::new(255, 0, 0, 255);

fn white(w: u32, h: u32) -> RasterSurface {
    let mut s = RasterSurface::new(w, h);
    s.clear(Rgba::WHITE);
    s
}

fn red_png_data_url(w: u32, h: u32) -> String {
    let mut s = RasterSurface::new(w, h);
    s.clear(RED);
    s.to_data_url().unwrap()
}

// =============================================================
// Fills
// =============================================================

#[test]
fn clear_paints_every_pixel() {
    let s = white(4, 3);
    assert!(s.image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn fill_rect_covers_pixel_centers_inside() {
    let mut s = white(40, 40);
    s.fill_path(&Path::Rect { x: 10.0, y: 10.0, width: 20.0, height: 20.0 }, RED).unwrap();
    assert_eq!(s.pixel(10, 10), Some(RED));
    assert_eq!(s.pixel(29, 29), Some(RED));
    assert_eq!(s.pixel(30, 30), Some(Rgba::WHITE));
    assert_eq!(s.pixel(9, 9), Some(Rgba::WHITE));
}

#[test]
fn fill_outside_surface_is_clipped() {
    let mut s = white(10, 10);
    s.fill_path(&Path::Rect { x: -50.0, y: -50.0, width: 20.0, height: 20.0 }, RED).unwrap();
    assert!(s.image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn translate_and_rotate_move_the_fill() {
    let mut s = white(100, 100);
    s.translate(50.0, 50.0);
    s.rotate(FRAC_PI_2);
    s.fill_path(&Path::Rect { x: -20.0, y: -5.0, width: 40.0, height: 10.0 }, RED).unwrap();
    assert_eq!(s.pixel(50, 65), Some(RED));
    assert_eq!(s.pixel(65, 50), Some(Rgba::WHITE));
}

#[test]
fn restore_undoes_transform_and_alpha() {
    let mut s = white(20, 20);
    s.save();
    s.translate(100.0, 100.0);
    s.set_alpha(0.0);
    s.restore();
    s.fill_path(&Path::Rect { x: 0.0, y: 0.0, width: 5.0, height: 5.0 }, RED).unwrap();
    assert_eq!(s.pixel(2, 2), Some(RED));
}

#[test]
fn alpha_blends_over_background() {
    let mut s = white(10, 10);
    s.set_alpha(0.5);
    s.fill_path(&Path::Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 }, Rgba::BLACK).unwrap();
    let p = s.pixel(5, 5).unwrap();
    assert!((127..=128).contains(&p.r), "got {p:?}");
    assert_eq!(p.a, 255);
}

#[test]
fn circle_fill_is_round() {
    let mut s = white(40, 40);
    s.fill_path(&Path::Circle { cx: 20.0, cy: 20.0, radius: 10.0 }, RED).unwrap();
    assert_eq!(s.pixel(20, 20), Some(RED));
    assert_eq!(s.pixel(11, 20), Some(RED));
    assert_eq!(s.pixel(11, 11), Some(Rgba::WHITE));
}

// =============================================================
// Strokes
// =============================================================

#[test]
fn stroke_marks_outline_only() {
    let mut s = white(40, 40);
    s.stroke_path(&Path::Rect { x: 10.0, y: 10.0, width: 20.0, height: 20.0 }, &Stroke::solid(RED, 2.0))
        .unwrap();
    assert_eq!(s.pixel(10, 15), Some(RED));
    assert_eq!(s.pixel(29, 20), Some(RED));
    assert_eq!(s.pixel(20, 20), Some(Rgba::WHITE));
}

#[test]
fn dashed_stroke_leaves_gaps() {
    let mut s = white(120, 60);
    let stroke = Stroke { color: RED, width: 2.0, dash: Some(10.0) };
    s.stroke_path(&Path::Rect { x: 0.0, y: 0.0, width: 100.0, height: 50.0 }, &stroke).unwrap();
    assert_eq!(s.pixel(5, 0), Some(RED));
    assert_eq!(s.pixel(15, 0), Some(Rgba::WHITE));
    assert_eq!(s.pixel(25, 0), Some(RED));
}

#[test]
fn dash_segments_alternate_along_perimeter() {
    let poly = Path::Rect { x: 0.0, y: 0.0, width: 40.0, height: 10.0 }.to_polygon();
    let segs = dash_segments(&poly, Some(10.0), true);
    // Perimeter 100 → five "on" dashes.
    assert_eq!(segs.len(), 5);
    assert_eq!(segs[0], (Point::new(0.0, 0.0), Point::new(10.0, 0.0)));
    assert_eq!(segs[1], (Point::new(20.0, 0.0), Point::new(30.0, 0.0)));
}

#[test]
fn polyline_stroke_is_open() {
    let mut s = white(40, 40);
    let line = Path::Polyline(vec![Point::new(10.0, 10.0), Point::new(30.0, 10.0), Point::new(30.0, 30.0)]);
    s.stroke_path(&line, &Stroke::solid(RED, 4.0)).unwrap();
    assert_eq!(s.pixel(20, 10), Some(RED));
    assert_eq!(s.pixel(30, 20), Some(RED));
    // The closing edge from (30, 30) back to (10, 10) would pass here.
    assert_eq!(s.pixel(20, 20), Some(Rgba::WHITE));
}

#[test]
fn polyline_stroke_has_round_caps() {
    let mut s = white(40, 40);
    let line = Path::Polyline(vec![Point::new(10.0, 20.0), Point::new(30.0, 20.0)]);
    s.stroke_path(&line, &Stroke::solid(RED, 8.0)).unwrap();
    assert_eq!(s.pixel(7, 20), Some(RED));
    assert_eq!(s.pixel(6, 16), Some(Rgba::WHITE));
}

#[test]
fn open_dash_segments_skip_closing_edge() {
    let poly = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
    let segs = dash_segments(&poly, None, false);
    assert_eq!(segs, vec![
        (Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
        (Point::new(10.0, 0.0), Point::new(10.0, 10.0)),
    ]);
}

// =============================================================
// Images and encoding
// =============================================================

#[test]
fn data_url_round_trips_through_png() {
    let url = red_png_data_url(3, 2);
    assert!(url.starts_with("data:image/png;base64,"));
    let bytes = data_url_bytes(&url).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn data_url_bytes_rejects_other_sources() {
    assert!(matches!(data_url_bytes("https://example.com/a.png"), Err(SurfaceError::InvalidSource(_))));
    assert!(matches!(data_url_bytes("data:text/plain,hello"), Err(SurfaceError::InvalidSource(_))));
    assert!(matches!(data_url_bytes("data:image/png;base64,@@@"), Err(SurfaceError::InvalidSource(_))));
}

#[test]
fn draw_image_scales_into_box() {
    let src = red_png_data_url(2, 2);
    let mut s = white(30, 30);
    s.draw_image(&src, 5.0, 5.0, 10.0, 10.0).unwrap();
    assert_eq!(s.pixel(7, 7), Some(RED));
    assert_eq!(s.pixel(14, 14), Some(RED));
    assert_eq!(s.pixel(16, 16), Some(Rgba::WHITE));
    assert_eq!(s.image_size(&src).unwrap(), (2.0, 2.0));
}

#[test]
fn draw_image_rejects_garbage() {
    let mut s = white(10, 10);
    assert!(s.draw_image("not-a-url", 0.0, 0.0, 5.0, 5.0).is_err());
    assert!(matches!(
        s.draw_image("data:image/png;base64,AAAA", 0.0, 0.0, 5.0, 5.0),
        Err(SurfaceError::Image(_))
    ));
}

// =============================================================
// Text
// =============================================================

#[test]
fn measure_without_font_uses_average_advance() {
    let mut s = white(10, 10);
    let w = s.measure_text("abcd", Font { size: 20.0, family: "Arial" });
    assert!((w - 48.0).abs() < 1e-9);
    assert!(!s.has_font());
}

#[test]
fn fill_text_without_font_draws_nothing() {
    let mut s = white(50, 50);
    s.fill_text("Hi", 25.0, 25.0, Font { size: 20.0, family: "Arial" }, TextAlign::Center, RED).unwrap();
    assert!(s.image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn load_font_reports_missing_file() {
    let err = load_font(FsPath::new("/nonexistent/font.ttf")).unwrap_err();
    assert!(matches!(err, SurfaceError::Backend(_)));
}

// =============================================================
// Text with a font
// =============================================================

const FONT_20: Font<'static> = Font { size: 20.0, family: "DejaVu Sans" };

fn test_font() -> FontArc {
    load_font(&FsPath::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")).unwrap()
}

fn white_with_font(w: u32, h: u32) -> RasterSurface {
    let mut s = white(w, h);
    s.set_font(Some(test_font()));
    s
}

/// Inclusive pixel box `(min_x, min_y, max_x, max_y)` of everything not white.
fn ink_bounds(s: &RasterSurface) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in s.image().enumerate_pixels() {
        if p.0 == [255, 255, 255, 255] {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

#[test]
fn measure_with_font_uses_glyph_advances() {
    let mut s = white_with_font(10, 10);
    let one = s.measure_text("H", FONT_20);
    let four = s.measure_text("HHHH", FONT_20);
    assert!(one > 0.0);
    assert!((four - one * 4.0).abs() < 1e-6);
}

#[test]
fn centred_text_ink_is_centred_on_anchor() {
    let mut s = white_with_font(100, 50);
    s.fill_text("HHHH", 50.0, 25.0, FONT_20, TextAlign::Center, RED).unwrap();
    let (x0, y0, x1, y1) = ink_bounds(&s).unwrap();
    let measured = s.measure_text("HHHH", FONT_20);
    assert!((f64::from(x0 + x1) / 2.0 - 50.0).abs() <= 2.0, "ink spans {x0}..{x1}");
    assert!(f64::from(x1 - x0) <= measured + 2.0);
    assert!((f64::from(y0 + y1) / 2.0 - 25.0).abs() <= 2.0, "ink spans rows {y0}..{y1}");
}

#[test]
fn left_and_right_alignment_anchor_ink_edges() {
    let mut left = white_with_font(100, 50);
    left.fill_text("HHHH", 10.0, 25.0, FONT_20, TextAlign::Left, RED).unwrap();
    let (lx0, _, _, _) = ink_bounds(&left).unwrap();
    assert!((10..=14).contains(&lx0), "left ink starts at {lx0}");

    let mut right = white_with_font(100, 50);
    right.fill_text("HHHH", 90.0, 25.0, FONT_20, TextAlign::Right, RED).unwrap();
    let (_, _, rx1, _) = ink_bounds(&right).unwrap();
    assert!((85..=90).contains(&rx1), "right ink ends at {rx1}");
}

#[test]
fn rotated_text_turns_the_ink_box() {
    let mut flat = white_with_font(100, 100);
    flat.fill_text("HHHH", 50.0, 50.0, FONT_20, TextAlign::Center, RED).unwrap();
    let (x0, y0, x1, y1) = ink_bounds(&flat).unwrap();
    assert!(x1 - x0 > (y1 - y0) * 2);

    let mut turned = white_with_font(100, 100);
    turned.translate(50.0, 50.0);
    turned.rotate(FRAC_PI_2);
    turned.fill_text("HHHH", 0.0, 0.0, FONT_20, TextAlign::Center, RED).unwrap();
    let (x0, y0, x1, y1) = ink_bounds(&turned).unwrap();
    assert!(y1 - y0 > (x1 - x0) * 2);
    assert!((f64::from(y0 + y1) / 2.0 - 50.0).abs() <= 2.0);
}

#[test]
fn huge_font_size_is_clipped_to_the_surface() {
    let mut s = white_with_font(40, 40);
    let font = Font { size: 1.0e10, family: "DejaVu Sans" };
    s.fill_text("Hi", 20.0, 20.0, font, TextAlign::Center, RED).unwrap();
    let capped = Font { size: MAX_FONT_SIZE, family: "DejaVu Sans" };
    s.fill_text("Hi", 20.0, 20.0, capped, TextAlign::Left, RED).unwrap();
}

#[test]
fn non_finite_font_size_draws_nothing() {
    let mut s = white_with_font(40, 40);
    for size in [f64::NAN, f64::INFINITY, -4.0] {
        s.fill_text("Hi", 20.0, 20.0, Font { size, family: "DejaVu Sans" }, TextAlign::Center, RED).unwrap();
    }
    assert!(ink_bounds(&s).is_none());
}

#[test]
fn text_far_off_surface_draws_nothing() {
    let mut s = white_with_font(40, 40);
    s.fill_text("Hi", -5000.0, 20.0, FONT_20, TextAlign::Center, RED).unwrap();
    s.fill_text("Hi", 20.0, 5000.0, FONT_20, TextAlign::Center, RED).unwrap();
    assert!(ink_bounds(&s).is_none());
}
