#![allow(clippy::float_cmp)]

use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================
// Point
// =============================================================

#[test]
fn distance_is_euclidean() {
    assert!(close(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0));
}

#[test]
fn rotate_around_quarter_turn_is_clockwise_on_screen() {
    let p = Point::new(10.0, 0.0).rotate_around(Point::new(0.0, 0.0), 90.0);
    assert!(close(p.x, 0.0));
    assert!(close(p.y, 10.0));
}

#[test]
fn rotate_around_zero_is_identity() {
    let p = Point::new(7.0, -3.0).rotate_around(Point::new(1.0, 1.0), 0.0);
    assert!(close(p.x, 7.0));
    assert!(close(p.y, -3.0));
}

// =============================================================
// Affine
// =============================================================

#[test]
fn identity_maps_points_unchanged() {
    let p = Affine::IDENTITY.apply(Point::new(5.0, 6.0));
    assert_eq!(p, Point::new(5.0, 6.0));
}

#[test]
fn translate_then_rotate_matches_rotate_around() {
    let center = Point::new(50.0, 40.0);
    let m = Affine::IDENTITY
        .then_translate(center.x, center.y)
        .then_rotate(30f64.to_radians())
        .then_translate(-center.x, -center.y);
    let p = Point::new(80.0, 40.0);
    let a = m.apply(p);
    let b = p.rotate_around(center, 30.0);
    assert!(close(a.x, b.x));
    assert!(close(a.y, b.y));
}

#[test]
fn inverse_round_trips() {
    let m = Affine::IDENTITY.then_translate(12.0, -4.0).then_rotate(1.1);
    let inv = m.inverse().unwrap();
    let p = Point::new(3.5, 9.25);
    let back = inv.apply(m.apply(p));
    assert!(close(back.x, p.x));
    assert!(close(back.y, p.y));
}

#[test]
fn rotation_preserves_scale() {
    let m = Affine::IDENTITY.then_rotate(0.7);
    assert!(close(m.scale(), 1.0));
}

#[test]
fn singular_matrix_has_no_inverse() {
    let m = Affine { a: 0.0, b: 0.0, c: 0.0, d: 0.0, e: 1.0, f: 1.0 };
    assert!(m.inverse().is_none());
}

// =============================================================
// Path
// =============================================================

#[test]
fn rect_polygon_has_four_corners() {
    let poly = Path::Rect { x: 1.0, y: 2.0, width: 10.0, height: 5.0 }.to_polygon();
    assert_eq!(poly, vec![
        Point::new(1.0, 2.0),
        Point::new(11.0, 2.0),
        Point::new(11.0, 7.0),
        Point::new(1.0, 7.0),
    ]);
}

#[test]
fn circle_polygon_points_lie_on_radius() {
    let poly = Path::Circle { cx: 5.0, cy: 5.0, radius: 4.0 }.to_polygon();
    assert_eq!(poly.len(), CIRCLE_SEGMENTS);
    for p in poly {
        assert!(close(p.distance(Point::new(5.0, 5.0)), 4.0));
    }
}

#[test]
fn polyline_is_open_and_keeps_vertices() {
    let points = vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
    let line = Path::Polyline(points.clone());
    assert!(!line.is_closed());
    assert_eq!(line.to_polygon(), points);
    assert!(Path::Polygon(points).is_closed());
    assert!(Path::Rect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 }.is_closed());
}
