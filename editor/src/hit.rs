#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::doc::{Layer, LayerStack};
use crate::geom::Point;

/// Whether `pt` lies inside the layer's (possibly rotated) box.
///
/// Rotated layers are tested by un-rotating the point about the box center
/// and checking the axis-aligned box. Edges count as inside.
#[must_use]
pub fn contains(layer: &Layer, pt: Point) -> bool {
    let local = if layer.rotation.abs() < f64::EPSILON { pt } else { pt.rotate_around(layer.center(), -layer.rotation) };
    local.x >= layer.x && local.x <= layer.x + layer.width && local.y >= layer.y && local.y <= layer.y + layer.height
}

/// The topmost visible layer under `pt`, if any.
///
/// Locked layers are still returned; callers decide whether a locked hit
/// consumes the click.
#[must_use]
pub fn layer_at(stack: &LayerStack, pt: Point) -> Option<&Layer> {
    stack.iter().rev().filter(|l| l.visible).find(|l| contains(l, pt))
}
