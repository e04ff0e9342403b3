use nalgebra::{Point2, Vector2};

use super::{Dimension, Point};

/// Affine map between a world window and a device window.
///
/// Extents default to 1, so a fresh transform is a pure translation by
/// `device_origin - world_origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    world_origin: Point2<f64>,
    world_extent: Vector2<f64>,
    device_origin: Point2<f64>,
    device_extent: Vector2<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            world_origin: Point2::origin(),
            world_extent: Vector2::new(1.0, 1.0),
            device_origin: Point2::origin(),
            device_extent: Vector2::new(1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn set_world_origin(&mut self, p: Point) {
        self.world_origin = Point2::new(p.x, p.y);
    }

    pub fn set_world_extent(&mut self, d: Dimension) {
        self.world_extent = Vector2::new(d.width, d.height);
    }

    pub fn set_device_origin(&mut self, p: Point) {
        self.device_origin = Point2::new(p.x, p.y);
    }

    pub fn set_device_extent(&mut self, d: Dimension) {
        self.device_extent = Vector2::new(d.width, d.height);
    }

    /// World coordinates to device coordinates.
    pub fn transform_point(&self, p: Point) -> Point {
        map(
            Point2::new(p.x, p.y),
            &self.world_origin,
            &self.world_extent,
            &self.device_origin,
            &self.device_extent,
        )
    }

    /// Device coordinates to world coordinates.
    pub fn inverse_transform_point(&self, p: Point) -> Point {
        map(
            Point2::new(p.x, p.y),
            &self.device_origin,
            &self.device_extent,
            &self.world_origin,
            &self.world_extent,
        )
    }
}

fn map(
    p: Point2<f64>,
    from_origin: &Point2<f64>,
    from_extent: &Vector2<f64>,
    to_origin: &Point2<f64>,
    to_extent: &Vector2<f64>,
) -> Point {
    // A collapsed source axis maps everything onto the target origin.
    let scale = Vector2::new(
        ratio(to_extent.x, from_extent.x),
        ratio(to_extent.y, from_extent.y),
    );
    let out = *to_origin + (p - *from_origin).component_mul(&scale);
    Point::new(out.x, out.y)
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}
