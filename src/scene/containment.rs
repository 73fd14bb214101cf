use crate::geometry::{Axis, BoxExtent};
use glam::Vec3;

/// Allowed range for the centre of a box of size `contained` along `axis`.
///
/// The container is centred on the origin horizontally and rests on the
/// floor vertically, so Y spans `[0, height]`. When the contained box does
/// not fit on an axis the range collapses onto the container centre.
pub fn axis_bounds(axis: Axis, contained: &BoxExtent, container: &BoxExtent) -> (f32, f32) {
    let half = contained.along(axis) * 0.5;
    let container_size = container.along(axis);
    let (min, max) = match axis {
        Axis::X | Axis::Z => (-container_size * 0.5 + half, container_size * 0.5 - half),
        Axis::Y => (half, container_size - half),
    };
    if min > max {
        let center = match axis {
            Axis::X | Axis::Z => 0.0,
            Axis::Y => container_size * 0.5,
        };
        return (center, center);
    }
    (min, max)
}

/// Nearest centre position that keeps `contained` inside `container`.
pub fn clamp_to_container(desired: Vec3, contained: &BoxExtent, container: &BoxExtent) -> Vec3 {
    let mut out = desired;
    for axis in Axis::ALL {
        let (min, max) = axis_bounds(axis, contained, container);
        let value = axis.component(desired);
        out = axis.with_component(out, min.max(max.min(value)));
    }
    out
}
