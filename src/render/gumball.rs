use super::pick::{PickKey, PickTarget};
use super::{rgb_from_hex, DrawableDesc, DrawableId, DrawableShape, RenderBackend, RenderError};
use crate::config::ViewportConfig;
use crate::geometry::{Aabb, Axis};
use glam::{Mat4, Quat, Vec3};

const CENTER_MARKER_RADIUS: f32 = 0.1;
const CENTER_MARKER_COLOR: u32 = 0xffffff;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GumballStyle {
    pub arrow_length: f32,
    pub arrow_radius: f32,
}

impl GumballStyle {
    pub fn from_config(config: &ViewportConfig) -> Self {
        Self {
            arrow_length: config.gumball_arrow_length,
            arrow_radius: config.gumball_arrow_radius,
        }
    }

    fn head_radius(&self) -> f32 {
        self.arrow_radius * 3.0
    }

    fn head_height(&self) -> f32 {
        self.arrow_radius * 6.0
    }
}

impl Default for GumballStyle {
    fn default() -> Self {
        Self::from_config(&ViewportConfig::default())
    }
}

#[derive(Debug)]
struct AxisHandle {
    axis: Axis,
    drawable: DrawableId,
    /// Centre of the part relative to the gumball origin.
    offset: Vec3,
    half_size: Vec3,
}

/// Three-axis move widget drawn on the selected parcel.
///
/// Owns its drawables. They stay alive until [`Gumball::release`] is
/// called; there is no implicit cleanup.
#[derive(Debug)]
pub struct Gumball {
    origin: Vec3,
    handles: Vec<AxisHandle>,
    center_marker: DrawableId,
}

impl Gumball {
    /// Builds all handle drawables at `origin`. On failure every drawable
    /// created so far is released before the error is returned.
    pub fn create(
        backend: &mut dyn RenderBackend,
        origin: Vec3,
        style: &GumballStyle,
    ) -> Result<Self, RenderError> {
        let mut created: Vec<DrawableId> = Vec::new();
        match Self::build(backend, origin, style, &mut created) {
            Ok(gumball) => Ok(gumball),
            Err(err) => {
                for id in created {
                    backend.release_drawable(id);
                }
                Err(err)
            }
        }
    }

    fn build(
        backend: &mut dyn RenderBackend,
        origin: Vec3,
        style: &GumballStyle,
        created: &mut Vec<DrawableId>,
    ) -> Result<Self, RenderError> {
        let mut handles = Vec::with_capacity(6);
        for axis in Axis::ALL {
            let color = rgb_from_hex(axis_color(axis));
            let dir = axis.unit();
            let parts = [
                (
                    DrawableShape::Cylinder {
                        radius: style.arrow_radius,
                        length: style.arrow_length,
                    },
                    dir * (style.arrow_length * 0.5),
                    across(axis, style.arrow_length * 0.5, style.arrow_radius),
                ),
                (
                    DrawableShape::Cone {
                        radius: style.head_radius(),
                        height: style.head_height(),
                    },
                    dir * (style.arrow_length + style.head_radius()),
                    across(axis, style.head_height() * 0.5, style.head_radius()),
                ),
            ];
            for (shape, offset, half_size) in parts {
                let drawable = backend.create_drawable(&DrawableDesc::solid(shape, color))?;
                created.push(drawable);
                handles.push(AxisHandle {
                    axis,
                    drawable,
                    offset,
                    half_size,
                });
            }
        }

        let center_marker = backend.create_drawable(&DrawableDesc::solid(
            DrawableShape::Sphere {
                radius: CENTER_MARKER_RADIUS,
            },
            rgb_from_hex(CENTER_MARKER_COLOR),
        ))?;
        created.push(center_marker);

        let gumball = Self {
            origin,
            handles,
            center_marker,
        };
        gumball.apply_transforms(backend);
        Ok(gumball)
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Moves the widget; must follow every committed parcel move.
    pub fn set_origin(&mut self, backend: &mut dyn RenderBackend, origin: Vec3) {
        self.origin = origin;
        self.apply_transforms(backend);
    }

    /// Pickable shafts and heads, each tagged with its axis. The centre
    /// marker is not pickable.
    pub fn pick_targets(&self) -> Vec<PickTarget> {
        self.handles
            .iter()
            .map(|handle| PickTarget {
                key: PickKey::GizmoAxis(handle.axis),
                bounds: Aabb::from_center_half(self.origin + handle.offset, handle.half_size),
            })
            .collect()
    }

    pub fn drawables(&self) -> Vec<DrawableId> {
        let mut ids: Vec<DrawableId> = self.handles.iter().map(|h| h.drawable).collect();
        ids.push(self.center_marker);
        ids
    }

    /// Frees every drawable the widget owns.
    pub fn release(self, backend: &mut dyn RenderBackend) {
        for id in self.drawables() {
            backend.release_drawable(id);
        }
    }

    fn apply_transforms(&self, backend: &mut dyn RenderBackend) {
        for handle in &self.handles {
            let world = Mat4::from_rotation_translation(
                Quat::from_rotation_arc(Vec3::Y, handle.axis.unit()),
                self.origin + handle.offset,
            );
            backend.set_transform(handle.drawable, world);
        }
        backend.set_transform(self.center_marker, Mat4::from_translation(self.origin));
    }
}

pub fn axis_color(axis: Axis) -> u32 {
    match axis {
        Axis::X => 0xff0000,
        Axis::Y => 0x00ff00,
        Axis::Z => 0x0000ff,
    }
}

/// Half size of a part that is `along` long on `axis` and `radius` wide on
/// the other two.
fn across(axis: Axis, along: f32, radius: f32) -> Vec3 {
    axis.with_component(Vec3::splat(radius), along)
}
