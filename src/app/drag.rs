use crate::geometry::{Axis, Plane, Ray};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragMode {
    Idle,
    /// Moving on a horizontal plane through the point the body was grabbed.
    FreeDrag { plane: Plane },
    /// Moving along one axis after grabbing a gumball handle.
    AxisDrag { axis: Axis },
}

/// Turns pointer rays into candidate positions for the selected parcel.
/// Clamping and committing are left to the caller.
#[derive(Debug, Clone, Copy)]
pub struct DragController {
    mode: DragMode,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            mode: DragMode::Idle,
        }
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode != DragMode::Idle
    }

    pub fn active_axis(&self) -> Option<Axis> {
        match self.mode {
            DragMode::AxisDrag { axis } => Some(axis),
            _ => None,
        }
    }

    pub fn begin_free(&mut self, grab_point: Vec3) {
        self.mode = DragMode::FreeDrag {
            plane: Plane::horizontal_through(grab_point),
        };
    }

    pub fn begin_axis(&mut self, axis: Axis) {
        self.mode = DragMode::AxisDrag { axis };
    }

    pub fn end(&mut self) {
        self.mode = DragMode::Idle;
    }

    /// Raw desired position for the next commit, or `None` when the ray
    /// does not reach the drag plane.
    ///
    /// `view_direction` is the camera's forward vector.
    pub fn candidate(&self, ray: &Ray, current: Vec3, view_direction: Vec3) -> Option<Vec3> {
        match self.mode {
            DragMode::Idle => None,
            DragMode::FreeDrag { plane } => ray.intersect_plane(&plane),
            DragMode::AxisDrag { axis } => {
                let plane = axis_drag_plane(axis, current, view_direction)?;
                let hit = ray.intersect_plane(&plane)?;
                let delta = hit - current;
                Some(axis.with_component(
                    current,
                    axis.component(current) + axis.component(delta),
                ))
            }
        }
    }
}

/// Plane through `current` whose normal is `axis × view_direction`.
/// `None` when the axis is parallel to the view.
fn axis_drag_plane(axis: Axis, current: Vec3, view_direction: Vec3) -> Option<Plane> {
    let normal = axis.unit().cross(view_direction);
    if normal.length_squared() < 1e-8 {
        return None;
    }
    Plane::from_normal_and_point(normal, current)
}
