//! Box extents, rays, planes and the intersection helpers shared by picking
//! and dragging. Everything here is a pure function of its inputs.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("{axis:?} extent must be positive and finite, got {value}")]
    InvalidExtent { axis: Axis, value: f32 },
}

pub type Result<T> = std::result::Result<T, GeometryError>;

/// Coordinate axis, used to tag gumball handles and to constrain drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    /// Returns `v` with only this axis replaced by `value`.
    pub fn with_component(self, v: Vec3, value: f32) -> Vec3 {
        match self {
            Axis::X => Vec3::new(value, v.y, v.z),
            Axis::Y => Vec3::new(v.x, value, v.z),
            Axis::Z => Vec3::new(v.x, v.y, value),
        }
    }
}

/// Width (X), height (Y) and depth (Z) of an axis-aligned box.
///
/// Immutable: changing a dimension means building a new value with
/// [`BoxExtent::resized`]. Anything drawn from the old value has to be
/// rebuilt by the caller.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoxExtent {
    width: f32,
    height: f32,
    depth: f32,
}

impl BoxExtent {
    /// 2×2×2, the size new parcels start at.
    pub const DEFAULT_PARCEL: BoxExtent = BoxExtent {
        width: 2.0,
        height: 2.0,
        depth: 2.0,
    };

    pub fn new(width: f32, height: f32, depth: f32) -> Result<Self> {
        for (axis, value) in [(Axis::X, width), (Axis::Y, height), (Axis::Z, depth)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::InvalidExtent { axis, value });
            }
        }
        Ok(Self {
            width,
            height,
            depth,
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    pub fn along(&self, axis: Axis) -> f32 {
        axis.component(self.size())
    }

    /// New extent with any provided dimension replaced.
    pub fn resized(
        &self,
        width: Option<f32>,
        height: Option<f32>,
        depth: Option<f32>,
    ) -> Result<Self> {
        Self::new(
            width.unwrap_or(self.width),
            height.unwrap_or(self.height),
            depth.unwrap_or(self.depth),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_extent(center: Vec3, extent: &BoxExtent) -> Self {
        Self::from_center_half(center, extent.half_extents())
    }

    pub fn from_center_half(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray parameter of the entry point into `aabb`, slab method.
    ///
    /// Only boxes in front of the origin count; a ray starting inside a box
    /// does not hit it.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let inv = self.direction.recip();
        let t0 = (aabb.min - self.origin) * inv;
        let t1 = (aabb.max - self.origin) * inv;
        let t_near = t0.min(t1).max_element();
        let t_far = t0.max(t1).min_element();
        if t_near.is_nan() || t_far.is_nan() || t_near > t_far || t_near < 0.0 {
            return None;
        }
        Some(t_near)
    }

    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (plane.point - self.origin).dot(plane.normal) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    /// Unit length.
    pub normal: Vec3,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Option<Self> {
        let normal = normal.try_normalize()?;
        Some(Self { point, normal })
    }

    /// Horizontal plane at the height of `point`.
    pub fn horizontal_through(point: Vec3) -> Self {
        Self {
            point,
            normal: Vec3::Y,
        }
    }
}

/// Rounds to one decimal place, the precision positions are reported at.
pub fn round_to_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

pub fn round_vec_to_tenth(v: Vec3) -> Vec3 {
    Vec3::new(round_to_tenth(v.x), round_to_tenth(v.y), round_to_tenth(v.z))
}
