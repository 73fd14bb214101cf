pub mod containment;

use crate::geometry::{round_vec_to_tenth, BoxExtent, GeometryError};
use crate::render::{rgb_from_hex, DrawableDesc, DrawableId, DrawableShape, RenderError};
use glam::{Mat4, Vec3};

pub use containment::clamp_to_container;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("no container defined")]
    MissingContainer,
    #[error("unknown object {0:?}")]
    UnknownObject(ObjectId),
    #[error("position for {0:?} is not finite")]
    NonFinitePosition(ObjectId),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, SceneError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRole {
    /// Fixed at the origin, resting on the floor.
    Container,
    Parcel,
}

pub const CONTAINER_COLOR: u32 = 0x333333;
pub const CONTAINER_OPACITY: f32 = 0.3;
pub const DEFAULT_PARCEL_COLOR: u32 = 0x0167d3;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub name: String,
    pub role: ObjectRole,
    /// Centre of the box. Kept at full precision; see `display_position`.
    pub position: Vec3,
    pub extent: BoxExtent,
    pub color: [f32; 3],
    pub render_handle: Option<DrawableId>,
}

impl PlacedObject {
    /// Position at the one-decimal precision reported to the form layer.
    pub fn display_position(&self) -> Vec3 {
        round_vec_to_tenth(self.position)
    }

    /// Drawable description for the current extent and colour.
    pub fn drawable_desc(&self) -> DrawableDesc {
        box_drawable(&self.extent, self.color, self.role)
    }

    /// World transform of the drawable. The container's box is lifted so
    /// its base sits on the floor.
    pub fn world_transform(&self) -> Mat4 {
        match self.role {
            ObjectRole::Container => {
                Mat4::from_translation(Vec3::new(0.0, self.extent.height() * 0.5, 0.0))
            }
            ObjectRole::Parcel => Mat4::from_translation(self.position),
        }
    }
}

/// Geometry for a box of the given extent. Pure: callers decide when a
/// drawable is rebuilt from it.
pub fn box_drawable(extent: &BoxExtent, color: [f32; 3], role: ObjectRole) -> DrawableDesc {
    let shape = DrawableShape::Box {
        width: extent.width(),
        height: extent.height(),
        depth: extent.depth(),
    };
    match role {
        ObjectRole::Container => DrawableDesc {
            shape,
            color,
            opacity: CONTAINER_OPACITY,
            wireframe: true,
        },
        ObjectRole::Parcel => DrawableDesc::solid(shape, color),
    }
}

/// What the factory layer hands over when a parcel is added.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelSpec {
    pub name: Option<String>,
    pub position: Vec3,
    pub extent: BoxExtent,
    pub color: [f32; 3],
}

impl Default for ParcelSpec {
    fn default() -> Self {
        Self {
            name: None,
            position: Vec3::new(0.0, 1.0, 0.0),
            extent: BoxExtent::DEFAULT_PARCEL,
            color: rgb_from_hex(DEFAULT_PARCEL_COLOR),
        }
    }
}

/// The container plus every parcel, in insertion order.
#[derive(Debug, Default)]
pub struct SceneState {
    container: Option<PlacedObject>,
    parcels: Vec<PlacedObject>,
    next_id: u64,
}

impl SceneState {
    pub fn new() -> Self {
        Self {
            container: None,
            parcels: Vec::new(),
            next_id: 1,
        }
    }

    pub fn container(&self) -> Option<&PlacedObject> {
        self.container.as_ref()
    }

    pub fn container_mut(&mut self) -> Option<&mut PlacedObject> {
        self.container.as_mut()
    }

    pub fn require_container(&self) -> Result<&PlacedObject> {
        self.container.as_ref().ok_or(SceneError::MissingContainer)
    }

    pub fn set_container(&mut self, name: &str, extent: BoxExtent) -> ObjectId {
        let id = self.allocate_id();
        self.container = Some(PlacedObject {
            id,
            name: name.to_string(),
            role: ObjectRole::Container,
            position: Vec3::ZERO,
            extent,
            color: rgb_from_hex(CONTAINER_COLOR),
            render_handle: None,
        });
        id
    }

    pub fn parcels(&self) -> &[PlacedObject] {
        &self.parcels
    }

    pub fn parcel(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.parcels.iter().find(|parcel| parcel.id == id)
    }

    pub fn parcel_mut(&mut self, id: ObjectId) -> Option<&mut PlacedObject> {
        self.parcels.iter_mut().find(|parcel| parcel.id == id)
    }

    /// Adds a parcel at its clamped position. Fails without a container.
    pub fn add_parcel(&mut self, spec: ParcelSpec) -> Result<ObjectId> {
        let position = clamp_to_container(
            spec.position,
            &spec.extent,
            &self.require_container()?.extent,
        );
        let id = self.allocate_id();
        self.parcels.push(PlacedObject {
            id,
            name: spec.name.unwrap_or_else(|| format!("Parcel {}", id.0)),
            role: ObjectRole::Parcel,
            position,
            extent: spec.extent,
            color: spec.color,
            render_handle: None,
        });
        Ok(id)
    }

    /// Detaches a parcel from the list. The caller releases its drawable
    /// first.
    pub fn remove_parcel(&mut self, id: ObjectId) -> Result<PlacedObject> {
        let index = self
            .parcels
            .iter()
            .position(|parcel| parcel.id == id)
            .ok_or(SceneError::UnknownObject(id))?;
        Ok(self.parcels.remove(index))
    }

    /// Nearest position inside the container for parcel `id`.
    pub fn clamp_parcel_position(&self, id: ObjectId, desired: Vec3) -> Result<Vec3> {
        let container = self.require_container()?;
        let parcel = self.parcel(id).ok_or(SceneError::UnknownObject(id))?;
        Ok(clamp_to_container(desired, &parcel.extent, &container.extent))
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        ObjectId(id)
    }
}
