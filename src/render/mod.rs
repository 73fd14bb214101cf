mod camera;
mod gumball;
pub mod headless;
pub mod pick;

pub use camera::CameraController;
pub use gumball::{Gumball, GumballStyle};
pub use headless::HeadlessBackend;
pub use pick::{pick_nearest, PickHit, PickKey, PickTarget};

use glam::Mat4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create drawable: {0}")]
    DrawableCreateFailed(String),
    #[error("unknown drawable {0:?}")]
    UnknownDrawable(DrawableId),
}

/// Opaque handle to something the backend draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableId(pub u64);

/// Primitive shapes, centred on their local origin. Cylinders and cones
/// run along local +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawableShape {
    Box { width: f32, height: f32, depth: f32 },
    Cylinder { radius: f32, length: f32 },
    Cone { radius: f32, height: f32 },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableDesc {
    pub shape: DrawableShape,
    pub color: [f32; 3],
    pub opacity: f32,
    pub wireframe: bool,
}

impl DrawableDesc {
    pub fn solid(shape: DrawableShape, color: [f32; 3]) -> Self {
        Self {
            shape,
            color,
            opacity: 1.0,
            wireframe: false,
        }
    }
}

/// Everything the interaction core needs from a renderer.
///
/// Drawables are created and released explicitly; the core never relies on
/// the backend walking a scene graph to find what to free.
pub trait RenderBackend {
    fn create_drawable(&mut self, desc: &DrawableDesc) -> Result<DrawableId, RenderError>;

    fn release_drawable(&mut self, id: DrawableId);

    fn set_transform(&mut self, id: DrawableId, transform: Mat4);

    fn emissive(&self, id: DrawableId) -> [f32; 3];

    fn set_emissive(&mut self, id: DrawableId, rgb: [f32; 3]);

    fn surface_size(&self) -> (u32, u32);

    fn resize_surface(&mut self, width: u32, height: u32);
}

/// Splits a `0xRRGGBB` colour into channels in `[0, 1]`.
pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}
