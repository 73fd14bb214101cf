use glam::Vec2;
use winit::event::{MouseButton, MouseScrollDelta};

/// Which button started a gesture. Primary selects and drags, secondary
/// orbits the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

impl PointerButton {
    pub fn from_winit(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Self::Primary,
            MouseButton::Right => Self::Secondary,
            _ => Self::Other,
        }
    }

    /// Whether releasing this button ends a drag or orbit. Other buttons
    /// never start one.
    pub fn ends_gesture(self) -> bool {
        self != Self::Other
    }
}

/// Wheel delta in the browser convention: positive scrolls away from the
/// user, which zooms out.
pub fn wheel_delta_y(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y,
        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32),
    }
}

/// Pixel coordinate (top-left origin) to normalized device coordinate
/// (`[-1, 1]`, +Y up). `None` while the viewport has no area.
pub fn pixel_to_ndc(pixel: Vec2, width: u32, height: u32) -> Option<Vec2> {
    if width == 0 || height == 0 || !pixel.is_finite() {
        return None;
    }
    Some(Vec2::new(
        pixel.x / width as f32 * 2.0 - 1.0,
        1.0 - pixel.y / height as f32 * 2.0,
    ))
}
