//! In-memory render backend.
//!
//! Keeps every live drawable in an arena keyed by id so that hosts without a
//! GPU (and the tests) can drive the viewport and check that nothing leaks.

use super::{DrawableDesc, DrawableId, RenderBackend, RenderError};
use glam::Mat4;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawableRecord {
    pub desc: DrawableDesc,
    pub transform: Mat4,
    pub emissive: [f32; 3],
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    drawables: HashMap<u64, DrawableRecord>,
    next_id: u64,
    width: u32,
    height: u32,
    released: u64,
    /// Successful creates left before every create fails.
    fail_creates_after: Option<u32>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            drawables: HashMap::new(),
            next_id: 1,
            width,
            height,
            released: 0,
            fail_creates_after: None,
        }
    }

    /// Lets `successes` more creates through, then fails every create until
    /// [`HeadlessBackend::clear_create_failures`] is called.
    pub fn fail_creates_after(&mut self, successes: u32) {
        self.fail_creates_after = Some(successes);
    }

    pub fn clear_create_failures(&mut self) {
        self.fail_creates_after = None;
    }

    pub fn live_count(&self) -> usize {
        self.drawables.len()
    }

    pub fn released_count(&self) -> u64 {
        self.released
    }

    pub fn get(&self, id: DrawableId) -> Option<&DrawableRecord> {
        self.drawables.get(&id.0)
    }

    pub fn is_live(&self, id: DrawableId) -> bool {
        self.drawables.contains_key(&id.0)
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_drawable(&mut self, desc: &DrawableDesc) -> Result<DrawableId, RenderError> {
        if !desc.opacity.is_finite() {
            return Err(RenderError::DrawableCreateFailed(format!(
                "opacity {} is not finite",
                desc.opacity
            )));
        }
        if let Some(remaining) = &mut self.fail_creates_after {
            if *remaining == 0 {
                log::warn!("drawable create refused ({:?})", desc.shape);
                return Err(RenderError::DrawableCreateFailed(
                    "backend refused the drawable".to_string(),
                ));
            }
            *remaining -= 1;
        }
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.drawables.insert(
            id,
            DrawableRecord {
                desc: *desc,
                transform: Mat4::IDENTITY,
                emissive: [0.0; 3],
            },
        );
        log::trace!("drawable {} created ({:?})", id, desc.shape);
        Ok(DrawableId(id))
    }

    fn release_drawable(&mut self, id: DrawableId) {
        if self.drawables.remove(&id.0).is_some() {
            self.released += 1;
            log::trace!("drawable {} released", id.0);
        } else {
            log::warn!("release of unknown drawable {}", id.0);
        }
    }

    fn set_transform(&mut self, id: DrawableId, transform: Mat4) {
        if let Some(record) = self.drawables.get_mut(&id.0) {
            record.transform = transform;
        }
    }

    fn emissive(&self, id: DrawableId) -> [f32; 3] {
        self.drawables
            .get(&id.0)
            .map(|record| record.emissive)
            .unwrap_or([0.0; 3])
    }

    fn set_emissive(&mut self, id: DrawableId, rgb: [f32; 3]) {
        if let Some(record) = self.drawables.get_mut(&id.0) {
            record.emissive = rgb;
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}
