use crate::render::{DrawableId, Gumball, GumballStyle, RenderBackend, RenderError};
use crate::scene::{ObjectId, PlacedObject};
use glam::Vec3;

#[derive(Debug)]
struct ActiveSelection {
    parcel: ObjectId,
    drawable: Option<DrawableId>,
    /// Emissive the drawable had before it was highlighted.
    restore_emissive: [f32; 3],
    gumball: Gumball,
}

/// At most one selected parcel, its highlight and its gumball.
///
/// The gumball lives inside the selection, so a gumball without a selection
/// (or a selection without one) cannot be represented.
#[derive(Debug, Default)]
pub struct Selection {
    active: Option<ActiveSelection>,
}

impl Selection {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.active.as_ref().map(|active| active.parcel)
    }

    pub fn gumball(&self) -> Option<&Gumball> {
        self.active.as_ref().map(|active| &active.gumball)
    }

    /// Selects `parcel`, replacing any previous selection. Returns whether
    /// the selected id changed.
    ///
    /// If the gumball cannot be built the previous selection has already
    /// been cleared and nothing stays selected.
    pub fn select(
        &mut self,
        backend: &mut dyn RenderBackend,
        parcel: &PlacedObject,
        style: &GumballStyle,
        highlight: [f32; 3],
    ) -> Result<bool, RenderError> {
        if self.selected() == Some(parcel.id) {
            return Ok(false);
        }
        self.deselect(backend);

        let restore_emissive = match parcel.render_handle {
            Some(id) => {
                let previous = backend.emissive(id);
                backend.set_emissive(id, highlight);
                previous
            }
            None => [0.0; 3],
        };

        let gumball = match Gumball::create(backend, parcel.position, style) {
            Ok(gumball) => gumball,
            Err(err) => {
                if let Some(id) = parcel.render_handle {
                    backend.set_emissive(id, restore_emissive);
                }
                return Err(err);
            }
        };

        self.active = Some(ActiveSelection {
            parcel: parcel.id,
            drawable: parcel.render_handle,
            restore_emissive,
            gumball,
        });
        Ok(true)
    }

    /// Clears the highlight and frees the gumball. Returns whether anything
    /// was selected.
    pub fn deselect(&mut self, backend: &mut dyn RenderBackend) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        if let Some(id) = active.drawable {
            backend.set_emissive(id, active.restore_emissive);
        }
        active.gumball.release(backend);
        true
    }

    /// Keeps the gumball on the selected parcel after a move.
    pub fn follow(&mut self, backend: &mut dyn RenderBackend, position: Vec3) {
        if let Some(active) = &mut self.active {
            active.gumball.set_origin(backend, position);
        }
    }

    /// Points the highlight at a rebuilt drawable. The previous drawable is
    /// assumed to be gone, so it is not restored.
    pub fn rebind_drawable(
        &mut self,
        backend: &mut dyn RenderBackend,
        drawable: Option<DrawableId>,
        highlight: [f32; 3],
    ) {
        let Some(active) = &mut self.active else {
            return;
        };
        active.drawable = drawable;
        active.restore_emissive = match drawable {
            Some(id) => {
                let previous = backend.emissive(id);
                backend.set_emissive(id, highlight);
                previous
            }
            None => [0.0; 3],
        };
    }
}
