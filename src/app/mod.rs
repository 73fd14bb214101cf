mod drag;
pub mod host;
pub mod input;
mod selection;

pub use drag::{DragController, DragMode};
pub use input::PointerButton;
pub use selection::Selection;

use crate::config::{ConfigError, ViewportConfig};
use crate::geometry::{round_vec_to_tenth, Aabb, BoxExtent, GeometryError, Ray};
use crate::render::{
    pick_nearest, CameraController, Gumball, GumballStyle, PickKey, PickTarget, RenderBackend,
    RenderError,
};
use crate::scene::{
    box_drawable, clamp_to_container, ObjectId, ObjectRole, ParcelSpec, PlacedObject, SceneError,
    SceneState,
};
use glam::{Vec2, Vec3};

#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("viewport has been torn down")]
    TornDown,
}

impl From<RenderError> for ViewportError {
    fn from(err: RenderError) -> Self {
        Self::Scene(err.into())
    }
}

impl From<GeometryError> for ViewportError {
    fn from(err: GeometryError) -> Self {
        Self::Scene(err.into())
    }
}

pub type Result<T> = std::result::Result<T, ViewportError>;

/// Notifications for the layer above, drained with [`Viewport::take_events`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    SelectionChanged(Option<ObjectId>),
    /// `position` is rounded to one decimal place.
    ParcelMoved { id: ObjectId, position: Vec3 },
}

/// Interaction core: owns the scene, camera, drag state and selection, and
/// turns pointer input into committed parcel moves.
pub struct Viewport<B: RenderBackend> {
    backend: B,
    config: ViewportConfig,
    gumball_style: GumballStyle,
    scene: SceneState,
    camera: CameraController,
    drag: DragController,
    selection: Selection,
    events: Vec<ViewportEvent>,
    torn_down: bool,
}

impl<B: RenderBackend> Viewport<B> {
    /// Binds `backend` and seeds the container.
    pub fn initialize(
        backend: B,
        container_name: &str,
        container: BoxExtent,
        config: ViewportConfig,
    ) -> Result<Self> {
        let mut scene = SceneState::new();
        scene.set_container(container_name, container);
        Self::from_scene(backend, scene, config)
    }

    /// Binds an existing scene, creating a drawable for the container and
    /// every parcel. Fails before anything is drawn if the config is invalid
    /// or the scene has no container.
    pub fn from_scene(
        mut backend: B,
        mut scene: SceneState,
        config: ViewportConfig,
    ) -> Result<Self> {
        config.validate()?;
        scene.require_container()?;

        if let Err(err) = spawn_all(&mut backend, &mut scene) {
            release_all(&mut backend, &mut scene);
            return Err(err.into());
        }

        let (width, height) = backend.surface_size();
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        let camera = CameraController::new(&config, aspect);
        log::info!(
            "Viewport initialized: {}x{}, {} parcel(s)",
            width,
            height,
            scene.parcels().len()
        );

        Ok(Self {
            backend,
            gumball_style: GumballStyle::from_config(&config),
            config,
            scene,
            camera,
            drag: DragController::new(),
            selection: Selection::new(),
            events: Vec::new(),
            torn_down: false,
        })
    }

    /// Releases every drawable. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.drag.end();
        self.camera.end_orbit();
        self.selection.deselect(&mut self.backend);
        release_all(&mut self.backend, &mut self.scene);
        self.torn_down = true;
        log::info!("Viewport torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.torn_down {
            return;
        }
        self.backend.resize_surface(width, height);
        self.camera.set_aspect(width, height);
        log::info!("Viewport resized to {}x{}", width, height);
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32, button: PointerButton) {
        if self.torn_down {
            return;
        }
        let pixel = Vec2::new(x, y);
        match button {
            PointerButton::Secondary => {
                if self.drag.is_active() {
                    log::debug!("Orbit ignored while dragging");
                    return;
                }
                self.camera.begin_orbit(pixel);
                log::debug!("Orbit started at ({x}, {y})");
            }
            PointerButton::Primary => {
                if self.camera.is_orbiting() {
                    log::debug!("Pick ignored while orbiting");
                    return;
                }
                self.pick_and_begin_drag(pixel);
            }
            PointerButton::Other => {}
        }
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.torn_down {
            return;
        }
        let pixel = Vec2::new(x, y);
        if self.camera.orbit_to(pixel) {
            return;
        }
        if self.drag.is_active() {
            self.drag_to(pixel);
        }
    }

    /// Ends whichever gesture is active.
    pub fn on_pointer_up(&mut self) {
        if self.drag.is_active() || self.camera.is_orbiting() {
            log::debug!("Gesture ended ({:?})", self.drag.mode());
        }
        self.drag.end();
        self.camera.end_orbit();
    }

    /// Focus loss cancels the gesture the same way a release does.
    pub fn on_focus_lost(&mut self) {
        self.on_pointer_up();
    }

    pub fn on_wheel(&mut self, delta_y: f32) {
        if self.torn_down || !delta_y.is_finite() {
            return;
        }
        self.camera.zoom(delta_y);
    }

    /// Creates the parcel's drawable and places it, clamped, in the scene.
    pub fn add_parcel(&mut self, spec: ParcelSpec) -> Result<ObjectId> {
        self.ensure_live()?;
        let id = self.scene.add_parcel(spec)?;
        let Some(parcel) = self.scene.parcel_mut(id) else {
            return Err(SceneError::UnknownObject(id).into());
        };
        if let Err(err) = spawn_drawable(&mut self.backend, parcel) {
            self.scene.remove_parcel(id)?;
            return Err(err.into());
        }
        log::debug!("Parcel {:?} added", id);
        Ok(id)
    }

    /// Deselects the parcel if needed, releases its drawable, then drops it
    /// from the scene.
    pub fn delete_parcel(&mut self, id: ObjectId) -> Result<()> {
        self.ensure_live()?;
        if self.scene.parcel(id).is_none() {
            return Err(SceneError::UnknownObject(id).into());
        }
        if self.selection.selected() == Some(id) {
            self.drag.end();
            self.selection.deselect(&mut self.backend);
            self.events.push(ViewportEvent::SelectionChanged(None));
        }
        if let Some(parcel) = self.scene.parcel_mut(id) {
            if let Some(handle) = parcel.render_handle.take() {
                self.backend.release_drawable(handle);
            }
        }
        self.scene.remove_parcel(id)?;
        log::debug!("Parcel {:?} deleted", id);
        Ok(())
    }

    /// Replaces the parcel's extent, rebuilds its drawable and re-clamps it.
    pub fn resize_parcel(&mut self, id: ObjectId, extent: BoxExtent) -> Result<()> {
        self.ensure_live()?;
        let color = self.require_parcel(id)?.color;
        self.rebuild_parcel(id, extent, color)?;
        let position = self.require_parcel(id)?.position;
        let clamped = self.scene.clamp_parcel_position(id, position)?;
        if clamped != position {
            self.commit_position(id, clamped);
        }
        Ok(())
    }

    /// Replaces the container's extent, rebuilds its drawable and re-clamps
    /// every parcel.
    pub fn resize_container(&mut self, extent: BoxExtent) -> Result<()> {
        self.ensure_live()?;
        let container = self.scene.require_container()?;
        let desc = box_drawable(&extent, container.color, ObjectRole::Container);
        let handle = self.backend.create_drawable(&desc)?;
        let Some(container) = self.scene.container_mut() else {
            self.backend.release_drawable(handle);
            return Err(SceneError::MissingContainer.into());
        };
        if let Some(old) = container.render_handle.replace(handle) {
            self.backend.release_drawable(old);
        }
        container.extent = extent;
        self.backend.set_transform(handle, container.world_transform());
        log::debug!("Container resized to {:?}", extent.size());

        let moves: Vec<(ObjectId, Vec3)> = self
            .scene
            .parcels()
            .iter()
            .filter_map(|parcel| {
                let clamped = clamp_to_container(parcel.position, &parcel.extent, &extent);
                (clamped != parcel.position).then_some((parcel.id, clamped))
            })
            .collect();
        for (id, position) in moves {
            self.commit_position(id, position);
        }
        Ok(())
    }

    /// Rebuilds the parcel's drawable in a new colour. A selected parcel
    /// stays highlighted.
    pub fn set_parcel_color(&mut self, id: ObjectId, color: [f32; 3]) -> Result<()> {
        self.ensure_live()?;
        let extent = self.require_parcel(id)?.extent;
        self.rebuild_parcel(id, extent, color)
    }

    /// Commits a typed position, clamped into the container. The gumball
    /// follows and `ParcelMoved` is queued when the stored position changes.
    pub fn set_parcel_position(&mut self, id: ObjectId, desired: Vec3) -> Result<()> {
        self.ensure_live()?;
        let current = self.require_parcel(id)?.position;
        if !desired.is_finite() {
            return Err(SceneError::NonFinitePosition(id).into());
        }
        let clamped = self.scene.clamp_parcel_position(id, desired)?;
        if clamped != current {
            self.commit_position(id, clamped);
        }
        Ok(())
    }

    pub fn rename_parcel(&mut self, id: ObjectId, name: &str) -> Result<()> {
        self.ensure_live()?;
        let parcel = self
            .scene
            .parcel_mut(id)
            .ok_or(SceneError::UnknownObject(id))?;
        parcel.name = name.to_string();
        Ok(())
    }

    pub fn rename_container(&mut self, name: &str) -> Result<()> {
        self.ensure_live()?;
        let container = self
            .scene
            .container_mut()
            .ok_or(SceneError::MissingContainer)?;
        container.name = name.to_string();
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<ViewportEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn drag_mode(&self) -> DragMode {
        self.drag.mode()
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selection.selected()
    }

    pub fn gumball(&self) -> Option<&Gumball> {
        self.selection.gumball()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.torn_down {
            Err(ViewportError::TornDown)
        } else {
            Ok(())
        }
    }

    fn require_parcel(&self, id: ObjectId) -> Result<&PlacedObject> {
        self.scene
            .parcel(id)
            .ok_or_else(|| SceneError::UnknownObject(id).into())
    }

    fn ray_at(&self, pixel: Vec2) -> Option<Ray> {
        let (width, height) = self.backend.surface_size();
        let ndc = input::pixel_to_ndc(pixel, width, height)?;
        self.camera.ray_from_ndc(ndc)
    }

    /// Handles first, then parcel bodies, then empty space.
    fn pick_and_begin_drag(&mut self, pixel: Vec2) {
        let Some(ray) = self.ray_at(pixel) else {
            return;
        };

        if let Some(gumball) = self.selection.gumball() {
            if let Some(hit) = pick_nearest(&ray, &gumball.pick_targets()) {
                if let PickKey::GizmoAxis(axis) = hit.key {
                    self.drag.begin_axis(axis);
                    log::debug!("Axis drag on {:?}", axis);
                    return;
                }
            }
        }

        let bodies: Vec<PickTarget> = self
            .scene
            .parcels()
            .iter()
            .map(|parcel| PickTarget {
                key: PickKey::Parcel(parcel.id),
                bounds: Aabb::from_center_extent(parcel.position, &parcel.extent),
            })
            .collect();

        match pick_nearest(&ray, &bodies) {
            Some(hit) => {
                let PickKey::Parcel(id) = hit.key else {
                    return;
                };
                if self.select(id) {
                    self.drag.begin_free(hit.point);
                    log::debug!("Free drag on {:?} at height {}", id, hit.point.y);
                }
            }
            None => {
                self.drag.end();
                if self.selection.deselect(&mut self.backend) {
                    log::debug!("Selection cleared");
                    self.events.push(ViewportEvent::SelectionChanged(None));
                }
            }
        }
    }

    /// Selects `id`. Returns `false` when nothing ends up selected.
    fn select(&mut self, id: ObjectId) -> bool {
        let Some(parcel) = self.scene.parcel(id) else {
            return false;
        };
        let previous = self.selection.selected();
        match self.selection.select(
            &mut self.backend,
            parcel,
            &self.gumball_style,
            self.config.highlight_emissive,
        ) {
            Ok(true) => {
                log::debug!("Selected {:?}", id);
                self.events.push(ViewportEvent::SelectionChanged(Some(id)));
                true
            }
            Ok(false) => true,
            Err(err) => {
                log::warn!("Could not build gumball for {:?}: {}", id, err);
                if previous.is_some() {
                    self.events.push(ViewportEvent::SelectionChanged(None));
                }
                false
            }
        }
    }

    fn drag_to(&mut self, pixel: Vec2) {
        let Some(id) = self.selection.selected() else {
            self.drag.end();
            return;
        };
        let Some(current) = self.scene.parcel(id).map(|parcel| parcel.position) else {
            return;
        };
        let Some(ray) = self.ray_at(pixel) else {
            return;
        };
        let Some(candidate) = self.drag.candidate(&ray, current, self.camera.forward()) else {
            return;
        };
        let mut clamped = match self.scene.clamp_parcel_position(id, candidate) {
            Ok(position) => position,
            Err(err) => {
                log::warn!("Drag of {:?} dropped: {}", id, err);
                return;
            }
        };
        if let Some(axis) = self.drag.active_axis() {
            clamped = axis.with_component(current, axis.component(clamped));
        }
        if clamped != current {
            self.commit_position(id, clamped);
        }
    }

    /// Writes a clamped position, moves the drawable and gumball, and queues
    /// the notification.
    fn commit_position(&mut self, id: ObjectId, position: Vec3) {
        let Some(parcel) = self.scene.parcel_mut(id) else {
            return;
        };
        parcel.position = position;
        if let Some(handle) = parcel.render_handle {
            self.backend.set_transform(handle, parcel.world_transform());
        }
        if self.selection.selected() == Some(id) {
            self.selection.follow(&mut self.backend, position);
        }
        log::trace!("{:?} moved to {:?}", id, position);
        self.events.push(ViewportEvent::ParcelMoved {
            id,
            position: round_vec_to_tenth(position),
        });
    }

    /// Swaps in a new drawable for the parcel. The old one is released only
    /// once the new one exists, so a failure leaves the parcel untouched.
    fn rebuild_parcel(&mut self, id: ObjectId, extent: BoxExtent, color: [f32; 3]) -> Result<()> {
        let desc = box_drawable(&extent, color, ObjectRole::Parcel);
        let handle = self.backend.create_drawable(&desc)?;
        let Some(parcel) = self.scene.parcel_mut(id) else {
            self.backend.release_drawable(handle);
            return Err(SceneError::UnknownObject(id).into());
        };
        if let Some(old) = parcel.render_handle.replace(handle) {
            self.backend.release_drawable(old);
        }
        parcel.extent = extent;
        parcel.color = color;
        self.backend.set_transform(handle, parcel.world_transform());
        if self.selection.selected() == Some(id) {
            self.selection.rebind_drawable(
                &mut self.backend,
                Some(handle),
                self.config.highlight_emissive,
            );
        }
        Ok(())
    }
}

impl<B: RenderBackend> Drop for Viewport<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn spawn_drawable(
    backend: &mut dyn RenderBackend,
    object: &mut PlacedObject,
) -> std::result::Result<(), RenderError> {
    let handle = backend.create_drawable(&object.drawable_desc())?;
    backend.set_transform(handle, object.world_transform());
    object.render_handle = Some(handle);
    Ok(())
}

fn spawn_all(
    backend: &mut dyn RenderBackend,
    scene: &mut SceneState,
) -> std::result::Result<(), RenderError> {
    if let Some(container) = scene.container_mut() {
        spawn_drawable(backend, container)?;
    }
    let ids: Vec<ObjectId> = scene.parcels().iter().map(|parcel| parcel.id).collect();
    for id in ids {
        if let Some(parcel) = scene.parcel_mut(id) {
            spawn_drawable(backend, parcel)?;
        }
    }
    Ok(())
}

fn release_all(backend: &mut dyn RenderBackend, scene: &mut SceneState) {
    if let Some(handle) = scene
        .container_mut()
        .and_then(|container| container.render_handle.take())
    {
        backend.release_drawable(handle);
    }
    let ids: Vec<ObjectId> = scene.parcels().iter().map(|parcel| parcel.id).collect();
    for id in ids {
        if let Some(handle) = scene
            .parcel_mut(id)
            .and_then(|parcel| parcel.render_handle.take())
        {
            backend.release_drawable(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Axis;
    use crate::render::HeadlessBackend;

    const WIDTH: u32 = 800;
    const HEIGHT: u32 = 600;

    fn viewport() -> Viewport<HeadlessBackend> {
        Viewport::initialize(
            HeadlessBackend::new(WIDTH, HEIGHT),
            "MainContainer",
            BoxExtent::new(10.0, 6.0, 10.0).unwrap(),
            ViewportConfig::default(),
        )
        .unwrap()
    }

    fn viewport_with_parcel() -> (Viewport<HeadlessBackend>, ObjectId) {
        let mut viewport = viewport();
        let id = viewport
            .add_parcel(ParcelSpec {
                position: Vec3::new(2.0, 1.0, -2.0),
                ..ParcelSpec::default()
            })
            .unwrap();
        (viewport, id)
    }

    /// Pixel the camera maps `world` to.
    fn pixel_of(viewport: &Viewport<HeadlessBackend>, world: Vec3) -> Vec2 {
        let ndc = viewport.camera().project(world);
        let (width, height) = viewport.backend().surface_size();
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc.y) * 0.5 * height as f32,
        )
    }

    fn click(viewport: &mut Viewport<HeadlessBackend>, world: Vec3) {
        let pixel = pixel_of(viewport, world);
        viewport.on_pointer_down(pixel.x, pixel.y, PointerButton::Primary);
    }

    fn position(viewport: &Viewport<HeadlessBackend>, id: ObjectId) -> Vec3 {
        viewport.scene().parcel(id).unwrap().position
    }

    fn assert_coupled(viewport: &Viewport<HeadlessBackend>) {
        assert_eq!(viewport.selected().is_none(), viewport.gumball().is_none());
    }

    #[test]
    fn initialize_draws_container() {
        let viewport = viewport();
        assert_eq!(viewport.backend().live_count(), 1);
        let container = viewport.scene().container().unwrap();
        let record = viewport
            .backend()
            .get(container.render_handle.unwrap())
            .unwrap();
        assert!(record.desc.wireframe);
        assert_eq!(record.transform.w_axis.truncate(), Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn initialize_rejects_invalid_config() {
        let config = ViewportConfig {
            orbit_sensitivity: f32::NAN,
            ..ViewportConfig::default()
        };
        let result = Viewport::initialize(
            HeadlessBackend::new(WIDTH, HEIGHT),
            "MainContainer",
            BoxExtent::new(10.0, 6.0, 10.0).unwrap(),
            config,
        );
        assert!(matches!(result, Err(ViewportError::Config(_))));
    }

    #[test]
    fn scene_without_container_fails_before_any_pick() {
        let result = Viewport::from_scene(
            HeadlessBackend::new(WIDTH, HEIGHT),
            SceneState::new(),
            ViewportConfig::default(),
        );
        assert!(matches!(
            result,
            Err(ViewportError::Scene(SceneError::MissingContainer))
        ));
    }

    #[test]
    fn clicking_a_parcel_selects_it_and_starts_free_drag() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));

        assert_eq!(viewport.selected(), Some(id));
        assert_coupled(&viewport);
        assert_eq!(
            viewport.take_events(),
            vec![ViewportEvent::SelectionChanged(Some(id))]
        );
        let handle = viewport.scene().parcel(id).unwrap().render_handle.unwrap();
        assert_eq!(
            viewport.backend().get(handle).unwrap().emissive,
            viewport.config().highlight_emissive
        );

        let DragMode::FreeDrag { plane } = viewport.drag_mode() else {
            panic!("expected free drag, got {:?}", viewport.drag_mode());
        };
        let target = Vec3::new(3.0, plane.point.y, -1.0);
        let pixel = pixel_of(&viewport, target);
        viewport.on_pointer_move(pixel.x, pixel.y);

        let moved = position(&viewport, id);
        assert!((moved - target).length() < 5e-2, "{moved:?}");
        assert!((viewport.gumball().unwrap().origin() - moved).length() < 1e-6);
        let events = viewport.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            ViewportEvent::ParcelMoved {
                id,
                position: round_vec_to_tenth(moved)
            }
        );

        viewport.on_pointer_up();
        assert_eq!(viewport.drag_mode(), DragMode::Idle);
    }

    #[test]
    fn free_drag_is_clamped_to_container() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        let DragMode::FreeDrag { plane } = viewport.drag_mode() else {
            panic!("expected free drag");
        };
        let pixel = pixel_of(&viewport, Vec3::new(-30.0, plane.point.y, 0.0));
        viewport.on_pointer_move(pixel.x, pixel.y);
        let moved = position(&viewport, id);
        assert_eq!(moved.x, -4.0);
        assert!(moved.y >= 1.0 && moved.y <= 5.0);
        assert!(moved.z.abs() <= 4.0);
    }

    #[test]
    fn y_handle_drag_moves_only_y() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.on_pointer_up();
        viewport.take_events();

        let start = position(&viewport, id);
        let grab = pixel_of(&viewport, start + Vec3::new(0.0, 1.2, 0.0));
        viewport.on_pointer_down(grab.x, grab.y, PointerButton::Primary);
        assert_eq!(viewport.drag_mode(), DragMode::AxisDrag { axis: Axis::Y });
        assert!(viewport.take_events().is_empty());

        viewport.on_pointer_move(grab.x + 40.0, grab.y);
        let first = position(&viewport, id);
        assert_eq!(first.x.to_bits(), start.x.to_bits());
        assert_eq!(first.z.to_bits(), start.z.to_bits());
        assert_ne!(first.y, start.y);

        viewport.on_pointer_move(grab.x + 10.0, grab.y + 25.0);
        let second = position(&viewport, id);
        assert_eq!(second.x.to_bits(), start.x.to_bits());
        assert_eq!(second.z.to_bits(), start.z.to_bits());
        assert!(second.y >= 1.0 && second.y <= 5.0);
        assert_eq!(viewport.gumball().unwrap().origin(), second);

        viewport.on_pointer_up();
        assert_eq!(viewport.drag_mode(), DragMode::Idle);
        assert_eq!(viewport.selected(), Some(id));
    }

    #[test]
    fn clicking_empty_space_clears_selection() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.on_pointer_up();
        assert_eq!(viewport.selected(), Some(id));
        assert_eq!(viewport.backend().live_count(), 2 + 7);
        viewport.take_events();

        viewport.on_pointer_down(5.0, 5.0, PointerButton::Primary);
        assert_eq!(viewport.selected(), None);
        assert_coupled(&viewport);
        assert_eq!(viewport.drag_mode(), DragMode::Idle);
        assert_eq!(viewport.backend().live_count(), 2);
        assert_eq!(
            viewport.take_events(),
            vec![ViewportEvent::SelectionChanged(None)]
        );

        // Nothing selected and nothing hit: no event.
        viewport.on_pointer_down(5.0, 5.0, PointerButton::Primary);
        assert!(viewport.take_events().is_empty());
    }

    #[test]
    fn reselecting_same_parcel_is_silent() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.on_pointer_up();
        viewport.take_events();

        // The body below the gumball, away from any handle.
        click(&mut viewport, Vec3::new(1.5, 0.2, -1.5));
        assert_eq!(viewport.selected(), Some(id));
        assert!(matches!(viewport.drag_mode(), DragMode::FreeDrag { .. }));
        assert!(viewport.take_events().is_empty());
        assert_eq!(viewport.backend().live_count(), 2 + 7);
    }

    #[test]
    fn secondary_drag_orbits_camera() {
        let mut viewport = viewport();
        let theta = viewport.camera().theta;
        let radius = viewport.camera().radius;

        viewport.on_pointer_down(200.0, 300.0, PointerButton::Secondary);
        viewport.on_pointer_move(300.0, 300.0);
        assert!((viewport.camera().theta - (theta - 100.0 * 0.01)).abs() < 1e-5);
        assert!((viewport.camera().position().length() - radius).abs() < 1e-3);
        viewport.on_pointer_up();

        viewport.on_pointer_move(400.0, 300.0);
        assert!((viewport.camera().theta - (theta - 1.0)).abs() < 1e-5);
    }

    #[test]
    fn drag_and_orbit_exclude_each_other() {
        let (mut viewport, id) = viewport_with_parcel();

        viewport.on_pointer_down(10.0, 10.0, PointerButton::Secondary);
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        assert_eq!(viewport.selected(), None);
        viewport.on_pointer_up();

        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        assert_eq!(viewport.selected(), Some(id));
        let theta = viewport.camera().theta;
        viewport.on_pointer_down(10.0, 10.0, PointerButton::Secondary);
        assert!(!viewport.camera().is_orbiting());
        viewport.on_pointer_move(20.0, 10.0);
        assert_eq!(viewport.camera().theta, theta);
    }

    #[test]
    fn focus_loss_cancels_drag() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        assert!(matches!(viewport.drag_mode(), DragMode::FreeDrag { .. }));
        viewport.on_focus_lost();
        assert_eq!(viewport.drag_mode(), DragMode::Idle);

        let before = position(&viewport, id);
        viewport.on_pointer_move(700.0, 500.0);
        assert_eq!(position(&viewport, id), before);
    }

    #[test]
    fn wheel_zooms_within_bounds() {
        let mut viewport = viewport();
        let radius = viewport.camera().radius;
        viewport.on_wheel(100.0);
        assert!((viewport.camera().radius - radius * 1.1).abs() < 1e-4);
        viewport.on_wheel(0.0);
        assert!((viewport.camera().radius - radius * 1.1).abs() < 1e-4);
        for _ in 0..100 {
            viewport.on_wheel(-100.0);
        }
        assert_eq!(viewport.camera().radius, viewport.config().min_radius);
    }

    #[test]
    fn zero_sized_viewport_ignores_picks() {
        let (mut viewport, _) = viewport_with_parcel();
        viewport.resize(0, 0);
        viewport.on_pointer_down(0.0, 0.0, PointerButton::Primary);
        assert_eq!(viewport.selected(), None);
        assert!(viewport.take_events().is_empty());

        viewport.resize(1024, 512);
        assert_eq!(viewport.camera().aspect, 2.0);
        assert_eq!(viewport.backend().surface_size(), (1024, 512));
    }

    #[test]
    fn deleting_selected_parcel_releases_everything() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.take_events();

        viewport.delete_parcel(id).unwrap();
        assert_eq!(viewport.selected(), None);
        assert_coupled(&viewport);
        assert_eq!(viewport.drag_mode(), DragMode::Idle);
        assert_eq!(viewport.backend().live_count(), 1);
        assert!(viewport.scene().parcels().is_empty());
        assert_eq!(
            viewport.take_events(),
            vec![ViewportEvent::SelectionChanged(None)]
        );
        assert!(matches!(
            viewport.delete_parcel(id),
            Err(ViewportError::Scene(SceneError::UnknownObject(_)))
        ));
    }

    #[test]
    fn shrinking_container_reclamps_parcels() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.on_pointer_up();
        viewport.take_events();

        viewport
            .resize_container(BoxExtent::new(4.0, 6.0, 4.0).unwrap())
            .unwrap();
        assert_eq!(position(&viewport, id), Vec3::new(1.0, 1.0, -1.0));
        assert_eq!(viewport.gumball().unwrap().origin(), Vec3::new(1.0, 1.0, -1.0));
        assert_eq!(
            viewport.take_events(),
            vec![ViewportEvent::ParcelMoved {
                id,
                position: Vec3::new(1.0, 1.0, -1.0)
            }]
        );
        assert_eq!(viewport.backend().live_count(), 2 + 7);
        let container = viewport.scene().container().unwrap();
        assert_eq!(container.extent.width(), 4.0);
    }

    #[test]
    fn resizing_parcel_rebuilds_drawable_and_reclamps() {
        let (mut viewport, id) = viewport_with_parcel();
        let old_handle = viewport.scene().parcel(id).unwrap().render_handle.unwrap();

        viewport
            .resize_parcel(id, BoxExtent::new(4.0, 4.0, 4.0).unwrap())
            .unwrap();
        let parcel = viewport.scene().parcel(id).unwrap();
        let new_handle = parcel.render_handle.unwrap();
        assert_ne!(new_handle, old_handle);
        assert!(!viewport.backend().is_live(old_handle));
        assert_eq!(parcel.position, Vec3::new(2.0, 2.0, -2.0));
        assert_eq!(viewport.backend().live_count(), 2);
        assert_eq!(
            viewport.take_events(),
            vec![ViewportEvent::ParcelMoved {
                id,
                position: Vec3::new(2.0, 2.0, -2.0)
            }]
        );
    }

    #[test]
    fn recolouring_selected_parcel_keeps_highlight() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.on_pointer_up();

        viewport.set_parcel_color(id, [1.0, 0.5, 0.0]).unwrap();
        let handle = viewport.scene().parcel(id).unwrap().render_handle.unwrap();
        let record = viewport.backend().get(handle).unwrap();
        assert_eq!(record.desc.color, [1.0, 0.5, 0.0]);
        assert_eq!(record.emissive, viewport.config().highlight_emissive);

        viewport.on_pointer_down(5.0, 5.0, PointerButton::Primary);
        let record = viewport.backend().get(handle).unwrap();
        assert_eq!(record.emissive, [0.0; 3]);
    }

    #[test]
    fn typed_position_is_clamped_and_reported() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.on_pointer_up();
        viewport.take_events();

        viewport
            .set_parcel_position(id, Vec3::new(9.0, -3.0, 1.25))
            .unwrap();
        assert_eq!(position(&viewport, id), Vec3::new(4.0, 1.0, 1.25));
        assert_eq!(viewport.gumball().unwrap().origin(), Vec3::new(4.0, 1.0, 1.25));
        let handle = viewport.scene().parcel(id).unwrap().render_handle.unwrap();
        assert_eq!(
            viewport.backend().get(handle).unwrap().transform.w_axis.truncate(),
            Vec3::new(4.0, 1.0, 1.25)
        );
        assert_eq!(
            viewport.take_events(),
            vec![ViewportEvent::ParcelMoved {
                id,
                position: Vec3::new(4.0, 1.0, 1.3)
            }]
        );

        // Clamps back onto the current position: nothing to report.
        viewport
            .set_parcel_position(id, Vec3::new(40.0, 1.0, 1.25))
            .unwrap();
        assert!(viewport.take_events().is_empty());
    }

    #[test]
    fn typed_position_rejects_bad_input() {
        let (mut viewport, id) = viewport_with_parcel();
        let before = position(&viewport, id);
        assert!(matches!(
            viewport.set_parcel_position(id, Vec3::new(f32::NAN, 1.0, 0.0)),
            Err(ViewportError::Scene(SceneError::NonFinitePosition(_)))
        ));
        assert!(matches!(
            viewport.set_parcel_position(ObjectId(999), Vec3::ZERO),
            Err(ViewportError::Scene(SceneError::UnknownObject(_)))
        ));
        assert_eq!(position(&viewport, id), before);
        assert!(viewport.take_events().is_empty());
    }

    #[test]
    fn renames_parcel_and_container() {
        let (mut viewport, id) = viewport_with_parcel();
        viewport.rename_parcel(id, "Pallet A").unwrap();
        viewport.rename_container("40ft HC").unwrap();
        assert_eq!(viewport.scene().parcel(id).unwrap().name, "Pallet A");
        assert_eq!(viewport.scene().container().unwrap().name, "40ft HC");
        assert!(matches!(
            viewport.rename_parcel(ObjectId(999), "ghost"),
            Err(ViewportError::Scene(SceneError::UnknownObject(_)))
        ));
    }

    #[test]
    fn failed_gumball_build_leaves_nothing_selected() {
        let (mut viewport, id) = viewport_with_parcel();
        let handle = viewport.scene().parcel(id).unwrap().render_handle.unwrap();
        // Shaft and head for X, then the Y shaft fails.
        viewport.backend_mut().fail_creates_after(3);

        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        assert_eq!(viewport.selected(), None);
        assert!(viewport.gumball().is_none());
        assert_eq!(viewport.drag_mode(), DragMode::Idle);
        assert_eq!(viewport.backend().live_count(), 2);
        assert_eq!(viewport.backend().get(handle).unwrap().emissive, [0.0; 3]);
        assert!(viewport.take_events().is_empty());
    }

    #[test]
    fn failed_gumball_build_clears_previous_selection() {
        let (mut viewport, first) = viewport_with_parcel();
        let second = viewport
            .add_parcel(ParcelSpec {
                position: Vec3::new(-2.0, 1.0, 2.0),
                ..ParcelSpec::default()
            })
            .unwrap();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.on_pointer_up();
        assert_eq!(viewport.selected(), Some(first));
        viewport.take_events();

        viewport.backend_mut().fail_creates_after(0);
        click(&mut viewport, Vec3::new(-2.0, 1.0, 2.0));
        assert_eq!(viewport.selected(), None);
        assert_coupled(&viewport);
        assert_eq!(viewport.drag_mode(), DragMode::Idle);
        assert_eq!(viewport.backend().live_count(), 3);
        for id in [first, second] {
            let handle = viewport.scene().parcel(id).unwrap().render_handle.unwrap();
            assert_eq!(viewport.backend().get(handle).unwrap().emissive, [0.0; 3]);
        }
        assert_eq!(
            viewport.take_events(),
            vec![ViewportEvent::SelectionChanged(None)]
        );

        viewport.backend_mut().clear_create_failures();
        click(&mut viewport, Vec3::new(-2.0, 1.0, 2.0));
        assert_eq!(viewport.selected(), Some(second));
        assert_coupled(&viewport);
    }

    #[test]
    fn failed_rebuild_leaves_parcel_untouched() {
        let (mut viewport, id) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        viewport.on_pointer_up();
        viewport.take_events();
        let before = viewport.scene().parcel(id).unwrap().clone();
        let live = viewport.backend().live_count();

        viewport.backend_mut().fail_creates_after(0);
        assert!(viewport
            .resize_parcel(id, BoxExtent::new(4.0, 4.0, 4.0).unwrap())
            .is_err());
        assert!(viewport.set_parcel_color(id, [1.0, 0.0, 0.0]).is_err());
        assert!(viewport
            .resize_container(BoxExtent::new(4.0, 6.0, 4.0).unwrap())
            .is_err());

        assert_eq!(viewport.scene().parcel(id).unwrap(), &before);
        assert_eq!(viewport.scene().container().unwrap().extent.width(), 10.0);
        assert_eq!(viewport.backend().live_count(), live);
        let handle = before.render_handle.unwrap();
        assert_eq!(
            viewport.backend().get(handle).unwrap().emissive,
            viewport.config().highlight_emissive
        );
        assert_eq!(viewport.selected(), Some(id));
        assert!(viewport.take_events().is_empty());
    }

    #[test]
    fn teardown_releases_all_drawables_once() {
        let (mut viewport, _) = viewport_with_parcel();
        click(&mut viewport, Vec3::new(2.0, 1.0, -2.0));
        assert_eq!(viewport.backend().live_count(), 2 + 7);

        viewport.teardown();
        assert!(viewport.is_torn_down());
        assert_eq!(viewport.backend().live_count(), 0);
        assert_eq!(viewport.drag_mode(), DragMode::Idle);
        let released = viewport.backend().released_count();

        viewport.teardown();
        assert_eq!(viewport.backend().released_count(), released);

        viewport.on_pointer_down(400.0, 300.0, PointerButton::Primary);
        assert_eq!(viewport.backend().live_count(), 0);
        assert!(matches!(
            viewport.add_parcel(ParcelSpec::default()),
            Err(ViewportError::TornDown)
        ));
    }
}
