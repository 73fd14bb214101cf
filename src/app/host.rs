//! Desktop host: opens a window and feeds its input to a [`Viewport`] over
//! the headless backend, logging every notification the viewport emits.
//!
//! `N` adds a parcel, `Delete` removes the selected one and `=`/`-` widen or
//! narrow it.

use super::input::{wheel_delta_y, PointerButton};
use super::{Viewport, ViewportError, ViewportEvent};
use crate::config::ViewportConfig;
use crate::geometry::BoxExtent;
use crate::render::HeadlessBackend;
use crate::scene::ParcelSpec;

use glam::Vec2;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const CONTAINER_NAME: &str = "MainContainer";

pub struct ViewportHost {
    window: Option<Arc<Window>>,
    config: ViewportConfig,
    viewport: Option<Viewport<HeadlessBackend>>,
    cursor: Option<Vec2>,
}

impl ViewportHost {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            window: None,
            config,
            viewport: None,
            cursor: None,
        }
    }

    fn init_viewport(&mut self, size: PhysicalSize<u32>) {
        let container = match BoxExtent::new(10.0, 6.0, 10.0) {
            Ok(extent) => extent,
            Err(err) => {
                log::warn!("Bad default container: {}", err);
                return;
            }
        };
        let backend = HeadlessBackend::new(size.width, size.height);
        match Viewport::initialize(backend, CONTAINER_NAME, container, self.config.clone()) {
            Ok(mut viewport) => {
                if let Err(err) = viewport.add_parcel(ParcelSpec::default()) {
                    log::warn!("Failed to add starter parcel: {}", err);
                }
                self.viewport = Some(viewport);
            }
            Err(err) => log::warn!("Failed to initialize viewport: {}", err),
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let Some(viewport) = &mut self.viewport else {
            return;
        };
        match code {
            KeyCode::KeyN => {
                if let Err(err) = viewport.add_parcel(ParcelSpec::default()) {
                    log::warn!("Failed to add parcel: {}", err);
                }
            }
            KeyCode::Delete | KeyCode::Backspace => {
                if let Some(id) = viewport.selected() {
                    if let Err(err) = viewport.delete_parcel(id) {
                        log::warn!("Failed to delete parcel: {}", err);
                    }
                }
            }
            KeyCode::Equal | KeyCode::Minus => {
                let step = if code == KeyCode::Equal { 0.5 } else { -0.5 };
                if let Err(err) = grow_selected(viewport, step) {
                    log::warn!("Failed to resize parcel: {}", err);
                }
            }
            _ => {}
        }
    }

    fn drain_events(&mut self) {
        let Some(viewport) = &mut self.viewport else {
            return;
        };
        for event in viewport.take_events() {
            match event {
                ViewportEvent::SelectionChanged(Some(id)) => log::info!("Selected {:?}", id),
                ViewportEvent::SelectionChanged(None) => log::info!("Selection cleared"),
                ViewportEvent::ParcelMoved { id, position } => {
                    log::info!(
                        "{:?} moved to ({:.1}, {:.1}, {:.1})",
                        id,
                        position.x,
                        position.y,
                        position.z
                    );
                }
            }
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(viewport) = &mut self.viewport {
            viewport.teardown();
        }
        event_loop.exit();
    }
}

/// Widens the selected parcel by `step`.
fn grow_selected(
    viewport: &mut Viewport<HeadlessBackend>,
    step: f32,
) -> Result<(), ViewportError> {
    let Some(id) = viewport.selected() else {
        return Ok(());
    };
    let Some(parcel) = viewport.scene().parcel(id) else {
        return Ok(());
    };
    let extent = parcel
        .extent
        .resized(Some(parcel.extent.width() + step), None, None)?;
    viewport.resize_parcel(id, extent)
}

impl ApplicationHandler for ViewportHost {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title("Parcel Viewport")
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        self.init_viewport(window.inner_size());
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown(event_loop);
                return;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => {
                        self.shutdown(event_loop);
                        return;
                    }
                    PhysicalKey::Code(code) => self.handle_key(code),
                    _ => {}
                }
            }
            WindowEvent::Focused(false) => {
                self.cursor = None;
                if let Some(viewport) = &mut self.viewport {
                    viewport.on_focus_lost();
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(viewport) = &mut self.viewport {
                    viewport.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                self.cursor = Some(cursor);
                if let Some(viewport) = &mut self.viewport {
                    viewport.on_pointer_move(cursor.x, cursor.y);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(viewport) = &mut self.viewport else {
                    return;
                };
                let button = PointerButton::from_winit(button);
                match state {
                    ElementState::Pressed => {
                        if let Some(cursor) = self.cursor {
                            viewport.on_pointer_down(cursor.x, cursor.y, button);
                        }
                    }
                    ElementState::Released => {
                        if button.ends_gesture() {
                            viewport.on_pointer_up();
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(viewport) = &mut self.viewport {
                    viewport.on_wheel(wheel_delta_y(delta));
                }
            }
            _ => {}
        }
        self.drain_events();
    }
}

pub fn run(config: ViewportConfig) {
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut host = ViewportHost::new(config);
    event_loop.run_app(&mut host).expect("Event loop error");
}
