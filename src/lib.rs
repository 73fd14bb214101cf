//! Interaction core for arranging box-shaped parcels inside a container in
//! a 3D viewport: picking, a move gumball, a drag state machine with
//! containment clamping, and an orbit camera.

pub mod app;
pub mod config;
pub mod geometry;
pub mod render;
pub mod scene;

pub use app::{Viewport, ViewportError, ViewportEvent};
