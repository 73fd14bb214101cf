use crate::config::ViewportConfig;
use crate::geometry::Ray;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Perspective camera orbiting a fixed target, stored in spherical form.
///
/// `phi` is the polar angle measured from +Y and `theta` the azimuth around
/// +Y measured from +Z, so `theta = 0, phi = PI/2` looks down -Z.
#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
    pub target: Vec3,
    pub aspect: f32,
    fov_y: f32,
    near: f32,
    far: f32,
    sensitivity: f32,
    polar_margin: f32,
    zoom_in_factor: f32,
    zoom_out_factor: f32,
    min_radius: f32,
    max_radius: f32,
    orbit_anchor: Option<Vec2>,
}

impl CameraController {
    pub fn new(config: &ViewportConfig, aspect: f32) -> Self {
        let mut camera = Self {
            radius: 1.0,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,
            target: Vec3::ZERO,
            aspect: sanitize_aspect(aspect),
            fov_y: config.fov_y_deg.to_radians(),
            near: config.near,
            far: config.far,
            sensitivity: config.orbit_sensitivity,
            polar_margin: config.polar_margin,
            zoom_in_factor: config.zoom_in_factor,
            zoom_out_factor: config.zoom_out_factor,
            min_radius: config.min_radius,
            max_radius: config.max_radius,
            orbit_anchor: None,
        };
        camera.set_position(Vec3::from_array(config.initial_eye));
        camera
    }

    /// Re-derives the spherical state from a world-space eye position.
    pub fn set_position(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON || !radius.is_finite() {
            return;
        }
        self.radius = radius.clamp(self.min_radius, self.max_radius);
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        self.clamp_phi();
    }

    pub fn position(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.target
            + Vec3::new(
                self.radius * sin_phi * sin_theta,
                self.radius * cos_phi,
                self.radius * sin_phi * cos_theta,
            )
    }

    /// Unit vector from the eye towards the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = sanitize_aspect(width as f32 / height as f32);
    }

    /// World-space ray from the eye through a normalized device coordinate
    /// (`[-1, 1]` on both axes, +Y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        let inv = (self.projection_matrix() * self.view_matrix()).inverse();
        let far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        if far.w.abs() <= f32::EPSILON {
            return None;
        }
        let eye = self.position();
        Ray::new(eye, far.truncate() / far.w - eye)
    }

    /// Maps a world point to normalized device coordinates.
    pub fn project(&self, world: Vec3) -> Vec3 {
        let clip = self.projection_matrix() * self.view_matrix() * world.extend(1.0);
        clip.truncate() / clip.w
    }

    pub fn begin_orbit(&mut self, screen: Vec2) {
        self.orbit_anchor = Some(screen);
    }

    pub fn is_orbiting(&self) -> bool {
        self.orbit_anchor.is_some()
    }

    /// Applies pointer travel since the last sample. Returns `false` when no
    /// orbit is in progress.
    pub fn orbit_to(&mut self, screen: Vec2) -> bool {
        let Some(last) = self.orbit_anchor else {
            return false;
        };
        let delta = screen - last;
        self.orbit_by(delta.x, delta.y);
        self.orbit_anchor = Some(screen);
        true
    }

    pub fn orbit_by(&mut self, delta_x: f32, delta_y: f32) {
        if !(delta_x.is_finite() && delta_y.is_finite()) {
            return;
        }
        self.theta -= delta_x * self.sensitivity;
        self.phi -= delta_y * self.sensitivity;
        self.clamp_phi();
    }

    pub fn end_orbit(&mut self) {
        self.orbit_anchor = None;
    }

    /// Scales the orbit radius by one wheel notch. Positive `delta_y` zooms
    /// out.
    pub fn zoom(&mut self, delta_y: f32) {
        let factor = if delta_y > 0.0 {
            self.zoom_out_factor
        } else if delta_y < 0.0 {
            self.zoom_in_factor
        } else {
            return;
        };
        self.radius = (self.radius * factor).clamp(self.min_radius, self.max_radius);
    }

    pub fn polar_bounds(&self) -> (f32, f32) {
        (self.polar_margin, std::f32::consts::PI - self.polar_margin)
    }

    fn clamp_phi(&mut self) {
        let (min, max) = self.polar_bounds();
        self.phi = self.phi.clamp(min, max);
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}
