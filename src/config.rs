use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tuning constants for camera, picking feedback and the gumball.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Radians of orbit per pixel of pointer travel.
    pub orbit_sensitivity: f32,
    /// Keeps the polar angle inside `[margin, PI - margin]`.
    pub polar_margin: f32,
    pub zoom_out_factor: f32,
    pub zoom_in_factor: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub initial_eye: [f32; 3],
    pub highlight_emissive: [f32; 3],
    pub gumball_arrow_length: f32,
    pub gumball_arrow_radius: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let highlight = 0x44 as f32 / 255.0;
        Self {
            orbit_sensitivity: 0.01,
            polar_margin: 0.1,
            zoom_out_factor: 1.1,
            zoom_in_factor: 0.9,
            min_radius: 2.0,
            max_radius: 200.0,
            fov_y_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            initial_eye: [8.0, 8.0, 8.0],
            highlight_emissive: [highlight; 3],
            gumball_arrow_length: 1.5,
            gumball_arrow_radius: 0.05,
        }
    }
}

impl ViewportConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("orbit_sensitivity", self.orbit_sensitivity),
            ("polar_margin", self.polar_margin),
            ("zoom_out_factor", self.zoom_out_factor),
            ("zoom_in_factor", self.zoom_in_factor),
            ("min_radius", self.min_radius),
            ("max_radius", self.max_radius),
            ("fov_y_deg", self.fov_y_deg),
            ("near", self.near),
            ("far", self.far),
            ("gumball_arrow_length", self.gumball_arrow_length),
            ("gumball_arrow_radius", self.gumball_arrow_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if self.polar_margin >= std::f32::consts::FRAC_PI_2 {
            return Err(ConfigError::Invalid(format!(
                "polar_margin must be below PI/2, got {}",
                self.polar_margin
            )));
        }
        if self.zoom_out_factor <= 1.0 || self.zoom_in_factor >= 1.0 {
            return Err(ConfigError::Invalid(
                "zoom_out_factor must exceed 1 and zoom_in_factor must be below 1".to_string(),
            ));
        }
        if self.min_radius > self.max_radius {
            return Err(ConfigError::Invalid(format!(
                "min_radius {} exceeds max_radius {}",
                self.min_radius, self.max_radius
            )));
        }
        if self.near >= self.far || self.fov_y_deg >= 180.0 {
            return Err(ConfigError::Invalid(
                "projection needs near < far and fov_y_deg < 180".to_string(),
            ));
        }
        if !self.initial_eye.iter().all(|v| v.is_finite()) || self.initial_eye == [0.0; 3] {
            return Err(ConfigError::Invalid(
                "initial_eye must be finite and away from the target".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn save_config(config: &ViewportConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<ViewportConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: ViewportConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}
