//! Viewport configuration.
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! produces the stock scene: 75° camera at (0, 2, 5), sky-blue background,
//! 20×20 grid and a length-5 axis indicator.

use serde::{Deserialize, Serialize};

use crate::asset::AssetSource;
use crate::controls::OrbitConfig;
use crate::error::ConfigError;

/// Which scene to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneVariant {
    /// A single wireframe cube
    #[default]
    Cube,
    /// Wireframe cube plus an imported model
    Model,
    /// Cube, imported model and scattered clones of the model
    Forest,
}

impl SceneVariant {
    pub fn needs_model(self) -> bool {
        !matches!(self, SceneVariant::Cube)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: u32,
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 100.0],
            color: 0xffffff,
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub props: u32,
    pub seed: u64,
    pub scale: f32,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            props: 12,
            seed: 7,
            scale: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub variant: SceneVariant,
    pub model: Option<AssetSource>,
    pub cube_size: f32,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub axes_length: f32,
    pub light: LightConfig,
    pub forest: ForestConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            variant: SceneVariant::Cube,
            model: None,
            cube_size: 3.0,
            grid_size: 20.0,
            grid_divisions: 20,
            axes_length: 5.0,
            light: LightConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: [f32; 3],
    pub clear_color: u32,
    /// Overrides the host's device pixel ratio
    pub pixel_ratio: Option<f64>,
    pub controls: OrbitConfig,
    pub scene: SceneConfig,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_position: [0.0, 2.0, 5.0],
            clear_color: 0x87ceeb,
            pixel_ratio: None,
            controls: OrbitConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl ViewportConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far, got {} / {}",
                self.near, self.far
            )));
        }
        if let Some(ratio) = self.pixel_ratio {
            if !(ratio > 0.0) {
                return Err(ConfigError::Invalid(format!("pixel_ratio must be positive, got {ratio}")));
            }
        }
        let damping = self.controls.damping_factor;
        if !(0.0..=1.0).contains(&damping) {
            return Err(ConfigError::Invalid(format!(
                "damping_factor must be in [0, 1], got {damping}"
            )));
        }
        let (min, max) = (self.controls.min_distance, self.controls.max_distance);
        if !(min >= 0.0 && max >= min) {
            return Err(ConfigError::Invalid(format!(
                "orbit distances must satisfy 0 <= min_distance <= max_distance, got {min} / {max}"
            )));
        }
        if self.scene.variant.needs_model() && self.scene.model.is_none() {
            return Err(ConfigError::Invalid(format!(
                "scene variant {:?} needs a model source",
                self.scene.variant
            )));
        }
        Ok(())
    }
}
