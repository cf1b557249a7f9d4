//! Run configuration for the headless runner
//!
//! Read from a JSON file; every field falls back to its default when absent.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_TICKS, SIM_DT};
use crate::error::ConfigError;
use crate::presets::ScenePreset;
use crate::sim::{IntegratorKind, SystemConfig};

/// Where the scene comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneSource {
    /// Name of a built-in scene
    Preset(String),
    /// Fully spelled-out system
    Inline(SystemConfig),
}

impl Default for SceneSource {
    fn default() -> Self {
        SceneSource::Preset(ScenePreset::default().as_str().to_string())
    }
}

impl SceneSource {
    pub fn resolve(&self) -> Result<SystemConfig, ConfigError> {
        match self {
            SceneSource::Preset(name) => ScenePreset::from_str(name)
                .map(|preset| preset.config())
                .ok_or_else(|| ConfigError::UnknownPreset(name.clone())),
            SceneSource::Inline(config) => Ok(config.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub scene: SceneSource,
    /// Seconds per tick
    pub timestep: f32,
    pub ticks: u64,
    /// Log stats every this many ticks (0 disables)
    pub log_interval: u64,
    /// Overrides the scene's seed
    pub seed: Option<u64>,
    /// Overrides the scene's integrator
    pub integrator: Option<IntegratorKind>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scene: SceneSource::default(),
            timestep: SIM_DT,
            ticks: DEFAULT_TICKS,
            log_interval: 60,
            seed: None,
            integrator: None,
        }
    }
}

impl RunConfig {
    /// Run a named preset with default settings
    pub fn preset(preset: ScenePreset) -> Self {
        Self {
            scene: SceneSource::Preset(preset.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded run config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Scene configuration with the overrides applied
    pub fn system_config(&self) -> Result<SystemConfig, ConfigError> {
        let mut config = self.scene.resolve()?;
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(integrator) = self.integrator {
            config.integrator = integrator;
        }
        Ok(config)
    }
}
