use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bvh::split::SplitStrategy;
use crate::error::ConfigError;

// rejection sampling compares every candidate against all placed spheres
const MAX_SCENE_SPHERES: usize = 1_000_000;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneConfig {
    #[default]
    BookCover,
    // `count` non-overlapping spheres inside the cube `[-extent, extent]^3`.
    RandomSpheres {
        count: usize,
        radius: f32,
        extent: f32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub strategies: Vec<SplitStrategy>,
    pub scene: SceneConfig,
    // random rays traced per strategy
    pub rays: usize,
    // 0 picks the available parallelism
    pub workers: usize,
    pub seed: u64,
    pub t_min: f32,
}

impl Default for TraceConfig {
    fn default() -> TraceConfig {
        TraceConfig {
            strategies: SplitStrategy::ALL.to_vec(),
            scene: SceneConfig::default(),
            rays: 100_000,
            workers: 0,
            seed: 0,
            t_min: 0.001,
        }
    }
}

impl TraceConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<TraceConfig, ConfigError> {
        let contents = fs::read_to_string(path)?;
        TraceConfig::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<TraceConfig, ConfigError> {
        let config: TraceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid("no split strategies given".to_string()));
        }
        if self.rays == 0 {
            return Err(ConfigError::Invalid("rays must be positive".to_string()));
        }
        if !(self.t_min >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "t_min must be non-negative, got {}",
                self.t_min
            )));
        }
        if let SceneConfig::RandomSpheres {
            count,
            radius,
            extent,
        } = self.scene
        {
            if count == 0 {
                return Err(ConfigError::Invalid("scene has no spheres".to_string()));
            }
            if count > MAX_SCENE_SPHERES {
                return Err(ConfigError::Invalid(format!(
                    "scene asks for {count} spheres, at most {MAX_SCENE_SPHERES} are supported"
                )));
            }
            if !(radius > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "sphere radius must be positive, got {radius}"
                )));
            }
            if !(extent > radius) {
                return Err(ConfigError::Invalid(format!(
                    "scene extent {extent} cannot hold spheres of radius {radius}"
                )));
            }
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }
}
