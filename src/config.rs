use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    grain::{Grainer, GrainerConfig, GrainerRegistry, Strength},
    graigasm::{band::default_overflow, Graigasm, PerBand},
};

/// Main configuration for luma-grain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Processing settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Grainer used by bands that do not name their own
    #[serde(default)]
    pub grainer: GrainerConfig,

    /// Bands, in processing order
    pub bands: Vec<BandConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let band = |threshold: f32, luma: f32, size: f32, sharp: f32| BandConfig {
            threshold,
            strength: [luma, 0.0],
            size,
            sharp,
            overflow: None,
            grainer: None,
        };
        Self {
            processing: ProcessingConfig::default(),
            grainer: GrainerConfig::default(),
            bands: vec![
                band(32.0, 0.6, 1.25, 80.0),
                band(80.0, 0.45, 1.2, 70.0),
                band(128.0, 0.3, 1.15, 60.0),
                band(176.0, 0.0, 1.0, 50.0),
            ],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.processing.validate()?;

        if self.bands.is_empty() {
            return Err(ConfigError::MissingKey {
                key: "bands".to_string(),
            }
            .into());
        }
        for (i, band) in self.bands.iter().enumerate() {
            band.validate(i)?;
        }
        Ok(())
    }

    /// Build the band processor, resolving grainers through `registry`
    pub fn build_graigasm(&self, registry: &GrainerRegistry) -> Result<Graigasm> {
        self.validate()?;

        let default_grainer = registry.create(&self.grainer)?;
        let grainers = self
            .bands
            .iter()
            .map(|band| match &band.grainer {
                Some(config) => registry.create(config),
                None => Ok(Arc::clone(&default_grainer)),
            })
            .collect::<Result<Vec<Arc<dyn Grainer>>>>()?;

        Graigasm::new(
            self.bands.iter().map(|b| b.threshold).collect(),
            self.bands.iter().map(|b| Strength::new(b.strength[0], b.strength[1])).collect(),
            self.bands.iter().map(|b| b.size).collect(),
            self.bands.iter().map(|b| b.sharp).collect(),
            self.overflows(),
            PerBand::Each(grainers),
        )
    }

    /// Overflows with missing entries carried forward from the previous band
    fn overflows(&self) -> PerBand<f32> {
        if self.bands.iter().all(|b| b.overflow.is_none()) {
            return PerBand::Unset;
        }
        let mut carry = default_overflow(self.bands.len());
        PerBand::each(self.bands.iter().map(|b| {
            if let Some(overflow) = b.overflow {
                carry = overflow;
            }
            carry
        }))
    }
}

/// Processing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of worker threads for per-band work
    pub threads: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
        }
    }
}

impl ProcessingConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "processing.threads".to_string(),
                value: self.threads.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// One band as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    pub threshold: f32,

    /// `[luma, chroma]`
    pub strength: [f32; 2],

    pub size: f32,

    pub sharp: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overflow: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grainer: Option<GrainerConfig>,
}

impl BandConfig {
    fn validate(&self, index: usize) -> Result<()> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: format!("bands[{}].size", index),
                value: self.size.to_string(),
            }
            .into());
        }

        if !self.sharp.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: format!("bands[{}].sharp", index),
                value: self.sharp.to_string(),
            }
            .into());
        }

        if let Some(overflow) = self.overflow {
            if !overflow.is_finite() || overflow < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("bands[{}].overflow", index),
                    value: overflow.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}
