use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{
    error::{GrainerError, Result},
    video::types::Frame,
};

/// Core trait that all grain algorithms must implement
///
/// Algorithm-specific options are captured when the grainer is built; the
/// per-call contract is only the target frame and a strength pair.
pub trait Grainer: Send + Sync + fmt::Debug {
    /// Returns the unique name of this grainer
    fn name(&self) -> &str;

    /// Returns a human-readable description of this grainer
    fn description(&self) -> &str;

    /// Produce a noised copy of `frame`
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to add noise to; it is not modified
    /// * `strength` - Luma and chroma noise amplitude
    ///
    /// # Returns
    ///
    /// A frame with the same format and geometry as `frame`.
    fn grain(&self, frame: &Frame, strength: Strength) -> Result<Frame>;

    /// Get grainer-specific metadata
    fn metadata(&self) -> GrainerMetadata {
        GrainerMetadata::default()
    }
}

/// Noise amplitude for the luma plane and the chroma planes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Strength {
    pub luma: f32,
    pub chroma: f32,
}

impl Strength {
    pub fn new(luma: f32, chroma: f32) -> Self {
        Self { luma, chroma }
    }

    /// Strength that applies to `plane` (0 = luma)
    pub fn for_plane(&self, plane: usize) -> f32 {
        if plane == 0 {
            self.luma
        } else {
            self.chroma
        }
    }
}

impl From<(f32, f32)> for Strength {
    fn from((luma, chroma): (f32, f32)) -> Self {
        Self { luma, chroma }
    }
}

/// Configuration used to build a grainer through the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrainerConfig {
    /// Registered grainer name
    pub name: String,

    /// Grainer-specific parameters
    #[serde(default)]
    pub parameters: HashMap<String, ConfigValue>,
}

impl Default for GrainerConfig {
    fn default() -> Self {
        Self::named("add")
    }
}

impl GrainerConfig {
    /// Create an empty config for the named grainer
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            parameters: HashMap::new(),
        }
    }

    /// Set a parameter value
    pub fn set<K: Into<String>, V: Into<ConfigValue>>(mut self, key: K, value: V) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Get a parameter value as an integer
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.parameters.get(key).and_then(|v| v.as_i64())
    }

    /// Get a parameter value as a boolean
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.parameters.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        self.get_i64(key).unwrap_or(default)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Reject parameters the grainer does not know about
    pub fn check_keys(&self, known: &[&str]) -> Result<()> {
        for (key, value) in &self.parameters {
            if !known.contains(&key.as_str()) {
                return Err(GrainerError::InvalidParameter {
                    name: self.name.clone(),
                    key: key.clone(),
                    value: format!("{:?}", value),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Flexible configuration value that can hold different types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f32),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            ConfigValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }
}

impl From<f32> for ConfigValue {
    fn from(value: f32) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(value as i64)
    }
}

/// Metadata about a grainer's parameters and characteristics
#[derive(Debug, Clone, Default)]
pub struct GrainerMetadata {
    /// Estimated performance impact (0.0 = minimal, 1.0 = heavy)
    pub performance_impact: f32,

    /// Whether repeated calls with the same input give the same output
    pub deterministic: bool,

    /// List of optional parameters with descriptions
    pub optional_parameters: Vec<(String, String)>,
}
