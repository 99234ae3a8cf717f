use thiserror::Error;

/// Main error type for the luma-grain library
#[derive(Error, Debug)]
pub enum GrainError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Grainer error: {0}")]
    Grainer(#[from] GrainerError),

    #[error("Config file error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Band parameters or derived geometry that can never be processed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Band parameter lists must have the same length: thresholds={thresholds}, strengths={strengths}, sizes={sizes}, sharps={sharps}")]
    LengthMismatch {
        thresholds: usize,
        strengths: usize,
        sizes: usize,
        sharps: usize,
    },

    #[error("At least one band is required")]
    NoBands,

    #[error("Empty list given for per-band parameter: {parameter}")]
    EmptyParameterList { parameter: String },

    #[error("Invalid band parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    #[error("Unsupported chroma subsampling: ({subsampling_w}, {subsampling_h})")]
    UnsupportedSubsampling { subsampling_w: u32, subsampling_h: u32 },

    #[error("Grain layer dimensions collapse to zero: {width}x{height} at size {size}")]
    ZeroSizedLayer { width: u32, height: u32, size: f32 },
}

/// Frame formats the pipeline refuses to touch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Variable format not allowed")]
    VariableFormat,

    #[error("Unsupported color family: {family}; only YUV and GRAY are supported")]
    UnsupportedColorFamily { family: String },

    #[error("Frame dimensions {width}x{height} are not compatible with subsampling ({subsampling_w}, {subsampling_h})")]
    IncompatibleDimensions {
        width: u32,
        height: u32,
        subsampling_w: u32,
        subsampling_h: u32,
    },

    #[error("Plane geometry mismatch: expected {expected}, got {actual}")]
    GeometryMismatch { expected: String, actual: String },

    #[error("Unsupported bit depth: {bits}")]
    UnsupportedBitDepth { bits: u32 },
}

/// Grain algorithm errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrainerError {
    #[error("Grainer not found: {name}")]
    NotFound { name: String },

    #[error("Invalid grainer parameter: {name}.{key} = {value}")]
    InvalidParameter {
        name: String,
        key: String,
        value: String,
    },

    #[error("Grainer {name} returned a frame with a different geometry")]
    GeometryChanged { name: String },
}

/// Configuration-file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using GrainError
pub type Result<T> = std::result::Result<T, GrainError>;

impl GrainError {
    /// Check if this error is recoverable (can be retried)
    ///
    /// Frame processing is pure; only reading or writing files can succeed on a retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(ConfigurationError::LengthMismatch { .. }) => {
                "Every band needs a threshold, a strength, a size and a sharpness value.".to_string()
            }
            Self::Format(FormatError::UnsupportedColorFamily { family }) => {
                format!("Frames in {} are not supported. Convert to YUV or GRAY first.", family)
            }
            Self::Grainer(GrainerError::NotFound { name }) => {
                format!("Grainer '{}' not found. Available grainers: add, placebo, f3kdb", name)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
