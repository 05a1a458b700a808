// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the rule engine.

use std::fmt;

/// Result type alias for rule engine operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Main error type for the rule engine.
#[derive(Debug)]
pub enum RuleError {
    /// A rule's required joints are absent from a frame.
    MissingJointData(String),
    /// The torso baseline could not be computed, so the frame is unusable.
    CannotClassifyFrame(String),
    /// Angle or distance requested on coincident points.
    DegenerateGeometry(String),
    /// No catalog entry exists for the requested activity.
    UnknownActivity(String),
    /// Two catalog entries share the same normalized activity name.
    DuplicateActivity(String),
    /// A catalog entry has an empty activity name.
    EmptyActivityName,
    /// A label outside the vocabulary of its landmark.
    InvalidLabel(String),
    /// An external pose or equipment detector failed.
    DetectorError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// Malformed catalog input.
    CatalogError(String),
    /// Malformed or unreadable track input.
    SourceError(String),
    /// JSON (de)serialization error.
    JsonError(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingJointData(msg) => write!(f, "Missing joint data: {msg}"),
            Self::CannotClassifyFrame(msg) => write!(f, "Cannot classify frame: {msg}"),
            Self::DegenerateGeometry(msg) => write!(f, "Degenerate geometry: {msg}"),
            Self::UnknownActivity(name) => write!(f, "Unknown activity: '{name}'"),
            Self::DuplicateActivity(name) => write!(f, "Duplicate activity name: '{name}'"),
            Self::EmptyActivityName => write!(f, "Activity name is empty"),
            Self::InvalidLabel(msg) => write!(f, "Invalid label: {msg}"),
            Self::DetectorError(msg) => write!(f, "Detector error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::CatalogError(msg) => write!(f, "Catalog error: {msg}"),
            Self::SourceError(msg) => write!(f, "Source error: {msg}"),
            Self::JsonError(msg) => write!(f, "JSON error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RuleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}
