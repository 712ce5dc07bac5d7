//! Error types for the viewport and its collaborators

use thiserror::Error;

use crate::viewport::Phase;

/// Failure to load or decode an imported model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("failed to fetch asset {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("file too small to be a valid STL ({0} bytes)")]
    TooSmall(usize),

    #[error("unexpected end of STL data: expected {expected} facets, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),

    #[error("asset {0} contains no triangles")]
    Empty(String),
}

/// Invalid viewport configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

/// Failure reported by a host while scheduling or listening
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("host error: {0}")]
pub struct HostError(pub String);

/// Failure reported by a render surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("surface error: {0}")]
pub struct SurfaceError(pub String);

/// Lifecycle and frame errors raised by the viewport controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    #[error("cannot {operation} while viewport is {phase:?}")]
    InvalidPhase { operation: &'static str, phase: Phase },

    #[error("scene not ready: {0}")]
    SceneNotReady(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

pub type Result<T> = std::result::Result<T, ViewportError>;
