//! Gyroview Core Library - Host-agnostic viewport lifecycle and scene logic
//!
//! This library owns everything that does not depend on where the viewport is
//! displayed: the scene and its animation, camera and orbit controls,
//! projection of the scene into drawable frames, STL model loading, and the
//! viewport controller that drives the frame/resize lifecycle through the
//! traits in [`host`].

pub mod asset;
pub mod config;
pub mod controls;
pub mod error;
pub mod frame_loop;
pub mod geometry;
pub mod host;
pub mod projection;
pub mod render;
pub mod scene;
pub mod status;
pub mod stl;
pub mod transform;
pub mod viewport;

// Re-export commonly used types
pub use asset::{AssetSource, AssetState};
pub use config::{SceneVariant, ViewportConfig};
pub use controls::{OrbitConfig, OrbitControls};
pub use error::{AssetError, ConfigError, HostError, SurfaceError, ViewportError};
pub use geometry::{Mesh, Rgb, Triangle, Vertex};
pub use host::{Container, FrameHost, RenderSurface};
pub use projection::{Camera, ScreenPoint};
pub use render::{Frame, Primitive};
pub use scene::Scene;
pub use transform::{OrientationSample, RotationState, Transform};
pub use viewport::{FrameOutcome, Phase, ViewportController, ViewportSize};
