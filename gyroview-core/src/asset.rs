//! Imported model state.
//!
//! Hosts fetch model bytes however they can (file read, HTTP fetch) and hand
//! the outcome to [`AssetState::from_bytes`] or [`AssetState::failed`]. The
//! scene only draws or animates a model slot once it is `Ready`, and the
//! viewport refuses to start while any slot is still `Pending` or `Failed`.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::geometry::Mesh;
use crate::stl;

/// Where an imported model comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    /// Filesystem path
    Path(String),
    /// URL fetched by the browser host
    Url(String),
}

impl AssetSource {
    pub fn name(&self) -> &str {
        match self {
            AssetSource::Path(path) => path,
            AssetSource::Url(url) => url,
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Load progress of an imported model
#[derive(Debug, Clone)]
pub enum AssetState {
    Pending,
    Ready(Rc<Mesh>),
    Failed(AssetError),
}

impl AssetState {
    /// Decode STL bytes into a ready mesh, or a failure
    pub fn from_bytes(source: &AssetSource, data: &[u8]) -> Self {
        match stl::parse_stl(data) {
            Ok(mesh) if mesh.is_empty() => {
                log::warn!("asset {source} decoded to an empty mesh");
                AssetState::Failed(AssetError::Empty(source.to_string()))
            }
            Ok(mesh) => {
                log::info!("asset {source} loaded, {} triangles", mesh.triangles.len());
                AssetState::Ready(Rc::new(mesh))
            }
            Err(e) => {
                log::error!("asset {source} could not be decoded: {e}");
                AssetState::Failed(e)
            }
        }
    }

    /// The fetch itself failed before any bytes arrived
    pub fn failed(source: &AssetSource, reason: impl fmt::Display) -> Self {
        let error = AssetError::Fetch {
            source_name: source.to_string(),
            reason: reason.to_string(),
        };
        log::error!("{error}");
        AssetState::Failed(error)
    }

    pub fn mesh(&self) -> Option<&Rc<Mesh>> {
        match self {
            AssetState::Ready(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AssetState::Ready(_))
    }

    /// Why the asset cannot be used yet, if it cannot
    pub fn not_ready_reason(&self) -> Option<String> {
        match self {
            AssetState::Pending => Some("model is still loading".to_string()),
            AssetState::Ready(_) => None,
            AssetState::Failed(e) => Some(e.to_string()),
        }
    }
}
