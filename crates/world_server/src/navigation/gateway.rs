//! Pathfinding gateway.
//!
//! Callers speak client coordinates, where `y` is height and `z` is depth.
//! The mesh uses `z` for height, so the two axes are swapped on the way in
//! and swapped back on the way out.

use super::NavMesh;
use crate::error::NavigationError;
use crate::messaging::NavV3;
use glam::Vec3;
use std::path::Path;
use tracing::{info, warn};

/// Read-only path query service.
///
/// Either holds a loaded mesh or is disabled; a disabled gateway answers
/// every query with [`NavigationError::Unavailable`]. The mesh is never
/// mutated after construction, so concurrent queries need no locking.
#[derive(Debug, Clone, Default)]
pub struct NavigationGateway {
    mesh: Option<NavMesh>,
}

impl NavigationGateway {
    /// Loads the mesh at `path`, or disables navigation if that fails.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match NavMesh::load(path) {
            Ok(mesh) => {
                info!(
                    "🧭 Navigation mesh loaded from {} ({} triangles)",
                    path.display(),
                    mesh.triangle_count()
                );
                Self::from_mesh(mesh)
            }
            Err(e) => {
                warn!(
                    "⚠️ Navigation disabled, could not load {}: {}",
                    path.display(),
                    e
                );
                Self::disabled()
            }
        }
    }

    /// Wraps an already built mesh.
    pub fn from_mesh(mesh: NavMesh) -> Self {
        Self { mesh: Some(mesh) }
    }

    /// A gateway without a mesh.
    pub fn disabled() -> Self {
        Self { mesh: None }
    }

    /// Whether a mesh is loaded.
    pub fn is_enabled(&self) -> bool {
        self.mesh.is_some()
    }

    /// Finds a path between two points given in client coordinates.
    pub fn find_path(&self, from: NavV3, to: NavV3) -> Result<Vec<NavV3>, NavigationError> {
        let mesh = self.mesh.as_ref().ok_or(NavigationError::Unavailable)?;
        let path = mesh.find_path(to_mesh_axes(from), to_mesh_axes(to))?;
        Ok(path.into_iter().map(to_client_axes).collect())
    }
}

fn to_mesh_axes(p: NavV3) -> Vec3 {
    Vec3::new(p.x, p.z, p.y)
}

fn to_client_axes(v: Vec3) -> NavV3 {
    NavV3 {
        x: v.x,
        y: v.z,
        z: v.y,
    }
}
