//! Navigation mesh loading and path queries.

pub mod gateway;
pub mod mesh;

pub use gateway::NavigationGateway;
pub use mesh::NavMesh;
