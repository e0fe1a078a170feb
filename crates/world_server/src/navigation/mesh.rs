//! Triangle navigation mesh and shortest-path index.
//!
//! Coordinates here are the mesh's own: `x`/`y` span the walkable plane and
//! `z` is height. Triangles sharing an edge are neighbors; routes are found
//! with Dijkstra over triangle centroids and smoothed through the midpoints
//! of the crossed edges.

use crate::error::{MeshLoadError, NavigationError};
use glam::{Vec2, Vec3};
use serde::Deserialize;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::path::Path;

const CONTAINMENT_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Deserialize)]
struct MeshDocument {
    vertices: Vec<VertexRecord>,
    triangles: Vec<TriangleRecord>,
}

#[derive(Debug, Deserialize)]
struct VertexRecord {
    #[serde(rename = "X", alias = "x")]
    x: f32,
    #[serde(rename = "Y", alias = "y")]
    y: f32,
    #[serde(rename = "Z", alias = "z")]
    z: f32,
}

#[derive(Debug, Deserialize)]
struct TriangleRecord {
    indices: [usize; 3],
}

/// Edge shared with a neighboring triangle.
#[derive(Debug, Clone, Copy)]
struct Portal {
    neighbor: usize,
    midpoint: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f32,
    triangle: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.cost.total_cmp(&other.cost) {
            Ordering::Equal => self.triangle.cmp(&other.triangle),
            o => o,
        }
    }
}

/// Immutable navigation mesh with a prebuilt adjacency graph.
#[derive(Debug, Clone)]
pub struct NavMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[usize; 3]>,
    centroids: Vec<Vec3>,
    portals: Vec<Vec<Portal>>,
}

impl NavMesh {
    /// Reads and indexes a mesh document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MeshLoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses and indexes a mesh document.
    ///
    /// The document is `{"vertices": [{"X":..,"Y":..,"Z":..}], "triangles":
    /// [{"indices": [a, b, c]}]}`; lowercase vertex keys are accepted too.
    pub fn from_json(text: &str) -> Result<Self, MeshLoadError> {
        let document: MeshDocument = serde_json::from_str(text)?;
        let vertices = document
            .vertices
            .into_iter()
            .map(|v| Vec3::new(v.x, v.y, v.z))
            .collect();
        let triangles = document.triangles.into_iter().map(|t| t.indices).collect();
        Self::new(vertices, triangles)
    }

    /// Validates the triangles and builds the adjacency graph.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[usize; 3]>) -> Result<Self, MeshLoadError> {
        if triangles.is_empty() {
            return Err(MeshLoadError::EmptyMesh);
        }
        for (triangle, corners) in triangles.iter().enumerate() {
            if let Some(&index) = corners.iter().find(|&&i| i >= vertices.len()) {
                return Err(MeshLoadError::InvalidTriangle {
                    triangle,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }

        let centroids = triangles
            .iter()
            .map(|[a, b, c]| (vertices[*a] + vertices[*b] + vertices[*c]) / 3.0)
            .collect();

        let mut edges: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (triangle, &[a, b, c]) in triangles.iter().enumerate() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                edges.entry((u.min(v), u.max(v))).or_default().push(triangle);
            }
        }

        let mut portals = vec![Vec::new(); triangles.len()];
        for ((u, v), sharing) in &edges {
            let midpoint = (vertices[*u] + vertices[*v]) * 0.5;
            for &from in sharing {
                for &to in sharing {
                    if from != to {
                        portals[from].push(Portal { neighbor: to, midpoint });
                    }
                }
            }
        }

        Ok(Self {
            vertices,
            triangles,
            centroids,
            portals,
        })
    }

    /// Number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Index of the first triangle whose plane projection contains `point`.
    pub fn locate(&self, point: Vec3) -> Option<usize> {
        let p = point.truncate();
        self.triangles.iter().position(|&[a, b, c]| {
            contains(
                self.vertices[a].truncate(),
                self.vertices[b].truncate(),
                self.vertices[c].truncate(),
                p,
            )
        })
    }

    /// Shortest route from `from` to `to` as a list of waypoints.
    ///
    /// The route starts at `from`, passes the midpoint of every crossed edge
    /// and ends at `to`.
    pub fn find_path(&self, from: Vec3, to: Vec3) -> Result<Vec<Vec3>, NavigationError> {
        let start = self.locate(from).ok_or(NavigationError::OutsideMesh)?;
        let goal = self.locate(to).ok_or(NavigationError::OutsideMesh)?;
        let route = self.triangle_route(start, goal).ok_or(NavigationError::NoRoute)?;

        let mut path = Vec::with_capacity(route.len() + 1);
        path.push(from);
        for pair in route.windows(2) {
            if let Some(portal) = self.portals[pair[0]].iter().find(|p| p.neighbor == pair[1]) {
                path.push(portal.midpoint);
            }
        }
        path.push(to);
        Ok(path)
    }

    fn triangle_route(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let mut dist = vec![f32::INFINITY; self.triangles.len()];
        let mut prev: Vec<Option<usize>> = vec![None; self.triangles.len()];
        let mut heap = BinaryHeap::new();

        dist[start] = 0.0;
        heap.push(Reverse(Candidate {
            cost: 0.0,
            triangle: start,
        }));

        while let Some(Reverse(Candidate { cost, triangle })) = heap.pop() {
            if triangle == goal {
                break;
            }
            if cost > dist[triangle] {
                continue;
            }
            for portal in &self.portals[triangle] {
                let next = cost + self.centroids[triangle].distance(self.centroids[portal.neighbor]);
                if next < dist[portal.neighbor] {
                    dist[portal.neighbor] = next;
                    prev[portal.neighbor] = Some(triangle);
                    heap.push(Reverse(Candidate {
                        cost: next,
                        triangle: portal.neighbor,
                    }));
                }
            }
        }

        if !dist[goal].is_finite() {
            return None;
        }
        let mut route = vec![goal];
        let mut current = goal;
        while let Some(p) = prev[current] {
            route.push(p);
            current = p;
        }
        route.reverse();
        Some(route)
    }
}

fn contains(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let has_neg = d1 < -CONTAINMENT_TOLERANCE || d2 < -CONTAINMENT_TOLERANCE || d3 < -CONTAINMENT_TOLERANCE;
    let has_pos = d1 > CONTAINMENT_TOLERANCE || d2 > CONTAINMENT_TOLERANCE || d3 > CONTAINMENT_TOLERANCE;
    !(has_neg && has_pos)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two triangles forming a 10x10 square at height 1, plus one detached
    /// triangle to the east.
    pub(crate) const SQUARE_MESH: &str = r#"{
        "vertices": [
            {"X": 0.0, "Y": 0.0, "Z": 1.0},
            {"X": 10.0, "Y": 0.0, "Z": 1.0},
            {"X": 10.0, "Y": 10.0, "Z": 1.0},
            {"X": 0.0, "Y": 10.0, "Z": 1.0},
            {"x": 20.0, "y": 0.0, "z": 0.0},
            {"x": 30.0, "y": 0.0, "z": 0.0},
            {"x": 20.0, "y": 10.0, "z": 0.0}
        ],
        "triangles": [
            {"indices": [0, 1, 2]},
            {"indices": [0, 2, 3]},
            {"indices": [4, 5, 6]}
        ]
    }"#;

    #[test]
    fn test_locate_triangles() {
        let mesh = NavMesh::from_json(SQUARE_MESH).unwrap();
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.locate(Vec3::new(8.0, 2.0, 0.0)), Some(0));
        assert_eq!(mesh.locate(Vec3::new(2.0, 8.0, 0.0)), Some(1));
        assert_eq!(mesh.locate(Vec3::new(22.0, 2.0, 0.0)), Some(2));
        assert_eq!(mesh.locate(Vec3::new(50.0, 50.0, 0.0)), None);
    }

    #[test]
    fn test_path_crosses_shared_edge_midpoint() {
        let mesh = NavMesh::from_json(SQUARE_MESH).unwrap();
        let from = Vec3::new(8.0, 2.0, 1.0);
        let to = Vec3::new(2.0, 8.0, 1.0);

        let path = mesh.find_path(from, to).unwrap();
        assert_eq!(path, vec![from, Vec3::new(5.0, 5.0, 1.0), to]);
    }

    #[test]
    fn test_path_inside_one_triangle_is_direct() {
        let mesh = NavMesh::from_json(SQUARE_MESH).unwrap();
        let from = Vec3::new(8.0, 1.0, 1.0);
        let to = Vec3::new(9.0, 3.0, 1.0);
        assert_eq!(mesh.find_path(from, to).unwrap(), vec![from, to]);
    }

    #[test]
    fn test_path_errors() {
        let mesh = NavMesh::from_json(SQUARE_MESH).unwrap();
        assert_eq!(
            mesh.find_path(Vec3::new(8.0, 2.0, 0.0), Vec3::new(22.0, 2.0, 0.0)),
            Err(NavigationError::NoRoute)
        );
        assert_eq!(
            mesh.find_path(Vec3::new(-5.0, 2.0, 0.0), Vec3::new(8.0, 2.0, 0.0)),
            Err(NavigationError::OutsideMesh)
        );
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        assert!(matches!(
            NavMesh::from_json("not json"),
            Err(MeshLoadError::Parse(_))
        ));
        assert!(matches!(
            NavMesh::from_json(r#"{"vertices": [], "triangles": []}"#),
            Err(MeshLoadError::EmptyMesh)
        ));
        assert!(matches!(
            NavMesh::new(vec![Vec3::ZERO; 2], vec![[0, 1, 5]]),
            Err(MeshLoadError::InvalidTriangle { triangle: 0, index: 5, vertex_count: 2 })
        ));
    }
}
