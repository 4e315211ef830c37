//! Mesh boundary types: validated surface input, tet output, options.
//!
//! The host hands the plugin flat vertex/index buffers; everything past
//! this module works with the validated [`SurfaceMesh`]. Validation errors
//! are surfaced synchronously to the caller, never to the worker thread.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TetForgeError};

/// A triangulated surface handed in by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<[u32; 3]>,
}

impl SurfaceMesh {
    /// Build a mesh from already-structured vertex and triangle lists.
    pub fn new(vertices: Vec<[f64; 3]>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(TetForgeError::InvalidMesh(format!(
                "need at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if triangles.is_empty() {
            return Err(TetForgeError::InvalidMesh("no triangles".to_string()));
        }
        let vertex_count = vertices.len() as u32;
        for (i, tri) in triangles.iter().enumerate() {
            if tri.iter().any(|&idx| idx >= vertex_count) {
                return Err(TetForgeError::InvalidMesh(format!(
                    "triangle {} references vertex out of range (vertex count {})",
                    i, vertex_count
                )));
            }
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Build a mesh from the flat buffers a host marshals across the ABI:
    /// `vertices` as xyz triples, `indices` as triangle triples.
    pub fn from_buffers(vertices: &[f64], indices: &[u32]) -> Result<Self> {
        if vertices.len() % 3 != 0 {
            return Err(TetForgeError::InvalidMesh(format!(
                "vertex buffer length {} is not a multiple of 3",
                vertices.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(TetForgeError::InvalidMesh(format!(
                "index buffer length {} is not a multiple of 3",
                indices.len()
            )));
        }
        let structured_vertices = vertices
            .chunks_exact(3)
            .map(|v| [v[0], v[1], v[2]])
            .collect();
        let structured_triangles = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();
        Self::new(structured_vertices, structured_triangles)
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Arithmetic mean of the vertex positions.
    pub fn centroid(&self) -> [f64; 3] {
        let mut sum = [0.0f64; 3];
        for v in &self.vertices {
            sum[0] += v[0];
            sum[1] += v[1];
            sum[2] += v[2];
        }
        let n = self.vertices.len() as f64;
        [sum[0] / n, sum[1] / n, sum[2] / n]
    }
}

/// The tetrahedral mesh an operation produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TetMesh {
    pub vertices: Vec<[f64; 3]>,
    pub tets: Vec<[u32; 4]>,
}

impl TetMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn tet_count(&self) -> usize {
        self.tets.len()
    }
}

/// Tuning knobs for the meshing algorithm, deserializable from the JSON
/// options document a host may pass at operation start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TetOptions {
    /// How many input triangles are consumed between two progress
    /// checkpoints. Smaller values mean finer-grained cancellation latency
    /// at the cost of more callback traffic.
    pub checkpoint_granularity: u32,

    /// Override for the a-priori checkpoint estimate used to scale the
    /// progress percentage. When unset, the algorithm supplies its own.
    pub estimated_steps: Option<u32>,
}

impl Default for TetOptions {
    fn default() -> Self {
        Self {
            checkpoint_granularity: 64,
            estimated_steps: None,
        }
    }
}

impl TetOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
