//! Mesh export boundary.
//!
//! File formats are a collaborator concern; the launcher only needs a sink
//! it can hand the finished mesh to when an output path was requested.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mesh::TetMesh;

/// Destination for a finished tetrahedral mesh.
pub trait MeshSink: Send + Sync {
    fn write(&self, mesh: &TetMesh, path: &Path) -> Result<()>;
}

/// Plain-text sink: a header line, then one vertex or tetrahedron per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiSink;

impl MeshSink for AsciiSink {
    fn write(&self, mesh: &TetMesh, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(
            out,
            "# tetforge {} vertices {} tets",
            mesh.vertex_count(),
            mesh.tet_count()
        )?;
        for v in &mesh.vertices {
            writeln!(out, "v {} {} {}", v[0], v[1], v[2])?;
        }
        for t in &mesh.tets {
            writeln!(out, "t {} {} {} {}", t[0], t[1], t[2], t[3])?;
        }
        out.flush()?;
        Ok(())
    }
}
