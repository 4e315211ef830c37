//! The meshing algorithm boundary and the baseline implementation.

use crate::error::{Result, TetForgeError};
use crate::mesh::{SurfaceMesh, TetMesh, TetOptions};
use crate::operation::OperationContext;

/// A long-running tetrahedralization algorithm.
///
/// Implementations own the geometry; the launcher owns the lifecycle. The
/// contract an implementation must honor: emit one info-level checkpoint
/// per coarse unit of work through `ctx`, poll continuation at the same
/// cadence, and on a `false` poll wind down and return without emitting
/// further checkpoints. `estimated_steps` is the a-priori checkpoint count
/// used to scale the progress percentage; overrunning it is tolerated
/// (progress clamps at 100).
pub trait Tetrahedralizer: Send + Sync {
    /// A-priori estimate of how many checkpoints a run will emit.
    fn estimated_steps(&self, mesh: &SurfaceMesh, options: &TetOptions) -> u32;

    /// Run the computation to completion, cancellation, or failure.
    fn tetrahedralize(
        &self,
        mesh: &SurfaceMesh,
        options: &TetOptions,
        ctx: &OperationContext,
    ) -> Result<TetMesh>;
}

/// Baseline algorithm: fans every surface triangle against one anchor
/// vertex placed at the centroid.
///
/// Produces a valid tetrahedralization only for star-shaped domains; its
/// role here is to be the default algorithm behind the plugin surface and
/// a faithful exerciser of the checkpoint/cancel contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanTetrahedralizer;

impl FanTetrahedralizer {
    fn chunk_count(mesh: &SurfaceMesh, options: &TetOptions) -> u32 {
        let granularity = options.checkpoint_granularity.max(1) as usize;
        mesh.triangle_count().div_ceil(granularity) as u32
    }
}

impl Tetrahedralizer for FanTetrahedralizer {
    fn estimated_steps(&self, mesh: &SurfaceMesh, options: &TetOptions) -> u32 {
        // One checkpoint per triangle chunk, one for anchor placement.
        Self::chunk_count(mesh, options) + 1
    }

    fn tetrahedralize(
        &self,
        mesh: &SurfaceMesh,
        options: &TetOptions,
        ctx: &OperationContext,
    ) -> Result<TetMesh> {
        ctx.debug(format!(
            "fan tetrahedralization over {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        ));

        let centroid = mesh.centroid();
        let mut vertices = mesh.vertices().to_vec();
        let anchor = vertices.len() as u32;
        vertices.push(centroid);

        if !ctx.checkpoint(format!(
            "anchor vertex placed at centroid ({:.3}, {:.3}, {:.3})",
            centroid[0], centroid[1], centroid[2]
        )) {
            return Err(TetForgeError::Cancelled);
        }

        let granularity = options.checkpoint_granularity.max(1) as usize;
        let total = mesh.triangle_count();
        let mut tets = Vec::with_capacity(total);
        let mut done = 0usize;

        for chunk in mesh.triangles().chunks(granularity) {
            for tri in chunk {
                tets.push([tri[0], tri[1], tri[2], anchor]);
            }
            done += chunk.len();
            if !ctx.checkpoint(format!("fanned {}/{} triangles", done, total)) {
                return Err(TetForgeError::Cancelled);
            }
        }

        ctx.debug(format!("produced {} tetrahedra", tets.len()));
        Ok(TetMesh { vertices, tets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::handler::ProgressHandler;
    use crate::level::Level;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quad_mesh() -> SurfaceMesh {
        SurfaceMesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    /// Continues until a set number of info messages has been seen.
    struct StopAfter {
        seen: AtomicU32,
        limit: u32,
    }

    impl ProgressHandler for StopAfter {
        fn on_message(&self, level: Level, _text: &str) {
            if level == Level::Info {
                self.seen.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn should_continue(&self) -> bool {
            self.seen.load(Ordering::SeqCst) < self.limit
        }
    }

    struct AlwaysContinue;

    impl ProgressHandler for AlwaysContinue {
        fn on_message(&self, _level: Level, _text: &str) {}

        fn should_continue(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_fan_covers_every_triangle() {
        let mesh = quad_mesh();
        let ctx = OperationContext::new(Arc::new(AlwaysContinue), CancelToken::new());
        let tet_mesh = FanTetrahedralizer
            .tetrahedralize(&mesh, &TetOptions::default(), &ctx)
            .unwrap();

        assert_eq!(tet_mesh.vertex_count(), 5);
        assert_eq!(tet_mesh.tet_count(), 2);
        // Every tet is anchored at the appended centroid vertex.
        assert!(tet_mesh.tets.iter().all(|t| t[3] == 4));
    }

    #[test]
    fn test_estimated_steps_match_emitted_checkpoints() {
        let mesh = quad_mesh();
        let options = TetOptions {
            checkpoint_granularity: 1,
            ..TetOptions::default()
        };
        let counter = Arc::new(StopAfter {
            seen: AtomicU32::new(0),
            limit: u32::MAX,
        });
        let ctx = OperationContext::new(counter.clone(), CancelToken::new());

        let estimate = FanTetrahedralizer.estimated_steps(&mesh, &options);
        FanTetrahedralizer
            .tetrahedralize(&mesh, &options, &ctx)
            .unwrap();

        assert_eq!(counter.seen.load(Ordering::SeqCst), estimate);
    }

    #[test]
    fn test_handler_vote_cancels_run() {
        let mesh = quad_mesh();
        let options = TetOptions {
            checkpoint_granularity: 1,
            ..TetOptions::default()
        };
        let handler = Arc::new(StopAfter {
            seen: AtomicU32::new(0),
            limit: 1,
        });
        let ctx = OperationContext::new(handler.clone(), CancelToken::new());

        let err = FanTetrahedralizer
            .tetrahedralize(&mesh, &options, &ctx)
            .unwrap_err();
        assert!(matches!(err, TetForgeError::Cancelled));
        // Wound down after the first checkpoint: no further info traffic.
        assert_eq!(handler.seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_token_cancels_run() {
        let mesh = quad_mesh();
        let token = CancelToken::new();
        token.cancel();
        let ctx = OperationContext::new(Arc::new(AlwaysContinue), token);

        let err = FanTetrahedralizer
            .tetrahedralize(&mesh, &TetOptions::default(), &ctx)
            .unwrap_err();
        assert!(matches!(err, TetForgeError::Cancelled));
    }
}
