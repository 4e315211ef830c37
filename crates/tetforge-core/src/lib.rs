//! # TetForge Core
//!
//! Cross-thread progress reporting, cooperative cancellation, and the
//! meshing boundary for the TetForge tetrahedralization plugin.
//!
//! A long-running meshing computation runs on a dedicated worker thread
//! and emits leveled messages without knowing who is listening. The
//! listener side is a [`ProgressHandler`] held in a process-wide slot by
//! weak reference: when its owner goes away mid-flight, emission degrades
//! to the always-alive default handler instead of dangling.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tetforge_core::{Operation, SurfaceMesh};
//!
//! let mesh = SurfaceMesh::from_buffers(&vertices, &indices)?;
//! let handle = Operation::new(mesh)
//!     .on_complete(completion)
//!     .spawn()?;
//! // ... later:
//! handle.cancel();
//! handle.join();
//! ```

pub mod cancel;
pub mod error;
pub mod export;
pub mod handler;
pub mod launcher;
pub mod level;
pub mod mesh;
pub mod operation;
pub mod progress;
pub mod report;
pub mod tetrahedralize;

pub use cancel::CancelToken;
pub use error::{Result, TetForgeError};
pub use export::{AsciiSink, MeshSink};
pub use handler::{default_handler, set_handler, DefaultHandler, HandlerPtr, ProgressHandler};
pub use launcher::{operation_in_flight, Operation, OperationHandle};
pub use level::{Level, LogCategory};
pub use mesh::{SurfaceMesh, TetMesh, TetOptions};
pub use operation::{CompletionHandler, OperationContext, OperationOutcome};
pub use progress::StepProgress;
pub use tetrahedralize::{FanTetrahedralizer, Tetrahedralizer};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        CancelToken, CompletionHandler, Level, LogCategory, Operation, OperationContext,
        OperationHandle, OperationOutcome, ProgressHandler, Result, StepProgress, SurfaceMesh,
        TetForgeError, TetMesh, TetOptions, Tetrahedralizer,
    };
}
