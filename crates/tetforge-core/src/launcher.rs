//! Operation launcher: worker spawn, lifecycle, and failure boundary.
//!
//! One accepted start owns one dedicated worker thread. The worker
//! installs the operation's handler into the process-wide slot for the
//! duration of the run, executes the algorithm behind a panic boundary,
//! and tears down in a fixed order no matter how the run ends: critical
//! log, slot revert, in-flight release, completion signal.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::error::{Result, TetForgeError};
use crate::export::{AsciiSink, MeshSink};
use crate::handler::{self, HandlerPtr};
use crate::mesh::{SurfaceMesh, TetOptions};
use crate::operation::{CompletionHandler, OperationContext, OperationOutcome};
use crate::tetrahedralize::{FanTetrahedralizer, Tetrahedralizer};

/// Starts are serialized: the process-wide handler slot can only route one
/// operation's traffic, so a second start while this is set is rejected.
static OPERATION_IN_FLIGHT: AtomicBool = AtomicBool::new(false);

struct InFlightGuard;

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        OPERATION_IN_FLIGHT.store(false, Ordering::SeqCst);
    }
}

/// True while a worker is running (or wound down but not yet torn down).
pub fn operation_in_flight() -> bool {
    OPERATION_IN_FLIGHT.load(Ordering::SeqCst)
}

/// Handle to a spawned operation.
///
/// Dropping the handle detaches the worker without cancelling it; keep it
/// to cancel cooperatively or to join at shutdown so no worker outlives
/// its host.
pub struct OperationHandle {
    id: Uuid,
    token: CancelToken,
    join: Option<JoinHandle<()>>,
}

impl OperationHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Request cooperative cancellation. Takes effect at the operation's
    /// next checkpoint.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A clone of the operation's cancellation token.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Whether the worker thread has finished (any outcome).
    pub fn is_finished(&self) -> bool {
        self.join
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }

    /// Block until the worker has finished and its completion signal has
    /// fired.
    pub fn join(mut self) {
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::error!(operation = %self.id, "worker escaped the failure boundary");
            }
        }
    }
}

/// Builder for one tetrahedralization operation.
///
/// Defaults: the fan algorithm, the process default handler, the ASCII
/// sink, no completion signal, no export.
pub struct Operation {
    mesh: SurfaceMesh,
    options: TetOptions,
    algorithm: Arc<dyn Tetrahedralizer>,
    handler: HandlerPtr,
    completion: Option<Arc<dyn CompletionHandler>>,
    sink: Arc<dyn MeshSink>,
    output_path: Option<PathBuf>,
    token: CancelToken,
}

impl Operation {
    pub fn new(mesh: SurfaceMesh) -> Self {
        Self {
            mesh,
            options: TetOptions::default(),
            algorithm: Arc::new(FanTetrahedralizer),
            handler: handler::default_handler(),
            completion: None,
            sink: Arc::new(AsciiSink),
            output_path: None,
            token: CancelToken::new(),
        }
    }

    pub fn with_options(mut self, options: TetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Arc<dyn Tetrahedralizer>) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Install a handler for this operation. It is held strongly by the
    /// worker and installed into the process-wide slot for the run.
    pub fn with_handler(mut self, handler: HandlerPtr) -> Self {
        self.handler = handler;
        self
    }

    /// Capability invoked exactly once when the operation finishes.
    pub fn on_complete(mut self, completion: Arc<dyn CompletionHandler>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn MeshSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Export the finished mesh to `path` through the sink.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Use a caller-supplied cancellation token instead of a fresh one, so
    /// a handler constructed ahead of the spawn can share it.
    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// Spawn the worker thread and return immediately.
    ///
    /// Fails with [`TetForgeError::OperationInFlight`] while another
    /// operation is running; the shared handler slot cannot route two
    /// operations' traffic without cross-talk.
    pub fn spawn(self) -> Result<OperationHandle> {
        if OPERATION_IN_FLIGHT
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(TetForgeError::OperationInFlight);
        }
        let in_flight = InFlightGuard;

        let id = Uuid::new_v4();

        debug!(operation = %id, triangles = self.mesh.triangle_count(), "spawning worker");

        let Operation {
            mesh,
            options,
            algorithm,
            handler,
            completion,
            sink,
            output_path,
            token,
        } = self;
        let worker_token = token.clone();

        let join = thread::Builder::new()
            .name(format!("tetforge-{id}"))
            .spawn(move || {
                // The guard lives on the worker so a panic anywhere in
                // this closure still releases the start gate.
                let in_flight = in_flight;
                let ctx = OperationContext::new(Arc::clone(&handler), worker_token.clone());

                handler::set_handler(Some(&handler));

                let run = panic::catch_unwind(AssertUnwindSafe(|| {
                    algorithm.tetrahedralize(&mesh, &options, &ctx)
                }));
                let outcome = classify(run, &ctx, &worker_token, sink.as_ref(), output_path);

                handler::set_handler(None);
                drop(in_flight);

                debug!(operation = %id, ?outcome, "worker finished");
                if let Some(completion) = completion {
                    completion.on_complete(&outcome);
                }
            })?;

        Ok(OperationHandle {
            id,
            token,
            join: Some(join),
        })
    }
}

type RunResult = std::result::Result<Result<crate::mesh::TetMesh>, Box<dyn std::any::Any + Send>>;

/// Turn however the algorithm ended into an outcome, emitting the
/// critical-level log for failures through the operation's own context.
fn classify(
    run: RunResult,
    ctx: &OperationContext,
    token: &CancelToken,
    sink: &dyn MeshSink,
    output_path: Option<PathBuf>,
) -> OperationOutcome {
    match run {
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            ctx.critical(format!("tetrahedralization panicked: {reason}"));
            OperationOutcome::Failed { reason }
        }
        Ok(Err(TetForgeError::Cancelled)) => {
            ctx.warn("tetrahedralization cancelled");
            OperationOutcome::Cancelled
        }
        Ok(Err(err)) if token.is_cancelled() => {
            // The algorithm surfaced its wind-down as some other error;
            // the token decides.
            ctx.warn(format!("tetrahedralization cancelled ({err})"));
            OperationOutcome::Cancelled
        }
        Ok(Err(err)) => {
            let reason = err.to_string();
            ctx.critical(format!("tetrahedralization failed: {reason}"));
            OperationOutcome::Failed { reason }
        }
        Ok(Ok(tet_mesh)) => {
            let tet_count = tet_mesh.tet_count();
            match output_path {
                Some(path) => match sink.write(&tet_mesh, &path) {
                    Ok(()) => OperationOutcome::Completed {
                        tet_count,
                        output_path: Some(path),
                    },
                    Err(err) => {
                        let reason = format!("mesh export to {} failed: {err}", path.display());
                        ctx.critical(reason.clone());
                        OperationOutcome::Failed { reason }
                    }
                },
                None => OperationOutcome::Completed {
                    tet_count,
                    output_path: None,
                },
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
