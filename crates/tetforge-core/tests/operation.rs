//! End-to-end operation tests: a host-like handler observing a spawned
//! worker through the same seams the FFI plugin uses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use serial_test::serial;
use tetforge_core::{
    CompletionHandler, Level, Operation, OperationContext, OperationOutcome, ProgressHandler,
    Result, StepProgress, SurfaceMesh, TetMesh, TetOptions, Tetrahedralizer,
};

/// Handler shaped like the plugin's host-bound one: counts info messages
/// against an a-priori estimate and records the resulting percentages.
struct HostLikeHandler {
    progress: Mutex<StepProgress>,
    percents: Mutex<Vec<f32>>,
    keep_going: AtomicBool,
}

impl HostLikeHandler {
    fn new(total_steps: u32) -> Self {
        Self {
            progress: Mutex::new(StepProgress::new(total_steps)),
            percents: Mutex::new(Vec::new()),
            keep_going: AtomicBool::new(true),
        }
    }
}

impl ProgressHandler for HostLikeHandler {
    fn on_message(&self, level: Level, _text: &str) {
        if level == Level::Info {
            let percent = self.progress.lock().unwrap().advance();
            self.percents.lock().unwrap().push(percent);
        }
    }

    fn should_continue(&self) -> bool {
        self.keep_going.load(Ordering::SeqCst)
    }
}

/// Emits a fixed number of info checkpoints, honoring the poll.
struct FixedStepAlgorithm {
    steps: u32,
}

impl Tetrahedralizer for FixedStepAlgorithm {
    fn estimated_steps(&self, _mesh: &SurfaceMesh, _options: &TetOptions) -> u32 {
        self.steps
    }

    fn tetrahedralize(
        &self,
        _mesh: &SurfaceMesh,
        _options: &TetOptions,
        ctx: &OperationContext,
    ) -> Result<TetMesh> {
        for step in 0..self.steps {
            if !ctx.checkpoint(format!("step {step}")) {
                return Err(tetforge_core::TetForgeError::Cancelled);
            }
        }
        Ok(TetMesh::default())
    }
}

/// Algorithm that reports through the ambient facade instead of the
/// context, the way code deep inside a meshing kernel would.
struct AmbientAlgorithm;

impl Tetrahedralizer for AmbientAlgorithm {
    fn estimated_steps(&self, _mesh: &SurfaceMesh, _options: &TetOptions) -> u32 {
        2
    }

    fn tetrahedralize(
        &self,
        _mesh: &SurfaceMesh,
        _options: &TetOptions,
        _ctx: &OperationContext,
    ) -> Result<TetMesh> {
        tetforge_core::report_info!("ambient checkpoint {}", 1);
        if !tetforge_core::report::should_continue() {
            return Err(tetforge_core::TetForgeError::Cancelled);
        }
        tetforge_core::report_info!("ambient checkpoint {}", 2);
        Ok(TetMesh::default())
    }
}

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

fn completion_channel() -> (Arc<dyn CompletionHandler>, mpsc::Receiver<OperationOutcome>) {
    let (tx, rx) = mpsc::channel::<OperationOutcome>();
    let tx = Mutex::new(tx);
    let completion: Arc<dyn CompletionHandler> = Arc::new(move |outcome: &OperationOutcome| {
        tx.lock().unwrap().send(outcome.clone()).ok();
    });
    (completion, rx)
}

#[test]
#[serial]
fn progress_stream_is_monotone_and_hits_100() {
    let handler = Arc::new(HostLikeHandler::new(55));
    let (completion, outcomes) = completion_channel();

    let handle = Operation::new(quad_mesh())
        .with_algorithm(Arc::new(FixedStepAlgorithm { steps: 56 }))
        .with_handler(handler.clone())
        .on_complete(completion)
        .spawn()
        .unwrap();
    handle.join();

    assert!(outcomes.recv().unwrap().is_completed());

    let percents = handler.percents.lock().unwrap();
    assert_eq!(percents.len(), 56);
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    // 28th checkpoint of an estimated 55: roughly 50.9 percent.
    assert!((percents[27] - 50.909_092).abs() < 0.01);
    assert_eq!(percents[54], 100.0);
    // The 56th overruns the estimate and stays clamped.
    assert_eq!(percents[55], 100.0);
}

#[test]
#[serial]
fn handler_vote_cancels_within_one_poll() {
    let handler = Arc::new(HostLikeHandler::new(100));
    handler.keep_going.store(false, Ordering::SeqCst);
    let (completion, outcomes) = completion_channel();

    let handle = Operation::new(quad_mesh())
        .with_algorithm(Arc::new(FixedStepAlgorithm { steps: 100 }))
        .with_handler(handler.clone())
        .on_complete(completion)
        .spawn()
        .unwrap();
    handle.join();

    assert_eq!(outcomes.recv().unwrap(), OperationOutcome::Cancelled);
    // Exactly one checkpoint got out before the vote was observed.
    assert_eq!(handler.percents.lock().unwrap().len(), 1);
}

#[test]
#[serial]
fn unlistened_operation_runs_to_completion() {
    // No handler, no callbacks registered anywhere: the default handler
    // absorbs the traffic and the completion signal still fires.
    let (completion, outcomes) = completion_channel();
    let handle = Operation::new(quad_mesh())
        .on_complete(completion)
        .spawn()
        .unwrap();
    handle.join();

    assert_eq!(
        outcomes.recv().unwrap(),
        OperationOutcome::Completed {
            tet_count: 2,
            output_path: None,
        }
    );
}

#[test]
#[serial]
fn ambient_facade_reaches_the_operation_handler() {
    let handler = Arc::new(HostLikeHandler::new(2));
    let (completion, outcomes) = completion_channel();

    let handle = Operation::new(quad_mesh())
        .with_algorithm(Arc::new(AmbientAlgorithm))
        .with_handler(handler.clone())
        .on_complete(completion)
        .spawn()
        .unwrap();
    handle.join();

    assert!(outcomes.recv().unwrap().is_completed());
    let percents = handler.percents.lock().unwrap();
    assert_eq!(percents.as_slice(), &[50.0, 100.0]);
}

#[test]
#[serial]
fn slot_reverts_after_every_outcome() {
    let handler = Arc::new(HostLikeHandler::new(1));
    let handle = Operation::new(quad_mesh())
        .with_handler(handler.clone())
        .spawn()
        .unwrap();
    handle.join();

    // The worker uninstalled its handler on the way out; ambient traffic
    // now lands in the default handler, not the finished operation's.
    tetforge_core::report::info("stray message");
    let info_count = handler.percents.lock().unwrap().len();
    let expected = tetforge_core::FanTetrahedralizer
        .estimated_steps(&quad_mesh(), &TetOptions::default()) as usize;
    assert_eq!(info_count, expected);
}
