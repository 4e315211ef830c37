//! Demo: run a tetrahedralization with a console progress handler.
//!
//! ```bash
//! cargo run --example progress_demo
//! ```

use std::sync::{Arc, Mutex};

use tetforge_core::{
    Level, Operation, OperationOutcome, ProgressHandler, StepProgress, SurfaceMesh, TetOptions,
};

struct ConsoleHandler {
    progress: Mutex<StepProgress>,
}

impl ProgressHandler for ConsoleHandler {
    fn on_message(&self, level: Level, text: &str) {
        if level == Level::Info {
            let percent = self.progress.lock().unwrap().advance();
            println!("[{percent:6.1}%] {text}");
        } else {
            println!("[{level}] {text}");
        }
    }

    fn should_continue(&self) -> bool {
        true
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // An octahedron surface: eight triangles around six vertices.
    let vertices = vec![
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
    ];
    let triangles = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    let mesh = SurfaceMesh::new(vertices, triangles).expect("valid demo mesh");

    let options = TetOptions {
        checkpoint_granularity: 2,
        ..TetOptions::default()
    };
    let estimate = tetforge_core::Tetrahedralizer::estimated_steps(
        &tetforge_core::FanTetrahedralizer,
        &mesh,
        &options,
    );
    let handler = Arc::new(ConsoleHandler {
        progress: Mutex::new(StepProgress::new(estimate)),
    });

    let completion = Arc::new(|outcome: &OperationOutcome| match outcome {
        OperationOutcome::Completed { tet_count, .. } => {
            println!("done: {tet_count} tetrahedra");
        }
        OperationOutcome::Cancelled => println!("cancelled"),
        OperationOutcome::Failed { reason } => println!("failed: {reason}"),
    });

    let handle = Operation::new(mesh)
        .with_options(options)
        .with_handler(handler)
        .on_complete(completion)
        .spawn()
        .expect("no other operation is running");

    handle.join();
}
