//! Bounded worker pool over session tasks

use rayon::prelude::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::session::{process_session, RunContext, SessionOutcome, SessionTask};
use crate::aggregate::{Exclusion, ExclusionReason};
use crate::core::error::{EngineError, Result};

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run one task, turning a panic into an exclusion
pub fn run_guarded(ctx: &RunContext<'_>, task: &SessionTask) -> SessionOutcome {
    catch_unwind(AssertUnwindSafe(|| process_session(ctx, task))).unwrap_or_else(|payload| {
        let message = panic_message(payload);
        tracing::warn!("Worker panicked on session {}: {}", task.input.id(), message);
        SessionOutcome::Excluded(Exclusion::new(
            task.input.id().clone(),
            ExclusionReason::WorkerPanicked { message },
        ))
    })
}

/// Process every task on a dedicated pool of `workers` threads
///
/// Outcomes come back in task order.
pub fn run_sessions(
    workers: usize,
    ctx: &RunContext<'_>,
    tasks: &[SessionTask],
) -> Result<Vec<SessionOutcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("session-worker-{}", i))
        .build()
        .map_err(|e| EngineError::WorkerPool(e.to_string()))?;

    tracing::info!("Processing {} sessions on {} workers", tasks.len(), workers);
    Ok(pool.install(|| tasks.par_iter().map(|task| run_guarded(ctx, task)).collect()))
}
