//! Running use case steps to completion.
//!
//! The gateway aborts a connection's reader task as soon as its writer stops,
//! which drops whatever use case future the reader was awaiting. Steps that
//! must not stop halfway (persist then broadcast, move then replay) run on
//! their own task instead, so dropping the caller only stops the waiting.

use std::{future::Future, panic};

/// Run `task` on its own tokio task and wait for its output.
///
/// Returns `None` only when the runtime cancelled the task during shutdown.
/// A panic inside `task` is resumed on the caller.
pub(crate) async fn run_detached<F>(task: F) -> Option<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match tokio::spawn(task).await {
        Ok(output) => Some(output),
        Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
        Err(e) => {
            tracing::warn!("Detached use case step cancelled: {}", e);
            None
        }
    }
}
