//! Time seams: one-shot sleeps for request timeouts and cancellable
//! callbacks for the change watcher.

use futures::future::{self, Either, LocalBoxFuture};
use std::future::Future;

/// Produces futures that complete after a delay.
pub trait Sleeper {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

/// Runs callbacks after a delay.
///
/// Dropping the returned handle cancels the callback if it has not run yet.
pub trait Scheduler {
    type Handle: 'static;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle;
}

/// Race `fut` against a sleep of `ms`. `None` means the sleep won.
pub async fn with_timeout<F: Future>(sleeper: &dyn Sleeper, ms: u32, fut: F) -> Option<F::Output> {
    let fut = std::pin::pin!(fut);
    match future::select(fut, sleeper.sleep(ms)).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}
