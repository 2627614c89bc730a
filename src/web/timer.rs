//! Browser timers behind the `Sleeper` and `Scheduler` seams.

use crate::timer::{Scheduler, Sleeper};
use futures::future::{FutureExt, LocalBoxFuture};
use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;

#[derive(Debug, Default, Clone, Copy)]
pub struct GlooSleeper;

impl Sleeper for GlooSleeper {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        TimeoutFuture::new(ms).boxed_local()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GlooScheduler;

impl Scheduler for GlooScheduler {
    // Dropping a `Timeout` clears it.
    type Handle = Timeout;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Timeout {
        Timeout::new(delay_ms, task)
    }
}
