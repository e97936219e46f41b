//! Injectable clock for self-rescheduling loops

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

/// Supplies the delay between scheduler cycles
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Wall-clock delays through the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}
