use std::future::Future;
use std::time::Duration;

pub trait Sleeper {
    type Sleep: Future<Output = ()>;

    fn sleep(&self, duration: Duration) -> Self::Sleep;
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSleeper;

#[cfg(target_arch = "wasm32")]
impl Sleeper for BrowserSleeper {
    type Sleep = gloo_timers::future::TimeoutFuture;

    fn sleep(&self, duration: Duration) -> Self::Sleep {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis)
    }
}
