//! Bounded polling for eventually consistent API state

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Delay before each check
    pub interval: Duration,
    /// Give up once this much time has passed
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

impl WaitOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Check `condition` every interval until it holds or the timeout passes.
///
/// The first check happens after one interval. An error from `condition`
/// stops polling and is returned as is.
pub async fn poll_until<F, Fut>(options: WaitOptions, what: &str, mut condition: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + options.timeout;
    let mut attempts = 0u32;

    loop {
        sleep(options.interval).await;
        attempts += 1;

        if condition().await? {
            debug!("{} after {} checks", what, attempts);
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout {
                timeout: options.timeout,
                what: what.to_string(),
            });
        }
    }
}

/// Fixed pause giving a controller time to catch up; skipped when `fast`.
pub async fn settle(duration: Duration, fast: bool) {
    if fast || duration.is_zero() {
        return;
    }
    info!("Wait {} seconds", duration.as_secs());
    sleep(duration).await;
}
