// ABOUTME: Bounded polling for provider operations that complete asynchronously.
// ABOUTME: Replaces open-ended waiters with a deadline and a Timeout error.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

use super::DeployError;

/// How long to wait for a stack or change set to settle, and how often to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_max_wait", with = "humantime_serde")]
    pub max_wait: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

fn default_max_wait() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_wait: default_max_wait(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Poll `check` until it yields a value, fails, or `config.max_wait` passes.
///
/// `check` returns `Ok(None)` while the operation is still running.
pub async fn poll_until<T, F, Fut>(
    config: &WaitConfig,
    what: &str,
    mut check: F,
) -> Result<T, DeployError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DeployError>>,
{
    let start = Instant::now();

    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }

        if start.elapsed() >= config.max_wait {
            return Err(DeployError::Timeout {
                what: what.to_string(),
                waited_secs: start.elapsed().as_secs(),
            });
        }

        tracing::trace!("Still waiting for {}", what);
        tokio::time::sleep(config.poll_interval).await;
    }
}
