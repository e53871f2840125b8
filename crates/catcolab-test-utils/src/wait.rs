//! Waiting on watch channels

use std::time::Duration;
use tokio::sync::watch;

/// Upper bound for every wait
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait until the channel holds a value satisfying `pred` and return it
///
/// Panics after [`WAIT_TIMEOUT`].
pub async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<T>,
    mut pred: impl FnMut(&T) -> bool,
) -> T {
    let waited = tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(|value| pred(value))).await;
    match waited {
        Ok(Ok(value)) => value.clone(),
        Ok(Err(_)) => panic!("channel closed while waiting"),
        Err(_) => panic!("condition not reached within {WAIT_TIMEOUT:?}"),
    }
}

/// Let spawned tasks run until they block
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
