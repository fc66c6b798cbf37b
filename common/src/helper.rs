use log::{error, trace};
use tokio::task::JoinHandle;

/// join a spawned task loop, logging instead of propagating its panic
pub async fn wait(handle: JoinHandle<()>, label: &str) {
    match handle.await {
        Ok(_) => trace!("{label} task loop exit successfully"),
        Err(e) if e.is_cancelled() => trace!("{label} task loop aborted"),
        Err(e) => error!("{label} task loop panic: {e}"),
    }
}
