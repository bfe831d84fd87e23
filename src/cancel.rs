use crate::error::ScrobblerError;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Cancellation scope for polling tasks.
///
/// The scope holds an epoch counter:
/// - `begin()` hands out a token bound to the current epoch.
/// - `cancel()` bumps the epoch, which makes every outstanding token stale
///   and wakes anything sleeping on it.
/// - A task checks `is_current()` before writing state or scheduling more work.
#[derive(Clone, Debug)]
pub struct PollScope {
    tx: Arc<watch::Sender<u64>>,
}

/// A handle tied to one epoch of a [`PollScope`].
#[derive(Clone, Debug)]
pub struct ScopeToken {
    epoch: u64,
    rx: watch::Receiver<u64>,
}

impl Default for PollScope {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Invalidate any previous token and return a fresh one.
    pub fn begin(&self) -> ScopeToken {
        self.cancel();
        let rx = self.tx.subscribe();
        let epoch = *rx.borrow();
        ScopeToken { epoch, rx }
    }

    pub fn cancel(&self) {
        self.tx.send_modify(|epoch| *epoch += 1);
    }

    pub fn epoch(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl ScopeToken {
    pub fn is_current(&self) -> bool {
        *self.rx.borrow() == self.epoch
    }

    pub fn check(&self) -> Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(ScrobblerError::Cancelled)
        }
    }
}

/// Sleep for `duration` unless the token's scope is cancelled first.
pub async fn sleep_with_cancel(token: &ScopeToken, duration: Duration) -> Result<()> {
    token.check()?;

    let mut rx = token.rx.clone();
    let epoch = token.epoch;
    let sleeper = tokio::time::sleep(duration);
    tokio::pin!(sleeper);
    tokio::select! {
        _ = &mut sleeper => token.check(),
        _ = async {
            loop {
                if rx.changed().await.is_err() {
                    // Scope dropped; nothing can cancel us any more.
                    std::future::pending::<()>().await;
                }
                if *rx.borrow() != epoch {
                    break;
                }
            }
        } => Err(ScrobblerError::Cancelled),
    }
}
