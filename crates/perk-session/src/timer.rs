//! Reward countdown timer.
//!
//! A countdown is an explicit scheduled task that emits tick events and a
//! final completion event over a channel; the state machine consumes the
//! completion and applies the credit. No pause; cancellation aborts the task
//! and no completion (and therefore no credit) is ever emitted.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountdownEvent {
    /// One logical second elapsed.
    Tick { remaining_secs: u32 },
    /// The countdown reached zero.
    Completed,
}

/// Handle to a running countdown. Cancelling (or dropping) the handle aborts
/// the task, so a torn-down session can never receive a stale completion.
pub struct CountdownHandle {
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start a countdown of `duration_secs` logical seconds.
///
/// `tick` is the wall-clock length of one logical second; production uses
/// one real second, tests shrink it to milliseconds.
pub(crate) fn start(
    duration_secs: u32,
    tick: Duration,
) -> (CountdownHandle, mpsc::Receiver<CountdownEvent>) {
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(async move {
        let mut remaining = duration_secs;
        while remaining > 0 {
            tokio::time::sleep(tick).await;
            remaining -= 1;
            if tx
                .send(CountdownEvent::Tick {
                    remaining_secs: remaining,
                })
                .await
                .is_err()
            {
                // Receiver gone: session torn down mid-countdown.
                return;
            }
        }
        let _ = tx.send(CountdownEvent::Completed).await;
    });
    (CountdownHandle { task }, rx)
}
