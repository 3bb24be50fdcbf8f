//! Background task for reconnects and follow-up reads
//!
//! Work that cannot run on the notification callback (it needs to await the
//! link) is queued here. The task only holds a weak reference to the device,
//! so dropping the last [`Device`] handle ends it.

use std::sync::Weak;

use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    device::{Device, Inner},
    pump::FollowUp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Task {
    /// Link lost without being asked to
    Reconnect,

    /// Read back a value the device just acknowledged writing
    Refresh(FollowUp),
}

pub(crate) struct Supervisor {
    tx: mpsc::UnboundedSender<Task>,
    handle: JoinHandle<()>,
}

impl Supervisor {
    /// Start the task on the current tokio runtime
    pub(crate) fn spawn(inner: Weak<Inner>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(inner, rx));
        Self { tx, handle }
    }

    pub(crate) fn submit(&self, task: Task) -> bool {
        self.tx.send(task).is_ok()
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(inner: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<Task>) {
    while let Some(task) = rx.recv().await {
        match task {
            Task::Reconnect => reconnect(&inner).await,
            Task::Refresh(follow_up) => {
                let Some(device) = Device::upgrade(&inner) else {
                    break;
                };
                if let Err(e) = device.refresh(follow_up).await {
                    warn!("Follow-up {:?} failed: {}", follow_up, e);
                }
            }
        }
    }
    debug!("Supervisor stopped");
}

/// Re-run setup until it succeeds, waiting out "not found"
async fn reconnect(inner: &Weak<Inner>) {
    let mut attempt = 1u32;

    loop {
        let (result, backoff) = {
            let Some(device) = Device::upgrade(inner) else {
                return;
            };
            if device.is_connected() {
                debug!("Already reconnected");
                return;
            }
            if device.disconnect_requested() {
                debug!("Disconnect requested, abandoning reconnect");
                return;
            }
            (device.setup().await, device.options().reconnect_backoff)
        };

        match result {
            Ok(()) => {
                info!("Reconnected after {} attempt(s)", attempt);
                return;
            }
            Err(e) if e.is_not_found() => {
                debug!("Device not found, retrying in {:?}", backoff);
                sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("Reconnect failed: {}", e);
                return;
            }
        }
    }
}
