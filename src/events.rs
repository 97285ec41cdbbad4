use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, TreeError};
use crate::tree::NodeId;

/// Change event delivered to tree observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    NodeChanged { node: NodeId },
}

/// Serializes change notifications from any producer onto one channel with a
/// single consumer, so observers see a totally ordered stream of changes.
#[derive(Debug, Default)]
pub(crate) struct ChangeSink {
    tx: Option<UnboundedSender<TreeEvent>>,
}

impl ChangeSink {
    /// Install a fresh channel, replacing any previous subscriber.
    pub(crate) fn subscribe(&mut self) -> UnboundedReceiver<TreeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tx = Some(tx);
        rx
    }

    /// Fire-and-forget delivery: a failed enqueue is logged and never
    /// surfaced to the mutation that triggered it.
    pub(crate) fn notify(&self, node: NodeId) {
        if let Err(e) = self.try_notify(node) {
            warn!("node {:?}: {}", node, e);
        }
    }

    fn try_notify(&self, node: NodeId) -> Result<()> {
        // No subscriber installed: nothing to deliver to.
        let Some(tx) = &self.tx else { return Ok(()) };
        tx.send(TreeEvent::NodeChanged { node })
            .map_err(|e| TreeError::NotifyFailed(e.to_string()))
    }
}

/// Spawn the dedicated task that drains change events in order and hands
/// each one to `handler`. The task ends when the tree (the sender) is
/// dropped or the subscription is replaced.
pub fn spawn_observer<F>(mut rx: UnboundedReceiver<TreeEvent>, mut handler: F) -> JoinHandle<()>
where
    F: FnMut(TreeEvent) + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            handler(event);
        }
        debug!("tree event channel closed, observer exiting");
    })
}
