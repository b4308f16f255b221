//! Duplex in-process bridge: two ends, each a fire-and-forget sender and an ordered receiver.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{BridgeError, BridgeMessage, BridgeResult};
use crate::runtime::Shutdown;

/// Receives decoded messages one at a time, in arrival order.
#[async_trait]
pub trait BridgeHandler: Send {
    async fn handle(&mut self, message: BridgeMessage);
}

#[derive(Clone)]
pub struct BridgeSender {
    side: &'static str,
    tx: mpsc::UnboundedSender<String>,
}

impl BridgeSender {
    /// Fire-and-forget. A detached remote is logged, never surfaced.
    pub fn send(&self, message: &BridgeMessage) {
        if let Err(e) = self.try_send(message) {
            tracing::warn!(side = self.side, kind = message.kind.tag(), error = %e, "bridge send dropped");
        }
    }

    pub fn try_send(&self, message: &BridgeMessage) -> BridgeResult<()> {
        self.send_raw(message.encode()?)
    }

    /// Send a pre-encoded frame as-is.
    pub fn send_raw(&self, frame: String) -> BridgeResult<()> {
        self.tx.send(frame).map_err(|_| BridgeError::Detached)
    }

    pub fn is_attached(&self) -> bool { !self.tx.is_closed() }
}

pub struct BridgeReceiver {
    side: &'static str,
    rx: mpsc::UnboundedReceiver<String>,
}

impl BridgeReceiver {
    /// Next well-formed message. Malformed frames are logged and skipped.
    pub async fn recv(&mut self) -> Option<BridgeMessage> {
        loop {
            let frame = self.rx.recv().await?;
            match BridgeMessage::decode(&frame) {
                Ok(message) => return Some(message),
                Err(e) => tracing::warn!(side = self.side, error = %e, "dropping malformed bridge frame"),
            }
        }
    }

    /// Drive `handler` until the remote end is gone.
    pub async fn run<H: BridgeHandler>(mut self, handler: &mut H) {
        while let Some(message) = self.recv().await {
            handler.handle(message).await;
        }
        tracing::debug!(side = self.side, "bridge closed");
    }

    /// Drive `handler` until the remote end is gone or shutdown fires.
    pub async fn run_until<H: BridgeHandler>(mut self, handler: &mut H, shutdown: &Shutdown) {
        let mut stop = shutdown.subscribe();
        if shutdown.is_triggered() {
            return;
        }
        loop {
            tokio::select! {
                biased;
                _ = stop.recv() => {
                    tracing::info!(side = self.side, "bridge loop stopping");
                    return;
                }
                next = self.recv() => match next {
                    Some(message) => handler.handle(message).await,
                    None => return,
                },
            }
        }
    }
}

/// Connected pair of bridge ends.
pub struct BridgeChannel;

impl BridgeChannel {
    /// Returns `((host_tx, host_rx), (runtime_tx, runtime_rx))`.
    pub fn pair() -> ((BridgeSender, BridgeReceiver), (BridgeSender, BridgeReceiver)) {
        let (to_runtime, from_host) = mpsc::unbounded_channel();
        let (to_host, from_runtime) = mpsc::unbounded_channel();
        (
            (BridgeSender { side: "host", tx: to_runtime }, BridgeReceiver { side: "host", rx: from_runtime }),
            (BridgeSender { side: "runtime", tx: to_host }, BridgeReceiver { side: "runtime", rx: from_host }),
        )
    }
}
