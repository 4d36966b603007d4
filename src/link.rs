// ReflexPod — Connection / Notification Gate
//
// Tracks whether a peer is attached and decides whether an outbound payload
// actually goes out. Payloads built while detached are dropped, never queued.

use anyhow::Context;

use crate::protocol::Outbound;

/// The wireless (or console) link underneath the gate.
pub trait Transport {
    /// Best-effort notify of one serialized payload.
    fn transmit(&mut self, payload: &str) -> anyhow::Result<()>;

    /// Make the device discoverable again after a peer left.
    fn resume_discovery(&mut self) -> anyhow::Result<()>;
}

pub struct Gate<T: Transport> {
    transport: T,
    connected: bool,
    settle_ms: u64,
    rediscover_at_ms: Option<u64>,
}

impl<T: Transport> Gate<T> {
    pub fn new(transport: T, settle_ms: u64) -> Self {
        Self {
            transport,
            connected: false,
            settle_ms,
            rediscover_at_ms: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns true on the Disconnected → Connected edge.
    pub fn attach(&mut self) -> bool {
        self.rediscover_at_ms = None;
        if self.connected {
            return false;
        }
        self.connected = true;
        log::info!("Peer connected");
        true
    }

    pub fn detach(&mut self, now_ms: u64) {
        if !self.connected {
            return;
        }
        self.connected = false;
        self.rediscover_at_ms = Some(now_ms + self.settle_ms);
        log::info!("Peer disconnected");
    }

    /// Re-open discovery once the settle delay has passed.
    pub fn tick(&mut self, now_ms: u64) {
        match self.rediscover_at_ms {
            Some(at) if now_ms >= at => {
                self.rediscover_at_ms = None;
                match self.transport.resume_discovery() {
                    Ok(()) => log::info!("Discovery resumed"),
                    Err(e) => log::warn!("Could not resume discovery: {:#}", e),
                }
            }
            _ => {}
        }
    }

    /// Serialize and send if a peer is attached; otherwise discard.
    pub fn send(&mut self, message: &Outbound) {
        if !self.connected {
            log::debug!("No peer, dropping {:?}", message);
            return;
        }
        let result = serde_json::to_string(message)
            .context("encode outbound payload")
            .and_then(|payload| self.transport.transmit(&payload));
        if let Err(e) = result {
            log::warn!("Notify failed: {:#}", e);
        }
    }
}
