//! The client roster: who is in the session and how to write to them.
//!
//! The pairing logic assumes two active slots. Extra connections are still
//! accepted at the transport layer and take part in the "every slot but the
//! sender" fan-out with undefined results; rejecting them is a non-goal.

use log::{debug, info};
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;

/// One connected client: its address and the write half of its stream.
pub struct Slot {
    pub addr: SocketAddr,
    writer: OwnedWriteHalf,
}

/// The set of connected clients, keyed by address for removal.
#[derive(Default)]
pub struct Roster {
    slots: Vec<Slot>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, addr: SocketAddr, writer: OwnedWriteHalf) {
        info!("client {} joined the session", addr);
        self.slots.push(Slot { addr, writer });
    }

    /// Returns true if the address held a slot.
    pub fn remove(&mut self, addr: SocketAddr) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.addr != addr);
        self.slots.len() < before
    }

    pub fn contains(&self, addr: SocketAddr) -> bool {
        self.slots.iter().any(|slot| slot.addr == addr)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sends to every slot except the sender's own. A broken pipe drops the
    /// frame silently; the peer's read loop will notice the dead stream.
    pub async fn relay_to_other(&mut self, sender: SocketAddr, bytes: &[u8]) {
        for slot in &mut self.slots {
            if slot.addr != sender {
                if let Err(e) = slot.writer.write_all(bytes).await {
                    debug!("dropped frame to {}: {}", slot.addr, e);
                }
            }
        }
    }

    /// Sends to every slot, the sender included.
    pub async fn broadcast(&mut self, bytes: &[u8]) {
        for slot in &mut self.slots {
            if let Err(e) = slot.writer.write_all(bytes).await {
                debug!("dropped frame to {}: {}", slot.addr, e);
            }
        }
    }
}
