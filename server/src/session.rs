//! The session coordinator: the header-driven protocol state machine.
//!
//! Two independently-polling clients are brought to the same logical phase
//! with barrier counters: each client re-sends its request header every tick
//! until it sees the grant, the coordinator counts distinct senders and
//! broadcasts the grant once both have signalled, then resets for the next
//! round. Counters are keyed by sender address, so a client retrying its own
//! request can never satisfy a barrier on behalf of its peer.

use log::warn;
use shared::Envelope;
use std::collections::HashSet;
use std::net::SocketAddr;

/// Number of clients a session pairs.
pub const SESSION_SIZE: usize = 2;

/// Side effect the network layer applies after one envelope is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Forward to every registered client except the sender.
    RelayToOther(Envelope),
    /// Forward to every registered client, the sender included.
    Broadcast(Envelope),
    /// Unregister the sender's slot.
    DropSender,
}

/// Barrier counters and the last reported score for one session.
#[derive(Debug, Default)]
pub struct SessionCoordinator {
    lobby_requests: HashSet<SocketAddr>,
    ready_players: HashSet<SocketAddr>,
    start_grants: HashSet<SocketAddr>,
    last_score: Option<u32>,
}

impl SessionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score carried by the most recent `EndGame`.
    pub fn last_score(&self) -> Option<u32> {
        self.last_score
    }

    pub fn lobby_request_count(&self) -> usize {
        self.lobby_requests.len()
    }

    pub fn ready_count(&self) -> usize {
        self.ready_players.len()
    }

    pub fn grant_count(&self) -> usize {
        self.start_grants.len()
    }

    /// Runs one received envelope through the state machine and returns the
    /// effects to apply, in order.
    pub fn handle(&mut self, sender: SocketAddr, envelope: Envelope) -> Vec<Effect> {
        match envelope {
            Envelope::PacmanCoordinates { .. } | Envelope::GhostCoordinates { .. } => {
                vec![Effect::RelayToOther(envelope)]
            }
            Envelope::PacmanSelected | Envelope::GhostSelected => {
                self.ready_players.insert(sender);
                vec![Effect::RelayToOther(envelope)]
            }
            Envelope::EndGame { score } => {
                self.last_score = Some(score);
                vec![Effect::Broadcast(envelope)]
            }
            Envelope::LobbyLoadRequest => {
                self.lobby_requests.insert(sender);
                if self.lobby_requests.len() >= SESSION_SIZE {
                    self.lobby_requests.clear();
                    vec![Effect::Broadcast(Envelope::LobbyLoadGranted)]
                } else {
                    Vec::new()
                }
            }
            Envelope::GameLoadRequest => {
                // The grant set only fills once both players have picked a
                // character; the single StartGame goes out when both clients
                // have asked for it, then both counters reset.
                if self.ready_players.len() >= SESSION_SIZE {
                    self.start_grants.insert(sender);
                    if self.start_grants.len() >= SESSION_SIZE {
                        self.ready_players.clear();
                        self.start_grants.clear();
                        return vec![Effect::Broadcast(Envelope::StartGame)];
                    }
                }
                Vec::new()
            }
            Envelope::Disconnect => {
                self.forget(sender);
                vec![
                    Effect::DropSender,
                    Effect::RelayToOther(Envelope::Disconnect),
                ]
            }
            Envelope::LobbyLoadGranted | Envelope::StartGame => {
                warn!("unrecognized envelope from {}: {:?}", sender, envelope);
                Vec::new()
            }
        }
    }

    /// Clears every trace of a departed client so a half-finished barrier
    /// cannot stay satisfied by a sender that is gone.
    pub fn forget(&mut self, addr: SocketAddr) {
        self.lobby_requests.remove(&addr);
        self.ready_players.remove(&addr);
        self.start_grants.remove(&addr);
    }
}
