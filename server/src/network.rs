//! Accept loop and per-client read tasks.
//!
//! One task accepts connections and registers slots; every accepted client
//! gets its own read task that feeds decoded envelopes to the coordinator.
//! Roster and counters are mutated from all of those tasks, so both live
//! behind a single mutex. Shutdown is cooperative: every loop watches a
//! shared flag, and read-task handles are joined once the accept loop exits.

use crate::roster::Roster;
use crate::session::{Effect, SessionCoordinator};
use log::{debug, error, info};
use shared::{decode, encode, Envelope, READ_BUFFER_LEN};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Everything the read tasks share: slot add/remove/iterate and the barrier
/// counters happen under this one lock.
#[derive(Default)]
pub struct SessionState {
    pub roster: Roster,
    pub coordinator: SessionCoordinator,
}

pub struct Server {
    listener: TcpListener,
    state: Arc<Mutex<SessionState>>,
    shutdown: watch::Receiver<bool>,
}

impl Server {
    /// Binds the listening socket. Pass the receiving end of a `watch`
    /// channel; sending `true` on it stops the accept loop and every
    /// client task.
    pub async fn bind(addr: &str, shutdown: watch::Receiver<bool>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Server {
            listener,
            state: Arc::new(Mutex::new(SessionState::default())),
            shutdown,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared session state, for inspection from tests and tooling.
    pub fn state(&self) -> Arc<Mutex<SessionState>> {
        Arc::clone(&self.state)
    }

    /// Accepts clients until shutdown, then joins the read tasks.
    pub async fn run(mut self) -> io::Result<()> {
        info!("listening on {}", self.listener.local_addr()?);
        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        info!("new connection: {}", addr);
                        let (read_half, write_half) = stream.into_split();
                        let state = Arc::clone(&self.state);
                        state.lock().await.roster.add(addr, write_half);
                        handles.push(tokio::spawn(client_loop(
                            read_half,
                            addr,
                            state,
                            self.shutdown.clone(),
                        )));
                    }
                    Err(e) => error!("accept failed: {}", e),
                },
                _ = self.shutdown.changed() => break,
            }
        }

        for handle in handles {
            let _ = handle.await;
        }
        info!("server stopped");
        Ok(())
    }
}

/// Read loop for one client. Decoded envelopes go through the coordinator;
/// an undecodable buffer is skipped; EOF or a read error while the slot is
/// still registered counts as a disconnect the client never got to send.
async fn client_loop(
    mut read_half: OwnedReadHalf,
    addr: SocketAddr,
    state: Arc<Mutex<SessionState>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = [0u8; READ_BUFFER_LEN];
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            read = read_half.read(&mut buf) => match read {
                Ok(0) => {
                    vacate(&state, addr, "peer closed the stream").await;
                    break;
                }
                Ok(n) => match decode(&buf[..n]) {
                    Ok(envelope) => {
                        if dispatch(&state, addr, envelope).await {
                            break;
                        }
                    }
                    Err(e) => debug!("undecodable buffer from {}: {}", addr, e),
                },
                Err(e) => {
                    vacate(&state, addr, &e.to_string()).await;
                    break;
                }
            },
        }
    }
}

/// Runs one envelope through the coordinator and applies its effects.
/// Returns true once the sender's slot has been dropped.
async fn dispatch(state: &Mutex<SessionState>, sender: SocketAddr, envelope: Envelope) -> bool {
    let mut session = state.lock().await;
    let effects = session.coordinator.handle(sender, envelope);
    let mut dropped = false;
    for effect in effects {
        match effect {
            Effect::DropSender => {
                if session.roster.remove(sender) {
                    info!("client {} left the session", sender);
                }
                dropped = true;
            }
            Effect::RelayToOther(envelope) => match encode(&envelope) {
                Ok(bytes) => session.roster.relay_to_other(sender, &bytes).await,
                Err(e) => error!("encode failed for {:?}: {}", envelope, e),
            },
            Effect::Broadcast(envelope) => match encode(&envelope) {
                Ok(bytes) => session.roster.broadcast(&bytes).await,
                Err(e) => error!("encode failed for {:?}: {}", envelope, e),
            },
        }
    }
    dropped
}

/// Treats an implicit departure like a received `Disconnect`, but only when
/// the slot is still registered so an explicit disconnect followed by EOF
/// is not processed twice.
async fn vacate(state: &Mutex<SessionState>, addr: SocketAddr, reason: &str) {
    let still_registered = state.lock().await.roster.contains(addr);
    if still_registered {
        debug!("implicit disconnect from {}: {}", addr, reason);
        dispatch(state, addr, Envelope::Disconnect).await;
    }
}
