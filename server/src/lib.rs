//! # Session server
//!
//! Pairs exactly two game clients into a shared session and keeps their
//! independently-simulated rounds in lockstep at the key transition points.
//!
//! The server never simulates the game. It does three things:
//!
//! - **Relay**: per-frame coordinate envelopes and character selections are
//!   forwarded verbatim to the other client.
//! - **Barriers**: lobby readiness and round start are gated on "both
//!   clients have asked since the last reset"; the grant is broadcast once
//!   and the counters reset for the next round (see [`session`]).
//! - **Roster**: clients join on accept and leave on an explicit
//!   `Disconnect` or a dead stream; the remaining client is always told
//!   (see [`roster`] and [`network`]).
//!
//! Delivery is best-effort by design: a frame that cannot be written is
//! dropped, and the clients' tick loops tolerate the gap.

pub mod network;
pub mod roster;
pub mod session;
