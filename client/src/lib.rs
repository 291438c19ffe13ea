//! # Game client
//!
//! A single cooperative loop walks a linear page sequence — start screen,
//! address and port entry, the synchronization interim, the character
//! lobby, the round itself and the post-game screen — while one bounded
//! network read and one write happen per tick. There is no second execution
//! context: network calls never block longer than the configured timeout,
//! so the frame cadence survives packet loss and a silent server alike.
//!
//! - [`channel`]: the timeout-bounded connection to the session server.
//! - [`phases`]: the page state machine and its session context.
//! - [`sim`]: local movement, collision, teleport and pellet scoring for
//!   the one locally-controlled character; the other character is always a
//!   mirrored position from the network.
//! - [`maze`]: flat-text grid layouts and the wrapping maze cycle.
//! - [`widgets`]: immediate-mode text, buttons and input boxes.

pub mod channel;
pub mod maze;
pub mod phases;
pub mod sim;
pub mod widgets;
