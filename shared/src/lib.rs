//! Wire protocol shared by the session server and the game client.
//!
//! Every message on the wire is one [`Envelope`]: the enum variant is the
//! header, the variant's fields are the payload, so a payload that does not
//! match its header is unrepresentable. Envelopes are bincode-encoded and
//! the transport delivers at most one read buffer per receive with no
//! reassembly, so an encoded envelope must always fit [`READ_BUFFER_LEN`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on a single receive call, in bytes.
pub const READ_BUFFER_LEN: usize = 1024;

/// Bound on how long a client-side receive (or send) may block.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_millis(100);

/// One message between a client and the session server.
///
/// Coordinate payloads carry a sprite's top-left pixel; the server treats
/// them as opaque and relays them unchanged.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Envelope {
    PacmanCoordinates { x: i32, y: i32 },
    GhostCoordinates { x: i32, y: i32 },
    PacmanSelected,
    GhostSelected,
    EndGame { score: u32 },
    LobbyLoadRequest,
    LobbyLoadGranted,
    GameLoadRequest,
    StartGame,
    Disconnect,
}

/// Serializes an envelope for transmission.
pub fn encode(envelope: &Envelope) -> bincode::Result<Vec<u8>> {
    bincode::serialize(envelope)
}

/// Deserializes one envelope from a received buffer.
///
/// A truncated or garbled buffer is an error the caller should treat as
/// "no usable message". Bytes past the first envelope are ignored, which
/// matches the transport: there is no framing, so whatever else a read
/// coalesced is dropped.
pub fn decode(bytes: &[u8]) -> bincode::Result<Envelope> {
    bincode::deserialize(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_envelope() -> Vec<Envelope> {
        vec![
            Envelope::PacmanCoordinates { x: 33, y: 30 },
            Envelope::GhostCoordinates { x: -2, y: 480 },
            Envelope::PacmanSelected,
            Envelope::GhostSelected,
            Envelope::EndGame { score: 7 },
            Envelope::LobbyLoadRequest,
            Envelope::LobbyLoadGranted,
            Envelope::GameLoadRequest,
            Envelope::StartGame,
            Envelope::Disconnect,
        ]
    }

    #[test]
    fn round_trip_law_holds_for_every_header() {
        for envelope in every_envelope() {
            let bytes = encode(&envelope).unwrap();
            assert_eq!(decode(&bytes).unwrap(), envelope);
        }
    }

    #[test]
    fn every_encoding_fits_one_read_buffer() {
        for envelope in every_envelope() {
            let bytes = encode(&envelope).unwrap();
            assert!(
                bytes.len() <= READ_BUFFER_LEN,
                "{:?} encodes to {} bytes",
                envelope,
                bytes.len()
            );
        }
    }

    #[test]
    fn truncated_buffer_fails_to_decode() {
        let bytes = encode(&Envelope::PacmanCoordinates { x: 33, y: 30 }).unwrap();
        for len in 0..bytes.len() {
            assert!(decode(&bytes[..len]).is_err(), "decoded a {}-byte prefix", len);
        }
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(decode(&[0xff; 16]).is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn coalesced_buffer_yields_the_first_envelope() {
        // Two envelopes arriving in one read: the first decodes, the rest
        // of the buffer is dropped by design.
        let mut bytes = encode(&Envelope::StartGame).unwrap();
        bytes.extend(encode(&Envelope::Disconnect).unwrap());
        assert_eq!(decode(&bytes).unwrap(), Envelope::StartGame);
    }
}
