//! The client's connection to the session server.
//!
//! Every failure mode degrades to "no message" or a silent drop; callers
//! never see a raw transport error, only an absent envelope or a `false`
//! connect result.

use log::{debug, info};
use shared::{decode, encode, Envelope, READ_BUFFER_LEN, RECEIVE_TIMEOUT};
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

/// A non-blocking, timeout-bounded duplex byte stream to the server.
#[derive(Default)]
pub struct Channel {
    stream: Option<TcpStream>,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Attempts to connect. Returns false on refusal, an unreachable host
    /// or a malformed address. Success arms the bounded send and receive
    /// timeouts.
    pub fn connect(&mut self, host: &str, port: u16) -> bool {
        let stream = match TcpStream::connect((host, port)) {
            Ok(stream) => stream,
            Err(e) => {
                debug!("connect to {}:{} failed: {}", host, port, e);
                return false;
            }
        };
        if stream.set_read_timeout(Some(RECEIVE_TIMEOUT)).is_err()
            || stream.set_write_timeout(Some(RECEIVE_TIMEOUT)).is_err()
        {
            return false;
        }
        info!("connected to {}:{}", host, port);
        self.stream = Some(stream);
        true
    }

    /// Fire-and-forget send. A dropped or never-opened connection swallows
    /// the envelope; the caller cannot tell delivered from dropped.
    pub fn send(&mut self, envelope: &Envelope) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let Ok(bytes) = encode(envelope) else {
            return;
        };
        if let Err(e) = stream.write_all(&bytes) {
            debug!("send dropped: {}", e);
        }
    }

    /// Blocks for at most the receive timeout. A timeout, an undecodable
    /// buffer and a reset all read as "no message this tick". A cleanly
    /// closed peer additionally drops the stream so later sends become
    /// no-ops.
    pub fn receive(&mut self) -> Option<Envelope> {
        let stream = self.stream.as_mut()?;
        let mut buf = [0u8; READ_BUFFER_LEN];
        match stream.read(&mut buf) {
            Ok(0) => {
                info!("server closed the connection");
                self.stream = None;
                None
            }
            Ok(n) => decode(&buf[..n]).ok(),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => None,
            Err(e) => {
                debug!("receive failed: {}", e);
                None
            }
        }
    }

    /// Best-effort goodbye: tell the peer, then tear the stream down.
    pub fn disconnect(&mut self) {
        self.send(&Envelope::Disconnect);
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::{Duration, Instant};

    /// Accepts the channel's connection and returns the server-side stream
    /// with a read timeout so a misbehaving test fails instead of hanging.
    fn accept(listener: &TcpListener) -> TcpStream {
        let (stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        stream
    }

    fn server_receive(stream: &mut TcpStream) -> Envelope {
        let mut buf = [0u8; READ_BUFFER_LEN];
        let n = stream.read(&mut buf).unwrap();
        decode(&buf[..n]).unwrap()
    }

    #[test]
    fn connect_to_nothing_returns_false() {
        // Grab a port that nothing is listening on.
        let vacated = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut channel = Channel::new();
        assert!(!channel.connect("127.0.0.1", vacated));
        assert!(!channel.is_connected());
    }

    #[test]
    fn connect_with_a_malformed_address_returns_false() {
        let mut channel = Channel::new();
        assert!(!channel.connect("", 80));
    }

    #[test]
    fn send_and_receive_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut channel = Channel::new();
        assert!(channel.connect("127.0.0.1", port));
        let mut server_side = accept(&listener);

        channel.send(&Envelope::LobbyLoadRequest);
        assert_eq!(server_receive(&mut server_side), Envelope::LobbyLoadRequest);

        let bytes = encode(&Envelope::LobbyLoadGranted).unwrap();
        server_side.write_all(&bytes).unwrap();
        // In-flight delivery may take a moment; the bounded read retries.
        let mut received = None;
        for _ in 0..10 {
            received = channel.receive();
            if received.is_some() {
                break;
            }
        }
        assert_eq!(received, Some(Envelope::LobbyLoadGranted));
    }

    #[test]
    fn receive_times_out_quietly() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut channel = Channel::new();
        assert!(channel.connect("127.0.0.1", port));
        let _server_side = accept(&listener);

        let started = Instant::now();
        assert_eq!(channel.receive(), None);
        // Bounded: well past the 100ms timeout counts as a hang.
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn garbage_reads_as_no_message() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut channel = Channel::new();
        assert!(channel.connect("127.0.0.1", port));
        let mut server_side = accept(&listener);

        server_side.write_all(&[0xff; 8]).unwrap();
        for _ in 0..10 {
            assert_eq!(channel.receive(), None);
        }
        assert!(channel.is_connected());
    }

    #[test]
    fn peer_close_drops_the_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut channel = Channel::new();
        assert!(channel.connect("127.0.0.1", port));
        drop(accept(&listener));

        let mut saw_close = false;
        for _ in 0..10 {
            channel.receive();
            if !channel.is_connected() {
                saw_close = true;
                break;
            }
        }
        assert!(saw_close);

        // Sends after the close are silent no-ops.
        channel.send(&Envelope::GameLoadRequest);
        assert_eq!(channel.receive(), None);
    }

    #[test]
    fn disconnect_says_goodbye_first() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut channel = Channel::new();
        assert!(channel.connect("127.0.0.1", port));
        let mut server_side = accept(&listener);

        channel.disconnect();
        assert!(!channel.is_connected());
        assert_eq!(server_receive(&mut server_side), Envelope::Disconnect);
    }
}
