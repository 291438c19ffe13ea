//! Loose throughput sanity checks: the codec and the coordinator both have
//! to keep up with two clients ticking at 60 Hz with plenty of headroom.

use shared::{decode, encode, Envelope};
use std::time::{Duration, Instant};

#[test]
fn codec_outpaces_a_minute_of_coordinate_traffic() {
    // Two clients at 60 Hz exchange ~7200 frames a minute; round up.
    let started = Instant::now();
    for i in 0..10_000 {
        let envelope = Envelope::PacmanCoordinates {
            x: i % 480,
            y: (i * 7) % 480,
        };
        let bytes = encode(&envelope).unwrap();
        assert_eq!(decode(&bytes).unwrap(), envelope);
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn coordinator_sustains_the_lobby_busy_poll() {
    use server::session::SessionCoordinator;

    let addr_a = "127.0.0.1:8080".parse().unwrap();
    let addr_b = "127.0.0.1:8081".parse().unwrap();
    let mut coordinator = SessionCoordinator::new();

    let started = Instant::now();
    for _ in 0..10_000 {
        coordinator.handle(addr_a, Envelope::GameLoadRequest);
        coordinator.handle(addr_b, Envelope::GameLoadRequest);
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}
