//! Load tests for the pairing engine and relay router

use server::pairing::{CounterPairing, Pairing};
use server::registry::ChannelRegistry;
use server::relay::RelayRouter;
use shared::ChannelId;
use std::time::Instant;

/// Benchmarks pairing throughput while checking room consistency
#[test]
fn load_test_mass_pairing() {
    let mut pairing = CounterPairing::new();
    let mut router = RelayRouter::new();

    let channels = 10_000;
    let start = Instant::now();

    let mut rooms_opened = 0;
    for channel in 1..=channels {
        if let Some(paired) = pairing.on_ready(channel).unwrap() {
            router.open_room(&paired).unwrap();
            rooms_opened += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Pairing: {} channels into {} rooms in {:?} ({:.2} μs/ready)",
        channels,
        rooms_opened,
        duration,
        duration.as_micros() as f64 / channels as f64
    );

    assert_eq!(rooms_opened, channels as usize / 2);
    assert_eq!(router.active_rooms(), rooms_opened);

    // Every even arrival pairs with the odd arrival right before it
    for channel in (2..=channels).step_by(2) {
        assert_eq!(router.opponent_of(channel), Some(channel - 1));
    }

    // Should pair 10k channels in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks opponent lookups across many active rooms
#[test]
fn load_test_relay_lookup_throughput() {
    let mut pairing = CounterPairing::new();
    let mut router = RelayRouter::new();

    for channel in 1..=2_000u32 {
        if let Some(paired) = pairing.on_ready(channel).unwrap() {
            router.open_room(&paired).unwrap();
        }
    }

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let sender = (i % 2_000) as ChannelId + 1;
        let _ = router.opponent_of(sender);
    }

    let duration = start.elapsed();
    println!(
        "Relay lookups: {} lookups in {:?} ({:.2} ns/lookup)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 100ms for 100k lookups
    assert!(duration.as_millis() < 100);
}

/// Stress tests pairing under interleaved abandons
#[test]
fn stress_test_pairing_with_churn() {
    let mut pairing = CounterPairing::new();
    let mut router = RelayRouter::new();

    let channels = 3_000u32;
    let start = Instant::now();

    let mut rooms = Vec::new();
    for channel in 1..=channels {
        match pairing.on_ready(channel).unwrap() {
            Some(paired) => {
                router.open_room(&paired).unwrap();
                rooms.push(paired);
            }
            None => {
                // Every fifth waiting channel gives up immediately
                if channel % 5 == 0 {
                    pairing.abandon(channel);
                }
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Churn: {} readies with abandons in {:?}, {} rooms survived",
        channels,
        duration,
        rooms.len()
    );

    // No channel appears in two rooms and no room pairs a channel with itself
    let mut seen = std::collections::HashSet::new();
    for room in &rooms {
        assert_ne!(room.members[0], room.members[1]);
        for member in room.members {
            assert!(seen.insert(member), "channel {} paired twice", member);
        }
    }

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks registry registration and timeout sweeps at scale
#[test]
fn load_test_registry_sweep() {
    use std::time::Duration;

    let mut registry = ChannelRegistry::new();

    for i in 0..5_000 {
        let addr = format!("127.0.0.1:{}", 10_000 + i).parse().unwrap();
        registry.register(addr);
    }

    let iterations = 100;
    let start = Instant::now();

    for _ in 0..iterations {
        // Generous timeout so nothing actually expires during the sweep
        let timed_out = registry.check_timeouts(Duration::from_secs(3600));
        assert!(timed_out.is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Registry sweep: {} channels × {} sweeps in {:?} ({:.2} μs/sweep)",
        registry.len(),
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should sweep 5k channels 100 times in under 500ms
    assert!(duration.as_millis() < 500);
}
