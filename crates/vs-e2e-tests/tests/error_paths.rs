//! E2E tests for degraded conditions: corrupt broadcasts, undecodable
//! responses, negative responders, and a bus that disappears mid-listen.

mod helpers;

use helpers::VALID_VIN;
use vs_bus::CanHub;
use vs_isotp::MockQuery;
use vs_vin::{ResolverConfig, resolve};

/// Fragments that assemble to a checksum-invalid candidate are discarded
/// and the resolver falls through to the active path.
#[tokio::test(start_paused = true)]
async fn corrupt_fragments_fall_through_to_active() {
    let hub = CanHub::new(16);
    let mut sub = hub.subscribe();
    helpers::publish_fragments(&hub, 1, b"GT999999", b"99999999");

    let mock = MockQuery::new();
    mock.queue_response(0x7E8, VALID_VIN.as_bytes());

    let result = resolve(&mut sub, &mock, &ResolverConfig::default()).await;

    assert_eq!(result.address, 0x7E8);
    assert_eq!(result.vin, VALID_VIN);
    assert_eq!(mock.calls(), 1);
}

/// An all-zero staging buffer corrects to "0" + zeros, which never
/// validates; no frames is handled identically to zero-content frames.
#[tokio::test(start_paused = true)]
async fn all_zero_broadcast_is_not_mistaken_for_a_vin() {
    let hub = CanHub::new(16);
    let mut sub = hub.subscribe();
    helpers::publish_fragments(&hub, 1, b"00000000", b"00000000");

    let mock = MockQuery::new();
    let result = resolve(&mut sub, &mock, &ResolverConfig::default()).await;

    assert!(result.is_unknown());
}

/// A response that isn't text burns the attempt; the next attempt's clean
/// answer resolves.
#[tokio::test(start_paused = true)]
async fn undecodable_response_burns_one_attempt() {
    let hub = CanHub::new(16);
    let mut sub = hub.subscribe();

    let mock = MockQuery::new();
    mock.queue_response(0x7E8, &[0xC3, 0x28, 0x00, 0x01]);
    mock.queue_response(0x7E8, VALID_VIN.as_bytes());

    let result = resolve(&mut sub, &mock, &ResolverConfig::default()).await;

    assert_eq!(result.vin, VALID_VIN);
    assert_eq!(mock.calls(), 2);
}

/// Dropping the hub (transport gone) during the passive window is not
/// fatal: the resolver still runs the active strategy.
#[tokio::test(start_paused = true)]
async fn bus_loss_mid_listen_still_tries_the_active_path() {
    let hub = CanHub::new(16);
    let mut sub = hub.subscribe();
    drop(hub);

    let mock = MockQuery::new();
    mock.queue_response(0x7E8, VALID_VIN.as_bytes());

    let result = resolve(&mut sub, &mock, &ResolverConfig::default()).await;

    assert_eq!(result.address, 0x7E8);
    assert_eq!(result.vin, VALID_VIN);
}

/// A node that only sends negative responses never satisfies the expected
/// response prefix, so every attempt comes back empty and the result is
/// Unknown.
#[tokio::test(start_paused = true)]
async fn negative_responder_yields_unknown() {
    let hub = CanHub::new(32);
    // 0x7F <sid> 0x12: service not supported.
    helpers::spawn_raw_responder(&hub, 1, 0x7E8, vec![0x7F, 0x09, 0x12]);

    let result = vs_vin::get_vin(&hub, &ResolverConfig::default()).await;

    assert!(result.is_unknown());
    assert_eq!(result.address, 0);
}

/// Fragment traffic from a different bus plus a silent engine: nothing
/// resolves, nothing panics.
#[tokio::test(start_paused = true)]
async fn wrong_bus_fragments_and_silence_return_unknown() {
    let hub = CanHub::new(16);
    let mut sub = hub.subscribe();
    helpers::publish_fragments(&hub, 2, helpers::FRAGMENT_A, helpers::FRAGMENT_B);

    let mock = MockQuery::new();
    let result = resolve(&mut sub, &mock, &ResolverConfig::default()).await;

    assert!(result.is_unknown());
}
