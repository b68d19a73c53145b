//! Shared fixtures for the e2e suite: known-good VINs, broadcast fragment
//! publishing, and scripted responder tasks over a real hub.
#![allow(dead_code)]

use vs_bus::types::OBD_FUNCTIONAL_ID;
use vs_bus::{CanFrame, CanHub};
use vs_isotp::encode_payload;
use vs_vin::query::VIN_RESPONSE_PREFIX;

/// Check-digit-valid VIN used by simulated OBD-II responders.
pub const VALID_VIN: &str = "1HGCM82633A004352";

/// VIN assembled from the broadcast fragments below after the "GT" → "1"
/// leading-character correction.
pub const BROADCAST_VIN: &str = "1GT3456789ABCDEF0";

pub const FRAGMENT_A: &[u8; 8] = b"GT345678";
pub const FRAGMENT_B: &[u8; 8] = b"9ABCDEF0";

/// Publish one broadcast of both VIN fragments at the default GM addresses.
pub fn publish_fragments(hub: &CanHub, bus: u8, a: &[u8], b: &[u8]) {
    hub.publisher().send_batch(vec![
        CanFrame::new(bus, 0x741, a.to_vec()),
        CanFrame::new(bus, 0x743, b.to_vec()),
    ]);
}

/// Spawn a node at `addr` answering every functional VIN request with
/// `vin` behind the positive response header, segmented over ISO-TP.
pub fn spawn_vin_responder(hub: &CanHub, bus: u8, addr: u32, vin: &[u8]) {
    let mut payload = VIN_RESPONSE_PREFIX.to_vec();
    payload.extend_from_slice(vin);
    spawn_raw_responder(hub, bus, addr, payload);
}

/// Spawn a node at `addr` answering every functional request with a raw
/// payload — no header prepended, so negative responses fit too.
pub fn spawn_raw_responder(hub: &CanHub, bus: u8, addr: u32, payload: Vec<u8>) {
    let mut sub = hub.subscribe();
    let publisher = hub.publisher();
    tokio::spawn(async move {
        while let Ok(batch) = sub.recv_batch().await {
            for frame in batch {
                if frame.bus == bus && frame.address == OBD_FUNCTIONAL_ID {
                    for out in encode_payload(bus, addr, &payload) {
                        publisher.send_frame(out);
                    }
                }
            }
        }
    });
}
