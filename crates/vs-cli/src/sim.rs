//! Simulated vehicle traffic for demos and smoke runs.
//!
//! Two personalities:
//! - `gm`: broadcasts VIN fragments unprompted, exercising the passive path
//! - `obd`: answers Mode 09 PID 02 functional requests over ISO-TP,
//!   exercising the active path

use std::str::FromStr;
use std::time::Duration;

use vs_bus::types::OBD_FUNCTIONAL_ID;
use vs_bus::{CanFrame, CanHub};
use vs_isotp::encode_payload;
use vs_vin::query::VIN_RESPONSE_PREFIX;
use vs_vin::{PassiveConfig, ResolverConfig};

/// Fragments a simulated GM truck broadcasts ("1GT3456789ABCDEF0" minus
/// its leading character).
const DEMO_FRAGMENT_A: &[u8; 8] = b"GT345678";
const DEMO_FRAGMENT_B: &[u8; 8] = b"9ABCDEF0";

/// VIN a simulated OBD-II node reports.
const DEMO_VIN: &[u8] = b"1HGCM82633A004352";

/// Which vehicle personality to simulate.
#[derive(Debug, Clone, Copy)]
pub enum SimMode {
    Gm,
    Obd,
}

impl FromStr for SimMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gm" => Ok(SimMode::Gm),
            "obd" => Ok(SimMode::Obd),
            other => Err(format!("unknown simulation mode: {other} (expected gm or obd)")),
        }
    }
}

/// Spawn the simulated vehicle onto `hub`.
pub fn spawn(hub: &CanHub, config: &ResolverConfig, mode: SimMode) {
    match mode {
        SimMode::Gm => spawn_gm_broadcaster(hub, &config.passive),
        SimMode::Obd => spawn_obd_responder(hub, config.bus),
    }
}

/// Broadcast both VIN fragments every 100 ms, forever.
fn spawn_gm_broadcaster(hub: &CanHub, cfg: &PassiveConfig) {
    let publisher = hub.publisher();
    let (bus, addr_a, addr_b) = (cfg.bus, cfg.fragment_a_addr, cfg.fragment_b_addr);

    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(100));
        loop {
            tick.tick().await;
            publisher.send_batch(vec![
                CanFrame::new(bus, addr_a, DEMO_FRAGMENT_A.to_vec()),
                CanFrame::new(bus, addr_b, DEMO_FRAGMENT_B.to_vec()),
            ]);
        }
    });
}

/// Answer every functional VIN request with a multi-frame ISO-TP response
/// from ECU #1 (0x7E8).
fn spawn_obd_responder(hub: &CanHub, bus: u8) {
    let mut sub = hub.subscribe();
    let publisher = hub.publisher();

    tokio::spawn(async move {
        while let Ok(batch) = sub.recv_batch().await {
            for frame in batch {
                let is_vin_request = frame.bus == bus
                    && frame.address == OBD_FUNCTIONAL_ID
                    && frame.data.starts_with(&[0x02, 0x09, 0x02]);
                if is_vin_request {
                    let mut payload = VIN_RESPONSE_PREFIX.to_vec();
                    payload.extend_from_slice(DEMO_VIN);
                    for out in encode_payload(bus, 0x7E8, &payload) {
                        publisher.send_frame(out);
                    }
                }
            }
        }
    });
}
