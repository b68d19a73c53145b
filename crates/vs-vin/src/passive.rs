//! Passive VIN assembly from unprompted broadcast fragments.
//!
//! Some vehicles (GM's convention by default) periodically broadcast the
//! VIN in two 8-character fragments at fixed arbitration addresses, minus
//! the leading character. This listener drains the bus for a bounded
//! window, overlays whatever fragments arrive onto a staging buffer,
//! restores the leading character from the correction table, and accepts
//! the result only if the check digit validates.

use std::time::Duration;

use tokio::time::Instant;

use crate::checksum;
use crate::config::PassiveConfig;
use vs_bus::CanSubscriber;

/// Leading character used when the correction table has no entry for the
/// observed fragment prefix.
const FALLBACK_FIRST_CHAR: &str = "0";

/// Fragment payloads must be exactly 8 printable characters.
fn fragment_text(data: &[u8]) -> Option<&[u8; 8]> {
    let bytes: &[u8; 8] = data.try_into().ok()?;
    bytes.iter().all(|b| b.is_ascii_graphic()).then_some(bytes)
}

/// Listen for broadcast VIN fragments until `window` elapses.
///
/// The window is a hard deadline on waiting for traffic; a batch already
/// delivered is still processed in full. Later fragments overwrite
/// earlier ones, so the staging buffer always reflects the most recent
/// broadcast of each half.
///
/// Returns the assembled VIN only if its check digit validates.
pub async fn listen(
    sub: &mut CanSubscriber,
    cfg: &PassiveConfig,
    window: Duration,
) -> Option<String> {
    let deadline = Instant::now() + window;
    let mut staging = *b"0000000000000000";
    let mut part_a: u32 = 0;
    let mut part_b: u32 = 0;

    loop {
        let batch = match sub.recv_batch_deadline(deadline).await {
            Ok(Some(batch)) => batch,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "bus went away during listen window");
                break;
            }
        };

        for frame in batch {
            if frame.bus != cfg.bus {
                continue;
            }
            if frame.address == cfg.fragment_a_addr {
                if let Some(text) = fragment_text(&frame.data) {
                    staging[..8].copy_from_slice(text);
                    part_a += 1;
                } else {
                    tracing::debug!(addr = frame.address, "unreadable fragment payload, skipped");
                }
            } else if frame.address == cfg.fragment_b_addr {
                if let Some(text) = fragment_text(&frame.data) {
                    staging[8..].copy_from_slice(text);
                    part_b += 1;
                } else {
                    tracing::debug!(addr = frame.address, "unreadable fragment payload, skipped");
                }
            }
        }
    }

    // The counters are diagnostic only: the check digit alone gates
    // acceptance, so a single stale fragment that still validates passes.
    tracing::debug!(part_a, part_b, "listen window closed");

    let staging = std::str::from_utf8(&staging).ok()?;
    let first = cfg
        .first_char_map
        .get(&staging[..2])
        .map(String::as_str)
        .unwrap_or(FALLBACK_FIRST_CHAR);
    let candidate = format!("{first}{staging}");

    if checksum::check_digit_valid(&candidate) {
        tracing::info!(vin = %candidate, "assembled broadcast VIN");
        Some(candidate)
    } else {
        None
    }
}
