//! Active VIN query: OBD-II Mode 09 PID 02 over the functional address
//! class, retried a bounded number of times.

use std::time::Duration;

use vs_bus::types::FUNCTIONAL_ADDRS;
use vs_isotp::{DiagQuery, QuerySpec};

/// Mode 09 PID 02 request: vehicle identification number.
pub const VIN_REQUEST: &[u8] = &[0x09, 0x02];

/// Positive response header for the VIN request.
pub const VIN_RESPONSE_PREFIX: &[u8] = &[0x49, 0x02, 0x01];

/// The VIN exchange, addressed to every diagnostic-capable node.
pub fn vin_query_spec() -> QuerySpec {
    QuerySpec {
        tx_addrs: FUNCTIONAL_ADDRS.to_vec(),
        request: VIN_REQUEST.to_vec(),
        response_prefix: VIN_RESPONSE_PREFIX.to_vec(),
        functional: true,
    }
}

/// Ask whichever node answers for the VIN.
///
/// Runs up to `retries` fresh engine attempts, each bounded by `timeout`.
/// The first well-formed answer wins — the lowest responder address when
/// several nodes reply in one attempt. A transport failure or an
/// undecodable payload burns the attempt and is logged, never propagated.
pub async fn query(
    engine: &dyn DiagQuery,
    bus: u8,
    timeout: Duration,
    retries: u32,
) -> Option<(u32, String)> {
    let spec = vin_query_spec();

    for attempt in 1..=retries {
        match engine.run(bus, &spec, timeout).await {
            Ok(responses) => match responses.into_iter().next() {
                Some((addr, raw)) => match String::from_utf8(raw) {
                    Ok(vin) => {
                        tracing::info!(%vin, "VIN query answered by {addr:#x}");
                        return Some((addr, vin));
                    }
                    Err(e) => {
                        tracing::warn!(attempt, error = %e, "VIN response from {addr:#x} is not text");
                    }
                },
                None => tracing::debug!(attempt, "VIN query unanswered, retrying"),
            },
            Err(e) => tracing::warn!(attempt, error = %e, "VIN query attempt failed"),
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use vs_isotp::MockQuery;

    const TIMEOUT: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn silence_exhausts_every_attempt() {
        let mock = MockQuery::new();

        let result = query(&mock, 1, TIMEOUT, 5).await;

        assert_eq!(result, None);
        assert_eq!(mock.calls(), 5);
    }

    #[tokio::test]
    async fn failures_then_answer_on_fourth_attempt() {
        let mock = MockQuery::new();
        mock.queue_failure("tx buffer full");
        mock.queue_failure("tx buffer full");
        mock.queue_failure("tx buffer full");
        mock.queue_response(0x7E8, b"1HGCM82633A004352");

        let result = query(&mock, 1, TIMEOUT, 5).await;

        assert_eq!(result, Some((0x7E8, "1HGCM82633A004352".to_string())));
        assert_eq!(mock.calls(), 4);
    }

    #[tokio::test]
    async fn lowest_responder_address_wins() {
        let mock = MockQuery::new();
        mock.queue_responses(
            [
                (0x7EAu32, b"WAUZZZ8V5KA000001".to_vec()),
                (0x7E8u32, b"1HGCM82633A004352".to_vec()),
            ]
            .into_iter()
            .collect(),
        );

        let result = query(&mock, 1, TIMEOUT, 5).await;
        assert_eq!(result.unwrap().0, 0x7E8);
    }

    #[tokio::test]
    async fn undecodable_payload_burns_the_attempt() {
        let mock = MockQuery::new();
        mock.queue_response(0x7E8, &[0xFF, 0xFE, 0x00]);
        mock.queue_response(0x7E8, b"1HGCM82633A004352");

        let result = query(&mock, 1, TIMEOUT, 5).await;

        assert_eq!(result, Some((0x7E8, "1HGCM82633A004352".to_string())));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn zero_retries_never_touches_the_engine() {
        let mock = MockQuery::new();
        mock.queue_response(0x7E8, b"1HGCM82633A004352");

        assert_eq!(query(&mock, 1, TIMEOUT, 0).await, None);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn spec_targets_the_functional_class() {
        let mock = MockQuery::new();
        let _ = query(&mock, 1, TIMEOUT, 1).await;

        let spec = &mock.recorded_specs()[0];
        assert_eq!(spec.request, vec![0x09, 0x02]);
        assert_eq!(spec.response_prefix, vec![0x49, 0x02, 0x01]);
        assert_eq!(spec.tx_addrs, FUNCTIONAL_ADDRS.to_vec());
        assert!(spec.functional);
    }
}
