//! Parallel diagnostic query engine: request fan-out, per-responder ISO-TP
//! reassembly, and deadline-bounded response collection.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{QueryError, QueryResult};
use vs_bus::types::{
    OBD_FUNCTIONAL_ID, OBD_FUNCTIONAL_ID_29, OBD_RESPONSE_BASE_29, OBD_RESPONSE_ID_MAX,
    OBD_RESPONSE_ID_MIN,
};
use vs_bus::{CanFrame, CanHub, CanPublisher};

// ── Query description ───────────────────────────────────────────

/// One logical diagnostic exchange: what to send, where, and what a
/// well-formed answer starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Addresses the request is transmitted on (functional class or
    /// physical targets).
    pub tx_addrs: Vec<u32>,
    /// Request bytes (service id + parameter), single-frame sized.
    pub request: Vec<u8>,
    /// Expected leading bytes of a positive response; stripped from the
    /// payload handed back to the caller.
    pub response_prefix: Vec<u8>,
    /// Functional (broadcast) addressing: responder count is unknown, so
    /// collection always runs to the deadline.
    pub functional: bool,
}

/// A diagnostic query engine, invoked fresh for every attempt.
///
/// The returned map is keyed by responder arbitration address; `BTreeMap`
/// fixes iteration to ascending address order, so "first responder" is
/// deterministic for callers that only want one answer.
#[async_trait]
pub trait DiagQuery: Send + Sync {
    async fn run(
        &self,
        bus: u8,
        spec: &QuerySpec,
        timeout: Duration,
    ) -> QueryResult<BTreeMap<u32, Vec<u8>>>;
}

// ── ISO-TP framing ──────────────────────────────────────────────

/// Single Frame (upper nibble of byte 0).
const ISOTP_SF: u8 = 0x0;
/// First Frame.
const ISOTP_FF: u8 = 0x1;
/// Consecutive Frame.
const ISOTP_CF: u8 = 0x2;

/// Flow Control frame: ContinueToSend, block_size=0, separation_time=0.
const FLOW_CONTROL_CTS: [u8; 8] = [0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Build the single-frame encoding of a request, zero-padded to 8 bytes.
fn single_frame(request: &[u8]) -> Vec<u8> {
    let mut data = vec![request.len() as u8];
    data.extend_from_slice(request);
    data.resize(8, 0x00);
    data
}

/// Encode an arbitrary payload as ISO-TP frames on `addr`.
///
/// Responder-side helper: single frame when the payload fits, otherwise
/// first frame plus consecutive frames. Used by simulated ECUs and tests.
pub fn encode_payload(bus: u8, addr: u32, payload: &[u8]) -> Vec<CanFrame> {
    if payload.len() <= 7 {
        return vec![CanFrame::new(bus, addr, single_frame(payload))];
    }

    let mut frames = Vec::with_capacity(1 + payload.len() / 7);
    let mut ff = vec![
        0x10 | ((payload.len() >> 8) & 0x0F) as u8,
        (payload.len() & 0xFF) as u8,
    ];
    ff.extend_from_slice(&payload[..6]);
    frames.push(CanFrame::new(bus, addr, ff));

    let mut seq = 1u8;
    for chunk in payload[6..].chunks(7) {
        let mut cf = vec![0x20 | (seq & 0x0F)];
        cf.extend_from_slice(chunk);
        frames.push(CanFrame::new(bus, addr, cf));
        seq = seq.wrapping_add(1);
    }
    frames
}

// ── Response addressing ─────────────────────────────────────────

/// Swap the target/source address bytes of a 29-bit diagnostic CAN ID.
fn swap_29(addr: u32) -> u32 {
    (addr & 0xFFFF_0000) | ((addr & 0xFF) << 8) | ((addr >> 8) & 0xFF)
}

/// Whether `addr` can be a response to a request transmitted on `tx`.
fn responds_to(addr: u32, tx: u32) -> bool {
    match tx {
        OBD_FUNCTIONAL_ID => (OBD_RESPONSE_ID_MIN..=OBD_RESPONSE_ID_MAX).contains(&addr),
        OBD_FUNCTIONAL_ID_29 => addr & 0xFFFF_FF00 == OBD_RESPONSE_BASE_29,
        tx if tx < 0x800 => addr == tx + 8,
        tx => addr == swap_29(tx),
    }
}

/// Address to send flow control on, given the responder's address.
fn flow_control_addr(response_addr: u32) -> u32 {
    if response_addr < 0x800 {
        response_addr - 8
    } else {
        swap_29(response_addr)
    }
}

// ── Reassembly state ────────────────────────────────────────────

/// In-flight multi-frame message for one responder.
struct TpAssembly {
    total: usize,
    buf: Vec<u8>,
    next_seq: u8,
}

/// Feed one frame into the per-responder assembly map. Returns the
/// complete payload when this frame finishes a message.
fn feed(
    pending: &mut HashMap<u32, TpAssembly>,
    frame: &CanFrame,
    publisher: &CanPublisher,
    bus: u8,
) -> Option<Vec<u8>> {
    let data = &frame.data;
    if data.is_empty() {
        return None;
    }

    match (data[0] >> 4) & 0x0F {
        ISOTP_SF => {
            let len = (data[0] & 0x0F) as usize;
            if len == 0 || len + 1 > data.len() {
                tracing::debug!(addr = frame.address, "invalid single-frame length");
                return None;
            }
            pending.remove(&frame.address);
            Some(data[1..1 + len].to_vec())
        }
        ISOTP_FF => {
            if data.len() < 2 {
                return None;
            }
            let total = (((data[0] & 0x0F) as usize) << 8) | data[1] as usize;
            let mut buf = Vec::with_capacity(total);
            buf.extend_from_slice(&data[2..data.len().min(8)]);
            pending.insert(
                frame.address,
                TpAssembly {
                    total,
                    buf,
                    next_seq: 1,
                },
            );
            publisher.send_frame(CanFrame::new(
                bus,
                flow_control_addr(frame.address),
                FLOW_CONTROL_CTS.to_vec(),
            ));
            None
        }
        ISOTP_CF => {
            let Some(assembly) = pending.get_mut(&frame.address) else {
                tracing::debug!(addr = frame.address, "consecutive frame without first frame");
                return None;
            };

            let seq = data[0] & 0x0F;
            if seq != assembly.next_seq & 0x0F {
                tracing::debug!(
                    addr = frame.address,
                    expected = assembly.next_seq,
                    got = seq,
                    "sequence mismatch, dropping responder"
                );
                pending.remove(&frame.address);
                return None;
            }

            let remaining = assembly.total - assembly.buf.len();
            let end = data.len().min(1 + remaining);
            assembly.buf.extend_from_slice(&data[1..end]);
            assembly.next_seq = assembly.next_seq.wrapping_add(1);

            if assembly.buf.len() >= assembly.total {
                if let Some(TpAssembly { total, mut buf, .. }) = pending.remove(&frame.address) {
                    buf.truncate(total);
                    return Some(buf);
                }
            }
            None
        }
        // Flow control and reserved frame types are never responses.
        _ => None,
    }
}

// ── Production engine ───────────────────────────────────────────

/// Query engine over an in-process bus hub.
///
/// Each `run` is a fresh exchange: new subscription, new reassembly state,
/// nothing carried over from a previous attempt.
pub struct IsoTpQueryEngine {
    hub: CanHub,
}

impl IsoTpQueryEngine {
    pub fn new(hub: CanHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl DiagQuery for IsoTpQueryEngine {
    async fn run(
        &self,
        bus: u8,
        spec: &QuerySpec,
        timeout: Duration,
    ) -> QueryResult<BTreeMap<u32, Vec<u8>>> {
        if spec.request.is_empty() || spec.request.len() > 7 {
            return Err(QueryError::Request(format!(
                "request must fit a single frame, got {} bytes",
                spec.request.len()
            )));
        }

        // Subscribe before transmitting so no response frame is missed.
        let mut sub = self.hub.subscribe();
        let publisher = self.hub.publisher();

        for &addr in &spec.tx_addrs {
            tracing::trace!("transmitting request on {addr:#x}");
            publisher.send_frame(CanFrame::new(bus, addr, single_frame(&spec.request)));
        }

        let deadline = Instant::now() + timeout;
        let mut pending: HashMap<u32, TpAssembly> = HashMap::new();
        let mut responses: BTreeMap<u32, Vec<u8>> = BTreeMap::new();

        while let Some(batch) = sub.recv_batch_deadline(deadline).await? {
            for frame in &batch {
                if frame.bus != bus
                    || !spec.tx_addrs.iter().any(|&tx| responds_to(frame.address, tx))
                    || responses.contains_key(&frame.address)
                {
                    continue;
                }

                if let Some(payload) = feed(&mut pending, frame, &publisher, bus) {
                    match payload.strip_prefix(spec.response_prefix.as_slice()) {
                        Some(data) => {
                            tracing::trace!(
                                len = data.len(),
                                "response complete from {:#x}",
                                frame.address
                            );
                            responses.insert(frame.address, data.to_vec());
                        }
                        None => {
                            tracing::debug!(
                                "response prefix mismatch from {:#x}, dropping",
                                frame.address
                            );
                        }
                    }
                }
            }

            // Physical addressing: every target answered, no need to wait
            // out the deadline. Functional responder count is unknown.
            if !spec.functional && responses.len() == spec.tx_addrs.len() {
                break;
            }
        }

        Ok(responses)
    }
}
