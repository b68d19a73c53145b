//! Two-stage VIN resolution: listen first, ask second.

use serde::{Deserialize, Serialize};

use crate::config::ResolverConfig;
use crate::{passive, query};
use vs_bus::{CanHub, CanSubscriber};
use vs_isotp::{DiagQuery, IsoTpQueryEngine};

/// Sentinel VIN for an unresolved vehicle: seventeen zeros.
pub const VIN_UNKNOWN: &str = "00000000000000000";

/// Outcome of a resolution attempt.
///
/// Invariant: address 0 pairs with the sentinel VIN and nothing else; a
/// real VIN always carries the address it came from (the fragment-A
/// broadcast address for the passive path, the responding node for the
/// active path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VinResult {
    /// Responding node, or 0 when unresolved.
    pub address: u32,
    /// Validated 17-character VIN, or the all-zero sentinel.
    pub vin: String,
}

impl VinResult {
    /// The "could not determine VIN" outcome. Normal, not exceptional.
    pub fn unknown() -> Self {
        Self {
            address: 0,
            vin: VIN_UNKNOWN.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.vin == VIN_UNKNOWN
    }
}

/// Resolve the VIN: passive broadcast window first, active query second.
///
/// The engine is never touched when the passive path succeeds. Both
/// strategies failing is a normal outcome and yields
/// [`VinResult::unknown`].
pub async fn resolve(
    sub: &mut CanSubscriber,
    engine: &dyn DiagQuery,
    cfg: &ResolverConfig,
) -> VinResult {
    if let Some(vin) = passive::listen(sub, &cfg.passive, cfg.passive_window()).await {
        return VinResult {
            address: cfg.passive.fragment_a_addr,
            vin,
        };
    }

    match query::query(engine, cfg.bus, cfg.query_timeout(), cfg.query_retries).await {
        Some((address, vin)) => VinResult { address, vin },
        None => VinResult::unknown(),
    }
}

/// Single-call surface: subscribe to `hub`, build the production ISO-TP
/// engine over it, and run the two-stage resolution.
pub async fn get_vin(hub: &CanHub, cfg: &ResolverConfig) -> VinResult {
    let mut sub = hub.subscribe();
    let engine = IsoTpQueryEngine::new(hub.clone());
    resolve(&mut sub, &engine, cfg).await
}
