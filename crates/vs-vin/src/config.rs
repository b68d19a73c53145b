//! Resolver configuration, loadable from TOML or built from defaults.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

// ── Passive listener ────────────────────────────────────────────

/// Passive broadcast-listener parameters.
///
/// The defaults cover GM's convention: two 8-character VIN fragments
/// broadcast unprompted at fixed arbitration addresses, with the leading
/// VIN character omitted on the wire and recovered from a lookup keyed by
/// the two characters that follow it. Other manufacturers are a matter of
/// configuration, not code.
#[derive(Debug, Clone, Deserialize)]
pub struct PassiveConfig {
    /// Source bus the fragments appear on.
    #[serde(default = "default_bus")]
    pub bus: u8,
    /// Address of the fragment carrying VIN characters 2–9.
    #[serde(default = "default_fragment_a_addr")]
    pub fragment_a_addr: u32,
    /// Address of the fragment carrying VIN characters 10–17.
    #[serde(default = "default_fragment_b_addr")]
    pub fragment_b_addr: u32,
    /// Leading-character correction, keyed by the first two characters of
    /// the assembled fragment buffer. Unmatched prefixes fall back to "0".
    #[serde(default = "default_first_char_map")]
    pub first_char_map: BTreeMap<String, String>,
}

fn default_bus() -> u8 {
    1
}

fn default_fragment_a_addr() -> u32 {
    0x741
}

fn default_fragment_b_addr() -> u32 {
    0x743
}

fn default_first_char_map() -> BTreeMap<String, String> {
    // North-American GM prefixes map to region '1'; Opel/Vauxhall built
    // trucks ("0L") to 'W'. Mexican-built GM vehicles are a known gap.
    [("GT", "1"), ("G1", "1"), ("G4", "1"), ("G6", "1"), ("0L", "W")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for PassiveConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            fragment_a_addr: default_fragment_a_addr(),
            fragment_b_addr: default_fragment_b_addr(),
            first_char_map: default_first_char_map(),
        }
    }
}

// ── Resolver ────────────────────────────────────────────────────

/// Top-level resolver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Bus the active diagnostic query is transmitted on.
    #[serde(default = "default_bus")]
    pub bus: u8,
    /// Passive listen window in milliseconds.
    #[serde(default = "default_passive_window_ms")]
    pub passive_window_ms: u64,
    /// Per-attempt response collection bound for the active query.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Active query attempts before giving up.
    #[serde(default = "default_query_retries")]
    pub query_retries: u32,
    /// Passive listener parameters.
    #[serde(default)]
    pub passive: PassiveConfig,
}

fn default_passive_window_ms() -> u64 {
    1500
}

fn default_query_timeout_ms() -> u64 {
    100
}

fn default_query_retries() -> u32 {
    5
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            passive_window_ms: default_passive_window_ms(),
            query_timeout_ms: default_query_timeout_ms(),
            query_retries: default_query_retries(),
            passive: PassiveConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn passive_window(&self) -> Duration {
        Duration::from_millis(self.passive_window_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
