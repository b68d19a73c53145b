//! VIN acquisition for a vehicle CAN bus.
//!
//! Two complementary strategies, tried in order:
//! 1. **Passive** — some vehicles broadcast VIN fragments unprompted as
//!    part of normal periodic traffic; listen for a bounded window,
//!    reassemble, and validate the check digit.
//! 2. **Active** — an OBD-II Mode 09 PID 02 request to the functional
//!    address class, retried a bounded number of times over an
//!    unreliable exchange.
//!
//! An unresolved VIN is a normal outcome, not an error: the resolver
//! returns address 0 plus an all-zero VIN rather than failing.

pub mod checksum;
pub mod config;
pub mod passive;
pub mod query;
pub mod resolve;

// Re-exports for convenience.
pub use config::{PassiveConfig, ResolverConfig};
pub use resolve::{VIN_UNKNOWN, VinResult, get_vin, resolve};
