//! ISO-TP-style parallel diagnostic queries.
//!
//! One logical request goes out to an address class (functional broadcast
//! or a set of physical targets); responses come back per responder,
//! possibly segmented across frames. This crate provides:
//! - `DiagQuery` — the trait resolvers program against (mockable in tests)
//! - `IsoTpQueryEngine` — the production engine over a `CanHub`
//! - `MockQuery` — scripted outcomes for testing retry/fallback logic

pub mod engine;
pub mod error;
pub mod mock;

// Re-exports for convenience.
pub use engine::{DiagQuery, IsoTpQueryEngine, QuerySpec, encode_payload};
pub use error::{QueryError, QueryResult};
pub use mock::MockQuery;
