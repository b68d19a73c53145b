//! Test-only crate. The integration suite lives in `tests/`.
