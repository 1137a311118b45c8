//! Style Enforcement Tests
//!
//! Scans the workspace crates for patterns clippy does not reject on its own.
//!
//! - `production_code` - No `#[allow(dead_code)]` and no `.unwrap()` outside test modules

#[path = "style/production_code.rs"]
mod production_code;
