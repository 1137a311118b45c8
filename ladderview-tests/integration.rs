//! Integration tests for Ladderview
//!
//! Drive the playback controller through the simulated player and check the
//! detection, ladder and relabelling rules end to end.

#[path = "integration/detection.rs"]
mod detection;
#[path = "integration/properties.rs"]
mod properties;
#[path = "integration/relabelling.rs"]
mod relabelling;
#[path = "integration/selector_gate.rs"]
mod selector_gate;
#[path = "integration/stale_tasks.rs"]
mod stale_tasks;
