//! Ladderview Simulation - Deterministic playback sessions without a browser.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Provides an in-memory stand-in for the embedded adaptive player and a
//! driver that feeds its events into a `PlaybackController`, so event
//! orderings that are hard to reproduce in a real browser (renditions
//! discovered before metadata, deferred tasks outliving their source) can
//! be exercised step by step on a virtual clock.
//!
//! # Example
//!
//! ```rust,no_run
//! use ladderview_core::LadderviewConfig;
//! use ladderview_sim::{Scenario, run_scenario};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scenario = Scenario::new(
//!     "https://cdn.example.com/show.m3u8?tr=sr-360_720",
//!     "adaptive",
//!     Scenario::renditions_from_heights(&[362, 724]),
//! );
//!
//! let report = run_scenario(&LadderviewConfig::default(), &scenario)?;
//! println!("{:?}", report.menu_labels);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod player;
pub mod scenario;

pub use driver::SessionDriver;
pub use player::{SimulatedPlayer, TransportCall};
pub use scenario::{LevelTiming, Scenario, ScenarioReport, run_scenario};

use ladderview_core::{LadderError, PlayRequestError, SchedulerError};

/// Errors raised while running a simulated session.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Controller could not be built from the configuration.
    #[error("controller setup failed: {0}")]
    Ladder(#[from] LadderError),

    /// The scripted play request was rejected.
    #[error("play request rejected: {0}")]
    PlayRequest(#[from] PlayRequestError),

    /// A scripted time step was invalid.
    #[error("invalid time step: {0}")]
    Scheduler(#[from] SchedulerError),
}
