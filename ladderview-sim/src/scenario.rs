//! Scripted playback sessions.
//!
//! A [`Scenario`] describes one play request and how the stream reveals its
//! renditions; [`run_scenario`] plays it against a fresh simulated player
//! and reports the resulting menu.

use std::time::Duration;

use ladderview_core::{AdaptivePlayer, LadderviewConfig, QualityLevel};
use serde::Serialize;

use crate::SimulationError;
use crate::driver::SessionDriver;
use crate::player::SimulatedPlayer;

/// When the stream's renditions become known relative to metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelTiming {
    /// All renditions are announced before metadata loads
    BeforeMetadata,
    /// Renditions are announced this long after metadata loads
    AfterMetadata(Duration),
}

/// One scripted play request.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// URL typed into the play form
    pub url: String,
    /// Format radio value
    pub format: String,
    /// Renditions the stream reveals, in discovery order
    pub renditions: Vec<QualityLevel>,
    /// When the renditions are revealed
    pub timing: LevelTiming,
    /// Whether the selector plugin is installed
    pub selector_plugin: bool,
    /// Whether quality level enumeration is installed
    pub quality_plugin: bool,
}

impl Scenario {
    /// Scenario with both plugins and renditions announced up front.
    pub fn new(
        url: impl Into<String>,
        format: impl Into<String>,
        renditions: Vec<QualityLevel>,
    ) -> Self {
        Self {
            url: url.into(),
            format: format.into(),
            renditions,
            timing: LevelTiming::BeforeMetadata,
            selector_plugin: true,
            quality_plugin: true,
        }
    }

    /// Replaces the rendition timing.
    pub fn with_timing(mut self, timing: LevelTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Builds renditions from heights with 16:9 widths and a nominal bitrate.
    pub fn renditions_from_heights(heights: &[u32]) -> Vec<QualityLevel> {
        heights
            .iter()
            .map(|&height| {
                let width = height.saturating_mul(16) / 9;
                QualityLevel::new(width, height, u64::from(width) * u64::from(height) * 3)
            })
            .collect()
    }

    fn player(&self) -> SimulatedPlayer {
        let mut player = SimulatedPlayer::new();
        if !self.selector_plugin {
            player = player.without_selector_plugin();
        }
        if !self.quality_plugin {
            player = player.without_quality_levels();
        }
        player
    }
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// MIME type the source was assigned with
    pub mime_type: String,
    /// Selector activations over the whole run
    pub activations: u64,
    /// Final menu labels, empty when the selector never rendered
    pub menu_labels: Vec<String>,
    /// Renditions the player ended up with
    pub quality_levels: Vec<QualityLevel>,
    /// Virtual time when the last deferred task ran
    pub elapsed_ms: u64,
}

/// Plays `scenario` to completion on a fresh simulated player.
///
/// # Errors
///
/// - `SimulationError::PlayRequest` - URL and format were rejected
/// - `SimulationError::Ladder` - Label configuration is invalid
/// - `SimulationError::Scheduler` - A timing step exceeded the clock limit
pub fn run_scenario(
    config: &LadderviewConfig,
    scenario: &Scenario,
) -> Result<ScenarioReport, SimulationError> {
    let mut driver = SessionDriver::new(scenario.player(), config)?;
    let source = driver.submit(&scenario.url, Some(&scenario.format))?;

    match scenario.timing {
        LevelTiming::BeforeMetadata => {
            driver.discover(&scenario.renditions);
            driver.load_metadata();
        }
        LevelTiming::AfterMetadata(delay) => {
            driver.load_metadata();
            driver.advance(delay)?;
            driver.discover(&scenario.renditions);
        }
    }
    driver.settle();

    let controller = driver.controller();
    Ok(ScenarioReport {
        mime_type: source.mime_type().to_string(),
        activations: controller.activation_count(),
        menu_labels: driver.menu_labels(),
        quality_levels: driver.player().quality_levels().unwrap_or_default(),
        elapsed_ms: u64::try_from(controller.now().as_millis()).unwrap_or(u64::MAX),
    })
}
