//! Event pump connecting a [`SimulatedPlayer`] to a [`PlaybackController`].

use std::time::Duration;

use ladderview_core::{
    LadderviewConfig, MediaSource, PlayForm, PlayRequestError, PlaybackController, QualityLevel,
};

use crate::SimulationError;
use crate::player::SimulatedPlayer;

/// Drives a controller over a simulated player, one host turn at a time.
///
/// Every method that touches the player drains its event queue into the
/// controller before returning, the way a browser would dispatch them on
/// its next turns.
#[derive(Debug)]
pub struct SessionDriver {
    controller: PlaybackController<SimulatedPlayer>,
}

impl SessionDriver {
    /// Creates a driver and delivers the player's `Ready` event.
    ///
    /// # Errors
    ///
    /// - `SimulationError::Ladder` - Label configuration is invalid
    pub fn new(
        player: SimulatedPlayer,
        config: &LadderviewConfig,
    ) -> Result<Self, SimulationError> {
        let mut driver = Self {
            controller: PlaybackController::new(player, config)?,
        };
        driver.pump();
        Ok(driver)
    }

    /// Controller under test.
    pub fn controller(&self) -> &PlaybackController<SimulatedPlayer> {
        &self.controller
    }

    /// Simulated player owned by the controller.
    pub fn player(&self) -> &SimulatedPlayer {
        self.controller.player()
    }

    /// Submits a play form and delivers the resulting load start.
    ///
    /// # Errors
    ///
    /// - `PlayRequestError` - The request failed validation
    pub fn submit(
        &mut self,
        url: &str,
        format: Option<&str>,
    ) -> Result<MediaSource, PlayRequestError> {
        let mut form = PlayForm::new(url, format);
        let result = self.controller.submit(&mut form);
        self.pump();
        result
    }

    /// Lets the player discover renditions, one notification each.
    pub fn discover(&mut self, levels: &[QualityLevel]) {
        for &level in levels {
            self.controller.player_mut().discover_rendition(level);
            self.pump();
        }
    }

    /// Delivers the metadata-loaded event.
    pub fn load_metadata(&mut self) {
        self.controller.player_mut().finish_metadata();
        self.pump();
    }

    /// Advances virtual time, running due deferred tasks.
    ///
    /// # Errors
    ///
    /// - `SimulationError::Scheduler` - Step exceeds the clock limit
    pub fn advance(&mut self, elapsed: Duration) -> Result<usize, SimulationError> {
        Ok(self.controller.advance(elapsed)?)
    }

    /// Runs every pending deferred task.
    pub fn settle(&mut self) -> usize {
        self.controller.run_until_idle()
    }

    /// Current selector menu labels, empty when not rendered.
    pub fn menu_labels(&self) -> Vec<String> {
        self.player().menu_labels().unwrap_or_default()
    }

    /// Delivers queued player events to the controller. Returns how many.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.controller.player_mut().next_event() {
            tracing::trace!(event = event.as_str(), "Delivering player event");
            self.controller.handle_event(event);
            delivered += 1;
        }
        delivered
    }
}
