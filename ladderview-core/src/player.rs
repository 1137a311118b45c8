//! Abstractions over the embedded adaptive video player.
//!
//! The player does the actual streaming work: rendition switching,
//! buffering and decoding, and it renders its own quality selector menu.
//! The controller only needs the narrow surface described here, so the
//! browser binding and the simulated player in `ladderview-sim` are
//! interchangeable.

use serde::Serialize;
use thiserror::Error;

use crate::media_type::MediaType;
use crate::menu::MenuLabel;

/// Lifecycle notifications emitted by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerEvent {
    /// Player finished initialising and can accept listeners
    Ready,
    /// A new source started loading
    LoadStart,
    /// Duration and dimensions of the current source are known
    LoadedMetadata,
    /// The adaptive engine discovered another rendition
    QualityLevelAdded,
}

impl PlayerEvent {
    /// Returns string representation of event type for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerEvent::Ready => "ready",
            PlayerEvent::LoadStart => "loadstart",
            PlayerEvent::LoadedMetadata => "loadedmetadata",
            PlayerEvent::QualityLevelAdded => "addqualitylevel",
        }
    }
}

/// Descriptive metadata of one rendition, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityLevel {
    pub height: u32,
    pub width: u32,
    /// Bits per second
    pub bitrate: u64,
}

impl QualityLevel {
    pub fn new(width: u32, height: u32, bitrate: u64) -> Self {
        Self {
            height,
            width,
            bitrate,
        }
    }
}

/// Source assignment handed to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub url: String,
    pub media_type: MediaType,
}

impl MediaSource {
    pub fn new(url: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            url: url.into(),
            media_type,
        }
    }

    /// MIME type string for the player's source object.
    pub fn mime_type(&self) -> &'static str {
        self.media_type.mime_type()
    }
}

/// Errors reported by the player's transport controls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The host refused to start playback, e.g. an autoplay policy.
    #[error("playback start rejected: {reason}")]
    PlayRejected {
        /// Reason given by the player.
        reason: String,
    },

    /// No source is assigned.
    #[error("no source assigned")]
    NoSource,
}

/// Surface of the embedded adaptive player used by the controller.
///
/// Capability probes return `false`/`None` when the corresponding plugin is
/// not installed; that is a skipped feature, not an error.
pub trait AdaptivePlayer {
    /// Writable text element of one rendered selector menu item.
    type Label: MenuLabel;

    /// Checks whether the multi-rendition selector plugin is installed.
    fn has_source_selector(&self) -> bool;

    /// Returns the current quality levels, or `None` when the enumeration
    /// API is not available.
    fn quality_levels(&self) -> Option<Vec<QualityLevel>>;

    /// Activates the selector UI with `default_option` preselected.
    fn activate_source_selector(&mut self, default_option: &str);

    /// Returns the rendered selector menu items, or `None` when the
    /// selector button has not been rendered.
    fn selector_menu(&mut self) -> Option<&mut [Self::Label]>;

    /// Assigns a new source.
    fn set_source(&mut self, source: &MediaSource);

    /// Starts playback of the current source.
    ///
    /// # Errors
    ///
    /// - `PlaybackError::PlayRejected` - The host refused to start playback
    /// - `PlaybackError::NoSource` - No source is assigned
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// Drops the current source and returns the player to its initial state.
    fn reset(&mut self);
}
