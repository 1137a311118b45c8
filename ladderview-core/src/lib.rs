//! Ladderview Core - Playback control for an embedded adaptive video player
//!
//! This crate holds the logic behind a page that plays user-supplied video
//! URLs through an adaptive streaming player: media type detection from the
//! URL and chosen format, one-shot quality selector activation per source,
//! and relabelling of the player's quality menu from the resolution ladder
//! encoded in the URL's query string.

pub mod config;
pub mod controller;
pub mod ladder;
pub mod media_type;
pub mod menu;
pub mod player;
pub mod scheduler;
pub mod session;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{ConfigError, LadderviewConfig};
pub use controller::{ActivationOutcome, PlayForm, PlayRequestError, PlaybackController};
pub use ladder::{LadderError, LadderParser, ResolutionLadder, closest_height, parse_target_heights};
pub use media_type::{MediaType, MediaTypeError, SourceFormat, detect_media_type};
pub use menu::{MenuLabel, QualityMenuItem, relabel_menu};
pub use player::{AdaptivePlayer, MediaSource, PlaybackError, PlayerEvent, QualityLevel};
pub use scheduler::{DeferredTask, SchedulerError, TaskScheduler};
pub use session::{SelectorGate, SessionState};

/// Errors that can bubble up from any Ladderview component.
#[derive(Debug, thiserror::Error)]
pub enum LadderviewError {
    #[error("Play request error: {0}")]
    PlayRequest(#[from] PlayRequestError),

    #[error("Ladder error: {0}")]
    Ladder(#[from] LadderError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaTypeError> for LadderviewError {
    fn from(error: MediaTypeError) -> Self {
        LadderviewError::PlayRequest(PlayRequestError::MediaType(error))
    }
}

impl LadderviewError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            LadderviewError::PlayRequest(e) => match e {
                PlayRequestError::EmptyUrl => "Enter a video URL first".to_string(),
                PlayRequestError::NoFormatSelected => "Choose MP4 or adaptive playback".to_string(),
                PlayRequestError::MediaType(inner) => inner.to_string(),
            },
            LadderviewError::Ladder(_) => "Invalid label configuration".to_string(),
            LadderviewError::Scheduler(_) => "Internal timing error".to_string(),
            LadderviewError::Config(e) => format!("Configuration error: {e}"),
            LadderviewError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(self, LadderviewError::PlayRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, LadderviewError>;
