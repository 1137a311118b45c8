//! Playback controller.
//!
//! Wires play requests and player lifecycle events to media type detection,
//! selector activation and quality menu relabelling. Everything runs on the
//! host's single event loop: the host feeds [`PlayerEvent`]s into
//! [`PlaybackController::handle_event`] and advances virtual time with
//! [`PlaybackController::advance`], which runs deferred tasks as they come
//! due.
//!
//! Deferred tasks are never cancelled. A task scheduled for one source may
//! run after the next source has started; it then re-checks the gate and
//! re-reads the menu, so at worst it does nothing useful.

use std::time::Duration;

use thiserror::Error;

use crate::config::{LadderviewConfig, SelectorConfig};
use crate::ladder::{LadderError, LadderParser};
use crate::media_type::{MediaTypeError, detect_media_type};
use crate::menu::relabel_menu;
use crate::player::{AdaptivePlayer, MediaSource, PlayerEvent};
use crate::scheduler::{DeferredTask, ScheduledTask, SchedulerError, TaskScheduler};
use crate::session::SessionState;

/// Errors that stop a play request before the player is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayRequestError {
    /// URL field is empty after trimming.
    #[error("no video URL entered")]
    EmptyUrl,

    /// No playback format was chosen.
    #[error("no playback format selected")]
    NoFormatSelected,

    /// URL and format do not agree.
    #[error(transparent)]
    MediaType(#[from] MediaTypeError),
}

/// Values submitted by the page's play form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayForm {
    /// Text of the URL input
    pub url: String,
    /// Checked format radio value, if any
    pub format: Option<String>,
}

impl PlayForm {
    pub fn new(url: impl Into<String>, format: Option<&str>) -> Self {
        Self {
            url: url.into(),
            format: format.map(str::to_string),
        }
    }
}

/// Which branch a selector activation attempt took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Selector already activated for the current source
    AlreadyActive,
    /// Selector plugin is not installed
    SelectorUnavailable,
    /// Quality level enumeration is not installed
    QualityLevelsUnavailable,
    /// Not enough renditions discovered yet
    TooFewRenditions { found: usize, required: usize },
    /// Selector was activated by this attempt
    Activated { renditions: usize },
}

impl ActivationOutcome {
    pub fn is_activated(self) -> bool {
        matches!(self, ActivationOutcome::Activated { .. })
    }
}

/// Drives one embedded player for the lifetime of the page.
#[derive(Debug)]
pub struct PlaybackController<P: AdaptivePlayer> {
    player: P,
    selector: SelectorConfig,
    parser: LadderParser,
    session: SessionState,
    scheduler: TaskScheduler,
    listening: bool,
    quality_events_bound: bool,
    activations: u64,
}

impl<P: AdaptivePlayer> PlaybackController<P> {
    /// Creates a controller for `player`.
    ///
    /// # Errors
    ///
    /// - `LadderError` - Label configuration does not yield a valid hint parser
    pub fn new(player: P, config: &LadderviewConfig) -> Result<Self, LadderError> {
        Ok(Self {
            player,
            selector: config.selector.clone(),
            parser: LadderParser::new(&config.labels)?,
            session: SessionState::new(),
            scheduler: TaskScheduler::new(),
            listening: false,
            quality_events_bound: false,
            activations: 0,
        })
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Number of successful selector activations since creation.
    pub fn activation_count(&self) -> u64 {
        self.activations
    }

    /// Submits the play form and clears its URL field on success.
    ///
    /// # Errors
    ///
    /// Same as [`PlaybackController::request_play`]; the form is left
    /// untouched on error.
    pub fn submit(&mut self, form: &mut PlayForm) -> Result<MediaSource, PlayRequestError> {
        let source = self.request_play(&form.url, form.format.as_deref())?;
        form.url.clear();
        Ok(source)
    }

    /// Validates a play request and replaces the player's source.
    ///
    /// The previous source is paused and reset before the new one is
    /// assigned and playback is requested. A rejected play call is ignored.
    ///
    /// # Errors
    ///
    /// - `PlayRequestError::EmptyUrl` - URL is empty after trimming
    /// - `PlayRequestError::NoFormatSelected` - No format value given
    /// - `PlayRequestError::MediaType` - URL extension does not match the format
    pub fn request_play(
        &mut self,
        url: &str,
        format: Option<&str>,
    ) -> Result<MediaSource, PlayRequestError> {
        let url = url.trim();
        if url.is_empty() {
            tracing::warn!("Play request ignored: empty URL");
            return Err(PlayRequestError::EmptyUrl);
        }

        let Some(format) = format else {
            tracing::warn!(url, "Play request ignored: no format selected");
            return Err(PlayRequestError::NoFormatSelected);
        };

        let media_type = detect_media_type(url, format).inspect_err(|e| {
            tracing::warn!(url, format, "{e}");
        })?;

        self.session.set_label_source(url);
        let source = MediaSource::new(url, media_type);

        self.player.pause();
        self.player.reset();
        self.player.set_source(&source);

        if let Err(e) = self.player.play() {
            tracing::debug!(error = %e, "Ignoring failed playback start");
        }

        tracing::info!(url, mime_type = source.mime_type(), "Assigned new source");
        Ok(source)
    }

    /// Reacts to a player lifecycle event.
    ///
    /// Events other than `Ready` are ignored until the player has reported
    /// ready, since listeners are attached only then.
    pub fn handle_event(&mut self, event: PlayerEvent) {
        if !self.listening && event != PlayerEvent::Ready {
            tracing::debug!(event = event.as_str(), "Ignoring event before player ready");
            return;
        }

        match event {
            PlayerEvent::Ready => self.attach(),
            PlayerEvent::LoadStart => {
                self.session.begin_source();
                tracing::debug!(
                    generation = self.session.source_generation(),
                    "Source load started, selector gate reset"
                );
            }
            PlayerEvent::LoadedMetadata => {
                self.init_selector_if_possible();

                let generation = self.session.source_generation();
                self.scheduler.schedule(
                    self.selector.init_retry_delay,
                    DeferredTask::RetrySelectorInit,
                    generation,
                );
                self.scheduler.schedule(
                    self.selector.label_reapply_delay,
                    DeferredTask::ApplyLabels,
                    generation,
                );
            }
            PlayerEvent::QualityLevelAdded => {
                if self.quality_events_bound {
                    self.init_selector_if_possible();
                }
            }
        }
    }

    fn attach(&mut self) {
        if self.listening {
            return;
        }

        self.listening = true;
        self.quality_events_bound = self.player.quality_levels().is_some();
        tracing::debug!(
            quality_events = self.quality_events_bound,
            "Player ready, listeners attached"
        );
    }

    /// Activates the quality selector once per source when the stream
    /// offers enough renditions.
    ///
    /// Safe to call any number of times; only the first successful call
    /// after a source start has side effects.
    pub fn init_selector_if_possible(&mut self) -> ActivationOutcome {
        if self.session.is_selector_ready() {
            return ActivationOutcome::AlreadyActive;
        }

        if !self.player.has_source_selector() {
            tracing::warn!("Quality selector plugin not available");
            return ActivationOutcome::SelectorUnavailable;
        }

        let Some(levels) = self.player.quality_levels() else {
            tracing::warn!("Quality levels plugin not available");
            return ActivationOutcome::QualityLevelsUnavailable;
        };

        if levels.len() < self.selector.min_renditions {
            return ActivationOutcome::TooFewRenditions {
                found: levels.len(),
                required: self.selector.min_renditions,
            };
        }

        self.player
            .activate_source_selector(&self.selector.default_option);
        self.session.mark_selector_ready();
        self.activations += 1;

        self.scheduler.schedule(
            self.selector.post_activation_label_delay,
            DeferredTask::ApplyLabels,
            self.session.source_generation(),
        );

        tracing::info!(count = levels.len(), "Quality levels found");
        for (index, level) in levels.iter().enumerate() {
            tracing::info!(
                index,
                height = level.height,
                width = level.width,
                bitrate = level.bitrate,
                "Quality level"
            );
        }

        ActivationOutcome::Activated {
            renditions: levels.len(),
        }
    }

    /// Rewrites the rendered quality menu from the last accepted URL.
    ///
    /// Returns the number of labels changed. Missing URL, missing hint and
    /// an unrendered or empty menu all result in zero.
    pub fn apply_labels(&mut self) -> usize {
        let Some(url) = self.session.label_source() else {
            return 0;
        };

        let ladder = self.parser.parse(url);
        if ladder.is_empty() {
            return 0;
        }

        let Some(items) = self.player.selector_menu() else {
            tracing::debug!("Quality selector menu not rendered, skipping relabel");
            return 0;
        };

        if items.is_empty() {
            return 0;
        }

        relabel_menu(items, &ladder)
    }

    /// Advances virtual time by `elapsed`, running every task that comes due.
    ///
    /// Tasks scheduled while running, such as the relabel pass queued by a
    /// successful activation, run in the same call if they are due in
    /// time. Returns the number of tasks run.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::AdvanceTooLarge` - `elapsed` exceeds 24 hours
    pub fn advance(&mut self, elapsed: Duration) -> Result<usize, SchedulerError> {
        let target = self.scheduler.target_after(elapsed)?;

        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(target) {
            self.run_task(task);
            ran += 1;
        }

        self.scheduler.advance_to(target)?;
        Ok(ran)
    }

    /// Runs pending tasks in due order until the queue is empty.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(Duration::MAX) {
            self.run_task(task);
            ran += 1;
        }
        ran
    }

    fn run_task(&mut self, scheduled: ScheduledTask) {
        if scheduled.generation != self.session.source_generation() {
            tracing::debug!(
                task = scheduled.task.as_str(),
                scheduled_for = scheduled.generation,
                current = self.session.source_generation(),
                "Running deferred task from an earlier source"
            );
        }

        match scheduled.task {
            DeferredTask::RetrySelectorInit => {
                self.init_selector_if_possible();
            }
            DeferredTask::ApplyLabels => {
                self.apply_labels();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_type::MediaType;
    use crate::menu::{MenuLabel, QualityMenuItem};
    use crate::player::{PlaybackError, QualityLevel};

    /// Minimal in-module player double.
    #[derive(Debug, Default)]
    struct MockPlayer {
        selector_plugin: bool,
        levels: Option<Vec<QualityLevel>>,
        menu: Option<Vec<QualityMenuItem>>,
        activations: Vec<String>,
        calls: Vec<&'static str>,
        source: Option<MediaSource>,
        reject_play: bool,
    }

    impl MockPlayer {
        fn with_levels(heights: &[u32]) -> Self {
            Self {
                selector_plugin: true,
                levels: Some(
                    heights
                        .iter()
                        .map(|&h| QualityLevel::new(h * 16 / 9, h, u64::from(h) * 2_000))
                        .collect(),
                ),
                ..Self::default()
            }
        }
    }

    impl AdaptivePlayer for MockPlayer {
        type Label = QualityMenuItem;

        fn has_source_selector(&self) -> bool {
            self.selector_plugin
        }

        fn quality_levels(&self) -> Option<Vec<QualityLevel>> {
            self.levels.clone()
        }

        fn activate_source_selector(&mut self, default_option: &str) {
            self.activations.push(default_option.to_string());
            let mut menu = vec![QualityMenuItem::new("Auto")];
            for level in self.levels.iter().flatten() {
                menu.push(QualityMenuItem::new(format!("{}p", level.height)));
            }
            self.menu = Some(menu);
        }

        fn selector_menu(&mut self) -> Option<&mut [QualityMenuItem]> {
            self.menu.as_deref_mut()
        }

        fn set_source(&mut self, source: &MediaSource) {
            self.calls.push("set_source");
            self.source = Some(source.clone());
        }

        fn play(&mut self) -> Result<(), PlaybackError> {
            self.calls.push("play");
            if self.reject_play {
                return Err(PlaybackError::PlayRejected {
                    reason: "autoplay blocked".to_string(),
                });
            }
            Ok(())
        }

        fn pause(&mut self) {
            self.calls.push("pause");
        }

        fn reset(&mut self) {
            self.calls.push("reset");
            self.menu = None;
        }
    }

    fn controller(player: MockPlayer) -> PlaybackController<MockPlayer> {
        let mut controller = PlaybackController::new(player, &LadderviewConfig::default()).unwrap();
        controller.handle_event(PlayerEvent::Ready);
        controller
    }

    fn menu_texts(controller: &PlaybackController<MockPlayer>) -> Vec<String> {
        controller
            .player()
            .menu
            .iter()
            .flatten()
            .map(MenuLabel::text)
            .collect()
    }

    #[test]
    fn test_request_play_replaces_source_in_order() {
        let mut controller = controller(MockPlayer::with_levels(&[]));

        let source = controller
            .request_play("  https://x/v.m3u8?tr=sr-360_720  ", Some("adaptive"))
            .unwrap();

        assert_eq!(source.media_type, MediaType::Hls);
        assert_eq!(source.url, "https://x/v.m3u8?tr=sr-360_720");
        assert_eq!(
            controller.player().calls,
            ["pause", "reset", "set_source", "play"]
        );
        assert_eq!(
            controller.session().label_source(),
            Some("https://x/v.m3u8?tr=sr-360_720")
        );
    }

    #[test]
    fn test_request_play_validation_errors_leave_player_alone() {
        let mut controller = controller(MockPlayer::with_levels(&[]));

        assert_eq!(
            controller.request_play("   ", Some("mp4")),
            Err(PlayRequestError::EmptyUrl)
        );
        assert_eq!(
            controller.request_play("https://x/v.mp4", None),
            Err(PlayRequestError::NoFormatSelected)
        );
        assert!(matches!(
            controller.request_play("https://x/v.m3u8", Some("mp4")),
            Err(PlayRequestError::MediaType(MediaTypeError::NotMp4 { .. }))
        ));

        assert!(controller.player().calls.is_empty());
        assert_eq!(controller.session().label_source(), None);
    }

    #[test]
    fn test_rejected_play_is_swallowed() {
        let mut player = MockPlayer::with_levels(&[]);
        player.reject_play = true;
        let mut controller = controller(player);

        assert!(controller.request_play("https://x/v.mp4", Some("mp4")).is_ok());
    }

    #[test]
    fn test_submit_clears_url_only_on_success() {
        let mut controller = controller(MockPlayer::with_levels(&[]));

        let mut form = PlayForm::new("https://x/v.mpd", Some("mp4"));
        assert!(controller.submit(&mut form).is_err());
        assert_eq!(form.url, "https://x/v.mpd");

        form.format = Some("adaptive".to_string());
        let source = controller.submit(&mut form).unwrap();
        assert_eq!(source.media_type, MediaType::Dash);
        assert!(form.url.is_empty());
    }

    #[test]
    fn test_quality_level_before_metadata_activates_once() {
        let mut controller = controller(MockPlayer::with_levels(&[360, 720]));
        controller
            .request_play("https://x/v.m3u8?tr=sr-360_720", Some("adaptive"))
            .unwrap();

        controller.handle_event(PlayerEvent::LoadStart);
        controller.handle_event(PlayerEvent::QualityLevelAdded);
        controller.handle_event(PlayerEvent::QualityLevelAdded);
        controller.handle_event(PlayerEvent::LoadedMetadata);
        controller.advance(Duration::from_secs(1)).unwrap();

        assert_eq!(controller.player().activations, ["auto"]);
        assert_eq!(controller.activation_count(), 1);

        controller.handle_event(PlayerEvent::LoadStart);
        controller.handle_event(PlayerEvent::QualityLevelAdded);
        controller.handle_event(PlayerEvent::LoadedMetadata);
        controller.advance(Duration::from_secs(1)).unwrap();

        assert_eq!(controller.activation_count(), 2);
    }

    #[test]
    fn test_single_rendition_never_activates() {
        let mut controller = controller(MockPlayer::with_levels(&[720]));
        controller.handle_event(PlayerEvent::LoadStart);
        controller.handle_event(PlayerEvent::QualityLevelAdded);

        assert_eq!(
            controller.init_selector_if_possible(),
            ActivationOutcome::TooFewRenditions {
                found: 1,
                required: 2
            }
        );
        assert!(controller.player().activations.is_empty());
    }

    #[test]
    fn test_missing_plugins_are_skipped() {
        let mut player = MockPlayer::with_levels(&[360, 720]);
        player.selector_plugin = false;
        let mut without_selector = controller(player);
        assert_eq!(
            without_selector.init_selector_if_possible(),
            ActivationOutcome::SelectorUnavailable
        );

        let mut player = MockPlayer::with_levels(&[]);
        player.levels = None;
        let mut without_levels = controller(player);
        assert_eq!(
            without_levels.init_selector_if_possible(),
            ActivationOutcome::QualityLevelsUnavailable
        );
    }

    #[test]
    fn test_quality_events_ignored_without_enumeration_api() {
        let mut player = MockPlayer::with_levels(&[]);
        player.levels = None;
        let mut controller = controller(player);

        // Enumeration appears after ready; listener was never attached.
        controller.player_mut().levels = Some(vec![
            QualityLevel::new(640, 360, 800_000),
            QualityLevel::new(1280, 720, 2_500_000),
        ]);
        controller.handle_event(PlayerEvent::QualityLevelAdded);
        assert_eq!(controller.activation_count(), 0);

        controller.handle_event(PlayerEvent::LoadedMetadata);
        assert_eq!(controller.activation_count(), 1);
    }

    #[test]
    fn test_events_before_ready_are_ignored() {
        let player = MockPlayer::with_levels(&[360, 720]);
        let mut controller = PlaybackController::new(player, &LadderviewConfig::default()).unwrap();

        controller.handle_event(PlayerEvent::LoadedMetadata);
        assert_eq!(controller.activation_count(), 0);
        assert_eq!(controller.scheduler().pending(), 0);
    }

    #[test]
    fn test_activation_relabels_menu() {
        let mut controller = controller(MockPlayer::with_levels(&[358, 718, 1076]));
        controller
            .request_play("https://x/v.m3u8?tr=sr-360_720_1080", Some("adaptive"))
            .unwrap();
        controller.handle_event(PlayerEvent::LoadStart);
        controller.handle_event(PlayerEvent::LoadedMetadata);

        // Post-activation pass runs immediately.
        controller.advance(Duration::ZERO).unwrap();
        assert_eq!(menu_texts(&controller), ["Auto", "360p", "720p", "1080p"]);

        // Retry and reapply later are harmless.
        let ran = controller.advance(Duration::from_millis(500)).unwrap();
        assert_eq!(ran, 2);
        assert_eq!(menu_texts(&controller), ["Auto", "360p", "720p", "1080p"]);
        assert_eq!(controller.activation_count(), 1);
    }

    #[test]
    fn test_retry_activates_when_levels_arrive_late() {
        let mut controller = controller(MockPlayer::with_levels(&[360]));
        controller.handle_event(PlayerEvent::LoadStart);
        controller.handle_event(PlayerEvent::LoadedMetadata);
        assert_eq!(controller.activation_count(), 0);

        controller.player_mut().levels = Some(vec![
            QualityLevel::new(640, 360, 800_000),
            QualityLevel::new(1280, 720, 2_500_000),
        ]);

        controller.advance(Duration::from_millis(299)).unwrap();
        assert_eq!(controller.activation_count(), 0);

        controller.advance(Duration::from_millis(1)).unwrap();
        assert_eq!(controller.activation_count(), 1);
    }

    #[test]
    fn test_apply_labels_without_hint_keeps_labels() {
        let mut controller = controller(MockPlayer::with_levels(&[432, 1052]));
        controller
            .request_play("https://x/v.m3u8", Some("adaptive"))
            .unwrap();
        controller.handle_event(PlayerEvent::LoadStart);
        controller.handle_event(PlayerEvent::LoadedMetadata);
        controller.run_until_idle();

        assert_eq!(menu_texts(&controller), ["Auto", "432p", "1052p"]);
    }

    #[test]
    fn test_advance_rejects_oversized_step() {
        let mut controller = controller(MockPlayer::with_levels(&[]));
        let result = controller.advance(Duration::from_secs(86_401));
        assert!(matches!(result, Err(SchedulerError::AdvanceTooLarge { .. })));
        assert_eq!(controller.now(), Duration::ZERO);
    }

    #[test]
    fn test_advance_by_maximum_duration_is_an_error() {
        let mut controller = controller(MockPlayer::with_levels(&[]));
        controller.advance(Duration::from_millis(1)).unwrap();

        let result = controller.advance(Duration::MAX);

        assert!(matches!(result, Err(SchedulerError::AdvanceTooLarge { .. })));
        assert_eq!(controller.now(), Duration::from_millis(1));
    }
}
