//! In-memory adaptive player.
//!
//! Behaves like the embedded browser player as far as the controller can
//! observe: it queues lifecycle events instead of dispatching them, grows
//! its quality level list as renditions are discovered, and renders a
//! selector menu labelled with the measured heights when activated.

use std::collections::VecDeque;

use ladderview_core::{
    AdaptivePlayer, MediaSource, PlaybackError, PlayerEvent, QualityLevel, QualityMenuItem,
};

/// Transport calls recorded by the simulated player, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TransportCall {
    Pause,
    Reset,
    SetSource { url: String, mime_type: &'static str },
    Play,
}

/// Simulated player with switchable plugins.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    selector_plugin: bool,
    quality_plugin: bool,
    reject_play: bool,
    source: Option<MediaSource>,
    playing: bool,
    levels: Vec<QualityLevel>,
    menu: Option<Vec<QualityMenuItem>>,
    selector_activations: Vec<String>,
    transport: Vec<TransportCall>,
    events: VecDeque<PlayerEvent>,
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlayer {
    /// Creates a player with both plugins installed.
    ///
    /// The `Ready` event is already queued.
    pub fn new() -> Self {
        Self {
            selector_plugin: true,
            quality_plugin: true,
            reject_play: false,
            source: None,
            playing: false,
            levels: Vec::new(),
            menu: None,
            selector_activations: Vec::new(),
            transport: Vec::new(),
            events: VecDeque::from([PlayerEvent::Ready]),
        }
    }

    /// Removes the selector plugin.
    pub fn without_selector_plugin(mut self) -> Self {
        self.selector_plugin = false;
        self
    }

    /// Removes the quality level enumeration plugin.
    pub fn without_quality_levels(mut self) -> Self {
        self.quality_plugin = false;
        self
    }

    /// Makes every play call fail as an autoplay policy would.
    pub fn rejecting_play(mut self) -> Self {
        self.reject_play = true;
        self
    }

    /// Records a newly discovered rendition and queues the notification.
    ///
    /// An already rendered menu is rebuilt, discarding any relabelling.
    pub fn discover_rendition(&mut self, level: QualityLevel) {
        self.levels.push(level);
        if self.menu.is_some() {
            self.render_menu();
        }
        if self.quality_plugin {
            self.events.push_back(PlayerEvent::QualityLevelAdded);
        }
    }

    /// Queues the metadata-loaded event for the current source.
    pub fn finish_metadata(&mut self) {
        self.events.push_back(PlayerEvent::LoadedMetadata);
    }

    /// Takes the next queued event.
    pub fn next_event(&mut self) -> Option<PlayerEvent> {
        self.events.pop_front()
    }

    /// Currently assigned source.
    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    /// Whether the last play call succeeded and nothing stopped it since.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Default options passed to each selector activation.
    pub fn selector_activations(&self) -> &[String] {
        &self.selector_activations
    }

    /// Transport calls made so far.
    pub fn transport_calls(&self) -> &[TransportCall] {
        &self.transport
    }

    /// Current menu labels, or `None` if the selector is not rendered.
    pub fn menu_labels(&self) -> Option<Vec<String>> {
        self.menu
            .as_ref()
            .map(|items| items.iter().map(|item| item.as_str().to_string()).collect())
    }

    /// Rebuilds the rendered menu from the discovered levels, highest first.
    fn render_menu(&mut self) {
        let mut heights: Vec<u32> = self.levels.iter().map(|level| level.height).collect();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();

        let mut items = vec![QualityMenuItem::new("Auto")];
        items.extend(heights.into_iter().map(|h| QualityMenuItem::new(format!("{h}p"))));
        self.menu = Some(items);
    }
}

impl AdaptivePlayer for SimulatedPlayer {
    type Label = QualityMenuItem;

    fn has_source_selector(&self) -> bool {
        self.selector_plugin
    }

    fn quality_levels(&self) -> Option<Vec<QualityLevel>> {
        self.quality_plugin.then(|| self.levels.clone())
    }

    fn activate_source_selector(&mut self, default_option: &str) {
        self.selector_activations.push(default_option.to_string());
        self.render_menu();
    }

    fn selector_menu(&mut self) -> Option<&mut [QualityMenuItem]> {
        self.menu.as_deref_mut()
    }

    fn set_source(&mut self, source: &MediaSource) {
        self.transport.push(TransportCall::SetSource {
            url: source.url.clone(),
            mime_type: source.mime_type(),
        });
        self.source = Some(source.clone());
        self.events.push_back(PlayerEvent::LoadStart);
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.transport.push(TransportCall::Play);
        if self.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        if self.reject_play {
            return Err(PlaybackError::PlayRejected {
                reason: "autoplay policy".to_string(),
            });
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.transport.push(TransportCall::Pause);
        self.playing = false;
    }

    fn reset(&mut self) {
        self.transport.push(TransportCall::Reset);
        self.source = None;
        self.playing = false;
        self.levels.clear();
        self.menu = None;
    }
}

#[cfg(test)]
mod tests {
    use ladderview_core::MediaType;

    use super::*;

    #[test]
    fn test_new_player_queues_ready() {
        let mut player = SimulatedPlayer::new();
        assert_eq!(player.next_event(), Some(PlayerEvent::Ready));
        assert_eq!(player.next_event(), None);
    }

    #[test]
    fn test_menu_lists_heights_descending() {
        let mut player = SimulatedPlayer::new();
        player.discover_rendition(QualityLevel::new(640, 360, 800_000));
        player.discover_rendition(QualityLevel::new(1920, 1080, 6_000_000));
        player.discover_rendition(QualityLevel::new(1280, 720, 3_000_000));

        assert_eq!(player.menu_labels(), None);
        player.activate_source_selector("auto");

        assert_eq!(
            player.menu_labels().unwrap(),
            ["Auto", "1080p", "720p", "360p"]
        );
    }

    #[test]
    fn test_discovery_rebuilds_rendered_menu() {
        let mut player = SimulatedPlayer::new();
        player.discover_rendition(QualityLevel::new(640, 362, 800_000));
        player.activate_source_selector("auto");
        if let Some(items) = player.selector_menu() {
            items[1] = QualityMenuItem::new("360p");
        }

        player.discover_rendition(QualityLevel::new(1280, 724, 3_000_000));

        assert_eq!(player.menu_labels().unwrap(), ["Auto", "724p", "362p"]);
    }

    #[test]
    fn test_quality_levels_hidden_without_plugin() {
        let mut player = SimulatedPlayer::new().without_quality_levels();
        player.next_event();
        player.discover_rendition(QualityLevel::new(640, 360, 800_000));

        assert_eq!(player.quality_levels(), None);
        assert_eq!(player.next_event(), None);
    }

    #[test]
    fn test_reset_drops_source_and_menu() {
        let mut player = SimulatedPlayer::new();
        player.set_source(&MediaSource::new("https://x/v.mp4", MediaType::Mp4));
        player.discover_rendition(QualityLevel::new(640, 360, 800_000));
        player.activate_source_selector("auto");
        assert!(player.play().is_ok());

        player.reset();

        assert!(player.source().is_none());
        assert!(!player.is_playing());
        assert_eq!(player.menu_labels(), None);
        assert_eq!(player.quality_levels(), Some(Vec::new()));
    }

    #[test]
    fn test_play_rejection() {
        let mut player = SimulatedPlayer::new().rejecting_play();
        assert_eq!(player.play(), Err(PlaybackError::NoSource));

        player.set_source(&MediaSource::new("https://x/v.mp4", MediaType::Mp4));
        assert!(matches!(
            player.play(),
            Err(PlaybackError::PlayRejected { .. })
        ));
        assert!(!player.is_playing());
    }
}
