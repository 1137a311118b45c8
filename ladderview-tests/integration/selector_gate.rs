//! Selector activation across event orderings.

use std::time::Duration;

use ladderview_core::{
    ActivationOutcome, LadderviewConfig, PlaybackController, PlayerEvent, QualityLevel,
};
use ladderview_sim::{Scenario, SessionDriver, SimulatedPlayer};

fn driver(player: SimulatedPlayer) -> SessionDriver {
    SessionDriver::new(player, &LadderviewConfig::default()).unwrap()
}

fn levels(heights: &[u32]) -> Vec<QualityLevel> {
    Scenario::renditions_from_heights(heights)
}

#[test]
fn test_levels_before_metadata_activate_once() {
    let mut driver = driver(SimulatedPlayer::new());
    driver
        .submit("https://x/show.m3u8?tr=sr-360_720", Some("adaptive"))
        .unwrap();

    // The second rendition crosses the threshold before metadata.
    driver.discover(&levels(&[362, 724]));
    assert_eq!(driver.controller().activation_count(), 1);

    driver.load_metadata();
    driver.settle();

    assert_eq!(driver.controller().activation_count(), 1);
    assert_eq!(driver.player().selector_activations(), ["auto"]);
    assert_eq!(driver.menu_labels(), ["Auto", "720p", "360p"]);
}

#[test]
fn test_missing_quality_enumeration_blocks_activation() {
    let player = SimulatedPlayer::new().without_quality_levels();
    let mut driver = driver(player);
    driver.submit("https://x/v.mpd", Some("adaptive")).unwrap();
    driver.discover(&levels(&[360, 720, 1080]));
    driver.load_metadata();
    driver.settle();

    // Without enumeration the gate never opens, whatever the renditions.
    assert_eq!(driver.controller().activation_count(), 0);
    assert!(!driver.controller().session().is_selector_ready());
    assert!(driver.menu_labels().is_empty());
}

#[test]
fn test_missing_selector_plugin_blocks_activation() {
    let mut driver = driver(SimulatedPlayer::new().without_selector_plugin());
    driver.submit("https://x/v.m3u8", Some("adaptive")).unwrap();
    driver.load_metadata();
    driver.discover(&levels(&[360, 720]));
    driver.settle();

    assert_eq!(driver.controller().activation_count(), 0);
    assert!(driver.player().selector_activations().is_empty());
}

#[test]
fn test_single_rendition_never_activates() {
    let mut driver = driver(SimulatedPlayer::new());
    driver.submit("https://x/v.m3u8?tr=sr-720", Some("adaptive")).unwrap();
    driver.discover(&levels(&[720]));
    driver.load_metadata();

    assert_eq!(
        driver.advance(Duration::from_secs(1)).unwrap(),
        2,
        "retry and relabel pass both run"
    );
    assert_eq!(driver.controller().activation_count(), 0);
    assert!(driver.menu_labels().is_empty());
}

#[test]
fn test_new_source_reactivates_selector() {
    let mut driver = driver(SimulatedPlayer::new());
    driver
        .submit("https://x/a.m3u8?tr=sr-360_720", Some("adaptive"))
        .unwrap();
    driver.discover(&levels(&[358, 718]));
    driver.load_metadata();
    driver.settle();
    assert_eq!(driver.menu_labels(), ["Auto", "720p", "360p"]);

    driver
        .submit("https://x/b.mpd?tr=sr-480_1080", Some("adaptive"))
        .unwrap();
    assert!(!driver.controller().session().is_selector_ready());
    assert!(driver.menu_labels().is_empty());

    driver.discover(&levels(&[476, 1078]));
    driver.load_metadata();
    driver.settle();

    assert_eq!(driver.controller().activation_count(), 2);
    assert_eq!(driver.menu_labels(), ["Auto", "1080p", "480p"]);
}

#[test]
fn test_repeated_quality_events_do_not_reactivate() {
    let mut driver = driver(SimulatedPlayer::new());
    driver.submit("https://x/v.m3u8", Some("adaptive")).unwrap();
    driver.discover(&levels(&[240, 360, 480, 720, 1080]));
    driver.load_metadata();
    driver.settle();

    assert_eq!(driver.controller().activation_count(), 1);
    assert_eq!(driver.player().selector_activations().len(), 1);
}

#[test]
fn test_events_before_ready_are_ignored() {
    let mut player = SimulatedPlayer::new();
    let ready = player.next_event();
    assert_eq!(ready, Some(PlayerEvent::Ready));
    player.discover_rendition(QualityLevel::new(640, 360, 800_000));
    player.discover_rendition(QualityLevel::new(1280, 720, 3_000_000));

    let mut controller = PlaybackController::new(player, &LadderviewConfig::default()).unwrap();
    controller.handle_event(PlayerEvent::LoadedMetadata);
    controller.handle_event(PlayerEvent::QualityLevelAdded);

    assert_eq!(controller.activation_count(), 0);
    assert_eq!(controller.scheduler().pending(), 0);

    controller.handle_event(PlayerEvent::Ready);
    controller.handle_event(PlayerEvent::QualityLevelAdded);
    assert_eq!(controller.activation_count(), 1);
}

#[test]
fn test_direct_activation_reports_each_branch() {
    let mut controller =
        PlaybackController::new(SimulatedPlayer::new(), &LadderviewConfig::default()).unwrap();
    controller.handle_event(PlayerEvent::Ready);

    assert_eq!(
        controller.init_selector_if_possible(),
        ActivationOutcome::TooFewRenditions {
            found: 0,
            required: 2
        }
    );

    controller
        .player_mut()
        .discover_rendition(QualityLevel::new(640, 360, 800_000));
    controller
        .player_mut()
        .discover_rendition(QualityLevel::new(1280, 720, 3_000_000));

    assert_eq!(
        controller.init_selector_if_possible(),
        ActivationOutcome::Activated { renditions: 2 }
    );
    assert_eq!(
        controller.init_selector_if_possible(),
        ActivationOutcome::AlreadyActive
    );
}
