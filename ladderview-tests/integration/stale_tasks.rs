//! Deferred tasks that outlive the source they were scheduled for.

use std::time::Duration;

use ladderview_core::LadderviewConfig;
use ladderview_sim::{Scenario, SessionDriver, SimulatedPlayer};

fn driver() -> SessionDriver {
    SessionDriver::new(SimulatedPlayer::new(), &LadderviewConfig::default()).unwrap()
}

#[test]
fn test_stale_tasks_do_not_activate_new_source_early() {
    let mut driver = driver();
    driver
        .submit("https://x/a.m3u8?tr=sr-360_720", Some("adaptive"))
        .unwrap();
    driver.discover(&Scenario::renditions_from_heights(&[362, 724]));
    driver.load_metadata();
    driver.advance(Duration::from_millis(100)).unwrap();
    assert_eq!(driver.controller().scheduler().pending(), 2);

    driver.submit("https://x/b.m3u8", Some("adaptive")).unwrap();
    assert_eq!(driver.advance(Duration::from_secs(1)).unwrap(), 2);

    assert_eq!(driver.controller().activation_count(), 1);
    assert!(!driver.controller().session().is_selector_ready());
    assert!(driver.menu_labels().is_empty());
}

#[test]
fn test_stale_relabel_uses_current_source_hint() {
    let mut driver = driver();
    driver
        .submit("https://x/a.m3u8?tr=sr-360_720", Some("adaptive"))
        .unwrap();
    driver.discover(&Scenario::renditions_from_heights(&[362, 724]));
    driver.load_metadata();
    driver.advance(Duration::from_millis(100)).unwrap();
    assert_eq!(driver.menu_labels(), ["Auto", "720p", "360p"]);

    driver
        .submit("https://x/b.mpd?tr=sr-480_1080", Some("adaptive"))
        .unwrap();
    driver.discover(&Scenario::renditions_from_heights(&[478, 1078]));
    driver.advance(Duration::from_millis(50)).unwrap();
    assert_eq!(driver.controller().activation_count(), 2);
    assert_eq!(driver.menu_labels(), ["Auto", "1080p", "480p"]);

    // A late rendition rebuilds the menu; only the first source's
    // deferred tasks remain to fix it.
    driver.discover(&Scenario::renditions_from_heights(&[718]));
    assert_eq!(driver.menu_labels(), ["Auto", "1078p", "718p", "478p"]);

    assert_eq!(driver.advance(Duration::from_millis(450)).unwrap(), 2);
    assert_eq!(driver.menu_labels(), ["Auto", "1080p", "480p", "480p"]);
    assert_eq!(driver.controller().now(), Duration::from_millis(600));
}
