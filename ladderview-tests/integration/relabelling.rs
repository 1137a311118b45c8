//! Ladder parsing and quality menu relabelling.

use ladderview_core::config::LabelConfig;
use ladderview_core::{
    LadderParser, QualityMenuItem, ResolutionLadder, closest_height, parse_target_heights,
    relabel_menu,
};

fn heights(url: &str) -> Vec<u64> {
    parse_target_heights(url).heights().to_vec()
}

fn menu(labels: &[&str]) -> Vec<QualityMenuItem> {
    labels.iter().copied().map(QualityMenuItem::from).collect()
}

fn texts(items: &[QualityMenuItem]) -> Vec<&str> {
    items.iter().map(QualityMenuItem::as_str).collect()
}

#[test]
fn test_ladder_hint_parsing() {
    assert_eq!(
        heights("https://x/v.m3u8?tr=w-1280,sr-360_720_1080"),
        [360, 720, 1080]
    );
    assert_eq!(heights("https://x/v.m3u8?tr=sr-1080_360_720"), [360, 720, 1080]);
    // An empty group reads as height 0.
    assert_eq!(heights("https://x/v.m3u8?tr=sr-360__720"), [0, 360, 720]);
    assert_eq!(heights("https://x/v.m3u8?tr=sr-_"), [0, 0]);
    assert_eq!(heights("https://x/v.m3u8?tr=sr-99999999999"), [99_999_999_999]);
    assert_eq!(heights("https://x/v.m3u8?tr=w-1280%2Csr-240_480"), [240, 480]);
    assert_eq!(heights("https://x/v.m3u8?tr=sr-360&tr=sr-720"), [360]);

    assert!(heights("https://x/v.m3u8").is_empty());
    assert!(heights("https://x/v.m3u8?tr=w-1280,h-720").is_empty());
    assert!(heights("https://x/v.m3u8?tr=xsr-360_720").is_empty());
    assert!(heights("https://x/v.m3u8?other=sr-360").is_empty());
    assert!(heights("not a url ?tr=sr-360").is_empty());
}

#[test]
fn test_custom_hint_location() {
    let parser = LadderParser::new(&LabelConfig {
        hint_param: "t".to_string(),
        token_prefix: "h.".to_string(),
    })
    .unwrap();

    assert_eq!(
        parser.parse("https://x/v.mpd?t=q-80,h.540_270&tr=sr-1080").heights(),
        [270, 540]
    );
    assert!(parser.parse("https://x/v.mpd?tr=sr-1080").is_empty());
}

#[test]
fn test_closest_height_examples() {
    assert_eq!(closest_height(700, &[360, 720, 1080]), 720);
    assert_eq!(closest_height(5000, &[360, 720, 1080]), 1080);
    assert_eq!(closest_height(0, &[360, 720, 1080]), 360);
    // Equidistant: the earlier, lower target wins.
    assert_eq!(closest_height(540, &[360, 720]), 360);
    assert_eq!(closest_height(500, &[]), 500);
}

#[test]
fn test_relabel_menu_example() {
    let ladder = ResolutionLadder::new(vec![360, 720]);
    let mut items = menu(&["Auto", "480p", "720p", "garbage"]);

    let changed = relabel_menu(&mut items, &ladder);

    assert_eq!(changed, 1);
    assert_eq!(texts(&items), ["Auto", "360p", "720p", "garbage"]);
}

#[test]
fn test_relabel_without_hint_keeps_player_labels() {
    let mut items = menu(&["Auto", "1078p", "718p"]);
    let ladder = parse_target_heights("https://x/v.m3u8");

    assert_eq!(relabel_menu(&mut items, &ladder), 0);
    assert_eq!(texts(&items), ["Auto", "1078p", "718p"]);
}

#[test]
fn test_relabel_accepts_loose_label_forms() {
    let ladder = ResolutionLadder::new(vec![480, 1080]);
    let mut items = menu(&["AUTO", " 1076p ", "486", "478.6p", "-360p", "p", "hd"]);

    relabel_menu(&mut items, &ladder);

    assert_eq!(
        texts(&items),
        ["AUTO", "1080p", "480p", "480p", "480p", "480p", "hd"]
    );
}

#[test]
fn test_relabel_compares_fractional_labels_exactly() {
    let ladder = parse_target_heights("https://x/v.m3u8?tr=sr-480_720");
    let mut items = menu(&["600.4p", "600p"]);

    relabel_menu(&mut items, &ladder);

    // 600.4 is nearer 720; an exact midpoint keeps the lower height.
    assert_eq!(texts(&items), ["720p", "480p"]);
}
