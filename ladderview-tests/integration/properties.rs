//! Property tests over ladders, relabelling and detection.

use ladderview_core::{
    QualityMenuItem, ResolutionLadder, closest_height, detect_media_type, parse_target_heights,
    relabel_menu,
};
use proptest::prelude::*;

fn ladder_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..4320, 1..8)
}

proptest! {
    #[test]
    fn closest_height_is_a_ladder_member(actual in 0u64..10_000, ladder in ladder_strategy()) {
        let result = closest_height(actual, &ladder);
        prop_assert!(ladder.contains(&result));

        let best = ladder.iter().map(|h| h.abs_diff(actual)).min().unwrap_or_default();
        prop_assert_eq!(result.abs_diff(actual), best);
    }

    #[test]
    fn parsed_ladder_is_ascending(heights in ladder_strategy()) {
        let token = heights
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("_");
        let url = format!("https://cdn.example.com/v.m3u8?tr=w-1280,sr-{token}");

        let parsed = parse_target_heights(&url);
        let mut expected = heights.clone();
        expected.sort_unstable();
        prop_assert_eq!(parsed.heights(), expected.as_slice());
    }

    #[test]
    fn relabelling_is_idempotent(
        ladder in ladder_strategy(),
        labels in prop::collection::vec(0u32..5000, 0..10),
    ) {
        let ladder = ResolutionLadder::new(ladder);
        let mut items: Vec<QualityMenuItem> = std::iter::once(QualityMenuItem::new("Auto"))
            .chain(labels.iter().map(|h| QualityMenuItem::new(format!("{h}p"))))
            .collect();

        relabel_menu(&mut items, &ladder);
        let once: Vec<String> = items.iter().map(|i| i.as_str().to_string()).collect();

        prop_assert_eq!(relabel_menu(&mut items, &ladder), 0);
        let twice: Vec<String> = items.iter().map(|i| i.as_str().to_string()).collect();
        prop_assert_eq!(once, twice);
        prop_assert_eq!(items[0].as_str(), "Auto");
    }

    #[test]
    fn detection_ignores_query_and_case(
        stem in "[a-z0-9]{1,12}",
        query in "[a-z0-9=&]{0,16}",
        upper in any::<bool>(),
    ) {
        let extension = if upper { "M3U8" } else { "m3u8" };
        let url = format!("https://cdn.example.com/{stem}.{extension}?{query}");

        prop_assert!(detect_media_type(&url, "adaptive").is_ok());
        prop_assert!(detect_media_type(&url, "mp4").is_err());
    }
}
