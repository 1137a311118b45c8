//! Media type detection and play request validation.

use ladderview_core::{
    LadderviewConfig, MediaType, MediaTypeError, PlayForm, PlayRequestError, PlaybackController,
    detect_media_type,
};
use ladderview_sim::{SimulatedPlayer, TransportCall};

#[test]
fn test_detection_table() {
    let cases = [
        ("https://cdn.example.com/a.mp4", "mp4", Some("video/mp4")),
        ("https://cdn.example.com/A.MP4?sig=abc", "mp4", Some("video/mp4")),
        ("https://cdn.example.com/live.m3u8", "adaptive", Some("application/x-mpegURL")),
        ("https://cdn.example.com/vod.mpd?tr=sr-360", "adaptive", Some("application/dash+xml")),
        ("https://cdn.example.com/live.m3u8", "mp4", None),
        ("https://cdn.example.com/a.mp4", "adaptive", None),
        ("https://cdn.example.com/a.webm", "adaptive", None),
        ("https://cdn.example.com/a.mp4", "webm", None),
    ];

    for (url, format, expected) in cases {
        let detected = detect_media_type(url, format).ok().map(MediaType::mime_type);
        assert_eq!(detected, expected, "{url} as {format}");
    }
}

#[test]
fn test_error_messages_name_the_selected_mode() {
    let not_mp4 = detect_media_type("https://x/v.m3u8", "mp4").unwrap_err();
    assert_eq!(
        not_mp4,
        MediaTypeError::NotMp4 {
            extension: "m3u8".to_string()
        }
    );
    assert_eq!(
        not_mp4.to_string(),
        "MP4 mode selected but URL is not an mp4 file."
    );

    let not_adaptive = detect_media_type("https://x/v.mov", "adaptive").unwrap_err();
    assert_eq!(
        not_adaptive.to_string(),
        "Adaptive mode selected but URL is not m3u8 or mpd."
    );

    let invalid = detect_media_type("https://x/v.mp4", "").unwrap_err();
    assert_eq!(invalid.to_string(), "Please select a valid format.");
}

fn ready_controller(player: SimulatedPlayer) -> PlaybackController<SimulatedPlayer> {
    let mut player = player;
    let event = player.next_event().expect("player queues ready");
    let mut controller =
        PlaybackController::new(player, &LadderviewConfig::for_testing()).unwrap();
    controller.handle_event(event);
    controller
}

#[test]
fn test_rejected_requests_leave_player_and_form_untouched() {
    let mut controller = ready_controller(SimulatedPlayer::new());

    let mut forms = [
        (PlayForm::new("   ", Some("mp4")), PlayRequestError::EmptyUrl),
        (
            PlayForm::new("https://x/v.mp4", None),
            PlayRequestError::NoFormatSelected,
        ),
        (
            PlayForm::new("https://x/v.mpd", Some("mp4")),
            PlayRequestError::MediaType(MediaTypeError::NotMp4 {
                extension: "mpd".to_string(),
            }),
        ),
    ];

    for (form, expected) in &mut forms {
        let before = form.clone();
        assert_eq!(controller.submit(form).unwrap_err(), *expected);
        assert_eq!(*form, before);
    }

    assert!(controller.player().transport_calls().is_empty());
    assert_eq!(controller.session().label_source(), None);
}

#[test]
fn test_accepted_request_replaces_source_in_order() {
    let mut controller = ready_controller(SimulatedPlayer::new());
    let mut form = PlayForm::new("  https://x/show.m3u8?tr=sr-720  ", Some("adaptive"));

    let source = controller.submit(&mut form).unwrap();

    assert_eq!(source.url, "https://x/show.m3u8?tr=sr-720");
    assert_eq!(source.media_type, MediaType::Hls);
    assert!(form.url.is_empty());
    assert_eq!(form.format.as_deref(), Some("adaptive"));
    assert_eq!(
        controller.player().transport_calls(),
        [
            TransportCall::Pause,
            TransportCall::Reset,
            TransportCall::SetSource {
                url: "https://x/show.m3u8?tr=sr-720".to_string(),
                mime_type: "application/x-mpegURL",
            },
            TransportCall::Play,
        ]
    );
    assert!(controller.player().is_playing());
}

#[test]
fn test_play_rejection_is_not_an_error() {
    let mut controller = ready_controller(SimulatedPlayer::new().rejecting_play());

    let source = controller.request_play("https://x/v.mp4", Some("mp4"));

    assert!(source.is_ok());
    assert!(!controller.player().is_playing());
    assert_eq!(
        controller.player().source().map(|s| s.url.as_str()),
        Some("https://x/v.mp4")
    );
    assert_eq!(controller.session().label_source(), Some("https://x/v.mp4"));
}
