//! Media type detection for user-submitted video URLs.
//!
//! The page offers two playback formats: progressive MP4 and adaptive
//! streaming (HLS or DASH). The user's format choice has to agree with the
//! extension of the URL before anything is handed to the player, so this
//! module maps (URL, format) to the MIME type the player expects.

use std::str::FromStr;

use thiserror::Error;

/// Playback format selected by the user for a play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Progressive MP4 download
    Mp4,
    /// Adaptive bitrate streaming (HLS playlist or DASH manifest)
    Adaptive,
}

impl SourceFormat {
    /// Form value used for this format.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Mp4 => "mp4",
            SourceFormat::Adaptive => "adaptive",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp4" => Ok(SourceFormat::Mp4),
            "adaptive" => Ok(SourceFormat::Adaptive),
            _ => Err(MediaTypeError::InvalidFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media type handed to the player together with the source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// MPEG-4 Part 14 file
    Mp4,
    /// HLS playlist (.m3u8)
    Hls,
    /// DASH manifest (.mpd)
    Dash,
}

impl MediaType {
    /// Returns the MIME type string the player understands.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaType::Mp4 => "video/mp4",
            MediaType::Hls => "application/x-mpegURL",
            MediaType::Dash => "application/dash+xml",
        }
    }

    /// Checks whether this type is served through the adaptive pipeline.
    pub fn is_adaptive(self) -> bool {
        matches!(self, MediaType::Hls | MediaType::Dash)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Errors produced when a URL does not match the selected format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    /// MP4 was selected but the URL does not end in `.mp4`.
    #[error("MP4 mode selected but URL is not an mp4 file.")]
    NotMp4 {
        /// Extension found on the URL.
        extension: String,
    },

    /// Adaptive was selected but the URL is neither `.m3u8` nor `.mpd`.
    #[error("Adaptive mode selected but URL is not m3u8 or mpd.")]
    NotAdaptive {
        /// Extension found on the URL.
        extension: String,
    },

    /// The format value is not one of the known formats.
    #[error("Please select a valid format.")]
    InvalidFormat {
        /// Format value that was rejected.
        format: String,
    },
}

/// Result type for media type detection.
pub type MediaTypeResult<T> = Result<T, MediaTypeError>;

/// Extracts the lowercased extension of a URL.
///
/// The query string is dropped first; the extension is whatever follows the
/// final `.`. A URL without any `.` yields the whole lowercased path, which
/// never matches a known extension.
pub fn url_extension(url: &str) -> String {
    let path = url.split('?').next().unwrap_or_default().to_lowercase();
    match path.rsplit_once('.') {
        Some((_, extension)) => extension.to_string(),
        None => path,
    }
}

/// Detects the media type for a URL under an already parsed format.
///
/// # Errors
///
/// - `MediaTypeError::NotMp4` - MP4 selected but extension is not `mp4`
/// - `MediaTypeError::NotAdaptive` - Adaptive selected but extension is not `m3u8`/`mpd`
pub fn detect_for_format(url: &str, format: SourceFormat) -> MediaTypeResult<MediaType> {
    let extension = url_extension(url);

    match format {
        SourceFormat::Mp4 => {
            if extension == "mp4" {
                Ok(MediaType::Mp4)
            } else {
                Err(MediaTypeError::NotMp4 { extension })
            }
        }
        SourceFormat::Adaptive => match extension.as_str() {
            "m3u8" => Ok(MediaType::Hls),
            "mpd" => Ok(MediaType::Dash),
            _ => Err(MediaTypeError::NotAdaptive { extension }),
        },
    }
}

/// Detects the media type for a URL and a raw format value from the form.
///
/// # Errors
///
/// - `MediaTypeError::InvalidFormat` - Format value is not `mp4` or `adaptive`
/// - `MediaTypeError::NotMp4` - MP4 selected but extension is not `mp4`
/// - `MediaTypeError::NotAdaptive` - Adaptive selected but extension is not `m3u8`/`mpd`
pub fn detect_media_type(url: &str, format: &str) -> MediaTypeResult<MediaType> {
    let format = format.parse::<SourceFormat>()?;
    detect_for_format(url, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp4_format_accepts_mp4_extension() {
        let result = detect_media_type("https://cdn.example.com/movie.mp4", "mp4");
        assert_eq!(result, Ok(MediaType::Mp4));
        assert_eq!(MediaType::Mp4.mime_type(), "video/mp4");
    }

    #[test]
    fn test_mp4_format_rejects_other_extensions() {
        let result = detect_media_type("https://cdn.example.com/live.m3u8", "mp4");
        assert_eq!(
            result,
            Err(MediaTypeError::NotMp4 {
                extension: "m3u8".to_string()
            })
        );
    }

    #[test]
    fn test_adaptive_format_maps_playlists_and_manifests() {
        assert_eq!(
            detect_media_type("https://x/v.m3u8", "adaptive"),
            Ok(MediaType::Hls)
        );
        assert_eq!(
            detect_media_type("https://x/v.mpd", "adaptive"),
            Ok(MediaType::Dash)
        );
        assert_eq!(MediaType::Hls.mime_type(), "application/x-mpegURL");
        assert_eq!(MediaType::Dash.mime_type(), "application/dash+xml");
    }

    #[test]
    fn test_adaptive_format_rejects_mp4() {
        let result = detect_media_type("https://x/v.mp4", "adaptive");
        assert!(matches!(result, Err(MediaTypeError::NotAdaptive { .. })));
    }

    #[test]
    fn test_unknown_format_is_invalid() {
        let result = detect_media_type("https://x/v.mp4", "webm");
        assert_eq!(
            result,
            Err(MediaTypeError::InvalidFormat {
                format: "webm".to_string()
            })
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "Please select a valid format."
        );
    }

    #[test]
    fn test_extension_ignores_query_and_case() {
        assert_eq!(url_extension("https://x/Video.M3U8?tr=sr-360_720"), "m3u8");
        assert_eq!(
            detect_media_type("https://x/CLIP.MP4?token=a.b", "mp4"),
            Ok(MediaType::Mp4)
        );
    }

    #[test]
    fn test_url_without_dot_has_no_usable_extension() {
        assert_eq!(url_extension("stream"), "stream");
        assert!(detect_media_type("stream", "mp4").is_err());
    }

    #[test]
    fn test_source_format_round_trips_through_display() {
        for format in [SourceFormat::Mp4, SourceFormat::Adaptive] {
            assert_eq!(format.to_string().parse::<SourceFormat>(), Ok(format));
        }
    }
}
