//! Resolution ladder hints carried in video URLs.
//!
//! Packagers encode the renditions they produced into a query parameter,
//! e.g. `?tr=w-1280,sr-360_480_720`. The `sr-` token lists the pixel heights
//! of the ladder. The player labels its quality menu from the heights it
//! measures in the stream, which often differ slightly from what was
//! encoded, so the ladder is used to snap menu labels back to the intended
//! values.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::LabelConfig;

/// Errors raised while building a ladder parser.
#[derive(Debug, Error)]
pub enum LadderError {
    /// The token pattern derived from the configured prefix did not compile.
    #[error("invalid ladder token pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The configured query parameter name is empty.
    #[error("ladder hint parameter name must not be empty")]
    EmptyParameter,

    /// The configured token prefix is empty.
    #[error("ladder token prefix must not be empty")]
    EmptyPrefix,
}

/// Ascending list of target pixel heights parsed from a URL hint.
///
/// An empty ladder means no hint was available; relabelling is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolutionLadder {
    heights: Vec<u64>,
}

impl ResolutionLadder {
    /// Creates a ladder from heights in any order.
    pub fn new(mut heights: Vec<u64>) -> Self {
        heights.sort_unstable();
        Self { heights }
    }

    /// Returns heights in ascending order.
    pub fn heights(&self) -> &[u64] {
        &self.heights
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Returns the ladder height closest to `actual`, or `None` for an
    /// empty ladder. `actual` may be fractional.
    pub fn closest(&self, actual: f64) -> Option<u64> {
        nearest_target(actual, &self.heights)
    }
}

/// Scans `targets` in order for the one nearest to `actual`.
///
/// Only a strictly smaller distance replaces the current best, so on a tie
/// the earlier target wins. With an ascending ladder that is the lower
/// height.
fn nearest_target(actual: f64, targets: &[u64]) -> Option<u64> {
    let (&first, rest) = targets.split_first()?;

    let mut best = first;
    let mut best_diff = (actual - first as f64).abs();

    for &target in rest {
        let diff = (actual - target as f64).abs();
        if diff < best_diff {
            best = target;
            best_diff = diff;
        }
    }

    Some(best)
}

/// Returns the target closest to `actual`.
///
/// Ties keep the earlier target. An empty target list returns `actual`
/// unchanged.
pub fn closest_height(actual: u64, targets: &[u64]) -> u64 {
    nearest_target(actual as f64, targets).unwrap_or(actual)
}

/// Extracts resolution ladders from URLs according to a [`LabelConfig`].
#[derive(Debug, Clone)]
pub struct LadderParser {
    param: String,
    token: Regex,
}

impl LadderParser {
    /// Builds a parser for the configured parameter and token prefix.
    ///
    /// # Errors
    ///
    /// - `LadderError::EmptyParameter` - Parameter name is empty
    /// - `LadderError::EmptyPrefix` - Token prefix is empty
    /// - `LadderError::InvalidPattern` - Token pattern failed to compile
    pub fn new(config: &LabelConfig) -> Result<Self, LadderError> {
        if config.hint_param.is_empty() {
            return Err(LadderError::EmptyParameter);
        }
        if config.token_prefix.is_empty() {
            return Err(LadderError::EmptyPrefix);
        }

        // One comma-delimited segment consisting of the prefix and digit groups.
        let pattern = format!(
            r"(?:^|,)\s*{}([0-9_]+)\s*(?:,|$)",
            regex::escape(&config.token_prefix)
        );

        Ok(Self {
            param: config.hint_param.clone(),
            token: Regex::new(&pattern)?,
        })
    }

    /// Query parameter this parser reads.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Parses the ladder hint from `url`.
    ///
    /// Malformed URLs, a missing parameter, a missing token or a token
    /// without any usable height all produce an empty ladder.
    pub fn parse(&self, url: &str) -> ResolutionLadder {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(url, error = %e, "Ignoring ladder hint on unparsable URL");
                return ResolutionLadder::default();
            }
        };

        let hint = parsed
            .query_pairs()
            .find(|(key, _)| key == self.param.as_str())
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();

        self.parse_hint(&hint)
    }

    /// Parses a raw hint parameter value such as `w-1280,sr-360_720`.
    ///
    /// An empty `_` group counts as height 0. Groups too large for `u64`
    /// saturate.
    pub fn parse_hint(&self, hint: &str) -> ResolutionLadder {
        let Some(captures) = self.token.captures(hint) else {
            return ResolutionLadder::default();
        };

        let heights = captures
            .get(1)
            .map(|digits| {
                digits
                    .as_str()
                    .split('_')
                    .map(|part| {
                        if part.is_empty() {
                            0
                        } else {
                            // Digits only, so parsing fails only on overflow.
                            part.parse::<u64>().unwrap_or(u64::MAX)
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        ResolutionLadder::new(heights)
    }
}

static DEFAULT_PARSER: LazyLock<Option<LadderParser>> =
    LazyLock::new(|| LadderParser::new(&LabelConfig::default()).ok());

/// Parses target heights from `url` using the default `tr` / `sr-` hint.
pub fn parse_target_heights(url: &str) -> ResolutionLadder {
    DEFAULT_PARSER
        .as_ref()
        .map(|parser| parser.parse(url))
        .unwrap_or_default()
}
