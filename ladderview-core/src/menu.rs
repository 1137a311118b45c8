//! Quality menu relabelling.
//!
//! The player builds its quality menu from measured rendition heights and
//! labels each entry `<height>p`, plus an `auto` entry. [`relabel_menu`]
//! rewrites the numeric entries to the nearest height of a
//! [`ResolutionLadder`]. Only the display text changes; the items themselves
//! belong to the player and are rebuilt on every source load.

use crate::ladder::ResolutionLadder;

/// Label of the menu entry that leaves rendition choice to the player.
pub const AUTO_LABEL: &str = "auto";

/// Writable text of one rendered quality menu item.
pub trait MenuLabel {
    /// Current display text.
    fn text(&self) -> String;

    /// Replaces the display text.
    fn set_text(&mut self, text: &str);
}

/// Owned menu label, used where no rendered element backs the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityMenuItem {
    text: String,
}

impl QualityMenuItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl MenuLabel for QualityMenuItem {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

impl From<&str> for QualityMenuItem {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Parses the height shown by a `<height>p` label.
///
/// The text is trimmed and lowercased; the `auto` entry yields `None`. The
/// first `p` is removed and the remainder read as a number: blank means 0,
/// and anything that is not a finite number yields `None`. Fractions and
/// negative values are kept as they are.
pub fn parse_label_height(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    if text == AUTO_LABEL {
        return None;
    }

    let number = text.replacen('p', "", 1);
    let number = number.trim();
    if number.is_empty() {
        return Some(0.0);
    }

    number.parse::<f64>().ok().filter(|height| height.is_finite())
}

/// Rewrites numeric menu labels to the closest ladder height.
///
/// Does nothing when the ladder is empty so that the player's own labels
/// survive when no hint is present. Returns the number of labels whose text
/// changed. Running it again with the same ladder changes nothing, since
/// every rewritten height is itself a ladder member.
pub fn relabel_menu<L: MenuLabel>(items: &mut [L], ladder: &ResolutionLadder) -> usize {
    if ladder.is_empty() {
        return 0;
    }

    let mut changed = 0;
    for item in items.iter_mut() {
        let current = item.text();
        let Some(target) = parse_label_height(&current).and_then(|h| ladder.closest(h)) else {
            continue;
        };

        let label = format!("{target}p");
        if label != current {
            tracing::debug!(from = %current, to = %label, "Relabelled quality menu item");
            changed += 1;
        }
        item.set_text(&label);
    }

    changed
}
