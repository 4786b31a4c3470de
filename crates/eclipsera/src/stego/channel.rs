//! Channel plane selection.
//!
//! A [`PlaneSelection`] is the ordered set of RGBA channels that carry payload
//! bits. It is always non-empty, duplicate free and kept in canonical
//! R, G, B, A order, so `["B", "R"]` and `["R", "B"]` select the same plane.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One colour channel of an RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "A")]
    Alpha,
}

impl Channel {
    /// Canonical channel order.
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];

    /// Index of the channel inside an `Rgba<u8>` pixel.
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Channel::Red => 'R',
            Channel::Green => 'G',
            Channel::Blue => 'B',
            Channel::Alpha => 'A',
        }
    }

    /// Human readable name, as used for bit plane labels.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
            Channel::Alpha => "Alpha",
        }
    }

    /// Parse a channel letter, case-insensitively. Anything else is `None`.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'R' => Some(Channel::Red),
            'G' => Some(Channel::Green),
            'B' => Some(Channel::Blue),
            'A' => Some(Channel::Alpha),
            _ => None,
        }
    }
}

/// Ordered, non-empty set of channels that carry payload bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlaneSelection {
    channels: Vec<Channel>,
}

impl PlaneSelection {
    /// The default plane: R, G and B without alpha.
    pub fn all_rgb() -> Self {
        Self {
            channels: vec![Channel::Red, Channel::Green, Channel::Blue],
        }
    }

    /// Build a selection from arbitrary channels. Duplicates are removed and
    /// the result is sorted canonically; an empty input yields RGB.
    pub fn from_channels<I: IntoIterator<Item = Channel>>(channels: I) -> Self {
        let mut selected: Vec<Channel> = Vec::new();
        for channel in channels {
            if !selected.contains(&channel) {
                selected.push(channel);
            }
        }

        if selected.is_empty() {
            return Self::all_rgb();
        }

        selected.sort();
        Self { channels: selected }
    }

    /// Parse a compact plane string such as `"rgb"`, `"RB"` or `"R,G,A"`.
    /// Unknown letters and separators are ignored.
    pub fn parse(plane: &str) -> Self {
        Self::from_channels(plane.chars().filter_map(Channel::from_letter))
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        self.channels.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }
}

impl Default for PlaneSelection {
    fn default() -> Self {
        Self::all_rgb()
    }
}

impl fmt::Display for PlaneSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for channel in &self.channels {
            write!(f, "{}", channel.letter())?;
        }
        Ok(())
    }
}

impl From<PlaneSelection> for String {
    fn from(plane: PlaneSelection) -> Self {
        plane.to_string()
    }
}

impl TryFrom<String> for PlaneSelection {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        if !value.chars().any(|c| Channel::from_letter(c).is_some()) {
            return Err(format!("'{}' does not name any of the channels R, G, B, A", value));
        }
        Ok(Self::parse(&value))
    }
}

/// Resolve the channels that carry the payload.
///
/// `use_all` always yields R, G, B; alpha is never part of the all-channels
/// mode. Otherwise each entry of `channels` is matched case-insensitively
/// against a single channel letter (surrounding whitespace makes an entry
/// invalid), invalid entries are dropped, and the
/// remaining channels are deduplicated and ordered canonically. An empty or
/// fully invalid list falls back to R, G, B. This function never fails.
pub fn resolve_plane<S: AsRef<str>>(use_all: bool, channels: &[S]) -> PlaneSelection {
    if use_all {
        return PlaneSelection::all_rgb();
    }

    let parsed = channels.iter().filter_map(|entry| {
        let mut chars = entry.as_ref().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Channel::from_letter(letter),
            _ => None,
        }
    });

    PlaneSelection::from_channels(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_all_excludes_alpha() {
        let plane = resolve_plane(true, &["A"]);
        assert_eq!(plane.to_string(), "RGB");
        assert!(!plane.contains(Channel::Alpha));
    }

    #[test]
    fn test_order_is_canonical() {
        let a = resolve_plane(false, &["B", "R"]);
        let b = resolve_plane(false, &["R", "B"]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "RB");
    }

    #[test]
    fn test_case_insensitive_and_deduplicated() {
        let plane = resolve_plane(false, &["g", "G", "a", "r"]);
        assert_eq!(plane.to_string(), "RGA");
        assert_eq!(plane.len(), 3);
    }

    #[test]
    fn test_invalid_entries_fall_back_to_rgb() {
        let plane = resolve_plane(false, &["X", "red", ""]);
        assert_eq!(plane, PlaneSelection::all_rgb());

        assert_eq!(resolve_plane(false, &[" R", "G "]), PlaneSelection::all_rgb());
        assert_eq!(resolve_plane(false, &[" A", "b"]).to_string(), "B");

        let empty: [&str; 0] = [];
        assert_eq!(resolve_plane(false, &empty), PlaneSelection::all_rgb());
    }

    #[test]
    fn test_parse_plane_string() {
        assert_eq!(PlaneSelection::parse("bgr").to_string(), "RGB");
        assert_eq!(PlaneSelection::parse("R,A").to_string(), "RA");
        assert_eq!(PlaneSelection::parse("").to_string(), "RGB");
    }

    #[test]
    fn test_serde_as_string() {
        let plane = resolve_plane(false, &["A", "G"]);
        let json = serde_json::to_string(&plane).unwrap();
        assert_eq!(json, "\"GA\"");

        let back: PlaneSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plane);

        assert!(serde_json::from_str::<PlaneSelection>("\"xyz\"").is_err());
    }
}
