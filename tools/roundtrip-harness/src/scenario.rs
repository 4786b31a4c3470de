//! Encode scenarios exercised against every cover.

use eclipsera::{EncodeOptions, PlaneSelection, resolve_plane};

/// Message embedded in every cover.
pub const GOLDEN_MESSAGE: &str = "Eclipsera golden vector v1: hello, moon.";

/// One way of embedding the golden message, plus how to analyze the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub label: String,
    pub encode: EncodeOptions,
    pub deep: bool,
    pub password: Option<String>,
}

impl Scenario {
    fn new(label: &str, encode: EncodeOptions, deep: bool) -> Self {
        Self {
            label: label.to_string(),
            encode,
            deep,
            password: None,
        }
    }

    /// Plane the encoder will resolve for this scenario.
    pub fn plane(&self) -> PlaneSelection {
        let channels = self.encode.channels.as_deref().unwrap_or_default();
        resolve_plane(self.encode.use_all_channels, channels)
    }
}

fn rgb() -> Option<Vec<String>> {
    Some(["R", "G", "B"].iter().map(|c| c.to_string()).collect())
}

/// The standard scenario set.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "overall",
            EncodeOptions {
                use_all_channels: true,
                channels: None,
                compress: false,
                reduce_size: true,
                ..Default::default()
            },
            false,
        ),
        Scenario::new(
            "channels_rgb",
            EncodeOptions {
                use_all_channels: false,
                channels: rgb(),
                compress: false,
                reduce_size: true,
                ..Default::default()
            },
            false,
        ),
        Scenario::new(
            "rgb_zlib_deep",
            EncodeOptions {
                use_all_channels: false,
                channels: rgb(),
                compress: true,
                reduce_size: true,
                ..Default::default()
            },
            true,
        ),
    ]
}
