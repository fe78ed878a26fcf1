//! Dimensions and their vertical ranges.

use serde::{Deserialize, Serialize};

/// The dimension a world simulates. It fixes the vertical range and whether
/// weather exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Y from -64 to 319, with weather.
    #[default]
    Overworld,
    /// Y from 0 to 127.
    Nether,
    /// Y from 0 to 255.
    End,
}

impl Dimension {
    /// The lowest and highest block y, inclusive.
    #[must_use]
    pub const fn range(self) -> (i32, i32) {
        match self {
            Self::Overworld => (-64, 319),
            Self::Nether => (0, 127),
            Self::End => (0, 255),
        }
    }

    /// Whether rain, thunder and lightning happen here.
    #[must_use]
    pub const fn has_weather(self) -> bool {
        matches!(self, Self::Overworld)
    }

    /// Whether sky light reaches the blocks.
    #[must_use]
    pub const fn has_sky(self) -> bool {
        matches!(self, Self::Overworld)
    }

    /// Lowercase name, also used as the directory name on disk.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::Nether => "nether",
            Self::End => "end",
        }
    }
}
