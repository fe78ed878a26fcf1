//! The difficulty stored in world settings.

use serde::{Deserialize, Serialize};

/// How hard a world is meant to be.
///
/// The engine persists and reports it, block and entity behaviours decide what it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Lowest setting.
    Peaceful = 0,
    /// Below the default.
    Easy = 1,
    /// What new worlds start with.
    #[default]
    Normal = 2,
    /// Highest setting.
    Hard = 3,
}

impl Difficulty {
    /// The name used in saved settings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Peaceful => "peaceful",
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_by_name() {
        for difficulty in [
            Difficulty::Peaceful,
            Difficulty::Easy,
            Difficulty::Normal,
            Difficulty::Hard,
        ] {
            let json = serde_json::to_string(&difficulty).expect("serializable");
            assert_eq!(json, format!("\"{}\"", difficulty.name()));
        }
        assert_eq!(Difficulty::default(), Difficulty::Normal);
    }
}
