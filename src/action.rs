use std::fmt::Display;
use std::str::FromStr;

use crate::error::Error;

/// What to do with image-update tracking for an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the image updater from bumping tags.
    Pause,
    /// Let the image updater bump tags again.
    Resume,
    /// Promote images between environments. Not implemented.
    Push,
}

impl Action {
    /// Whether the ignore-tags annotation should be present after this action,
    /// or `None` if the action does not edit annotations.
    pub fn annotation_present(self) -> Option<bool> {
        match self {
            Self::Pause => Some(true),
            Self::Resume => Some(false),
            Self::Push => None,
        }
    }

    /// Capitalized name used in pull request titles.
    pub fn title(self) -> &'static str {
        match self {
            Self::Pause => "Pause",
            Self::Resume => "Resume",
            Self::Push => "Push",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pause => f.write_str("pause"),
            Self::Resume => f.write_str("resume"),
            Self::Push => f.write_str("push"),
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "push" => Ok(Self::Push),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}
