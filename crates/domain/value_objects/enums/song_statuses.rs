use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SongStatus {
    #[default]
    Pending,
    Played,
    Rejected,
}

impl Display for SongStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SongStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SongStatus::Pending => "pending",
            SongStatus::Played => "played",
            SongStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SongStatus::Pending),
            "played" => Some(SongStatus::Played),
            "rejected" => Some(SongStatus::Rejected),
            _ => None,
        }
    }

    /// Rows carry two independent flags; `played` takes precedence when both are set.
    pub fn from_flags(played: bool, rejected: bool) -> Self {
        if played {
            SongStatus::Played
        } else if rejected {
            SongStatus::Rejected
        } else {
            SongStatus::Pending
        }
    }

    /// Returns the `(played, rejected)` flags persisted for this status.
    pub fn to_flags(self) -> (bool, bool) {
        (self == SongStatus::Played, self == SongStatus::Rejected)
    }
}
