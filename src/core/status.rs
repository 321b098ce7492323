//! Status registry shared by tasks and stages.
//!
//! The set of statuses is closed, but persisted data may carry a value this
//! build does not know; such values are kept verbatim as `Unknown` and are
//! rendered with fallback text and colors.

use serde::{Deserialize, Serialize};

/// Fill color used for unknown statuses.
pub const FALLBACK_FILL: &str = "#969696";
/// Border color used for unknown statuses.
pub const FALLBACK_BORDER: &str = "#616161";
/// Highlight color used for unknown statuses.
pub const FALLBACK_HIGHLIGHT: &str = "#9E9E9E";

/// Colors a status is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColors {
    pub fill: &'static str,
    pub border: &'static str,
    pub highlight: &'static str,
}

/// State of a task or a stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    InProgress,
    Waiting,
    Completed,
    Failed,
    Frozen,
    /// A value read from storage that is not part of the known set.
    Unknown(String),
}

impl Status {
    /// Every known status, in menu order.
    pub const ALL: [Status; 5] = [
        Status::InProgress,
        Status::Waiting,
        Status::Completed,
        Status::Failed,
        Status::Frozen,
    ];

    /// Stable key used in storage and on the command line.
    pub fn key(&self) -> &str {
        match self {
            Status::InProgress => "in-progress",
            Status::Waiting => "waiting",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Frozen => "frozen",
            Status::Unknown(raw) => raw,
        }
    }

    /// Human-readable text. Unknown values display as their raw key.
    pub fn text(&self) -> &str {
        match self {
            Status::InProgress => "In progress",
            Status::Waiting => "Waiting on others",
            Status::Completed => "Completed",
            Status::Failed => "Failed",
            Status::Frozen => "Frozen",
            Status::Unknown(raw) => raw,
        }
    }

    pub fn colors(&self) -> StatusColors {
        match self {
            Status::InProgress => StatusColors {
                fill: "#2196F3",
                border: "#1976D2",
                highlight: "#42A5F5",
            },
            Status::Waiting => StatusColors {
                fill: "#FF9800",
                border: "#F57C00",
                highlight: "#FFB74D",
            },
            Status::Completed => StatusColors {
                fill: "#4CAF50",
                border: "#388E3C",
                highlight: "#66BB6A",
            },
            Status::Failed => StatusColors {
                fill: "#F44336",
                border: "#D32F2F",
                highlight: "#EF5350",
            },
            Status::Frozen => StatusColors {
                fill: "#9E9E9E",
                border: "#616161",
                highlight: "#BDBDBD",
            },
            Status::Unknown(_) => StatusColors {
                fill: FALLBACK_FILL,
                border: FALLBACK_BORDER,
                highlight: FALLBACK_HIGHLIGHT,
            },
        }
    }

    /// Rank used when ordering the task list. Unknown statuses sort last.
    pub fn display_rank(&self) -> u8 {
        match self {
            Status::InProgress => 0,
            Status::Frozen => 1,
            Status::Completed => 2,
            Status::Waiting => 3,
            Status::Failed => 4,
            Status::Unknown(_) => 5,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Status::Unknown(_))
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "in-progress" => Status::InProgress,
            "waiting" => Status::Waiting,
            "completed" => Status::Completed,
            "failed" => Status::Failed,
            "frozen" => Status::Frozen,
            _ => Status::Unknown(raw),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.key().to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Status {
    type Err = crate::Error;

    /// Parse a user-supplied status. Only known keys are accepted here.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let status = Status::from(s.trim().to_ascii_lowercase().replace('_', "-"));
        if status.is_known() {
            Ok(status)
        } else {
            Err(crate::Error::Validation(format!(
                "unknown status '{}', expected one of: in-progress, waiting, completed, failed, frozen",
                s
            )))
        }
    }
}
