//! Delayed-task status.

use serde::{Deserialize, Serialize};

/// Status of a delayed task.
///
/// `Success` and `Canceled` are terminal: no transition ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Success,
    Canceled,
}

impl TaskStatus {
    /// The text form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Success => "success",
            TaskStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Canceled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "success" => Ok(TaskStatus::Success),
            "canceled" => Ok(TaskStatus::Canceled),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}
