use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a dispatch task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Created, discovery and planning in progress
    #[default]
    Pending,
    /// Steps are being dispatched
    Working,
    /// Every step completed
    Completed,
    /// At least one step completed and at least one failed
    PartiallyFailed,
    /// No step completed, or no peers were available to plan against
    Failed,
    /// Peers were available but the request matched none of them
    NothingToDispatch,
    /// The caller went away before the plan was exhausted
    Cancelled,
}

impl TaskState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Working)
    }

    /// Check if this terminal state is reported to the caller as a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed | Self::PartiallyFailed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Working => write!(f, "working"),
            Self::Completed => write!(f, "completed"),
            Self::PartiallyFailed => write!(f, "partially_failed"),
            Self::Failed => write!(f, "failed"),
            Self::NothingToDispatch => write!(f, "nothing_to_dispatch"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "working" => Ok(Self::Working),
            "completed" => Ok(Self::Completed),
            "partially_failed" => Ok(Self::PartiallyFailed),
            "failed" => Ok(Self::Failed),
            "nothing_to_dispatch" => Ok(Self::NothingToDispatch),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid task state: {s}")),
        }
    }
}

/// Lifecycle states of a single dispatch step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    #[default]
    Pending,
    /// The step's message is in flight
    Working,
    Completed,
    Failed,
}

impl StepState {
    /// Check if the step has an outcome recorded
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Working => write!(f, "working"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for StepState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "working" => Ok(Self::Working),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid step state: {s}")),
        }
    }
}
