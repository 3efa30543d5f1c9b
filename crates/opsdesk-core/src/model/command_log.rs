use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::timestamp::iso_millis;

/// Final disposition of one dispatch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    /// Handler returned success
    Success,
    /// Schema violation, unknown entity or handler failure
    Failed,
    /// Admin key missing or wrong
    Unauthorized,
    /// Fault caught at the dispatch boundary
    Error,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Success => "success",
            CommandStatus::Failed => "failed",
            CommandStatus::Unauthorized => "unauthorized",
            CommandStatus::Error => "error",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(CommandStatus::Success),
            "failed" => Ok(CommandStatus::Failed),
            "unauthorized" => Ok(CommandStatus::Unauthorized),
            "error" => Ok(CommandStatus::Error),
            other => Err(format!("unknown command status: {}", other)),
        }
    }
}

/// Append-only record of a dispatch attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLogEntry {
    pub command_id: String,
    pub entity: String,
    pub operation: String,
    pub request_data: Option<Value>,
    pub response_data: Option<Value>,
    pub status: CommandStatus,
    pub duration: i64,
    pub error_message: Option<String>,
    #[serde(with = "iso_millis")]
    pub executed_at: i64,
}

/// Aggregate counts over the command log
///
/// `failed` counts only the `failed` status; unauthorized and errored
/// attempts appear in `total` alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLogSummary {
    pub total: u64,
    pub last_hour: u64,
    pub last_day: u64,
    pub successful: u64,
    pub failed: u64,
}

impl CommandLogSummary {
    /// Percentage of logged commands that succeeded; 100 when the log is empty
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            CommandStatus::Success,
            CommandStatus::Failed,
            CommandStatus::Unauthorized,
            CommandStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<CommandStatus>(), Ok(status));
        }
        assert!("pending".parse::<CommandStatus>().is_err());
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(CommandLogSummary::default().success_rate(), 100.0);
        let summary = CommandLogSummary {
            total: 4,
            successful: 3,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(summary.success_rate(), 75.0);
    }
}
