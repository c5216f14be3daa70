use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output formats accepted for the daemon's structured logs.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, flattened for log shippers.
    #[default]
    Json,
    /// Single-line human-readable output for interactive use.
    Compact,
}

/// Error returned when a [`LogFormat`] cannot be parsed from text.
pub type LogFormatParseError = strum::ParseError;
