use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rate-limit window from the OAuth usage endpoint.
///
/// `percent` is always rounded and clamped into 0..=100 before construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageWindow {
    pub percent: u8,
    pub reset_time: Option<DateTime<Utc>>,
}

impl UsageWindow {
    /// Build a window from a raw utilization figure, enforcing the clamp.
    pub fn from_utilization(utilization: f64, reset_time: Option<DateTime<Utc>>) -> Self {
        UsageWindow {
            percent: utilization.round().clamp(0.0, 100.0) as u8,
            reset_time,
        }
    }
}

/// Rate-limit usage across the three windows the API reports.
///
/// Serialized camelCase (`fiveHour`, `sevenDaySonnet`, ...) so the disk cache
/// format matches the field names the endpoint itself uses downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub five_hour: Option<UsageWindow>,
    pub seven_day: Option<UsageWindow>,
    pub seven_day_sonnet: Option<UsageWindow>,
}
