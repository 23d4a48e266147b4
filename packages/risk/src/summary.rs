//! Aggregate counts over a scored forecast.

use std::collections::BTreeMap;

use heatwave_weather_models::{RiskLevel, RiskRecord};
use serde::Serialize;

/// Headline numbers for one city's scored forecast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskSummary {
    /// Number of forecast days.
    pub days: usize,
    /// Days that belong to a heatwave event.
    pub heatwave_days: usize,
    /// Days scored [`RiskLevel::Extreme`].
    pub extreme_days: usize,
    /// Highest tier over the forecast, if there are any days.
    pub peak_level: Option<RiskLevel>,
    /// Number of days per tier. Tiers with no days are omitted.
    pub by_level: BTreeMap<RiskLevel, usize>,
}

impl RiskSummary {
    /// Returns `true` if at least one heatwave day was forecast.
    #[must_use]
    pub const fn has_heatwave(&self) -> bool {
        self.heatwave_days > 0
    }
}

/// Counts days, heatwave days, and days per risk tier.
#[must_use]
pub fn summarize_risk(records: &[RiskRecord]) -> RiskSummary {
    let mut summary = RiskSummary {
        days: records.len(),
        ..RiskSummary::default()
    };

    for record in records {
        if record.heatwave_id.is_some() {
            summary.heatwave_days += 1;
        }
        if record.risk_level == RiskLevel::Extreme {
            summary.extreme_days += 1;
        }
        *summary.by_level.entry(record.risk_level).or_default() += 1;
        summary.peak_level = summary.peak_level.max(Some(record.risk_level));
    }

    summary
}
