//! Plain-text rendering of a scored forecast.

use std::fmt::Write as _;

use heatwave_detect::HeatwaveEvent;
use heatwave_risk::summarize_risk;
use heatwave_weather_models::{DetectionRecord, RiskLevel, RiskRecord};

/// Date format used in the risk table, e.g. `Mon, Jul 15`.
pub const DATE_FORMAT: &str = "%a, %b %d";

/// Full report for one city: headline, heatwave events, and the per-day
/// table.
#[must_use]
pub fn city_report(city_name: &str, records: &[RiskRecord]) -> String {
    let mut out = headline(city_name, records);
    out.push_str("\n\n");
    let event_lines = event_list(&events(records));
    if !event_lines.is_empty() {
        out.push_str(&event_lines);
        out.push('\n');
    }
    out.push_str(&risk_table(records));
    out
}

/// Heatwave events in a scored forecast.
#[must_use]
pub fn events(records: &[RiskRecord]) -> Vec<HeatwaveEvent> {
    let detections: Vec<DetectionRecord> = records
        .iter()
        .map(|record| DetectionRecord {
            date: record.date,
            tmin: record.tmin,
            tmax: record.tmax,
            city: record.city.clone(),
            exceeds_95p: record.exceeds_95p,
            heatwave_id: record.heatwave_id,
        })
        .collect();
    heatwave_detect::summarize_events(&detections)
}

/// One-line verdict for a city's forecast.
#[must_use]
pub fn headline(city_name: &str, records: &[RiskRecord]) -> String {
    let summary = summarize_risk(records);
    if summary.has_heatwave() {
        format!(
            "Heatwave detected! {} heatwave day(s) forecast for {city_name}, {} at extreme risk.",
            summary.heatwave_days, summary.extreme_days
        )
    } else {
        format!(
            "No heatwave forecast for {city_name} in the next {} day(s).",
            summary.days
        )
    }
}

/// Per-day table of temperatures, risk tier, and heatwave membership.
///
/// # Panics
///
/// Does not panic: writes to a `String` cannot fail.
#[must_use]
pub fn risk_table(records: &[RiskRecord]) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{:<12} {:>6} {:>6}  {:<9} {:<4} HEATWAVE",
        "DATE", "TMIN", "TMAX", "RISK", ""
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(50)).unwrap();

    for record in records {
        let heatwave = record
            .heatwave_id
            .map_or_else(|| "-".to_string(), |id| format!("#{id}"));
        writeln!(
            out,
            "{:<12} {:>6.1} {:>6.1}  {:<9} {:<4} {heatwave}",
            record.date.format(DATE_FORMAT).to_string(),
            record.tmin,
            record.tmax,
            record.risk_level.as_ref(),
            marker(record.risk_level),
        )
        .unwrap();
    }

    out
}

/// Lists heatwave events with their span and peaks.
///
/// # Panics
///
/// Does not panic: writes to a `String` cannot fail.
#[must_use]
pub fn event_list(events: &[HeatwaveEvent]) -> String {
    let mut out = String::new();
    for event in events {
        writeln!(
            out,
            "Heatwave #{}: {} to {} ({} days), peak {:.1} °C max / {:.1} °C min",
            event.id,
            event.start.format(DATE_FORMAT),
            event.end.format(DATE_FORMAT),
            event.days,
            event.peak_tmax,
            event.peak_tmin,
        )
        .unwrap();
    }
    out
}

/// Short severity marker shown next to the tier name.
const fn marker(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::None => "",
        RiskLevel::Mild => "!",
        RiskLevel::Moderate => "!!",
        RiskLevel::High => "!!!",
        RiskLevel::Extreme => "!!!!",
    }
}
