//! Per-event summaries of detected heatwaves.

use chrono::NaiveDate;
use heatwave_weather_models::DetectionRecord;
use serde::Serialize;

/// A single heatwave event: the days sharing one `heatwave_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatwaveEvent {
    /// Shared `heatwave_id` of the event's days.
    pub id: u32,
    /// City the event was detected for.
    pub city: String,
    /// First day of the event.
    pub start: NaiveDate,
    /// Last day of the event (inclusive).
    pub end: NaiveDate,
    /// Number of days in the event.
    pub days: usize,
    /// Highest daily maximum during the event.
    pub peak_tmax: f64,
    /// Highest daily minimum during the event.
    pub peak_tmin: f64,
}

/// Collapses detection rows into one [`HeatwaveEvent`] per `heatwave_id`,
/// ordered by first appearance.
#[must_use]
pub fn summarize_events(detections: &[DetectionRecord]) -> Vec<HeatwaveEvent> {
    let mut events: Vec<HeatwaveEvent> = Vec::new();

    for detection in detections {
        let Some(id) = detection.heatwave_id else {
            continue;
        };

        if let Some(event) = events.iter_mut().find(|e| e.id == id) {
            event.start = event.start.min(detection.date);
            event.end = event.end.max(detection.date);
            event.days += 1;
            event.peak_tmax = event.peak_tmax.max(detection.tmax);
            event.peak_tmin = event.peak_tmin.max(detection.tmin);
        } else {
            events.push(HeatwaveEvent {
                id,
                city: detection.city.clone(),
                start: detection.date,
                end: detection.date,
                days: 1,
                peak_tmax: detection.tmax,
                peak_tmin: detection.tmin,
            });
        }
    }

    events
}
