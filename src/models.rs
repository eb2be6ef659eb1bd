//! Selection and report types shared by the services and the view layer.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Event name → whether the report flags it (`Rain`, `Snow`, `Thunderstorm`,
/// `Extreme Heat`, …).
pub type EventFlags = BTreeMap<String, bool>;

/// One table row: `year` (merged table only) plus named numeric metrics.
pub type MetricRow = serde_json::Map<String, serde_json::Value>;

/// A point picked on the map. Replaced wholesale on every new selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

/// Place metadata reported by the search box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceProperties {
    pub name: Option<String>,
    pub full_address: Option<String>,
    pub place_formatted: Option<String>,
}

/// Payload of the search box's retrieve event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceSelection {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub properties: PlaceProperties,
}

impl PlaceSelection {
    pub fn location(&self) -> Location {
        Location {
            longitude: self.longitude,
            latitude: self.latitude,
        }
    }
}

/// Map camera, as reported by the surface's move event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

/// Request body for the report service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportRequest {
    pub lat: f64,
    pub lon: f64,
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
}

impl ReportRequest {
    pub fn new(location: Location, date: NaiveDate) -> Self {
        Self {
            lat: location.latitude,
            lon: location.longitude,
            date,
        }
    }
}

/// A weather report as returned by the report service.
///
/// Keeps the raw body for export and the typed sections parsed once on
/// arrival. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Report {
    raw: serde_json::Value,
    body: ReportBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ReportBody {
    #[serde(default, deserialize_with = "lenient")]
    tables: ReportTables,
    #[serde(default, deserialize_with = "lenient")]
    events: BTreeMap<String, serde_json::Value>,
    #[serde(default, deserialize_with = "lenient")]
    figures: ReportFigures,
    #[serde(default, deserialize_with = "lenient")]
    chatbot: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ReportTables {
    #[serde(default, deserialize_with = "lenient")]
    merged: ReportTable,
    #[serde(default, deserialize_with = "lenient")]
    forecast: ReportTable,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ReportTable {
    #[serde(default, deserialize_with = "lenient")]
    data: Vec<MetricRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ReportFigures {
    #[serde(default)]
    probability: Option<serde_json::Value>,
}

/// Read a section, falling back to its empty form when it is `null` or has
/// an unexpected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!("Unreadable report section, treating it as empty: {}", e);
        T::default()
    }))
}

impl Report {
    /// Build a report from a decoded response body.
    ///
    /// Missing, `null` or malformed sections read as empty; only a body that
    /// is not an object is rejected.
    pub fn from_value(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let body: ReportBody = serde_json::from_value(raw.clone())?;
        Ok(Self { raw, body })
    }

    /// The body exactly as received.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// Yearly rows of `tables.merged.data`, in service order.
    pub fn merged_rows(&self) -> &[MetricRow] {
        &self.body.tables.merged.data
    }

    /// Metrics for the selected date (first row of `tables.forecast.data`).
    pub fn forecast_row(&self) -> Option<&MetricRow> {
        self.body.tables.forecast.data.first()
    }

    /// Event flags; non-boolean values count as not set.
    pub fn events(&self) -> EventFlags {
        self.body
            .events
            .iter()
            .map(|(name, v)| (name.clone(), v.as_bool().unwrap_or(false)))
            .collect()
    }

    /// The embedded probability figure: either a JSON-encoded string or an
    /// already decoded object.
    pub fn probability_figure(&self) -> Option<&serde_json::Value> {
        self.body.figures.probability.as_ref()
    }

    /// Advisory text for the notification bubble.
    pub fn chatbot(&self) -> Option<&str> {
        self.body.chatbot.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_sections() {
        let raw = serde_json::json!({
            "tables": {
                "merged": {"columns": ["year"], "data": [{"year": 2020}, {"year": 2021}]},
                "forecast": {"data": [{"Temperature (°C)": 21.5}]}
            },
            "events": {"Rain": true, "Snow": false, "Odd": "yes"},
            "figures": {"probability": "{\"data\": []}"},
            "chatbot": "Bring an umbrella"
        });
        let report = Report::from_value(raw.clone()).unwrap();

        assert_eq!(report.merged_rows().len(), 2);
        assert!(report.forecast_row().is_some());
        assert_eq!(report.events().get("Rain"), Some(&true));
        assert_eq!(report.events().get("Odd"), Some(&false));
        assert!(report.probability_figure().is_some());
        assert_eq!(report.chatbot(), Some("Bring an umbrella"));
        assert_eq!(report.raw(), &raw);
    }

    #[test]
    fn test_report_missing_sections_default() {
        let report = Report::from_value(serde_json::json!({})).unwrap();
        assert!(report.merged_rows().is_empty());
        assert!(report.forecast_row().is_none());
        assert!(report.events().is_empty());
        assert!(report.probability_figure().is_none());
        assert_eq!(report.chatbot(), None);
    }

    #[test]
    fn test_report_null_sections_default() {
        let report = Report::from_value(serde_json::json!({
            "tables": {"merged": {"data": null}, "forecast": null},
            "figures": null,
            "events": {"Rain": true},
            "chatbot": "hi"
        }))
        .unwrap();
        assert!(report.merged_rows().is_empty());
        assert!(report.forecast_row().is_none());
        assert!(report.probability_figure().is_none());
        assert_eq!(report.events().get("Rain"), Some(&true));
        assert_eq!(report.chatbot(), Some("hi"));

        let report = Report::from_value(serde_json::json!({"events": null, "tables": null})).unwrap();
        assert!(report.events().is_empty());
        assert!(report.merged_rows().is_empty());
    }

    #[test]
    fn test_report_odd_typed_sections_default() {
        let report = Report::from_value(serde_json::json!({
            "tables": {"merged": {"data": "not rows"}, "forecast": {"data": [1, 2]}},
            "figures": [],
            "events": ["Rain"],
            "chatbot": 42
        }))
        .unwrap();
        assert!(report.merged_rows().is_empty());
        assert!(report.forecast_row().is_none());
        assert!(report.events().is_empty());
        assert!(report.probability_figure().is_none());
        assert_eq!(report.chatbot(), None);
    }

    #[test]
    fn test_report_rejects_non_object() {
        assert!(Report::from_value(serde_json::json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_report_request_body() {
        let req = ReportRequest::new(
            Location {
                longitude: -73.9855,
                latitude: 40.758,
            },
            NaiveDate::from_ymd_opt(2026, 7, 4).unwrap(),
        );
        let body = serde_json::to_value(req).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"lat": 40.758, "lon": -73.9855, "date": "2026-07-04"})
        );
    }

    #[test]
    fn test_place_selection_from_search_payload() {
        let sel: PlaceSelection = serde_json::from_value(serde_json::json!({
            "longitude": 2.2945,
            "latitude": 48.8584,
            "properties": {"name": "Eiffel Tower", "full_address": "Paris, France"}
        }))
        .unwrap();
        assert_eq!(sel.location().latitude, 48.8584);
        assert_eq!(sel.properties.name.as_deref(), Some("Eiffel Tower"));
        assert_eq!(sel.properties.place_formatted, None);
    }
}
