//! Chart-ready series derived from a report.
//!
//! Trend series come from the yearly rows of `tables.merged.data` and keep
//! the service's row order. The probability series is parsed from the
//! embedded bar-chart figure; anything unparseable yields an empty series.

use serde::{Deserialize, Serialize};

use crate::helpers::json_number;
use crate::models::{MetricRow, Report};

/// Metric keys used by the report service.
pub const TEMPERATURE_KEY: &str = "Temperature (°C)";
pub const WIND_SPEED_KEY: &str = "Wind speed (m/s)";
pub const CLOUD_TOP_KEY: &str = "Cloud-top T (°C)";
pub const PRESSURE_KEY: &str = "Pressure (hPa)";
pub const PRECIPITATION_KEY: &str = "precip_mm_day";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMetric {
    Temperature,
    WindSpeed,
    CloudTopTemperature,
    Pressure,
}

impl TrendMetric {
    pub const ALL: [TrendMetric; 4] = [
        TrendMetric::Temperature,
        TrendMetric::WindSpeed,
        TrendMetric::CloudTopTemperature,
        TrendMetric::Pressure,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TrendMetric::Temperature => TEMPERATURE_KEY,
            TrendMetric::WindSpeed => WIND_SPEED_KEY,
            TrendMetric::CloudTopTemperature => CLOUD_TOP_KEY,
            TrendMetric::Pressure => PRESSURE_KEY,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TrendMetric::Temperature => "Temperature Trend",
            TrendMetric::WindSpeed => "Wind Speed Trend",
            TrendMetric::CloudTopTemperature => "Cloud-top T (°C)",
            TrendMetric::Pressure => "Pressure (hPa)",
        }
    }
}

/// One point of a trend chart. `value` is `None` when the cell is missing or
/// not a finite number; the chart shows a placeholder for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: Option<f64>,
}

/// One bar of the probability chart. `value` is `None` when the figure has no
/// usable number for the category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityBar {
    pub label: String,
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A labelled reading for the "current metrics" table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReading {
    pub label: &'static str,
    pub value: Option<f64>,
}

/// The four trend charts for a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub title: &'static str,
    pub points: Vec<SeriesPoint>,
}

/// Build the trend series for `metric`, one point per merged row.
pub fn trend_series(rows: &[MetricRow], metric: TrendMetric) -> Vec<SeriesPoint> {
    rows.iter()
        .map(|row| SeriesPoint {
            label: year_label(row.get("year")),
            value: json_number(row.get(metric.key())),
        })
        .collect()
}

/// All four trend charts, in display order.
pub fn trend_charts(report: &Report) -> Vec<TrendChart> {
    TrendMetric::ALL
        .iter()
        .map(|&metric| TrendChart {
            title: metric.title(),
            points: trend_series(report.merged_rows(), metric),
        })
        .collect()
}

/// Render the `year` cell as a chart label (`2020`, not `2020.0`).
fn year_label(v: Option<&serde_json::Value>) -> String {
    match v {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => format!("{}", f as i64),
                _ => n.to_string(),
            },
        },
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct Figure {
    #[serde(default)]
    data: Vec<Trace>,
}

#[derive(Debug, Deserialize)]
struct Trace {
    #[serde(default)]
    x: Vec<serde_json::Value>,
    #[serde(default)]
    y: Vec<serde_json::Value>,
    #[serde(default)]
    marker: Option<Marker>,
}

#[derive(Debug, Deserialize)]
struct Marker {
    #[serde(default)]
    color: Option<serde_json::Value>,
}

/// Parse the probability figure into bars.
///
/// Labels come from the first trace's `x`, values from `y` (missing or
/// non-numeric → `None`), colors from `marker.color` only when it is a list.
pub fn probability_series(report: &Report) -> Vec<ProbabilityBar> {
    let Some(raw) = report.probability_figure() else {
        return Vec::new();
    };

    let figure: Figure = match parse_figure(raw) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!("Probability figure unreadable, charting nothing: {}", e);
            return Vec::new();
        }
    };

    let Some(trace) = figure.data.into_iter().next() else {
        return Vec::new();
    };

    let colors: Vec<Option<String>> = match trace.marker.and_then(|m| m.color) {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|c| c.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    trace
        .x
        .iter()
        .enumerate()
        .map(|(i, label)| ProbabilityBar {
            label: match label {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            value: trace.y.get(i).and_then(number_like),
            color: colors.get(i).cloned().flatten(),
        })
        .collect()
}

fn parse_figure(raw: &serde_json::Value) -> Result<Figure, serde_json::Error> {
    match raw {
        serde_json::Value::String(encoded) => serde_json::from_str(encoded),
        other => serde_json::from_value(other.clone()),
    }
}

/// Numbers, and strings holding numbers, as finite f64.
fn number_like(v: &serde_json::Value) -> Option<f64> {
    let n = match v {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    };
    n.filter(|n| n.is_finite())
}

/// Headline metrics for the selected date.
pub fn current_metrics(report: &Report) -> Vec<MetricReading> {
    let row = report.forecast_row();
    let read = |key: &str| row.and_then(|r| json_number(r.get(key)));
    vec![
        MetricReading {
            label: "Temp (°C)",
            value: read(TEMPERATURE_KEY),
        },
        MetricReading {
            label: "Precip (mm/day)",
            value: read(PRECIPITATION_KEY),
        },
        MetricReading {
            label: "Wind (m/s)",
            value: read(WIND_SPEED_KEY),
        },
        MetricReading {
            label: "Pressure (hPa)",
            value: read(PRESSURE_KEY),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(value: serde_json::Value) -> Report {
        Report::from_value(value).unwrap()
    }

    #[test]
    fn test_trend_series_preserves_rows() {
        let r = report(serde_json::json!({
            "tables": {"merged": {"data": [
                {"year": 2020, "Temperature (°C)": 10},
                {"year": 2021, "Temperature (°C)": 12}
            ]}}
        }));
        let series = trend_series(r.merged_rows(), TrendMetric::Temperature);
        assert_eq!(
            series,
            vec![
                SeriesPoint {
                    label: "2020".into(),
                    value: Some(10.0)
                },
                SeriesPoint {
                    label: "2021".into(),
                    value: Some(12.0)
                },
            ]
        );
    }

    #[test]
    fn test_trend_series_does_not_sort() {
        let r = report(serde_json::json!({
            "tables": {"merged": {"data": [
                {"year": 2022, "Pressure (hPa)": 1009.5},
                {"year": 2019, "Pressure (hPa)": 1012.0},
                {"year": 2021.0, "Pressure (hPa)": 1011.0}
            ]}}
        }));
        let labels: Vec<String> = trend_series(r.merged_rows(), TrendMetric::Pressure)
            .into_iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(labels, vec!["2022", "2019", "2021"]);
    }

    #[test]
    fn test_trend_series_missing_values() {
        let r = report(serde_json::json!({
            "tables": {"merged": {"data": [
                {"year": 2020, "Wind speed (m/s)": null},
                {"year": 2021}
            ]}}
        }));
        let series = trend_series(r.merged_rows(), TrendMetric::WindSpeed);
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_trend_charts_titles() {
        let r = report(serde_json::json!({}));
        let titles: Vec<&str> = trend_charts(&r).iter().map(|c| c.title).collect();
        assert_eq!(
            titles,
            vec![
                "Temperature Trend",
                "Wind Speed Trend",
                "Cloud-top T (°C)",
                "Pressure (hPa)"
            ]
        );
    }

    #[test]
    fn test_probability_series_from_encoded_figure() {
        let figure = serde_json::json!({
            "data": [{
                "type": "bar",
                "x": ["Extreme Heat", "Rain", "Snow", "Thunderstorm"],
                "y": [0.0, 57.1, 28.6, "14.3"],
                "marker": {"color": ["#ef476f", "#118ab2", "#adb5bd"]}
            }],
            "layout": {"title": {"text": "Weather Probabilities"}}
        });
        let r = report(serde_json::json!({
            "figures": {"probability": figure.to_string()}
        }));

        let bars = probability_series(&r);
        assert_eq!(bars.len(), 4);
        assert_eq!(bars[1].label, "Rain");
        assert_eq!(bars[0].value, Some(0.0));
        assert_eq!(bars[1].value, Some(57.1));
        assert_eq!(bars[1].color.as_deref(), Some("#118ab2"));
        assert_eq!(bars[3].value, Some(14.3));
        assert_eq!(bars[3].color, None);
    }

    #[test]
    fn test_probability_series_single_color_ignored() {
        let r = report(serde_json::json!({
            "figures": {"probability": {"data": [{
                "x": ["Rain"], "y": [], "marker": {"color": "#123456"}
            }]}}
        }));
        let bars = probability_series(&r);
        assert_eq!(
            bars,
            vec![ProbabilityBar {
                label: "Rain".into(),
                value: None,
                color: None
            }]
        );
    }

    #[test]
    fn test_probability_series_unreadable_values_are_gaps() {
        let r = report(serde_json::json!({
            "figures": {"probability": {"data": [{
                "x": ["Rain", "Snow", "Extreme Heat", "Thunderstorm"],
                "y": ["n/a", null, "NaN", "12.5"]
            }]}}
        }));
        let values: Vec<Option<f64>> = probability_series(&r).iter().map(|b| b.value).collect();
        assert_eq!(values, vec![None, None, None, Some(12.5)]);
    }

    #[test]
    fn test_null_sections_give_empty_series() {
        let r = report(serde_json::json!({
            "tables": {"merged": {"data": null}, "forecast": null},
            "figures": null
        }));
        assert!(trend_charts(&r).iter().all(|c| c.points.is_empty()));
        assert!(probability_series(&r).is_empty());
        assert!(current_metrics(&r).iter().all(|m| m.value.is_none()));
    }

    #[test]
    fn test_probability_series_malformed_or_absent() {
        let absent = report(serde_json::json!({}));
        assert!(probability_series(&absent).is_empty());

        let garbage = report(serde_json::json!({"figures": {"probability": "{not json"}}));
        assert!(probability_series(&garbage).is_empty());

        let wrong_shape = report(serde_json::json!({"figures": {"probability": "[1, 2]"}}));
        assert!(probability_series(&wrong_shape).is_empty());

        let no_traces = report(serde_json::json!({"figures": {"probability": "{\"data\": []}"}}));
        assert!(probability_series(&no_traces).is_empty());
    }

    #[test]
    fn test_current_metrics() {
        let r = report(serde_json::json!({
            "tables": {"forecast": {"data": [
                {"Temperature (°C)": 31.2, "precip_mm_day": 0.0, "Wind speed (m/s)": null}
            ]}}
        }));
        let metrics = current_metrics(&r);
        assert_eq!(metrics[0].value, Some(31.2));
        assert_eq!(metrics[1].value, Some(0.0));
        assert_eq!(metrics[2].value, None);
        assert_eq!(metrics[3].value, None);
    }
}
