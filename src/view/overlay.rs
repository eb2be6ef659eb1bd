//! Single-point intensity overlay for the selected place.
//!
//! Picks the most telling metric of the forecast row (precipitation, then
//! wind, then temperature), scales it to a 0..1 heat weight and chooses a
//! color ramp from the report's event flags.

use serde::Serialize;

use crate::helpers::json_number;
use crate::models::{EventFlags, Location, Report};
use crate::view::effects::{EXTREME_HEAT_EVENT, SNOW_EVENT, THUNDERSTORM_EVENT};
use crate::view::series::{PRECIPITATION_KEY, TEMPERATURE_KEY, WIND_SPEED_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverlayMetric {
    Precipitation,
    WindSpeed,
    Temperature,
}

impl OverlayMetric {
    pub fn label(self) -> &'static str {
        match self {
            OverlayMetric::Precipitation => "Precip (mm/day)",
            OverlayMetric::WindSpeed => "Wind (m/s)",
            OverlayMetric::Temperature => "Temp (°C)",
        }
    }

    /// Value that maps to full intensity.
    fn full_scale(self) -> f64 {
        match self {
            OverlayMetric::Precipitation => 40.0,
            OverlayMetric::WindSpeed => 20.0,
            OverlayMetric::Temperature => 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRamp {
    Rain,
    Snow,
    Heat,
    Storm,
}

impl ColorRamp {
    /// Snow, then heat, then storm; rain colors otherwise.
    pub fn for_events(events: &EventFlags) -> Self {
        let on = |name: &str| events.get(name).copied().unwrap_or(false);
        if on(SNOW_EVENT) {
            ColorRamp::Snow
        } else if on(EXTREME_HEAT_EVENT) {
            ColorRamp::Heat
        } else if on(THUNDERSTORM_EVENT) {
            ColorRamp::Storm
        } else {
            ColorRamp::Rain
        }
    }

    /// `(density, color)` stops for the heatmap color expression.
    pub fn stops(self) -> [(f64, &'static str); 6] {
        match self {
            ColorRamp::Rain => [
                (0.0, "rgba(33,102,172,0.0)"),
                (0.2, "rgb(103,169,207)"),
                (0.4, "rgb(209,229,240)"),
                (0.6, "rgb(253,219,199)"),
                (0.8, "rgb(239,138,98)"),
                (1.0, "rgb(178,24,43)"),
            ],
            ColorRamp::Snow => [
                (0.0, "rgba(0,90,170,0.0)"),
                (0.2, "rgb(173,216,230)"),
                (0.4, "rgb(160,200,255)"),
                (0.6, "rgb(120,170,255)"),
                (0.8, "rgb(70,130,180)"),
                (1.0, "rgb(25,70,140)"),
            ],
            ColorRamp::Heat => [
                (0.0, "rgba(255,200,120,0.0)"),
                (0.2, "rgb(255,220,150)"),
                (0.4, "rgb(255,200,120)"),
                (0.6, "rgb(255,170,80)"),
                (0.8, "rgb(255,120,40)"),
                (1.0, "rgb(220,60,20)"),
            ],
            ColorRamp::Storm => [
                (0.0, "rgba(80,0,120,0.0)"),
                (0.2, "rgb(120,60,180)"),
                (0.4, "rgb(160,80,200)"),
                (0.6, "rgb(190,90,210)"),
                (0.8, "rgb(230,110,230)"),
                (1.0, "rgb(255,130,255)"),
            ],
        }
    }

    /// Color of the center marker drawn over the heat point.
    pub fn marker_color(self) -> &'static str {
        match self {
            ColorRamp::Rain => "#2b6cb0",
            ColorRamp::Snow => "#4f83cc",
            ColorRamp::Heat => "#ff7a33",
            ColorRamp::Storm => "#9a4bff",
        }
    }

    /// Heatmap color expression for the map style.
    pub fn to_expression(self) -> serde_json::Value {
        let mut expr = vec![
            serde_json::json!("interpolate"),
            serde_json::json!(["linear"]),
            serde_json::json!(["heatmap-density"]),
        ];
        for (stop, color) in self.stops() {
            expr.push(serde_json::json!(stop));
            expr.push(serde_json::json!(color));
        }
        serde_json::Value::Array(expr)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityOverlay {
    pub location: Location,
    pub metric: OverlayMetric,
    /// `None` when the forecast row has none of the metrics.
    pub value: Option<f64>,
    /// Heat weight in `0.0..=1.0`.
    pub weight: f64,
    pub ramp: ColorRamp,
}

impl IntensityOverlay {
    /// Build the overlay for a report, if it has a forecast row.
    pub fn derive(report: &Report, location: Location) -> Option<Self> {
        let row = report.forecast_row()?;
        let precipitation = json_number(row.get(PRECIPITATION_KEY));
        let wind = json_number(row.get(WIND_SPEED_KEY));
        let temperature = json_number(row.get(TEMPERATURE_KEY));

        let (metric, value) = match (precipitation, wind) {
            (Some(p), _) => (OverlayMetric::Precipitation, Some(p)),
            (None, Some(w)) => (OverlayMetric::WindSpeed, Some(w)),
            (None, None) => (OverlayMetric::Temperature, temperature),
        };
        let weight = (value.unwrap_or(0.0) / metric.full_scale()).clamp(0.0, 1.0);

        Some(Self {
            location,
            metric,
            value,
            weight,
            ramp: ColorRamp::for_events(&report.events()),
        })
    }

    /// GeoJSON for the overlay's point source.
    pub fn feature_collection(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [self.location.longitude, self.location.latitude]
                },
                "properties": {"weight": self.weight}
            }]
        })
    }
}
