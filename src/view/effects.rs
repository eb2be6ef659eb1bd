//! Report event flags → map atmosphere.
//!
//! `compute_effects` is pure: the same flags always produce the same
//! configuration, and no flags produce the baseline (no precipitation,
//! baseline fog, dusk light). Precipitation and fog/light are decided
//! independently:
//!
//! - precipitation: rain if `Rain`, replaced by snow if `Snow`
//! - fog/light: first of `Thunderstorm` (storm, night) or `Extreme Heat`
//!   (heat haze, day), otherwise baseline fog and dusk

use serde::Serialize;

use crate::models::EventFlags;

pub const RAIN_EVENT: &str = "Rain";
pub const SNOW_EVENT: &str = "Snow";
pub const THUNDERSTORM_EVENT: &str = "Thunderstorm";
pub const EXTREME_HEAT_EVENT: &str = "Extreme Heat";

/// Zoom at which precipitation starts to show.
const REVEAL_MIN_ZOOM: f64 = 11.0;
/// Zoom at which precipitation reaches full strength.
const REVEAL_MAX_ZOOM: f64 = 13.0;

/// A value that ramps linearly from 0 at `min_zoom` to `value` at
/// `max_zoom`, clamped outside that window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRamp {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub value: f64,
}

impl ZoomRamp {
    pub const fn reveal(value: f64) -> Self {
        Self {
            min_zoom: REVEAL_MIN_ZOOM,
            max_zoom: REVEAL_MAX_ZOOM,
            value,
        }
    }

    /// Evaluate the ramp at a zoom level.
    pub fn at(&self, zoom: f64) -> f64 {
        if zoom <= self.min_zoom {
            return 0.0;
        }
        if zoom >= self.max_zoom {
            return self.value;
        }
        let t = (zoom - self.min_zoom) / (self.max_zoom - self.min_zoom);
        self.value * t
    }

    /// The equivalent map style expression.
    pub fn to_expression(&self) -> serde_json::Value {
        serde_json::json!([
            "interpolate",
            ["linear"],
            ["zoom"],
            self.min_zoom,
            0.0,
            self.max_zoom,
            self.value
        ])
    }
}

impl Serialize for ZoomRamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_expression().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RainParams {
    pub density: ZoomRamp,
    pub intensity: f64,
    pub color: &'static str,
    pub opacity: f64,
    pub vignette: ZoomRamp,
    pub vignette_color: &'static str,
    pub direction: [f64; 2],
    pub droplet_size: [f64; 2],
    pub distortion_strength: f64,
    pub center_thinning: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SnowParams {
    pub density: ZoomRamp,
    pub intensity: f64,
    pub center_thinning: f64,
    pub direction: [f64; 2],
    pub opacity: f64,
    pub color: &'static str,
    pub flake_size: f64,
    pub vignette: ZoomRamp,
    pub vignette_color: &'static str,
}

/// Fog settings as the map surface takes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FogParams {
    pub color: String,
    pub horizon_blend: f64,
    pub high_color: String,
    pub space_color: String,
    pub star_intensity: f64,
}

pub const RAIN: RainParams = RainParams {
    density: ZoomRamp::reveal(0.5),
    intensity: 1.0,
    color: "#a8adbc",
    opacity: 0.7,
    vignette: ZoomRamp::reveal(1.0),
    vignette_color: "#464646",
    direction: [0.0, 80.0],
    droplet_size: [2.6, 18.2],
    distortion_strength: 0.7,
    center_thinning: 0.0,
};

pub const SNOW: SnowParams = SnowParams {
    density: ZoomRamp::reveal(0.85),
    intensity: 1.0,
    center_thinning: 0.1,
    direction: [0.0, 50.0],
    opacity: 1.0,
    color: "#ffffff",
    flake_size: 0.71,
    vignette: ZoomRamp::reveal(0.3),
    vignette_color: "#ffffff",
};

#[derive(Debug, Clone, PartialEq)]
pub enum Precipitation {
    None,
    Rain(RainParams),
    Snow(SnowParams),
}

impl Precipitation {
    pub fn label(&self) -> &'static str {
        match self {
            Precipitation::None => "none",
            Precipitation::Rain(_) => "rain",
            Precipitation::Snow(_) => "snow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogPreset {
    /// Whatever fog the map style shipped with.
    Baseline,
    Storm,
    HeatHaze,
}

impl FogPreset {
    pub fn label(self) -> &'static str {
        match self {
            FogPreset::Baseline => "baseline",
            FogPreset::Storm => "storm",
            FogPreset::HeatHaze => "heat-haze",
        }
    }

    /// Explicit fog for this preset; `None` for the baseline.
    pub fn params(self) -> Option<FogParams> {
        match self {
            FogPreset::Baseline => None,
            FogPreset::Storm => Some(FogParams {
                color: "rgb(210,210,210)".into(),
                horizon_blend: 0.5,
                high_color: "rgb(36,44,107)".into(),
                space_color: "rgb(11,11,25)".into(),
                star_intensity: 0.0,
            }),
            FogPreset::HeatHaze => Some(FogParams {
                color: "rgba(255,200,150,0.25)".into(),
                horizon_blend: 0.25,
                high_color: "rgba(255,160,120,0.18)".into(),
                space_color: "rgb(11,11,25)".into(),
                star_intensity: 0.0,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightPreset {
    Dusk,
    Night,
    Day,
}

impl LightPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            LightPreset::Dusk => "dusk",
            LightPreset::Night => "night",
            LightPreset::Day => "day",
        }
    }
}

/// Everything the map needs to render a report's atmosphere.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEffectsConfig {
    pub precipitation: Precipitation,
    pub fog: FogPreset,
    pub light: LightPreset,
}

impl VisualEffectsConfig {
    pub fn baseline() -> Self {
        Self {
            precipitation: Precipitation::None,
            fog: FogPreset::Baseline,
            light: LightPreset::Dusk,
        }
    }

    pub fn is_baseline(&self) -> bool {
        *self == Self::baseline()
    }
}

fn flag(events: &EventFlags, name: &str) -> bool {
    events.get(name).copied().unwrap_or(false)
}

/// Map event flags to a visual effects configuration.
pub fn compute_effects(events: &EventFlags) -> VisualEffectsConfig {
    let mut config = VisualEffectsConfig::baseline();

    if flag(events, RAIN_EVENT) {
        config.precipitation = Precipitation::Rain(RAIN);
    }
    if flag(events, SNOW_EVENT) {
        config.precipitation = Precipitation::Snow(SNOW);
    }

    if flag(events, THUNDERSTORM_EVENT) {
        config.fog = FogPreset::Storm;
        config.light = LightPreset::Night;
    } else if flag(events, EXTREME_HEAT_EVENT) {
        config.fog = FogPreset::HeatHaze;
        config.light = LightPreset::Day;
    }

    config
}
