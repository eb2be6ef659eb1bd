//! Applies visual effects configurations to the map surface.
//!
//! Configurations committed before the map style has loaded are held (latest
//! wins) and replayed on the style-load event, since the precipitation and
//! fog layers do not exist until then. Every application starts from a clean
//! slate: rain and snow cleared, fog reset to the style's own fog.

use crate::models::CameraPosition;
use crate::view::effects::{FogParams, Precipitation, RainParams, SnowParams, VisualEffectsConfig};
use crate::view::overlay::IntensityOverlay;

/// Style import and property that hold the light preset.
const BASEMAP_IMPORT: &str = "basemap";
const LIGHT_PRESET_PROPERTY: &str = "lightPreset";

/// Imperative primitives of the underlying map.
pub trait MapSurface: Send {
    fn fly_to(&mut self, camera: CameraPosition);
    fn set_rain(&mut self, rain: Option<&RainParams>);
    fn set_snow(&mut self, snow: Option<&SnowParams>);
    fn set_fog(&mut self, fog: Option<&FogParams>);
    /// Fog currently set on the style.
    fn fog(&self) -> Option<FogParams>;
    fn set_config_property(&mut self, import: &str, key: &str, value: &str);
    /// Show the heatmap point for the selected place, or remove it.
    fn set_intensity_overlay(&mut self, overlay: Option<&IntensityOverlay>);
    /// Drop the move/style-load listeners registered for the controller.
    fn detach_listeners(&mut self);
}

#[derive(Debug, Default)]
pub struct Atmosphere {
    style_loaded: bool,
    baseline_fog: Option<FogParams>,
    pending: Option<VisualEffectsConfig>,
    applied: Option<VisualEffectsConfig>,
}

impl Atmosphere {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.style_loaded
    }

    /// Configuration waiting for the style to load.
    pub fn pending(&self) -> Option<&VisualEffectsConfig> {
        self.pending.as_ref()
    }

    /// Configuration last written to the surface.
    pub fn applied(&self) -> Option<&VisualEffectsConfig> {
        self.applied.as_ref()
    }

    /// Apply `config` now, or hold it until the style has loaded.
    pub fn commit(&mut self, config: VisualEffectsConfig, surface: &mut dyn MapSurface) {
        if !self.style_loaded {
            tracing::debug!("Map style not loaded yet, buffering atmosphere {:?}", config.light);
            self.pending = Some(config);
            return;
        }
        self.apply(config, surface);
    }

    /// Handle the surface's style-load event.
    ///
    /// Captures the style's own fog as the baseline and replays the held
    /// configuration (or the last applied one, after a style reload).
    pub fn on_style_load(&mut self, surface: &mut dyn MapSurface) {
        surface.set_config_property(BASEMAP_IMPORT, LIGHT_PRESET_PROPERTY, "dusk");
        self.baseline_fog = surface.fog();
        self.style_loaded = true;

        let replay = self
            .pending
            .take()
            .or_else(|| self.applied.take())
            .unwrap_or_else(VisualEffectsConfig::baseline);
        tracing::debug!("Map style loaded, replaying atmosphere {:?}", replay.light);
        self.apply(replay, surface);
    }

    fn apply(&mut self, config: VisualEffectsConfig, surface: &mut dyn MapSurface) {
        surface.set_rain(None);
        surface.set_snow(None);
        surface.set_fog(self.baseline_fog.as_ref());

        match &config.precipitation {
            Precipitation::None => {}
            Precipitation::Rain(rain) => surface.set_rain(Some(rain)),
            Precipitation::Snow(snow) => surface.set_snow(Some(snow)),
        }
        if let Some(fog) = config.fog.params() {
            surface.set_fog(Some(&fog));
        }
        surface.set_config_property(BASEMAP_IMPORT, LIGHT_PRESET_PROPERTY, config.light.as_str());

        self.applied = Some(config);
    }
}
