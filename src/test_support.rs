//! In-memory collaborators for controller, fetcher and atmosphere tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::errors::FetchError;
use crate::models::{CameraPosition, Report, ReportRequest};
use crate::services::photos::PhotoSource;
use crate::services::report_client::ReportSource;
use crate::view::atmosphere::MapSurface;
use crate::view::controller::Notifier;
use crate::view::effects::{FogParams, RainParams, SnowParams};
use crate::view::overlay::IntensityOverlay;

/// Report source answering from a per-date script.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<HashMap<NaiveDate, Result<serde_json::Value, FetchError>>>,
    gates: Mutex<HashMap<NaiveDate, oneshot::Receiver<()>>>,
    requests: Mutex<Vec<ReportRequest>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, date: NaiveDate, body: serde_json::Value) {
        self.responses.lock().unwrap().insert(date, Ok(body));
    }

    pub fn fail(&self, date: NaiveDate, error: FetchError) {
        self.responses.lock().unwrap().insert(date, Err(error));
    }

    /// Hold the next fetch for `date` until the returned sender fires or is
    /// dropped.
    pub fn gate(&self, date: NaiveDate) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(date, rx);
        tx
    }

    pub fn requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ReportSource for ScriptedSource {
    fn fetch_report(&self, request: ReportRequest) -> BoxFuture<'static, Result<Report, FetchError>> {
        self.requests.lock().unwrap().push(request);
        let gate = self.gates.lock().unwrap().remove(&request.date);
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&request.date)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Transport("no scripted response".into())));

        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let body = response?;
            Report::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    FlyTo(CameraPosition),
    /// `true` when rain was set, `false` when cleared.
    Rain(bool),
    Snow(bool),
    Fog(Option<FogParams>),
    Config(String, String, String),
    /// Overlay weight, or `None` when removed.
    Overlay(Option<f64>),
    Detach,
}

/// What the map currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceState {
    pub rain: Option<RainParams>,
    pub snow: Option<SnowParams>,
    pub fog: Option<FogParams>,
    pub light: Option<String>,
    pub camera: Option<CameraPosition>,
    pub overlay: Option<IntensityOverlay>,
    pub detached: bool,
}

#[derive(Debug)]
struct SurfaceInner {
    calls: Vec<SurfaceCall>,
    state: SurfaceState,
}

/// Shared view of a `RecordingSurface`, kept by the test after the surface
/// has been boxed into a controller.
#[derive(Debug, Clone)]
pub struct SurfaceLog(Arc<Mutex<SurfaceInner>>);

impl SurfaceLog {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn state(&self) -> SurfaceState {
        self.0.lock().unwrap().state.clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().calls.clear();
    }

    /// Simulate a style reload: layers and light reset to the style's own.
    pub fn reset_style(&self) {
        let mut inner = self.0.lock().unwrap();
        inner.state.rain = None;
        inner.state.snow = None;
        inner.state.fog = Some(RecordingSurface::style_fog());
        inner.state.light = None;
        inner.state.overlay = None;
    }
}

/// Map surface that records every call.
pub struct RecordingSurface {
    log: SurfaceLog,
}

impl RecordingSurface {
    pub fn new() -> (Self, SurfaceLog) {
        let log = SurfaceLog(Arc::new(Mutex::new(SurfaceInner {
            calls: Vec::new(),
            state: SurfaceState {
                rain: None,
                snow: None,
                fog: Some(Self::style_fog()),
                light: None,
                camera: None,
                overlay: None,
                detached: false,
            },
        })));
        (Self { log: log.clone() }, log)
    }

    /// Fog the style ships with.
    pub fn style_fog() -> FogParams {
        FogParams {
            color: "rgb(186,210,235)".into(),
            horizon_blend: 0.1,
            high_color: "rgb(36,92,223)".into(),
            space_color: "rgb(11,11,25)".into(),
            star_intensity: 0.6,
        }
    }

    fn record(&mut self, call: SurfaceCall, update: impl FnOnce(&mut SurfaceState)) {
        let mut inner = self.log.0.lock().unwrap();
        inner.calls.push(call);
        update(&mut inner.state);
    }
}

impl MapSurface for RecordingSurface {
    fn fly_to(&mut self, camera: CameraPosition) {
        self.record(SurfaceCall::FlyTo(camera), |s| s.camera = Some(camera));
    }

    fn set_rain(&mut self, rain: Option<&RainParams>) {
        let rain = rain.cloned();
        self.record(SurfaceCall::Rain(rain.is_some()), |s| s.rain = rain);
    }

    fn set_snow(&mut self, snow: Option<&SnowParams>) {
        let snow = snow.cloned();
        self.record(SurfaceCall::Snow(snow.is_some()), |s| s.snow = snow);
    }

    fn set_fog(&mut self, fog: Option<&FogParams>) {
        let fog = fog.cloned();
        self.record(SurfaceCall::Fog(fog.clone()), |s| s.fog = fog);
    }

    fn fog(&self) -> Option<FogParams> {
        self.log.0.lock().unwrap().state.fog.clone()
    }

    fn set_config_property(&mut self, import: &str, key: &str, value: &str) {
        let call = SurfaceCall::Config(import.into(), key.into(), value.into());
        let is_light = key == "lightPreset";
        let value = value.to_string();
        self.record(call, |s| {
            if is_light {
                s.light = Some(value);
            }
        });
    }

    fn set_intensity_overlay(&mut self, overlay: Option<&IntensityOverlay>) {
        let overlay = overlay.cloned();
        self.record(SurfaceCall::Overlay(overlay.as_ref().map(|o| o.weight)), |s| {
            s.overlay = overlay
        });
    }

    fn detach_listeners(&mut self) {
        self.record(SurfaceCall::Detach, |s| s.detached = true);
    }
}

#[derive(Debug, Clone)]
enum Note {
    Shown(String),
    Dismissed,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier(Arc<Mutex<Vec<Note>>>);

impl RecordingNotifier {
    /// Texts shown, in order.
    pub fn notes(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Note::Shown(text) => Some(text.clone()),
                Note::Dismissed => None,
            })
            .collect()
    }

    pub fn dismissals(&self) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|n| matches!(n, Note::Dismissed))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, text: &str) {
        self.0.lock().unwrap().push(Note::Shown(text.to_string()));
    }

    fn dismiss(&self) {
        self.0.lock().unwrap().push(Note::Dismissed);
    }
}

/// Photo source with fixed answers.
pub struct StaticPhotos {
    pub by_name: Option<String>,
    pub near: Option<String>,
}

impl PhotoSource for StaticPhotos {
    fn photo_by_name(&self, _name: &str) -> BoxFuture<'static, Option<String>> {
        let url = self.by_name.clone();
        Box::pin(async move { url })
    }

    fn photo_near(&self, _latitude: f64, _longitude: f64) -> BoxFuture<'static, Option<String>> {
        let url = self.near.clone();
        Box::pin(async move { url })
    }
}
