//! Selection state machine.
//!
//! `SelectionController` owns the place/date selection, the current report
//! and everything derived from it. All mutation goes through its `&mut self`
//! handlers, which recompute stage-dependent state (series, effects) before
//! returning. Background work (report fetches, photo lookups) posts a
//! `Completion` that the owner feeds back through `handle_completion`.
//!
//! Stages: `Idle` (nothing selected) → `Place` (location, no date) →
//! `Forecast` (location and date). Loading and error only occur in
//! `Forecast`.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::{abortable, AbortHandle};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::{
    CameraPosition, EventFlags, Location, PlaceProperties, PlaceSelection, Report, ReportRequest,
};
use crate::services::fetcher::{PlaceGeneration, ReportFetcher};
use crate::services::photos::{lookup_place_photo, PhotoSource};
use crate::services::report_client::ReportSource;
use crate::services::Completion;
use crate::view::atmosphere::{Atmosphere, MapSurface};
use crate::view::download::{self, DownloadArtifact, ReportKind};
use crate::view::effects::{compute_effects, VisualEffectsConfig};
use crate::view::overlay::IntensityOverlay;
use crate::view::series::{self, MetricReading, ProbabilityBar, TrendChart};
use crate::view::stage::{self, Stage};

/// Zoom the camera flies to after a place is picked; precipitation is at
/// full strength from zoom 13.
const PLACE_ZOOM: f64 = 14.0;

/// Receives advisory text for the notification bubble.
pub trait Notifier: Send {
    fn notify(&self, text: &str);
    fn dismiss(&self);
}

/// External collaborators the controller drives.
pub struct Collaborators {
    pub reports: Arc<dyn ReportSource>,
    /// `None` disables photo lookups.
    pub photos: Option<Arc<dyn PhotoSource>>,
    pub surface: Box<dyn MapSurface>,
    pub notifier: Box<dyn Notifier>,
}

/// Chart and table data derived from the current report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    pub kind: ReportKind,
    pub current: Vec<MetricReading>,
    pub trends: Vec<TrendChart>,
    pub probabilities: Vec<ProbabilityBar>,
    pub overlay: Option<IntensityOverlay>,
}

impl DerivedView {
    pub fn derive(report: &Report, request: &ReportRequest, today: NaiveDate) -> Self {
        let location = Location {
            longitude: request.lon,
            latitude: request.lat,
        };
        Self {
            kind: ReportKind::for_date(request.date, today),
            current: series::current_metrics(report),
            trends: series::trend_charts(report),
            probabilities: series::probability_series(report),
            overlay: IntensityOverlay::derive(report, location),
        }
    }
}

/// A report together with the exact selection that produced it.
struct CurrentReport {
    request: ReportRequest,
    report: Report,
    derived: DerivedView,
}

/// Serializable summary of the controller state.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub stage: Stage,
    pub location: Option<Location>,
    pub place_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub loading: bool,
    pub error: Option<String>,
    pub photo_url: Option<String>,
    pub precipitation: &'static str,
    pub fog: &'static str,
    pub light: &'static str,
    pub camera: CameraPosition,
    pub report: Option<DerivedView>,
}

pub struct SelectionController {
    fetcher: ReportFetcher,
    photos: Option<Arc<dyn PhotoSource>>,
    surface: Box<dyn MapSurface>,
    notifier: Box<dyn Notifier>,
    atmosphere: Atmosphere,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    home: CameraPosition,
    camera: CameraPosition,

    location: Option<Location>,
    properties: Option<PlaceProperties>,
    date: Option<NaiveDate>,
    report: Option<CurrentReport>,
    photo_url: Option<String>,
    loading: bool,
    error: Option<String>,
    effects: VisualEffectsConfig,
    place_generation: PlaceGeneration,
    photo_lookup: Option<AbortHandle>,
}

impl SelectionController {
    pub fn new(collaborators: Collaborators, home: CameraPosition) -> Self {
        let (completions_tx, completions) = mpsc::unbounded_channel();
        Self {
            fetcher: ReportFetcher::new(collaborators.reports, completions_tx.clone()),
            photos: collaborators.photos,
            surface: collaborators.surface,
            notifier: collaborators.notifier,
            atmosphere: Atmosphere::new(),
            completions_tx,
            completions,
            home,
            camera: home,
            location: None,
            properties: None,
            date: None,
            report: None,
            photo_url: None,
            loading: false,
            error: None,
            effects: VisualEffectsConfig::baseline(),
            place_generation: PlaceGeneration::default(),
            photo_lookup: None,
        }
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// The user picked a place in the search box.
    pub fn select_place(&mut self, selection: PlaceSelection) {
        let location = selection.location();
        tracing::info!(
            "Place selected: {} ({:.4}, {:.4})",
            selection.properties.name.as_deref().unwrap_or("unnamed"),
            location.latitude,
            location.longitude
        );

        self.fetcher.cancel();
        self.abort_photo_lookup();
        self.place_generation = self.place_generation.next();

        self.location = Some(location);
        self.properties = Some(selection.properties);
        self.date = None;
        self.report = None;
        self.photo_url = None;
        self.error = None;
        self.loading = false;

        self.refresh_effects();
        self.surface.fly_to(CameraPosition {
            longitude: location.longitude,
            latitude: location.latitude,
            zoom: PLACE_ZOOM,
        });
        self.start_photo_lookup(location);
    }

    /// The user picked a date. Ignored until a place is selected.
    pub fn select_date(&mut self, date: NaiveDate) {
        let Some(location) = self.location else {
            tracing::warn!("Date {} selected without a place, ignoring", date);
            return;
        };

        let already_have = self
            .report
            .as_ref()
            .is_some_and(|r| r.request == ReportRequest::new(location, date));
        if self.date == Some(date) && (self.fetcher.is_pending() || already_have) {
            tracing::debug!("Report for {} already loaded or loading", date);
            return;
        }

        self.date = Some(date);
        self.report = None;
        self.error = None;
        self.loading = true;

        let epoch = self.fetcher.begin(ReportRequest::new(location, date));
        tracing::info!("Fetching report for {} (fetch {})", date, epoch.value());
        self.refresh_effects();
    }

    /// The user cleared the date but kept the place.
    pub fn clear_date(&mut self) {
        if self.date.is_none() {
            return;
        }
        tracing::info!("Date cleared");

        self.fetcher.cancel();
        self.date = None;
        self.report = None;
        self.error = None;
        self.loading = false;
        self.refresh_effects();
    }

    /// The user cleared the search input: back to `Idle`.
    pub fn clear_input(&mut self) {
        tracing::info!("Selection cleared");

        self.fetcher.cancel();
        self.abort_photo_lookup();
        self.place_generation = self.place_generation.next();

        self.location = None;
        self.properties = None;
        self.date = None;
        self.report = None;
        self.photo_url = None;
        self.error = None;
        self.loading = false;

        self.refresh_effects();
        self.notifier.dismiss();
    }

    /// Apply a result posted by a background task.
    ///
    /// Returns `true` when a report outcome (success or failure) changed the
    /// state; stale, cancelled and photo results return `false`.
    pub fn handle_completion(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::Report {
                epoch,
                request,
                outcome,
            } => {
                let Some(outcome) = self.fetcher.accept(epoch, outcome) else {
                    return false;
                };
                if self.current_request() != Some(request) {
                    tracing::warn!(
                        "Report for {} no longer matches the selection, dropping it",
                        request.date
                    );
                    return false;
                }
                self.loading = false;

                match outcome {
                    Ok(report) => self.accept_report(request, report),
                    Err(e) => {
                        tracing::error!("Report fetch for {} failed: {}", request.date, e);
                        self.report = None;
                        self.error = e.user_message().map(str::to_string);
                        self.refresh_effects();
                    }
                }
                true
            }
            Completion::Photo { generation, url } => {
                if generation != self.place_generation {
                    tracing::debug!("Discarding photo for a previous place");
                    return false;
                }
                self.photo_lookup = None;
                self.photo_url = url;
                false
            }
        }
    }

    /// Wait for the next background result.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions.recv().await
    }

    /// Wait for the next background result and apply it.
    pub async fn settle(&mut self) {
        if let Some(completion) = self.next_completion().await {
            self.handle_completion(completion);
        }
    }

    /// Apply every result that has already arrived. Returns how many.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions.try_recv() {
            self.handle_completion(completion);
            applied += 1;
        }
        applied
    }

    // -----------------------------------------------------------------------
    // Map surface events and camera
    // -----------------------------------------------------------------------

    pub fn on_style_load(&mut self) {
        self.atmosphere.on_style_load(self.surface.as_mut());
        self.sync_overlay();
    }

    pub fn on_move(&mut self, camera: CameraPosition) {
        tracing::trace!(
            "Camera at ({:.4}, {:.4}) zoom {:.2}",
            camera.latitude,
            camera.longitude,
            camera.zoom
        );
        self.camera = camera;
    }

    pub fn fly_home(&mut self) {
        self.surface.fly_to(self.home);
    }

    pub fn fly_to(&mut self, camera: CameraPosition) {
        self.surface.fly_to(camera);
    }

    // -----------------------------------------------------------------------
    // State reads
    // -----------------------------------------------------------------------

    pub fn stage(&self) -> Stage {
        stage::resolve(self.location.as_ref(), self.date)
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn properties(&self) -> Option<&PlaceProperties> {
        self.properties.as_ref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref().map(|r| &r.report)
    }

    pub fn derived(&self) -> Option<&DerivedView> {
        self.report.as_ref().map(|r| &r.derived)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    /// Effects computed by the last transition.
    pub fn effects(&self) -> &VisualEffectsConfig {
        &self.effects
    }

    pub fn atmosphere(&self) -> &Atmosphere {
        &self.atmosphere
    }

    pub fn camera(&self) -> CameraPosition {
        self.camera
    }

    /// The current report as a downloadable file.
    pub fn download(&self) -> Option<DownloadArtifact> {
        let current = self.report.as_ref()?;
        let name = self.properties.as_ref().and_then(|p| p.name.as_deref());
        let today = Utc::now().date_naive();
        match download::build(&current.report, name, current.request.date, today) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                tracing::error!("Failed to serialize report for download: {}", e);
                None
            }
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            stage: self.stage(),
            location: self.location,
            place_name: self.properties.as_ref().and_then(|p| p.name.clone()),
            date: self.date,
            loading: self.loading,
            error: self.error.clone(),
            photo_url: self.photo_url.clone(),
            precipitation: self.effects.precipitation.label(),
            fog: self.effects.fog.label(),
            light: self.effects.light.as_str(),
            camera: self.camera,
            report: self.derived().cloned(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn current_request(&self) -> Option<ReportRequest> {
        Some(ReportRequest::new(self.location?, self.date?))
    }

    fn accept_report(&mut self, request: ReportRequest, report: Report) {
        let derived = DerivedView::derive(&report, &request, Utc::now().date_naive());
        tracing::info!(
            "Report received for {}: {} yearly rows, {} events flagged",
            request.date,
            report.merged_rows().len(),
            report.events().values().filter(|&&on| on).count()
        );

        match report.chatbot().map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => self.notifier.notify(text),
            None => self.notifier.dismiss(),
        }

        self.error = None;
        self.report = Some(CurrentReport {
            request,
            report,
            derived,
        });
        self.refresh_effects();
    }

    /// Recompute the atmosphere from the current stage and report and hand it
    /// to the map. Anything short of a loaded forecast gets the baseline.
    fn refresh_effects(&mut self) {
        let events = match (self.stage(), &self.report) {
            (Stage::Forecast, Some(current)) => current.report.events(),
            _ => EventFlags::new(),
        };
        self.effects = compute_effects(&events);
        self.atmosphere
            .commit(self.effects.clone(), self.surface.as_mut());
        self.sync_overlay();
    }

    /// Show the current report's intensity overlay, or remove it outside a
    /// loaded forecast. Skipped until the style has loaded; `on_style_load`
    /// pushes it then.
    fn sync_overlay(&mut self) {
        if !self.atmosphere.is_ready() {
            return;
        }
        let stage = self.stage();
        let overlay = match (stage, &self.report) {
            (Stage::Forecast, Some(current)) => current.derived.overlay.as_ref(),
            _ => None,
        };
        self.surface.set_intensity_overlay(overlay);
    }

    fn start_photo_lookup(&mut self, location: Location) {
        let Some(photos) = self.photos.clone() else {
            return;
        };
        let name = self.properties.as_ref().and_then(|p| p.name.clone());
        let generation = self.place_generation;

        let (lookup, abort) = abortable(async move {
            lookup_place_photo(
                photos.as_ref(),
                name.as_deref(),
                location.latitude,
                location.longitude,
            )
            .await
        });
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            if let Ok(url) = lookup.await {
                let _ = tx.send(Completion::Photo { generation, url });
            }
        });
        self.photo_lookup = Some(abort);
    }

    fn abort_photo_lookup(&mut self) {
        if let Some(abort) = self.photo_lookup.take() {
            abort.abort();
        }
    }
}

impl Drop for SelectionController {
    fn drop(&mut self) {
        self.fetcher.cancel();
        self.abort_photo_lookup();
        self.surface.detach_listeners();
    }
}
