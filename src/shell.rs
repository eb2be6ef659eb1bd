//! Line-oriented console front end.
//!
//! Stands in for the map widget and the search/date inputs: each stdin line
//! is one user event, and the map surface and notification bubble are
//! rendered as log lines and console output.

use std::path::Path;

use chrono::NaiveDate;

use crate::helpers::{format_metric, parse_iso_date};
use crate::models::{CameraPosition, PlaceProperties, PlaceSelection};
use crate::view::atmosphere::MapSurface;
use crate::view::controller::{Notifier, SelectionController};
use crate::view::effects::{FogParams, RainParams, SnowParams};
use crate::view::overlay::IntensityOverlay;

pub const HELP: &str = "\
commands:
  place <lon> <lat> [name...]   select a place
  date <YYYY-MM-DD>             select a date and fetch its report
  undate                        clear the date, keep the place
  clear                         clear the selection
  style-loaded                  signal that the map style finished loading
  move <lon> <lat> <zoom>       move the camera
  home                          fly back to the initial view
  show                          print the current state
  save                          write the current report to the download directory
  help                          print this help
  quit                          exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Place(PlaceSelection),
    Date(NaiveDate),
    Undate,
    Clear,
    StyleLoaded,
    Move(CameraPosition),
    Home,
    Show,
    Save,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a date (expected YYYY-MM-DD)")]
    BadDate(String),
}

fn number(s: &str) -> Result<f64, CommandError> {
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| CommandError::NotANumber(s.to_string()))
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        match head.to_ascii_lowercase().as_str() {
            "place" => {
                let [lon, lat, name @ ..] = args.as_slice() else {
                    return Err(CommandError::Usage("place <lon> <lat> [name...]"));
                };
                let name = (!name.is_empty()).then(|| name.join(" "));
                Ok(Command::Place(PlaceSelection {
                    longitude: number(lon)?,
                    latitude: number(lat)?,
                    properties: PlaceProperties {
                        name,
                        ..Default::default()
                    },
                }))
            }
            "date" => {
                let [date] = args.as_slice() else {
                    return Err(CommandError::Usage("date <YYYY-MM-DD>"));
                };
                parse_iso_date(date)
                    .map(Command::Date)
                    .ok_or_else(|| CommandError::BadDate(date.to_string()))
            }
            "move" => {
                let [lon, lat, zoom] = args.as_slice() else {
                    return Err(CommandError::Usage("move <lon> <lat> <zoom>"));
                };
                Ok(Command::Move(CameraPosition {
                    longitude: number(lon)?,
                    latitude: number(lat)?,
                    zoom: number(zoom)?,
                }))
            }
            "undate" => Ok(Command::Undate),
            "clear" => Ok(Command::Clear),
            "style-loaded" => Ok(Command::StyleLoaded),
            "home" => Ok(Command::Home),
            "show" => Ok(Command::Show),
            "save" => Ok(Command::Save),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Whether the shell keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one command against the controller.
pub async fn execute(
    controller: &mut SelectionController,
    command: Command,
    download_dir: &Path,
) -> Flow {
    match command {
        Command::Place(selection) => controller.select_place(selection),
        Command::Date(date) => controller.select_date(date),
        Command::Undate => controller.clear_date(),
        Command::Clear => controller.clear_input(),
        Command::StyleLoaded => controller.on_style_load(),
        Command::Move(camera) => {
            controller.fly_to(camera);
            controller.on_move(camera);
        }
        Command::Home => controller.fly_home(),
        Command::Show => print_state(controller),
        Command::Save => save_report(controller, download_dir).await,
        Command::Help => println!("{}", HELP),
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn print_state(controller: &SelectionController) {
    match serde_json::to_string_pretty(&controller.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to render state: {}", e),
    }

    let Some(derived) = controller.derived() else {
        return;
    };
    println!("{}", derived.kind.badge());
    for reading in &derived.current {
        println!("  {:<20} {}", reading.label, format_metric(reading.value, 1));
    }
    for chart in &derived.trends {
        let values: Vec<String> = chart
            .points
            .iter()
            .map(|p| format!("{}={}", p.label, format_metric(p.value, 1)))
            .collect();
        println!("  {}: {}", chart.title, values.join(" "));
    }
    for bar in &derived.probabilities {
        println!("  {:<20} {}", bar.label, format_metric(bar.value, 1));
    }
    if let Some(overlay) = &derived.overlay {
        println!(
            "  overlay: {} {} (weight {:.2}, {:?} ramp, marker {})",
            overlay.metric.label(),
            format_metric(overlay.value, 1),
            overlay.weight,
            overlay.ramp,
            overlay.ramp.marker_color()
        );
    }
}

async fn save_report(controller: &SelectionController, download_dir: &Path) {
    let Some(artifact) = controller.download() else {
        println!("No report to save.");
        return;
    };
    let path = download_dir.join(&artifact.file_name);
    match tokio::fs::write(&path, artifact.contents).await {
        Ok(()) => {
            tracing::info!("Saved report to {}", path.display());
            println!("Saved {}", path.display());
        }
        Err(e) => tracing::error!("Failed to write {}: {}", path.display(), e),
    }
}

/// Map surface that logs every primitive instead of drawing it.
pub struct LoggingMapSurface {
    zoom: f64,
    fog: Option<FogParams>,
}

impl LoggingMapSurface {
    pub fn new(initial: CameraPosition) -> Self {
        Self {
            zoom: initial.zoom,
            fog: Some(FogParams {
                color: "rgb(186,210,235)".into(),
                horizon_blend: 0.1,
                high_color: "rgb(36,92,223)".into(),
                space_color: "rgb(11,11,25)".into(),
                star_intensity: 0.6,
            }),
        }
    }
}

impl MapSurface for LoggingMapSurface {
    fn fly_to(&mut self, camera: CameraPosition) {
        self.zoom = camera.zoom;
        tracing::info!(
            "map: fly to ({:.4}, {:.4}) zoom {:.1}",
            camera.latitude,
            camera.longitude,
            camera.zoom
        );
    }

    fn set_rain(&mut self, rain: Option<&RainParams>) {
        match rain {
            Some(r) => tracing::info!(
                "map: rain on, density {:.2} at zoom {:.1}",
                r.density.at(self.zoom),
                self.zoom
            ),
            None => tracing::debug!("map: rain off"),
        }
    }

    fn set_snow(&mut self, snow: Option<&SnowParams>) {
        match snow {
            Some(s) => tracing::info!(
                "map: snow on, density {:.2} at zoom {:.1}",
                s.density.at(self.zoom),
                self.zoom
            ),
            None => tracing::debug!("map: snow off"),
        }
    }

    fn set_fog(&mut self, fog: Option<&FogParams>) {
        match fog {
            Some(f) => tracing::debug!("map: fog {} / {}", f.color, f.high_color),
            None => tracing::debug!("map: fog off"),
        }
        self.fog = fog.cloned();
    }

    fn fog(&self) -> Option<FogParams> {
        self.fog.clone()
    }

    fn set_config_property(&mut self, import: &str, key: &str, value: &str) {
        tracing::info!("map: {}.{} = {}", import, key, value);
    }

    fn set_intensity_overlay(&mut self, overlay: Option<&IntensityOverlay>) {
        match overlay {
            Some(o) => {
                tracing::info!(
                    "map: intensity overlay {} weight {:.2}, {:?} ramp",
                    o.metric.label(),
                    o.weight,
                    o.ramp
                );
                tracing::debug!(
                    "map: overlay source {} color {} marker {}",
                    o.feature_collection(),
                    o.ramp.to_expression(),
                    o.ramp.marker_color()
                );
            }
            None => tracing::debug!("map: intensity overlay off"),
        }
    }

    fn detach_listeners(&mut self) {
        tracing::debug!("map: listeners detached");
    }
}

/// Prints notifications to stdout.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, text: &str) {
        println!("\n[note] {}\n", text);
    }

    fn dismiss(&self) {
        tracing::trace!("notification dismissed");
    }
}
