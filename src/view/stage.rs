use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Location;

/// How far the user has progressed through place → date selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Place,
    Forecast,
}

/// Derive the stage from the current selection.
pub fn resolve(location: Option<&Location>, date: Option<NaiveDate>) -> Stage {
    match (location, date) {
        (None, _) => Stage::Idle,
        (Some(_), None) => Stage::Place,
        (Some(_), Some(_)) => Stage::Forecast,
    }
}
