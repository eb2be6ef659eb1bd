//! Downloadable copy of the current report.

use chrono::NaiveDate;
use serde::Serialize;

use crate::helpers::place_slug;
use crate::models::Report;

/// Whether a report looks back at a past date or ahead at a future one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Historical,
    Forecast,
}

impl ReportKind {
    /// Dates before `today` are historical; today and later are forecasts.
    pub fn for_date(date: NaiveDate, today: NaiveDate) -> Self {
        if date < today {
            ReportKind::Historical
        } else {
            ReportKind::Forecast
        }
    }

    pub fn file_prefix(self) -> &'static str {
        match self {
            ReportKind::Historical => "historical",
            ReportKind::Forecast => "forecast",
        }
    }

    /// Badge text shown next to the report heading.
    pub fn badge(self) -> &'static str {
        match self {
            ReportKind::Historical => "Historical date",
            ReportKind::Forecast => "Forecast",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadArtifact {
    pub file_name: String,
    /// Pretty-printed report JSON.
    pub contents: String,
}

/// `<historical|forecast>_<place-slug>_<YYYY-MM-DD>.json`
pub fn file_name(kind: ReportKind, place_name: Option<&str>, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}.json",
        kind.file_prefix(),
        place_slug(place_name),
        date.format("%Y-%m-%d")
    )
}

/// Serialize `report` for download.
pub fn build(
    report: &Report,
    place_name: Option<&str>,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<DownloadArtifact, serde_json::Error> {
    let contents = serde_json::to_string_pretty(report.raw())?;
    Ok(DownloadArtifact {
        file_name: file_name(ReportKind::for_date(date, today), place_name, date),
        contents,
    })
}
