pub mod fetcher;
pub mod photos;
pub mod report_client;

use crate::errors::FetchError;
use crate::models::{Report, ReportRequest};
use fetcher::{PlaceGeneration, RequestEpoch};

/// Result a background task posts back to the controller.
#[derive(Debug)]
pub enum Completion {
    Report {
        epoch: RequestEpoch,
        request: ReportRequest,
        outcome: Result<Report, FetchError>,
    },
    Photo {
        generation: PlaceGeneration,
        url: Option<String>,
    },
}
