//! Single-flight report fetching.
//!
//! Each fetch runs as its own tokio task and reports back over the
//! controller's completion channel. Results are tagged with the epoch issued
//! when the fetch began; only the latest epoch is ever accepted.
//!
//! Starting a new fetch, cancelling, or dropping the fetcher aborts the
//! in-flight transport future. Aborted fetches still post a `Cancelled`
//! completion, which is discarded like any other stale result.

use std::sync::Arc;

use futures::future::{abortable, AbortHandle, Aborted};
use tokio::sync::mpsc;

use crate::errors::FetchError;
use crate::models::{Report, ReportRequest};
use crate::services::report_client::ReportSource;
use crate::services::Completion;

/// Token identifying one fetch. Strictly increasing per fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestEpoch(u64);

impl RequestEpoch {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Counter identifying one place selection, for photo lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaceGeneration(u64);

impl PlaceGeneration {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

struct InFlight {
    epoch: RequestEpoch,
    request: ReportRequest,
    abort: AbortHandle,
}

pub struct ReportFetcher {
    source: Arc<dyn ReportSource>,
    completions: mpsc::UnboundedSender<Completion>,
    issued: u64,
    /// Epoch whose result may still be applied.
    current: Option<RequestEpoch>,
    in_flight: Option<InFlight>,
}

impl ReportFetcher {
    pub fn new(source: Arc<dyn ReportSource>, completions: mpsc::UnboundedSender<Completion>) -> Self {
        Self {
            source,
            completions,
            issued: 0,
            current: None,
            in_flight: None,
        }
    }

    /// Start fetching `request`, superseding any fetch still in flight.
    pub fn begin(&mut self, request: ReportRequest) -> RequestEpoch {
        self.cancel();

        self.issued += 1;
        let epoch = RequestEpoch(self.issued);

        let (fetch, abort) = abortable(self.source.fetch_report(request));
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let outcome = match fetch.await {
                Ok(outcome) => outcome,
                Err(Aborted) => Err(FetchError::Cancelled),
            };
            // The receiver is gone once the controller is torn down.
            let _ = tx.send(Completion::Report {
                epoch,
                request,
                outcome,
            });
        });

        tracing::debug!("Report fetch {} started for {}", epoch.value(), request.date);
        self.current = Some(epoch);
        self.in_flight = Some(InFlight {
            epoch,
            request,
            abort,
        });
        epoch
    }

    /// Abort the in-flight fetch, if any. Its result will never be accepted.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!(
                "Cancelling report fetch {} for {}",
                in_flight.epoch.value(),
                in_flight.request.date
            );
            in_flight.abort.abort();
        }
        self.current = None;
    }

    /// Whether a fetch is running whose result would be accepted.
    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Filter a completed fetch.
    ///
    /// Returns the outcome only for the latest epoch, and never for a
    /// cancellation. Each epoch is accepted at most once.
    pub fn accept(
        &mut self,
        epoch: RequestEpoch,
        outcome: Result<Report, FetchError>,
    ) -> Option<Result<Report, FetchError>> {
        if self.current != Some(epoch) {
            tracing::debug!(
                "Discarding stale report result for fetch {} (current: {:?})",
                epoch.value(),
                self.current.map(RequestEpoch::value)
            );
            return None;
        }
        if matches!(outcome, Err(FetchError::Cancelled)) {
            return None;
        }

        self.current = None;
        self.in_flight = None;
        Some(outcome)
    }
}

impl Drop for ReportFetcher {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort.abort();
        }
    }
}
