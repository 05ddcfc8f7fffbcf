use crate::common::constants::PRIMARY_KEY_FIELD;
use crate::common::types::{CanonicalEvent, RegionSummary};
use crate::observability::metrics::SINK_WRITES_TOTAL;
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::storage::{IndexSink, SinkResult};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshParams {
    #[serde(default)]
    pub regions: Vec<String>,
    /// Clear the index before writing the new batch
    #[serde(default)]
    pub replace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    Success,
    PartialSuccess,
    Error,
}

impl RefreshStatus {
    /// Status code a request/response front end should answer with
    pub fn http_status(self) -> u16 {
        match self {
            RefreshStatus::Success => 200,
            RefreshStatus::PartialSuccess => 207,
            RefreshStatus::Error => 503,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub status: RefreshStatus,
    pub regions_processed: usize,
    pub regions_with_events: usize,
    pub total_events_fetched: usize,
    pub deduplicated_events: usize,
    pub indexed_events: usize,
    pub regions: Vec<RegionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshReport {
    fn failed(error: String) -> Self {
        Self {
            status: RefreshStatus::Error,
            regions_processed: 0,
            regions_with_events: 0,
            total_events_fetched: 0,
            deduplicated_events: 0,
            indexed_events: 0,
            regions: Vec::new(),
            error: Some(error),
        }
    }
}

/// Health-check the sink, run one refresh, and hand the batch to the sink.
///
/// An unreachable sink is fatal and nothing is fetched. A failed write still
/// reports the fetch statistics as `partial_success`. An empty batch is never
/// written, so a run where every region failed leaves the index untouched.
#[instrument(skip(orchestrator, sink, params), fields(sink = sink.name(), replace = params.replace))]
pub async fn run_refresh(
    orchestrator: &Orchestrator,
    sink: Arc<dyn IndexSink>,
    params: RefreshParams,
) -> RefreshReport {
    if let Err(e) = sink.health().await {
        error!("Index sink is not available, aborting refresh: {}", e);
        return RefreshReport::failed(e.to_string());
    }

    let output = orchestrator.refresh(&params.regions).await;
    let stats = &output.stats;

    let mut report = RefreshReport {
        status: RefreshStatus::Success,
        regions_processed: stats.regions_requested,
        regions_with_events: stats.regions_with_events,
        total_events_fetched: stats.events_before_dedup,
        deduplicated_events: stats.events_after_dedup,
        indexed_events: 0,
        regions: stats.regions.clone(),
        error: None,
    };

    let every_region_failed =
        !stats.regions.is_empty() && stats.regions.iter().all(|r| r.error.is_some());
    if every_region_failed {
        error!("Every region failed; index left untouched");
        report.status = RefreshStatus::Error;
        report.error = Some("all regions failed to fetch".to_string());
        return report;
    }

    if output.events.is_empty() {
        info!("No events to index");
        return report;
    }

    match write_batch(sink.as_ref(), &output.events, params.replace).await {
        Ok(()) => {
            counter!(SINK_WRITES_TOTAL, "outcome" => "success").increment(1);
            report.indexed_events = output.events.len();
            info!("Indexed {} events into {}", output.events.len(), sink.name());
        }
        Err(e) => {
            counter!(SINK_WRITES_TOTAL, "outcome" => "error").increment(1);
            warn!("Fetched events but failed to save them: {}", e);
            report.status = RefreshStatus::PartialSuccess;
            report.error = Some(e.to_string());
        }
    }
    report
}

async fn write_batch(
    sink: &dyn IndexSink,
    events: &[CanonicalEvent],
    replace: bool,
) -> SinkResult<()> {
    if replace {
        sink.delete_all_documents().await?;
    }
    sink.add_documents(events, PRIMARY_KEY_FIELD).await
}
