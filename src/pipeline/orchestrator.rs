use crate::common::types::{
    CanonicalEvent, RefreshOutput, RefreshStats, RegionFailure, RegionResult, RegionSummary,
};
use crate::config::Config;
use crate::observability::metrics::{
    EVENTS_DEDUPLICATED_TOTAL, EVENTS_NORMALIZED_TOTAL, REFRESH_DURATION_SECONDS,
};
use crate::pipeline::ingestion::{HttpFetcher, SourceFetcher};
use crate::pipeline::processing::{dedupe, ListingParser, NineteenHzParser, Normalizer};
use metrics::{counter, histogram};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

/// Everything a region task needs besides its fetcher and parser
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_concurrency: usize,
    pub fallback_city: String,
    pub country: String,
    /// Per-region fallback city, overriding `fallback_city`
    pub region_cities: HashMap<String, String>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        let region_cities = config
            .regions
            .keys()
            .map(|id| (id.clone(), config.fallback_city_for(id).to_string()))
            .collect();
        Self {
            max_concurrency: config.fetch.max_concurrency.max(1),
            fallback_city: config.fallback_city.clone(),
            country: config.country.clone(),
            region_cities,
        }
    }

    fn normalizer_for(&self, region: &str) -> Normalizer {
        let city = self
            .region_cities
            .get(region)
            .unwrap_or(&self.fallback_city);
        Normalizer::new(city.clone(), self.country.clone())
    }
}

/// Shared, read-only state handed to every region task
struct RegionContext {
    fetcher: Arc<dyn SourceFetcher>,
    parser: Arc<dyn ListingParser>,
    settings: OrchestratorSettings,
}

/// Region ids waiting to be picked up by a worker. Lock-free: workers claim the next slot.
struct RegionQueue {
    regions: Vec<String>,
    next: AtomicUsize,
}

impl RegionQueue {
    fn new(regions: Vec<String>) -> Self {
        Self {
            regions,
            next: AtomicUsize::new(0),
        }
    }

    fn pop(&self) -> Option<(usize, String)> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.regions.get(index).map(|region| (index, region.clone()))
    }
}

/// Fans fetch → parse → normalize out across regions, then merges and dedupes.
pub struct Orchestrator {
    context: Arc<RegionContext>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        parser: Arc<dyn ListingParser>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            context: Arc::new(RegionContext {
                fetcher,
                parser,
                settings,
            }),
        }
    }

    /// Production wiring: HTTP fetcher and 19hz parser driven by `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpFetcher::from_config(config)),
            Arc::new(NineteenHzParser::new()),
            OrchestratorSettings::from_config(config),
        )
    }

    /// Run every region, wait for all of them, and return the deduplicated batch.
    /// Region failures are reported in the stats and never fail the call.
    #[instrument(skip(self, region_ids), fields(regions = region_ids.len()))]
    pub async fn refresh(&self, region_ids: &[String]) -> RefreshOutput {
        let started = Instant::now();
        let regions = unique_regions(region_ids);
        info!("Starting refresh for {} regions", regions.len());

        let results = self.run_regions(regions).await;
        let output = merge(results);

        let removed = output.stats.events_before_dedup - output.stats.events_after_dedup;
        counter!(EVENTS_DEDUPLICATED_TOTAL).increment(removed as u64);
        histogram!(REFRESH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        info!(
            "Refresh finished: {}/{} regions returned events, {} events scraped, {} after dedup",
            output.stats.regions_with_events,
            output.stats.regions_requested,
            output.stats.events_before_dedup,
            output.stats.events_after_dedup
        );
        output
    }

    /// Bounded worker pool over the region queue. Returns results in request order.
    async fn run_regions(&self, regions: Vec<String>) -> Vec<RegionResult> {
        if regions.is_empty() {
            return Vec::new();
        }

        let workers = regions
            .len()
            .min(self.context.settings.max_concurrency.max(1));
        let queue = Arc::new(RegionQueue::new(regions.clone()));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, RegionResult)>();

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let context = Arc::clone(&self.context);
            let tx = tx.clone();
            pool.spawn(async move {
                while let Some((index, region)) = queue.pop() {
                    let result = run_region_isolated(Arc::clone(&context), region).await;
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        // Barrier: every worker has finished before anything is merged
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                warn!("Region worker ended abnormally: {}", e);
            }
        }

        let mut slots: Vec<Option<RegionResult>> = regions.iter().map(|_| None).collect();
        while let Some((index, result)) = rx.recv().await {
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .zip(regions)
            .map(|(slot, region)| {
                slot.unwrap_or_else(|| {
                    RegionResult::failed(
                        region,
                        RegionFailure::Aborted("worker exited before reporting".to_string()),
                    )
                })
            })
            .collect()
    }
}

/// Trimmed, non-empty, first occurrence only
fn unique_regions(region_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    region_ids
        .iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

/// Run one region in its own task so a panic while parsing stays a regional failure.
async fn run_region_isolated(context: Arc<RegionContext>, region: String) -> RegionResult {
    let task_region = region.clone();
    match tokio::spawn(run_region(context, task_region)).await {
        Ok(result) => result,
        Err(e) => {
            warn!(region = %region, "Region task aborted: {}", e);
            RegionResult::failed(region, RegionFailure::Aborted(e.to_string()))
        }
    }
}

#[instrument(skip(context))]
async fn run_region(context: Arc<RegionContext>, region: String) -> RegionResult {
    let raw = match context.fetcher.fetch(&region).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Fetch failed, region contributes no events: {}", e);
            return RegionResult::failed(region, e.into());
        }
    };

    let normalizer = context.settings.normalizer_for(&region);
    let raw_events = context.parser.parse(&raw);
    let parsed = raw_events.len();

    let events: Vec<CanonicalEvent> = raw_events
        .into_iter()
        .map(|mut raw_event| {
            if !raw_event.id.is_empty() {
                raw_event.id = qualify_id(&region, &raw_event.id);
            }
            raw_event
        })
        .filter_map(|raw_event| normalizer.normalize(&raw_event))
        .collect();

    counter!(EVENTS_NORMALIZED_TOTAL, "region" => region.clone()).increment(events.len() as u64);
    info!("Found {} events ({} parsed rows)", events.len(), parsed);
    RegionResult::events(region, events)
}

/// `19hz-7` from region `la` becomes `19hz-la-7`
fn qualify_id(region: &str, id: &str) -> String {
    match id.split_once('-') {
        Some((source, seq)) => format!("{}-{}-{}", source, region, seq),
        None => format!("{}-{}", region, id),
    }
}

/// Concatenate region results in order, dedupe, and compute the stats.
pub fn merge(results: Vec<RegionResult>) -> RefreshOutput {
    let mut stats = RefreshStats {
        regions_requested: results.len(),
        ..RefreshStats::default()
    };
    let mut all_events = Vec::new();

    for result in results {
        let count = result.event_count();
        if count > 0 {
            stats.regions_with_events += 1;
        }
        let error = match result.outcome {
            Ok(events) => {
                all_events.extend(events);
                None
            }
            Err(failure) => Some(failure.to_string()),
        };
        stats.regions.push(RegionSummary {
            region: result.region,
            events: count,
            error,
        });
    }

    stats.events_before_dedup = all_events.len();
    let events = dedupe(all_events);
    stats.events_after_dedup = events.len();

    RefreshOutput { events, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::FetchError;
    use crate::common::types::RawEvent;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StubFetcher {
        pages: HashMap<String, String>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StubFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(r, p)| (r.to_string(), p.to_string()))
                    .collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SourceFetcher for StubFetcher {
        async fn fetch(&self, region: &str) -> Result<String, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.pages
                .get(region)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    region: region.to_string(),
                    status: 500,
                })
        }
    }

    /// One raw event per line: `title|date|location`; a line `PANIC` panics.
    struct LineParser;

    impl ListingParser for LineParser {
        fn parse(&self, raw: &str) -> Vec<RawEvent> {
            raw.lines()
                .enumerate()
                .map(|(i, line)| {
                    if line == "PANIC" {
                        panic!("parser blew up");
                    }
                    let mut fields = line.split('|');
                    let title = fields.next().unwrap_or_default().to_string();
                    RawEvent {
                        id: format!("row-{}", i),
                        artists: vec![title.clone()],
                        title,
                        date: fields.next().unwrap_or_default().to_string(),
                        location: fields.next().unwrap_or_default().to_string(),
                        ..RawEvent::default()
                    }
                })
                .collect()
        }
    }

    fn orchestrator(fetcher: Arc<StubFetcher>, max_concurrency: usize) -> Orchestrator {
        let settings = OrchestratorSettings {
            max_concurrency,
            fallback_city: "Los Angeles".to_string(),
            country: "United States".to_string(),
            region_cities: HashMap::from([("seattle".to_string(), "Seattle".to_string())]),
        };
        Orchestrator::new(fetcher, Arc::new(LineParser), settings)
    }

    fn ids(regions: &[&str]) -> Vec<String> {
        regions.iter().map(|r| r.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failed_region_contributes_zero_events() {
        let fetcher = Arc::new(StubFetcher::new(&[
            ("la", "A|2024-09-01|Los Angeles\nB|2024-09-01|Los Angeles"),
            ("seattle", "C|2024-09-02|Unknown City"),
        ]));
        let output = orchestrator(fetcher, 4)
            .refresh(&ids(&["la", "broken", "seattle"]))
            .await;

        assert_eq!(output.stats.regions_requested, 3);
        assert_eq!(output.stats.regions_with_events, 2);
        assert_eq!(output.stats.events_before_dedup, 3);
        assert_eq!(output.stats.events_after_dedup, 3);

        let broken = &output.stats.regions[1];
        assert_eq!(broken.region, "broken");
        assert_eq!(broken.events, 0);
        assert!(broken.error.as_deref().unwrap().contains("500"));

        let seattle = output.events.iter().find(|e| e.name == "C").unwrap();
        assert_eq!(seattle.city, "Seattle");
        assert_eq!(seattle.id, "row-seattle-0");
    }

    #[tokio::test]
    async fn test_merge_keeps_request_order_and_dedupes_across_regions() {
        let fetcher = Arc::new(StubFetcher::new(&[
            ("sf", "Same|2024-09-01|Oakland\nOther|2024-09-01|Oakland"),
            ("la", "same|2024-09-01T23:00:00Z|Los Angeles"),
        ]));
        let output = orchestrator(fetcher, 2).refresh(&ids(&["sf", "la"])).await;

        assert_eq!(output.stats.events_before_dedup, 3);
        assert_eq!(output.stats.events_after_dedup, 2);
        let kept: Vec<_> = output.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(kept, vec!["row-sf-0", "row-sf-1"]);
    }

    #[tokio::test]
    async fn test_worker_pool_is_bounded() {
        let pages: Vec<(String, String)> = (0..8)
            .map(|i| (format!("r{}", i), format!("Artist{}|2024-09-01|X", i)))
            .collect();
        let page_refs: Vec<(&str, &str)> =
            pages.iter().map(|(r, p)| (r.as_str(), p.as_str())).collect();
        let fetcher = Arc::new(StubFetcher::new(&page_refs));
        let regions: Vec<String> = pages.iter().map(|(r, _)| r.clone()).collect();

        let output = orchestrator(Arc::clone(&fetcher), 3).refresh(&regions).await;

        assert_eq!(output.stats.regions_with_events, 8);
        assert_eq!(output.events.len(), 8);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_parser_panic_is_isolated_to_its_region() {
        let fetcher = Arc::new(StubFetcher::new(&[
            ("good", "A|2024-09-01|X"),
            ("bad", "PANIC"),
        ]));
        let output = orchestrator(fetcher, 2).refresh(&ids(&["good", "bad"])).await;

        assert_eq!(output.events.len(), 1);
        assert_eq!(output.stats.regions_with_events, 1);
        assert!(output.stats.regions[1]
            .error
            .as_deref()
            .unwrap()
            .contains("aborted"));
    }

    #[tokio::test]
    async fn test_duplicate_and_blank_region_ids_run_once() {
        let fetcher = Arc::new(StubFetcher::new(&[("la", "A|2024-09-01|X")]));
        let output = orchestrator(fetcher, 2)
            .refresh(&ids(&["la", " la ", "", "la"]))
            .await;

        assert_eq!(output.stats.regions_requested, 1);
        assert_eq!(output.events.len(), 1);
    }

    #[test]
    fn test_qualify_id() {
        assert_eq!(qualify_id("la", "19hz-7"), "19hz-la-7");
        assert_eq!(qualify_id("la", "plain"), "la-plain");
    }

    #[tokio::test]
    async fn test_no_regions_is_an_empty_run() {
        let fetcher = Arc::new(StubFetcher::new(&[]));
        let output = orchestrator(fetcher, 2).refresh(&[]).await;
        assert!(output.events.is_empty());
        assert_eq!(output.stats, RefreshStats::default());
    }
}
