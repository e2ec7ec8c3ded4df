//! Per-key dependent synchronization
//!
//! For every catalog key this module fetches the dependent listing, extracts
//! its rows, tags them with the key and hands them to a caller-supplied
//! persist step. A failure at any stage is recorded against that one key and
//! never stops the remaining keys.

use crate::scrape::{extract_records, PageFetcher, Record, TableLayout};
use crate::storage::ReplaceOutcome;
use crate::sync::{DependentOutcome, DependentStatus, FailureStage};
use crate::{SyncError, TransportError};
use futures::future::join_all;
use std::time::Duration;

/// One catalog key and the listing URL of its dependents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentTask {
    pub key: String,
    pub url: String,
}

impl DependentTask {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
        }
    }
}

/// How dependent fetches are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// Fetch and persist of one key completes before the next key starts
    Sequential,
    /// All fetches start at once; persistence follows in key order once all settle
    Concurrent,
}

/// Shape of one workflow's dependents phase
#[derive(Debug, Clone, Copy)]
pub struct DependentPlan {
    pub layout: &'static TableLayout,
    /// Column set to the task key on every record that lacks it
    pub join_key: Option<&'static str>,
    pub fan_out: FanOut,
    /// Upper bound on a single fetch
    pub fetch_timeout: Duration,
}

type Scraped = Result<Vec<Record>, (FailureStage, SyncError)>;

/// Runs the dependents phase for `tasks`
///
/// `persist` receives each key's tagged records and returns the replace
/// counts when it wrote them directly, or `None` when it only collected them.
/// Outcomes are returned in task order.
///
/// A persist error for which [`SyncError::is_run_fatal`] holds stops the
/// phase immediately: no further key is fetched or persisted and the error is
/// returned instead of the outcomes.
pub async fn sync_dependents<F, P>(
    fetcher: &F,
    plan: &DependentPlan,
    tasks: Vec<DependentTask>,
    mut persist: P,
) -> Result<Vec<DependentOutcome>, SyncError>
where
    F: PageFetcher,
    P: FnMut(&DependentTask, Vec<Record>) -> Result<Option<ReplaceOutcome>, SyncError>,
{
    tracing::info!(
        "Syncing dependents of {} keys ({:?})",
        tasks.len(),
        plan.fan_out
    );

    match plan.fan_out {
        FanOut::Sequential => {
            let mut outcomes = Vec::with_capacity(tasks.len());
            for task in tasks {
                let scraped = scrape_dependents(fetcher, plan, &task).await;
                outcomes.push(settle(task, scraped, &mut persist)?);
            }
            Ok(outcomes)
        }
        FanOut::Concurrent => {
            let scraped = join_all(
                tasks
                    .iter()
                    .map(|task| scrape_dependents(fetcher, plan, task)),
            )
            .await;

            tasks
                .into_iter()
                .zip(scraped)
                .map(|(task, scraped)| settle(task, scraped, &mut persist))
                .collect()
        }
    }
}

/// Fetches and extracts one key's dependents
async fn scrape_dependents<F: PageFetcher>(
    fetcher: &F,
    plan: &DependentPlan,
    task: &DependentTask,
) -> Scraped {
    tracing::debug!(key = %task.key, url = %task.url, "Fetching dependents");

    let markup = match tokio::time::timeout(plan.fetch_timeout, fetcher.fetch(&task.url)).await {
        Ok(Ok(markup)) => markup,
        Ok(Err(e)) => return Err((FailureStage::Fetch, e.into())),
        Err(_) => {
            let timeout = TransportError::Timeout {
                url: task.url.clone(),
            };
            return Err((FailureStage::Fetch, timeout.into()));
        }
    };

    let mut records =
        extract_records(&markup, plan.layout).map_err(|e| (FailureStage::Extract, e.into()))?;

    if let Some(join_key) = plan.join_key {
        for record in &mut records {
            record
                .entry(join_key.to_string())
                .or_insert_with(|| task.key.clone());
        }
    }

    Ok(records)
}

/// Persists a scraped key and turns the result into an outcome
///
/// Run-fatal persist errors are passed through rather than recorded.
fn settle<P>(
    task: DependentTask,
    scraped: Scraped,
    persist: &mut P,
) -> Result<DependentOutcome, SyncError>
where
    P: FnMut(&DependentTask, Vec<Record>) -> Result<Option<ReplaceOutcome>, SyncError>,
{
    let result = scraped.and_then(|records| {
        let count = records.len();
        persist(&task, records)
            .map(|replaced| (count, replaced))
            .map_err(|e| (FailureStage::Persist, e))
    });

    let status = match result {
        Ok((records, replaced)) => {
            match replaced {
                Some(outcome) => tracing::info!(
                    key = %task.key,
                    url = %task.url,
                    records,
                    deleted = outcome.deleted,
                    inserted = outcome.inserted,
                    "Dependents replaced"
                ),
                None => tracing::info!(
                    key = %task.key,
                    url = %task.url,
                    records,
                    "Dependents collected"
                ),
            }
            DependentStatus::Synced { records, replaced }
        }
        Err((FailureStage::Persist, error)) if error.is_run_fatal() => {
            tracing::error!(
                key = %task.key,
                url = %task.url,
                error = %error,
                "Storage unavailable, aborting dependents phase"
            );
            return Err(error);
        }
        Err((stage, error)) => {
            tracing::warn!(
                key = %task.key,
                url = %task.url,
                stage = %stage,
                error = %error,
                "Dependent sync failed, continuing with next key"
            );
            DependentStatus::Failed { stage, error }
        }
    };

    Ok(DependentOutcome {
        key: task.key,
        url: task.url,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::{CUSTOMER_TRANSACTION_LAYOUT, STOCK_PRODUCT_LAYOUT};
    use crate::storage::StorageError;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory fetcher that records call order and peak concurrency
    #[derive(Clone, Default)]
    struct ScriptedFetcher {
        pages: HashMap<String, Result<String, u16>>,
        delay: Duration,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedFetcher {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl PageFetcher for ScriptedFetcher {
        fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> + Send {
            let response = self.pages.get(url).cloned().unwrap_or(Err(404));
            let url = url.to_string();
            let delay = self.delay;
            let in_flight = self.in_flight.clone();
            let peak = self.peak.clone();
            let events = self.events.clone();

            async move {
                events.lock().unwrap().push(format!("fetch {}", url));
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);

                response.map_err(|status| TransportError::Status { url, status })
            }
        }
    }

    fn customers_page(names: &[&str]) -> String {
        let rows: String = names
            .iter()
            .map(|n| format!("<tr><td>{}</td><td>9/7/19 23:00</td><td>10.5</td></tr>", n))
            .collect();
        format!(
            "<table><tr><th>Customer</th><th>Date</th><th>Total</th></tr>{}</table>",
            rows
        )
    }

    fn plan(fan_out: FanOut) -> DependentPlan {
        DependentPlan {
            layout: &CUSTOMER_TRANSACTION_LAYOUT,
            join_key: Some("ProductName"),
            fan_out,
            fetch_timeout: Duration::from_secs(5),
        }
    }

    fn tasks(keys: &[&str]) -> Vec<DependentTask> {
        keys.iter()
            .map(|k| DependentTask::new(*k, format!("http://shop/{}", k)))
            .collect()
    }

    #[tokio::test]
    async fn test_records_are_tagged_with_join_key() {
        let fetcher = ScriptedFetcher::default()
            .page("http://shop/PN-1", &customers_page(&["CS-1", "CS-2"]));
        let mut persisted = Vec::new();

        let outcomes = sync_dependents(
            &fetcher,
            &plan(FanOut::Sequential),
            tasks(&["PN-1"]),
            |task, records| {
                persisted.push((task.key.clone(), records));
                Ok(None)
            },
        )
        .await
        .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0].status,
            DependentStatus::Synced { records: 2, replaced: None }
        ));
        let (key, records) = &persisted[0];
        assert_eq!(key, "PN-1");
        assert!(records.iter().all(|r| r["ProductName"] == "PN-1"));
        assert_eq!(records[0]["CustomerName"], "CS-1");
    }

    #[tokio::test]
    async fn test_existing_join_key_is_not_overwritten() {
        let page = "<table><tr><th>P</th><th>Q</th></tr><tr><td>PN-9</td><td>3</td></tr></table>";
        let fetcher = ScriptedFetcher::default().page("http://shop/ALL", page);
        let plan = DependentPlan {
            layout: &STOCK_PRODUCT_LAYOUT,
            ..plan(FanOut::Sequential)
        };
        let mut seen = Vec::new();

        sync_dependents(&fetcher, &plan, tasks(&["ALL"]), |_, records| {
            seen.extend(records);
            Ok(None)
        })
        .await
        .unwrap();

        assert_eq!(seen[0]["ProductName"], "PN-9");
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_one_key() {
        let fetcher = ScriptedFetcher::default()
            .page("http://shop/PN-1", &customers_page(&["CS-1"]))
            .status("http://shop/PN-2", 500)
            .page("http://shop/PN-3", &customers_page(&["CS-3"]));
        let mut persisted = Vec::new();

        let outcomes = sync_dependents(
            &fetcher,
            &plan(FanOut::Sequential),
            tasks(&["PN-1", "PN-2", "PN-3"]),
            |task, _| {
                persisted.push(task.key.clone());
                Ok(Some(ReplaceOutcome { deleted: 0, inserted: 1 }))
            },
        )
        .await
        .unwrap();

        assert_eq!(persisted, vec!["PN-1", "PN-3"]);
        let keys: Vec<&str> = outcomes.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["PN-1", "PN-2", "PN-3"]);
        assert!(matches!(
            outcomes[1].status,
            DependentStatus::Failed { stage: FailureStage::Fetch, .. }
        ));
        assert!(!outcomes[0].is_failure());
        assert!(!outcomes[2].is_failure());
    }

    #[tokio::test]
    async fn test_extract_and_persist_failures_carry_stage() {
        let fetcher = ScriptedFetcher::default()
            .page("http://shop/PN-1", "<p>no table here</p>")
            .page("http://shop/PN-2", &customers_page(&["CS-2"]));

        let outcomes = sync_dependents(
            &fetcher,
            &plan(FanOut::Sequential),
            tasks(&["PN-1", "PN-2"]),
            |task, _| {
                Err(StorageError::UnknownColumn {
                    table: "customers".to_string(),
                    column: task.key.clone(),
                }
                .into())
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            outcomes[0].status,
            DependentStatus::Failed { stage: FailureStage::Extract, .. }
        ));
        assert!(matches!(
            outcomes[1].status,
            DependentStatus::Failed { stage: FailureStage::Persist, .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_listing_is_synced_with_zero_records() {
        let fetcher = ScriptedFetcher::default().page("http://shop/PN-1", &customers_page(&[]));
        let mut calls = 0;

        let outcomes = sync_dependents(
            &fetcher,
            &plan(FanOut::Sequential),
            tasks(&["PN-1"]),
            |_, records| {
                calls += 1;
                assert!(records.is_empty());
                Ok(Some(ReplaceOutcome { deleted: 4, inserted: 0 }))
            },
        )
        .await
        .unwrap();

        assert_eq!(calls, 1);
        assert!(matches!(
            outcomes[0].status,
            DependentStatus::Synced { records: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_sequential_never_overlaps_fetches() {
        let fetcher = ScriptedFetcher::default()
            .page("http://shop/A", &customers_page(&["CS-1"]))
            .page("http://shop/B", &customers_page(&["CS-2"]))
            .page("http://shop/C", &customers_page(&["CS-3"]))
            .with_delay(Duration::from_millis(20));
        let events = fetcher.events.clone();

        sync_dependents(
            &fetcher,
            &plan(FanOut::Sequential),
            tasks(&["A", "B", "C"]),
            |task, _| {
                events.lock().unwrap().push(format!("persist {}", task.key));
                Ok(None)
            },
        )
        .await
        .unwrap();

        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 1);
        assert_eq!(
            *fetcher.events.lock().unwrap(),
            vec![
                "fetch http://shop/A",
                "persist A",
                "fetch http://shop/B",
                "persist B",
                "fetch http://shop/C",
                "persist C",
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_starts_all_fetches_before_persisting() {
        let fetcher = ScriptedFetcher::default()
            .page("http://shop/A", &customers_page(&["CS-1"]))
            .status("http://shop/B", 503)
            .page("http://shop/C", &customers_page(&["CS-3"]))
            .with_delay(Duration::from_millis(20));
        let events = fetcher.events.clone();

        let outcomes = sync_dependents(
            &fetcher,
            &plan(FanOut::Concurrent),
            tasks(&["A", "B", "C"]),
            |task, _| {
                events.lock().unwrap().push(format!("persist {}", task.key));
                Ok(None)
            },
        )
        .await
        .unwrap();

        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 3);
        assert_eq!(
            *fetcher.events.lock().unwrap(),
            vec![
                "fetch http://shop/A",
                "fetch http://shop/B",
                "fetch http://shop/C",
                "persist A",
                "persist C",
            ]
        );
        assert!(outcomes[1].is_failure());
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let fetcher = ScriptedFetcher::default()
            .page("http://shop/A", &customers_page(&["CS-1"]))
            .with_delay(Duration::from_millis(200));
        let plan = DependentPlan {
            fetch_timeout: Duration::from_millis(10),
            ..plan(FanOut::Sequential)
        };

        let outcomes = sync_dependents(&fetcher, &plan, tasks(&["A"]), |_, _| Ok(None))
            .await
            .unwrap();

        match &outcomes[0].status {
            DependentStatus::Failed { stage, error } => {
                assert_eq!(*stage, FailureStage::Fetch);
                assert!(matches!(error, SyncError::Transport(TransportError::Timeout { .. })));
            }
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }
    fn connection_lost() -> SyncError {
        StorageError::Connection {
            path: "data/customers.db".to_string(),
            message: "unable to open database file".to_string(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_lost_connection_aborts_remaining_keys() {
        let fetcher = ScriptedFetcher::default()
            .page("http://shop/A", &customers_page(&["CS-1"]))
            .page("http://shop/B", &customers_page(&["CS-2"]))
            .page("http://shop/C", &customers_page(&["CS-3"]));
        let events = fetcher.events.clone();

        let result = sync_dependents(
            &fetcher,
            &plan(FanOut::Sequential),
            tasks(&["A", "B", "C"]),
            |task, _| {
                events.lock().unwrap().push(format!("persist {}", task.key));
                if task.key == "B" {
                    return Err(connection_lost());
                }
                Ok(None)
            },
        )
        .await;

        match result {
            Err(error) => assert!(error.is_run_fatal()),
            Ok(outcomes) => panic!("expected abort, got {} outcomes", outcomes.len()),
        }
        assert_eq!(
            *fetcher.events.lock().unwrap(),
            vec![
                "fetch http://shop/A",
                "persist A",
                "fetch http://shop/B",
                "persist B",
            ]
        );
    }

    #[tokio::test]
    async fn test_lost_connection_aborts_concurrent_persists() {
        let fetcher = ScriptedFetcher::default()
            .page("http://shop/A", &customers_page(&["CS-1"]))
            .page("http://shop/B", &customers_page(&["CS-2"]));
        let mut persisted = Vec::new();

        let result = sync_dependents(
            &fetcher,
            &plan(FanOut::Concurrent),
            tasks(&["A", "B"]),
            |task, _| {
                persisted.push(task.key.clone());
                Err(connection_lost())
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(SyncError::Storage(StorageError::Connection { .. }))
        ));
        assert_eq!(persisted, vec!["A"]);
    }
}
