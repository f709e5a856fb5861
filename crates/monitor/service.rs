use crate::{
    cache::SnapshotCache,
    config::MonitorConfig,
    diff::{PreviousStateStore, diff_snapshot},
    endpoint::EndpointSelector,
    fetcher::{FetchError, ValidatorFetcher},
    http::HttpClient,
    notifier::Notifier,
    snapshot::build_snapshot,
    subscribers::SubscriberRegistry,
};
use std::{sync::Arc, time::SystemTime};
use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;
use valwatch_common::{Alert, Summary};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("fetch from {endpoint} failed: {source}")]
    FetchFailed {
        endpoint: String,
        #[source]
        source: FetchError,
    },
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub endpoint: Url,
    pub degraded: bool,
    pub summary: Summary,
    pub uptime_skips: usize,
    pub alerts: Vec<Alert>,
    pub delivered: usize,
}

/// The poll loop. Sole writer of the snapshot cache and the previous state store.
pub struct Monitor {
    config: MonitorConfig,
    client: Arc<dyn HttpClient>,
    selector: EndpointSelector,
    fetcher: ValidatorFetcher,
    cache: SnapshotCache,
    previous: PreviousStateStore,
    notifier: Arc<dyn Notifier>,
    registry: Arc<dyn SubscriberRegistry>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        client: Arc<dyn HttpClient>,
        cache: SnapshotCache,
        notifier: Arc<dyn Notifier>,
        registry: Arc<dyn SubscriberRegistry>,
    ) -> Self {
        let selector = EndpointSelector::new(
            config.primary_url.clone(),
            config.reserve_url.clone(),
            config.probe_path.clone(),
        );
        let fetcher = ValidatorFetcher::new(client.clone())
            .with_page_limits(config.validators_page_limit, config.signing_infos_page_limit);

        Self {
            config,
            client,
            selector,
            fetcher,
            cache,
            previous: PreviousStateStore::new(),
            notifier,
            registry,
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn previous_state(&self) -> &PreviousStateStore {
        &self.previous
    }

    /// Runs one select → fetch → build → cache → diff → deliver → upsert cycle.
    ///
    /// A fetch failure returns before anything is written, leaving the cache and the
    /// previous state store as they were.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let selected = self.selector.select(self.client.as_ref()).await;

        let inputs = self
            .fetcher
            .fetch_cycle_inputs(&selected.url)
            .await
            .map_err(|source| CycleError::FetchFailed {
                endpoint: selected.url.to_string(),
                source,
            })?;

        let built = build_snapshot(&inputs, &self.config.valcons_prefix);
        for skip in &built.skipped {
            warn!(
                operator_address = %skip.operator_address(),
                error = %skip,
                "uptime skipped for validator"
            );
        }

        let summary = built.snapshot.summary();
        let cached = self.cache.replace(built.snapshot, SystemTime::now());
        info!(
            total = summary.total,
            active = summary.active,
            inactive = summary.inactive,
            jailed = summary.jailed,
            "snapshot cache replaced"
        );

        let alerts = diff_snapshot(&self.previous, &cached.snapshot, self.registry.as_ref());
        let delivered = dispatch_alerts(self.notifier.as_ref(), &alerts).await;
        self.previous.upsert(&cached.snapshot);

        Ok(CycleReport {
            endpoint: selected.url,
            degraded: selected.degraded,
            summary,
            uptime_skips: built.skipped.len(),
            alerts,
            delivered,
        })
    }

    /// Runs a cycle on every tick of the poll interval until `shutdown` is cancelled. The
    /// first cycle starts immediately.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut ticker = time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            primary = %self.config.primary_url,
            reserve = %self.config.reserve_url,
            poll_seconds = self.config.poll_interval.as_secs(),
            "validator monitor started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            info!("starting poll cycle");
            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.run_cycle() => result,
            };

            match result {
                Ok(report) => info!(
                    endpoint = %report.endpoint,
                    degraded = report.degraded,
                    validators = report.summary.total,
                    alerts = report.alerts.len(),
                    delivered = report.delivered,
                    "poll cycle finished"
                ),
                Err(error) => warn!(error = %error, "poll cycle aborted"),
            }
        }

        info!("validator monitor stopped");
    }
}

/// Hands alerts to `notifier` one at a time and returns how many were accepted. A failed
/// delivery is logged and does not stop the remaining alerts.
pub async fn dispatch_alerts(notifier: &dyn Notifier, alerts: &[Alert]) -> usize {
    let mut delivered = 0;
    for alert in alerts {
        match notifier.deliver(alert).await {
            Ok(()) => {
                delivered += 1;
                info!(
                    operator_address = %alert.operator_address,
                    category = %alert.category,
                    "alert delivered"
                );
            }
            Err(error) => warn!(
                operator_address = %alert.operator_address,
                category = %alert.category,
                error = %error,
                "failed to deliver alert"
            ),
        }
    }
    delivered
}
