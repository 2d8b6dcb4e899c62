//! The running application: every component wired together, plus the
//! background jobs that keep the cache and the line ranking fresh.
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheKey, CacheStats, TtlCache};
use crate::config::{validate_endpoint, Config};
use crate::endpoints::{Endpoint, EndpointRegistry};
use crate::error::ParseError;
use crate::health::{HealthTracker, HttpProber, PerformanceRecord, Prober};
use crate::logging::{LogBuffer, LogEntry};
use crate::parser::{
    find_site, History, Launcher, ParseOutcome, ParseRequest, ParseService, VideoSite,
};
use crate::sync::PeriodicTask;
use crate::update::{
    version_file_candidates, LocalVersion, UpdateInfo, UpdateStatus, Updater, VERSION_FILE,
};

/// One line as shown by `lines`.
#[derive(Debug, Clone)]
pub struct LineStatus {
    pub endpoint: Endpoint,
    pub selected: bool,
    pub record: Option<PerformanceRecord>,
}

pub struct Session {
    config: Config,
    config_path: PathBuf,
    registry: Arc<RwLock<EndpointRegistry>>,
    tracker: Arc<HealthTracker>,
    prober: Arc<dyn Prober>,
    parser: ParseService,
    updater: Updater,
    logs: Arc<LogBuffer>,
    tasks: Vec<PeriodicTask>,
}

impl Session {
    pub fn new(
        config: Config,
        config_path: PathBuf,
        data_dir: &Path,
        launcher: Arc<dyn Launcher>,
        logs: Arc<LogBuffer>,
    ) -> Result<Self> {
        let prober = HttpProber::new(config.probe.timeout(), config.probe.retry_policy())?;
        Self::with_prober(config, config_path, data_dir, Arc::new(prober), launcher, logs)
    }

    pub fn with_prober(
        config: Config,
        config_path: PathBuf,
        data_dir: &Path,
        prober: Arc<dyn Prober>,
        launcher: Arc<dyn Launcher>,
        logs: Arc<LogBuffer>,
    ) -> Result<Self> {
        let cache = Arc::new(TtlCache::<CacheKey, String>::new(
            config.cache.ttl(),
            config.cache.limit,
        ));
        let parser = ParseService::new(cache, config.history.limit, launcher);

        let local = LocalVersion::load_first(&version_file_candidates(data_dir));
        debug!("Local version is {}", local.version);
        let updater = Updater::new(
            config.update.manifest_url.clone(),
            local,
            data_dir.join(VERSION_FILE),
        )
        .context("Failed to build update client")?;

        Ok(Self {
            registry: Arc::new(RwLock::new(EndpointRegistry::new(config.endpoints.clone()))),
            tracker: Arc::new(HealthTracker::new()),
            prober,
            parser,
            updater,
            logs,
            tasks: Vec::new(),
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<HealthTracker> {
        &self.tracker
    }

    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    /// Starts the cache sweeper and, if `monitor` is set and enabled in the
    /// config, the periodic line ranking. The first ranking runs at once so
    /// the default line follows health from the start.
    pub fn start_background_tasks(&mut self, monitor: bool) {
        let cache = self.parser.cache().clone();
        self.tasks.push(PeriodicTask::spawn(
            "cache-sweeper",
            self.config.cache.sweep_interval(),
            move || {
                let cache = cache.clone();
                async move {
                    let removed = cache.sweep();
                    if removed > 0 {
                        debug!("Swept {} expired cache entries", removed);
                    }
                }
            },
        ));

        let period = match self.config.probe.monitor_interval() {
            Some(period) if monitor => period,
            _ => return,
        };
        let registry = self.registry.clone();
        let tracker = self.tracker.clone();
        let prober = self.prober.clone();
        let test_url = self.config.probe.test_url.clone();
        let concurrency = self.config.probe.concurrency();
        self.tasks.push(PeriodicTask::spawn_now("line-monitor", period, move || {
            let registry = registry.clone();
            let tracker = tracker.clone();
            let prober = prober.clone();
            let test_url = test_url.clone();
            async move {
                let endpoints = registry.read().await.list().to_vec();
                let ranked = tracker
                    .rank_all(prober.as_ref(), &endpoints, &test_url, concurrency)
                    .await;
                info!("Background ranking finished, best line: {:?}", ranked.first());
            }
        }));
    }

    /// Stops every background task and waits for them to finish.
    pub async fn shutdown(mut self) {
        for task in self.tasks.drain(..) {
            debug!("Stopping {}", task.name());
            task.shutdown().await;
        }
    }

    /// The line named by `selector`, or the default line if none is given.
    pub async fn resolve_endpoint(&self, selector: Option<&str>) -> Result<Endpoint, ParseError> {
        let registry = self.registry.read().await;
        match selector {
            Some(selector) => registry
                .resolve(selector)
                .cloned()
                .ok_or_else(|| ParseError::UnknownEndpoint(selector.to_string())),
            None => {
                let best = self.tracker.best();
                registry
                    .default_endpoint(best.as_deref())
                    .cloned()
                    .ok_or(ParseError::NoEndpoint)
            }
        }
    }

    pub async fn parse(
        &mut self,
        url: &str,
        line: Option<&str>,
        force: bool,
    ) -> Result<ParseOutcome, ParseError> {
        let endpoint = self.resolve_endpoint(line).await?;
        let request = ParseRequest::new(url).allow_unsupported(force);
        self.parser.parse(&request, &endpoint)
    }

    /// Re-parses the `position`-th history entry with the default line.
    pub async fn parse_again(&mut self, position: usize) -> Result<ParseOutcome> {
        let url = self
            .parser
            .history()
            .get(position)
            .map(|entry| entry.url.clone())
            .ok_or_else(|| anyhow!("No history entry #{}", position))?;
        Ok(self.parse(&url, None, true).await?)
    }

    pub fn history(&self) -> &History {
        self.parser.history()
    }

    pub fn clear_history(&mut self) {
        self.parser.clear_history();
    }

    /// Probes every line and returns them best-first with their statistics.
    pub async fn rank(&self) -> Vec<(String, Option<PerformanceRecord>)> {
        let endpoints = self.registry.read().await.list().to_vec();
        let ranked = self
            .tracker
            .rank_all(
                self.prober.as_ref(),
                &endpoints,
                &self.config.probe.test_url,
                self.config.probe.concurrency(),
            )
            .await;
        ranked
            .into_iter()
            .map(|name| {
                let record = self.tracker.get(&name);
                (name, record)
            })
            .collect()
    }

    pub async fn lines(&self) -> Vec<LineStatus> {
        let registry = self.registry.read().await;
        let selected = registry.selected().map(|e| e.name.clone());
        registry
            .list()
            .iter()
            .map(|endpoint| LineStatus {
                selected: selected.as_deref() == Some(endpoint.name.as_str()),
                record: self.tracker.get(&endpoint.name),
                endpoint: endpoint.clone(),
            })
            .collect()
    }

    pub async fn select_line(&self, selector: &str) -> Result<Endpoint> {
        let mut registry = self.registry.write().await;
        let endpoint = registry
            .resolve(selector)
            .cloned()
            .ok_or_else(|| ParseError::UnknownEndpoint(selector.to_string()))?;
        registry.select(&endpoint.name);
        info!("Default line set to {}", endpoint.name);
        Ok(endpoint)
    }

    /// Adds or replaces a line and writes the config file.
    pub async fn add_line(&mut self, base_url: &str, name: &str) -> Result<()> {
        let endpoint = Endpoint::new(name.trim(), base_url.trim());
        validate_endpoint(&endpoint)?;
        let replaced = {
            let mut registry = self.registry.write().await;
            let replaced = registry
                .get(&endpoint.name)
                .is_some_and(|existing| existing.base_url != endpoint.base_url);
            registry.add(endpoint.clone());
            self.config.endpoints = registry.list().to_vec();
            replaced
        };
        if replaced {
            // Cached URLs and probe statistics belong to the old base URL.
            self.forget_line(&endpoint.name);
        }
        info!("Added line {} ({})", endpoint.name, endpoint.base_url);
        self.persist()
    }

    pub async fn remove_line(&mut self, selector: &str) -> Result<Endpoint> {
        let removed = {
            let mut registry = self.registry.write().await;
            let name = registry
                .resolve(selector)
                .map(|e| e.name.clone())
                .ok_or_else(|| ParseError::UnknownEndpoint(selector.to_string()))?;
            let removed = registry
                .remove(&name)
                .ok_or_else(|| ParseError::UnknownEndpoint(name.clone()))?;
            self.config.endpoints = registry.list().to_vec();
            removed
        };
        self.forget_line(&removed.name);
        info!("Removed line {}", removed.name);
        self.persist()?;
        Ok(removed)
    }

    fn forget_line(&self, name: &str) {
        self.parser.forget_line(name);
        self.tracker.forget(name);
    }

    fn persist(&self) -> Result<()> {
        self.config
            .save(&self.config_path)
            .with_context(|| format!("Failed to save {}", self.config_path.display()))
    }

    /// Cache counters plus its limit and TTL.
    pub fn cache_stats(&self) -> (CacheStats, usize, Duration) {
        let cache = self.parser.cache();
        (cache.stats(), cache.limit(), cache.ttl())
    }

    pub fn open_site(&self, selector: &str) -> Result<&'static VideoSite> {
        let site = find_site(selector).ok_or_else(|| anyhow!("Unknown site: {}", selector))?;
        self.parser
            .launcher()
            .open(site.home)
            .map_err(ParseError::Launch)?;
        Ok(site)
    }

    pub async fn check_update(&self) -> Result<UpdateStatus> {
        Ok(self.updater.check().await?)
    }

    pub fn apply_update(&mut self, info: &UpdateInfo) -> Result<()> {
        let launcher = self.parser.launcher().clone();
        self.updater.apply(info, launcher.as_ref())?;
        Ok(())
    }

    pub fn recent_logs(&self, count: usize) -> Vec<LogEntry> {
        self.logs.recent(count)
    }
}
