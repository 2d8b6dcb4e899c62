//! Turns a video page URL into a parse-line action URL and opens it.
//!
//! Results are cached per (line, page URL) so repeated requests skip
//! rebuilding and re-validating the action URL.
pub mod history;
pub mod launcher;
pub mod sites;

pub use history::History;
pub use launcher::{Launcher, PrintLauncher, SystemBrowser};
pub use sites::{find_site, site_for, VideoSite, SUPPORTED_SITES};

use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheKey, TtlCache};
use crate::endpoints::Endpoint;
use crate::error::ParseError;

/// A user request to parse one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequest {
    pub url: String,
    /// Parse pages from sites outside [`SUPPORTED_SITES`] too.
    pub allow_unsupported: bool,
}

impl ParseRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            allow_unsupported: false,
        }
    }

    pub fn allow_unsupported(mut self, allow: bool) -> Self {
        self.allow_unsupported = allow;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub endpoint: String,
    pub action_url: String,
    pub cached: bool,
}

pub struct ParseService {
    cache: Arc<TtlCache<CacheKey, String>>,
    history: History,
    launcher: Arc<dyn Launcher>,
}

impl ParseService {
    pub fn new(
        cache: Arc<TtlCache<CacheKey, String>>,
        history_limit: usize,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            cache,
            history: History::new(history_limit),
            launcher,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn cache(&self) -> &Arc<TtlCache<CacheKey, String>> {
        &self.cache
    }

    pub fn launcher(&self) -> &Arc<dyn Launcher> {
        &self.launcher
    }

    /// Drops every cached action URL built with the line `name`.
    pub fn forget_line(&self, name: &str) -> usize {
        let removed = self.cache.retain(|key| key.endpoint != name);
        if removed > 0 {
            debug!("Dropped {} cached URLs for line {}", removed, name);
        }
        removed
    }

    pub fn parse(
        &mut self,
        request: &ParseRequest,
        endpoint: &Endpoint,
    ) -> Result<ParseOutcome, ParseError> {
        let url = validate(request)?;

        self.history.push(url);

        let key = CacheKey::new(endpoint.name.as_str(), url);
        let (action_url, cached) = match self.cache.get(&key) {
            Some(action_url) => {
                debug!("Cache hit for {} on {}", url, endpoint.name);
                (action_url, true)
            }
            None => (endpoint.request_url(url), false),
        };

        info!("Parsing {} with {}", url, endpoint.name);
        self.launcher.open(&action_url)?;

        if !cached {
            self.cache.put(key, action_url.clone());
        }

        Ok(ParseOutcome {
            endpoint: endpoint.name.clone(),
            action_url,
            cached,
        })
    }
}

/// Checks the page URL and returns it trimmed.
pub fn validate(request: &ParseRequest) -> Result<&str, ParseError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ParseError::EmptyUrl);
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ParseError::InvalidScheme(url.to_string()));
    }
    if !request.allow_unsupported && site_for(url).is_none() {
        return Err(ParseError::UnsupportedSite(url.to_string()));
    }
    Ok(url)
}
