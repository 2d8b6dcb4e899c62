//! Parse lines ("endpoints") and the ordered registry that holds them.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A named third-party parse service.
///
/// The action URL for a video page is `base_url` followed by the page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub base_url: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }

    pub fn request_url(&self, target: &str) -> String {
        format!("{}{}", self.base_url, target)
    }
}

/// The built-in parse lines shipped with the tool.
pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("Line 1 - General", "https://jx.m3u8.tv/jiexi/?url="),
        Endpoint::new("Line 2 - Stable", "https://jx.parwix.com:4433/player/?url="),
        Endpoint::new("Line 3 - Fast", "https://jx.xmflv.com/?url="),
        Endpoint::new("Line 4 - Backup", "https://www.yemu.xyz/?url="),
        Endpoint::new("Line 5 - HD", "https://api.jiexi.la/?url="),
        Endpoint::new("Line 6 - Rapid", "https://www.8090g.cn/?url="),
    ]
}

/// Ordered, runtime-editable set of endpoints keyed by name.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
    selected: Option<String>,
}

impl EndpointRegistry {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        let mut registry = Self::default();
        for endpoint in endpoints {
            registry.add(endpoint);
        }
        registry
    }

    pub fn list(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Looks an endpoint up by 1-based position or by exact name.
    pub fn resolve(&self, selector: &str) -> Option<&Endpoint> {
        let selector = selector.trim();
        if let Ok(index) = selector.parse::<usize>() {
            if index >= 1 {
                if let Some(endpoint) = self.endpoints.get(index - 1) {
                    return Some(endpoint);
                }
            }
        }
        self.get(selector)
    }

    /// Adds an endpoint, replacing the URL of an existing one with the same
    /// name without moving it.
    pub fn add(&mut self, endpoint: Endpoint) {
        if let Some(existing) = self.endpoints.iter_mut().find(|e| e.name == endpoint.name) {
            debug!("Replacing base URL of line {}", endpoint.name);
            existing.base_url = endpoint.base_url;
        } else {
            self.endpoints.push(endpoint);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Endpoint> {
        let index = self.endpoints.iter().position(|e| e.name == name)?;
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        Some(self.endpoints.remove(index))
    }

    /// Marks `name` as the user's preferred line. Returns false if unknown.
    pub fn select(&mut self, name: &str) -> bool {
        if self.get(name).is_some() {
            self.selected = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&Endpoint> {
        self.selected.as_deref().and_then(|name| self.get(name))
    }

    /// Picks the line to use when the caller did not name one: the user's
    /// selection, then the best ranked line, then the first configured one.
    pub fn default_endpoint(&self, best_ranked: Option<&str>) -> Option<&Endpoint> {
        self.selected()
            .or_else(|| best_ranked.and_then(|name| self.get(name)))
            .or_else(|| self.endpoints.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_appends_target() {
        let endpoint = Endpoint::new("a", "https://jx.example.com/?url=");
        assert_eq!(
            endpoint.request_url("https://v.qq.com/x/1.html"),
            "https://jx.example.com/?url=https://v.qq.com/x/1.html"
        );
    }

    #[test]
    fn test_add_replaces_in_place() {
        let mut registry = EndpointRegistry::new(vec![
            Endpoint::new("a", "https://a.com/?url="),
            Endpoint::new("b", "https://b.com/?url="),
        ]);
        registry.add(Endpoint::new("a", "https://a2.com/?url="));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list()[0].name, "a");
        assert_eq!(registry.list()[0].base_url, "https://a2.com/?url=");
    }

    #[test]
    fn test_resolve_by_index_or_name() {
        let registry = EndpointRegistry::new(default_endpoints());

        assert_eq!(registry.resolve("1").unwrap().name, "Line 1 - General");
        assert_eq!(registry.resolve("6").unwrap().name, "Line 6 - Rapid");
        assert!(registry.resolve("0").is_none());
        assert!(registry.resolve("7").is_none());
        assert_eq!(registry.resolve("Line 3 - Fast").unwrap().name, "Line 3 - Fast");
    }

    #[test]
    fn test_default_endpoint_precedence() {
        let mut registry = EndpointRegistry::new(vec![
            Endpoint::new("a", "https://a.com/?url="),
            Endpoint::new("b", "https://b.com/?url="),
            Endpoint::new("c", "https://c.com/?url="),
        ]);

        assert_eq!(registry.default_endpoint(None).unwrap().name, "a");
        assert_eq!(registry.default_endpoint(Some("c")).unwrap().name, "c");
        assert_eq!(registry.default_endpoint(Some("gone")).unwrap().name, "a");

        assert!(registry.select("b"));
        assert_eq!(registry.default_endpoint(Some("c")).unwrap().name, "b");

        registry.remove("b");
        assert!(registry.selected().is_none());
        assert!(!registry.select("b"));
    }

    #[test]
    fn test_empty_registry_has_no_default() {
        let registry = EndpointRegistry::default();
        assert!(registry.default_endpoint(Some("a")).is_none());
    }
}
