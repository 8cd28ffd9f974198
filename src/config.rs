use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub page_size: usize,
    /// Per-call bound applied around the gateway. `None` leaves calls unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, request_timeout: None }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    // Unparseable values keep the default.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(size) = get("FEED_PAGE_SIZE").and_then(|s| s.parse::<usize>().ok()) {
            cfg.page_size = size;
        }
        if let Some(secs) = get("FEED_REQUEST_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            cfg.request_timeout = Some(Duration::from_secs(secs));
        }
        cfg.page_size = cfg.page_size.max(1);
        cfg
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
