use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Width of the first-page recent window in seconds
    #[serde(default = "default_recent_window_secs")]
    pub recent_window_secs: i64,
    /// Hard cap on requested page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// Page size for the rescoring collection walk
    #[serde(default = "default_rescore_page_size")]
    pub rescore_page_size: u64,
    /// Seconds between rescoring runs
    #[serde(default = "default_rescore_interval_secs")]
    pub rescore_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recent_window_secs: default_recent_window_secs(),
            max_page_size: default_max_page_size(),
            rescore_page_size: default_rescore_page_size(),
            rescore_interval_secs: default_rescore_interval_secs(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(EngineConfig {
            recent_window_secs: std::env::var("FEED_RECENT_WINDOW_SECS")
                .unwrap_or_else(|_| default_recent_window_secs().to_string())
                .parse()?,
            max_page_size: std::env::var("FEED_MAX_PAGE_SIZE")
                .unwrap_or_else(|_| default_max_page_size().to_string())
                .parse()?,
            rescore_page_size: std::env::var("FEED_RESCORE_PAGE_SIZE")
                .unwrap_or_else(|_| default_rescore_page_size().to_string())
                .parse()?,
            rescore_interval_secs: std::env::var("FEED_RESCORE_INTERVAL_SECS")
                .unwrap_or_else(|_| default_rescore_interval_secs().to_string())
                .parse()?,
        })
    }
}

fn default_recent_window_secs() -> i64 {
    3600
}

fn default_max_page_size() -> u32 {
    100
}

fn default_rescore_page_size() -> u64 {
    500
}

fn default_rescore_interval_secs() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.recent_window_secs, 3600);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.rescore_page_size, 500);
        assert_eq!(config.rescore_interval_secs, 3600);
    }
}
