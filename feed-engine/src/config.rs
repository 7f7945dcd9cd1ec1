use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Posts requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Organic posts between ad insertions
    #[serde(default = "default_ad_interval")]
    pub ad_interval: usize,
    /// Substitute sample content when the remote feed is empty.
    /// Off by default so an empty feed renders as genuinely empty.
    #[serde(default)]
    pub enable_fallback: bool,
}

fn default_page_size() -> u32 {
    10
}

fn default_ad_interval() -> usize {
    8
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            ad_interval: default_ad_interval(),
            enable_fallback: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            page_size: std::env::var("FEED_PAGE_SIZE")
                .unwrap_or_else(|_| default_page_size().to_string())
                .parse()?,
            ad_interval: std::env::var("FEED_AD_INTERVAL")
                .unwrap_or_else(|_| default_ad_interval().to_string())
                .parse()?,
            enable_fallback: std::env::var("FEED_ENABLE_FALLBACK")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}
