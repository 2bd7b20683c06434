//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Source;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP settings for the board provider
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Background refresh and retry settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Snapshot persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Source definitions, in refresh order
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<Source>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.refresh.interval_secs == 0 {
            return Err(AppError::validation("refresh.interval_secs must be > 0"));
        }
        if self.refresh.max_attempts == 0 {
            return Err(AppError::validation("refresh.max_attempts must be > 0"));
        }
        if self.refresh.failure_threshold == 0 {
            return Err(AppError::validation(
                "refresh.failure_threshold must be > 0",
            ));
        }
        if self.storage.snapshot_path.as_os_str().is_empty() {
            return Err(AppError::validation("storage.snapshot_path is empty"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut keys = HashSet::new();
        for source in &self.sources {
            if source.key.trim().is_empty() {
                return Err(AppError::validation("source key is empty"));
            }
            if !keys.insert(source.key.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate source key '{}'",
                    source.key
                )));
            }
            if let Some(pages) = source.pages {
                if pages.start == 0 || pages.start > pages.end {
                    return Err(AppError::validation(format!(
                        "source '{}' has invalid page range {}..={}",
                        source.key, pages.start, pages.end
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            refresh: RefreshConfig::default(),
            storage: StorageConfig::default(),
            sources: defaults::default_sources(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-page request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Refresh cadence and retry bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between background refresh cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Delay before the first background cycle
    #[serde(default = "defaults::startup_delay")]
    pub startup_delay_secs: u64,

    /// Provider calls per source per cycle
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Consecutive failed sources before the provider is recreated
    #[serde(default = "defaults::failure_threshold")]
    pub failure_threshold: u32,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            startup_delay_secs: defaults::startup_delay(),
            max_attempts: defaults::max_attempts(),
            failure_threshold: defaults::failure_threshold(),
        }
    }
}

/// Snapshot file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: defaults::snapshot_path(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use crate::models::{BoardSelectors, Source};

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; NoticeAggregator/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Refresh defaults
    pub fn interval() -> u64 {
        3000
    }
    pub fn startup_delay() -> u64 {
        2
    }
    pub fn max_attempts() -> u32 {
        2
    }
    pub fn failure_threshold() -> u32 {
        3
    }

    // Storage defaults
    pub fn snapshot_path() -> PathBuf {
        PathBuf::from("cache.json")
    }

    const HOMEPAGE_LIST: &str = "https://www.hoseo.ac.kr/Home//BBSList.mbz?action=MAPP_1708240139&schIdx=0&schKeytype=subject&schKeyword=&schCategorycode=";
    const HOMEPAGE_VIEW: &str =
        "https://www.hoseo.ac.kr/Home//BBSView.mbz?action=MAPP_1708240139&schIdx={1}";

    fn homepage_board(category: &str) -> BoardSelectors {
        BoardSelectors::table(
            format!("{HOMEPAGE_LIST}{category}&pageIndex={{page}}"),
            "table.ui-list tbody tr",
            "td.board-list-title a",
            "td[data-header='등록일자']",
        )
        .with_link_rewrite(r"fn_viewData\('(\d+)'\)", HOMEPAGE_VIEW)
    }

    fn homepage_source(key: &str, name: &str, color: &str, icon: &str, category: &str) -> Source {
        Source::new(key, name, color, icon)
            .with_pages(1, 3)
            .with_board(homepage_board(category))
    }

    // Source defaults
    pub fn default_sources() -> Vec<Source> {
        vec![
            Source::new("library", "도서관", "#43a047", "📚").with_board(
                BoardSelectors::table(
                    "https://library.hoseo.ac.kr/#/bbs/notice?offset=0&max=200",
                    ".ikc-item",
                    ".ikc-item-title",
                    "span",
                )
                .with_date_pattern(r"\d{4}\.\d{2}\.\d{2}"),
            ),
            // Page 1 of the main board only repeats pinned notices.
            Source::new("main", "메인공지", "#1a73e8", "🏫")
                .with_pages(2, 5)
                .with_board(homepage_board("CTG_17082400011")),
            homepage_source("fusion", "융합교육", "#9c27b0", "🔬", "CTG_24050300117"),
            homepage_source("academic", "학사", "#f44336", "📝", "CTG_17082400012"),
            homepage_source("scholarship", "장학", "#ff9800", "💰", "CTG_17082400013"),
            homepage_source("volunteer", "사회봉사", "#4caf50", "🤝", "CTG_17082400014"),
            homepage_source("external", "외부공지", "#607d8b", "📢", "CTG_20012200070"),
            homepage_source("career", "취업", "#2196f3", "💼", "CTG_20120400086"),
            Source::new("cando", "캔두", "#e91e63", "🎯")
                .with_status()
                .with_pages(1, 2)
                .with_board(
                    BoardSelectors::table(
                        "https://cando.hoseo.ac.kr/Career/CareerTask/ProgramList.aspx?rp={page}",
                        ".prod-list",
                        ".prod1.text-info, [id$='_Title_txt']",
                        "[id$='_DateTime_txt'], .prod2",
                    )
                    .with_date_pattern(r"\d{4}-\d{2}-\d{2}")
                    .with_link_selector("a")
                    .with_status(
                        "[name='finishDate'], [id$='_finishDate'], .label.label-white span",
                        "진행중",
                    ),
                ),
        ]
    }
}
