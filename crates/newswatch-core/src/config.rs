use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configuration file location
pub const CONFIG_PATH_ENV: &str = "NEWSWATCH_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Keywords used for categories that do not list their own
    #[serde(default = "default_alert_keywords")]
    pub alert_keywords: Vec<String>,
    /// Minimum number of matched articles before an alert is sent
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: usize,
    /// Recency window in hours
    #[serde(default = "default_hours_back")]
    pub hours_back: u32,
    /// Entries taken from each feed or search page
    #[serde(default = "default_max_entries")]
    pub max_entries_per_source: usize,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub newsapi: NewsApiConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            alert_keywords: default_alert_keywords(),
            alert_threshold: default_alert_threshold(),
            hours_back: default_hours_back(),
            max_entries_per_source: default_max_entries(),
            general: GeneralConfig::default(),
            sync: SyncConfig::default(),
            search: SearchConfig::default(),
            newsapi: NewsApiConfig::default(),
            telegram: TelegramConfig::default(),
            sheets: SheetsConfig::default(),
            server: ServerConfig::default(),
            categories: default_categories(),
        }
    }
}

/// A named group of sources scanned with one keyword list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    /// Label describing what a match in this category signals
    #[serde(default = "default_signal_type")]
    pub signal_type: String,
    /// RSS/Atom feed URLs
    #[serde(default)]
    pub feeds: Vec<String>,
    /// Free-text web search queries
    #[serde(default)]
    pub queries: Vec<String>,
    /// NewsAPI `everything` queries; skipped when no API key is set
    #[serde(default)]
    pub newsapi_queries: Vec<String>,
    /// Category keywords; empty means the global `alert_keywords`
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryConfig {
    /// Keywords this category is matched against
    pub fn effective_keywords<'a>(&'a self, global: &'a [String]) -> &'a [String] {
        if self.keywords.is_empty() {
            global
        } else {
            &self.keywords
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between scheduled scans in seconds (0 = timer disabled)
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    /// Run one scan as soon as the timer starts
    #[serde(default)]
    pub run_on_start: bool,
    /// Request timeout for feed, search and spreadsheet calls
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL for fetching (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            run_on_start: false,
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search page URL; `{query}` is replaced by the URL-encoded query
    #[serde(default = "default_search_url")]
    pub url_template: String,
    /// CSS selector for one search result title
    #[serde(default = "default_result_selector")]
    pub result_selector: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url_template: default_search_url(),
            result_selector: default_result_selector(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsApiConfig {
    #[serde(default = "default_newsapi_base")]
    pub api_base: String,
    /// API key (NEWSAPI_KEY); NewsAPI sources return nothing without it
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_newsapi_language")]
    pub language: String,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            api_base: default_newsapi_base(),
            api_key: None,
            language: default_newsapi_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    /// Bot token (TELEGRAM_BOT_TOKEN)
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Destination chat (TELEGRAM_CHAT_ID), e.g. "-1001234" or "@channel"
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Send timeout in seconds
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
    /// Alert headline, rendered as "🚨 {alert_title} Triggered!"
    #[serde(default = "default_alert_title")]
    pub alert_title: String,
    /// Topic phrase, rendered as "articles with {topic} keywords"
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_telegram_api(),
            bot_token: None,
            chat_id: None,
            timeout_secs: default_notify_timeout(),
            alert_title: default_alert_title(),
            topic: default_topic(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Enable spreadsheet logging
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_spreadsheet_name")]
    pub spreadsheet_name: String,
    #[serde(default = "default_worksheet_title")]
    pub worksheet_title: String,
    /// Search group written on the summary row of an empty scan
    #[serde(default = "default_search_group")]
    pub summary_group: String,
    #[serde(default = "default_drive_api")]
    pub drive_api_base: String,
    #[serde(default = "default_sheets_api")]
    pub sheets_api_base: String,
    /// Connector host for the token handshake (REPLIT_CONNECTORS_HOSTNAME)
    #[serde(default)]
    pub connectors_hostname: Option<String>,
    /// Scheme used to reach the connector host
    #[serde(default = "default_connectors_scheme")]
    pub connectors_scheme: String,
    /// Workspace identity token (REPL_IDENTITY)
    #[serde(default)]
    pub repl_identity: Option<String>,
    /// Deployment renewal token (WEB_REPL_RENEWAL)
    #[serde(default)]
    pub web_repl_renewal: Option<String>,
    /// Static bearer token that bypasses the handshake (GOOGLE_SHEETS_ACCESS_TOKEN)
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spreadsheet_name: default_spreadsheet_name(),
            worksheet_title: default_worksheet_title(),
            summary_group: default_search_group(),
            drive_api_base: default_drive_api(),
            sheets_api_base: default_sheets_api(),
            connectors_hostname: None,
            connectors_scheme: default_connectors_scheme(),
            repl_identity: None,
            web_repl_renewal: None,
            access_token: None,
        }
    }
}

impl SheetsConfig {
    /// Header sent as X_REPLIT_TOKEN, identity token first
    pub fn connector_token(&self) -> Option<String> {
        self.repl_identity
            .as_deref()
            .map(|t| format!("repl {}", t))
            .or_else(|| self.web_repl_renewal.as_deref().map(|t| format!("depl {}", t)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP trigger server binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_alert_keywords() -> Vec<String> {
    [
        "fuel shortage",
        "petrol shortage",
        "diesel shortage",
        "fuel supply",
        "fuel price",
        "petrol price",
        "panic buying",
        "refinery",
        "fuel rationing",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}

fn default_alert_threshold() -> usize {
    1
}

fn default_hours_back() -> u32 {
    24
}

fn default_max_entries() -> usize {
    20
}

fn default_categories() -> Vec<CategoryConfig> {
    vec![CategoryConfig {
        name: default_search_group(),
        signal_type: default_signal_type(),
        feeds: vec![
            "https://www.abc.net.au/news/feed/51120/rss.xml".to_string(),
            "https://www.news.com.au/content-feeds/latest-news-national/".to_string(),
            "http://feeds.feedburner.com/theage/rss/national".to_string(),
        ],
        queries: Vec::new(),
        newsapi_queries: Vec::new(),
        keywords: Vec::new(),
    }]
}

fn default_signal_type() -> String {
    "Keyword Alert".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_scan_interval() -> u64 {
    900 // 15 minutes
}

fn default_timeout() -> u64 {
    30
}

fn default_search_url() -> String {
    "https://www.google.com/search?q={query}".to_string()
}

fn default_result_selector() -> String {
    "div.BVG0Nb".to_string()
}

fn default_newsapi_base() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_newsapi_language() -> String {
    "en".to_string()
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

fn default_notify_timeout() -> u64 {
    10
}

fn default_alert_title() -> String {
    "Fuel Alert".to_string()
}

fn default_topic() -> String {
    "fuel-related".to_string()
}

fn default_spreadsheet_name() -> String {
    "Fuel Alert Logs".to_string()
}

fn default_worksheet_title() -> String {
    "Alert Logs".to_string()
}

fn default_search_group() -> String {
    "General".to_string()
}

fn default_drive_api() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_sheets_api() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_connectors_scheme() -> String {
    "https".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

/// Read a non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist. Environment credentials are applied on top.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let path = expand_tilde(path);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML document without touching the environment
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Overlay credentials from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(env_var);
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(host) = lookup("REPLIT_CONNECTORS_HOSTNAME") {
            self.sheets.connectors_hostname = Some(host);
        }
        if let Some(identity) = lookup("REPL_IDENTITY") {
            self.sheets.repl_identity = Some(identity);
        }
        if let Some(renewal) = lookup("WEB_REPL_RENEWAL") {
            self.sheets.web_repl_renewal = Some(renewal);
        }
        if let Some(token) = lookup("GOOGLE_SHEETS_ACCESS_TOKEN") {
            self.sheets.access_token = Some(token);
        }
        if let Some(key) = lookup("NEWSAPI_KEY") {
            self.newsapi.api_key = Some(key);
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        let path = expand_tilde(path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// NEWSWATCH_CONFIG wins, otherwise ~/.config/newswatch/config.toml
    pub fn config_path() -> PathBuf {
        if let Some(path) = env_var(CONFIG_PATH_ENV) {
            return expand_tilde(Path::new(&path));
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("newswatch")
            .join("config.toml")
    }
}
