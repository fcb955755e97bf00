//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Portal endpoint and HTTP behavior
    #[serde(default)]
    pub portal: PortalConfig,

    /// Login toggle and credentials
    #[serde(default)]
    pub login: LoginConfig,

    /// Stream polling behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Attachment download behavior
    #[serde(default)]
    pub download: DownloadConfig,

    /// Server-side dismissal behavior
    #[serde(default)]
    pub dismiss: DismissConfig,

    /// Raw-entry archival settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Task sink settings
    #[serde(default)]
    pub sink: SinkConfig,

    /// Course ID to display-name mappings
    #[serde(default)]
    pub courses: Vec<CourseMapping>,
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
        if self.portal.base_url.trim().is_empty() {
            return Err(AppError::validation("portal.base_url is empty"));
        }
        url::Url::parse(&self.portal.base_url)
            .map_err(|e| AppError::validation(format!("portal.base_url is invalid: {e}")))?;
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::validation("portal.user_agent is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::validation("portal.timeout_secs must be > 0"));
        }
        if self.fetch.poll_interval_ms == 0 {
            return Err(AppError::validation("fetch.poll_interval_ms must be > 0"));
        }
        Ok(())
    }

    /// Look up the display name configured for a course ID.
    pub fn course_name(&self, course_id: &str) -> Option<&str> {
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .map(|c| c.name.as_str())
    }
}

/// Portal endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the Blackboard instance
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Login toggle and credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Whether to authenticate at startup. Disabled runs can still replay
    /// archived entries but cannot fetch or download.
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    #[serde(flatten)]
    pub credentials: LoginCredentials,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            credentials: LoginCredentials::default(),
        }
    }
}

/// Pre-encoded login form fields, as the portal's login page produces them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginCredentials {
    #[serde(default)]
    pub encoded_pw: String,
    #[serde(default)]
    pub encoded_pw_unicode: String,
    #[serde(default)]
    pub login_uid_unicode: String,
    #[serde(default)]
    pub login_pwd_unicode: String,
}

impl LoginCredentials {
    /// All four fields must be set for a login attempt to make sense.
    pub fn is_complete(&self) -> bool {
        !self.encoded_pw.is_empty()
            && !self.encoded_pw_unicode.is_empty()
            && !self.login_uid_unicode.is_empty()
            && !self.login_pwd_unicode.is_empty()
    }
}

/// Stream polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Delay between continuation fetches in milliseconds. Politeness
    /// backpressure toward the portal, not a performance knob.
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::poll_interval(),
        }
    }
}

/// Attachment download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Whether to download file content and attachments
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Directory downloads are written to
    #[serde(default = "defaults::download_dir")]
    pub dir: String,

    /// Maximum download size in bytes; 0 disables the cap
    #[serde(default)]
    pub max_size_bytes: u64,
}

impl DownloadConfig {
    /// Configured cap, if any.
    pub fn max_size(&self) -> Option<u64> {
        (self.max_size_bytes > 0).then_some(self.max_size_bytes)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            dir: defaults::download_dir(),
            max_size_bytes: 0,
        }
    }
}

/// Server-side dismissal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissConfig {
    /// Whether handled alerts are dismissed on the portal
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
}

impl Default for DismissConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
        }
    }
}

/// Raw-entry archival settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory timestamped raw-entry archives are written to
    #[serde(default = "defaults::data_dir")]
    pub data_dir: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

/// Task sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// JSONL inbox file task items are appended to
    #[serde(default = "defaults::inbox_path")]
    pub inbox_path: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            inbox_path: defaults::inbox_path(),
        }
    }
}

/// Mapping from a course ID to a display-name prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseMapping {
    /// Course identifier as it appears in stream entries
    pub id: String,

    /// Display prefix for task titles, e.g. "CALC: "
    pub name: String,
}

mod defaults {
    pub fn base_url() -> String {
        "https://c.zju.edu.cn".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn poll_interval() -> u64 {
        1000
    }
    pub fn download_dir() -> String {
        "downloads".into()
    }
    pub fn data_dir() -> String {
        "data".into()
    }
    pub fn inbox_path() -> String {
        "inbox.jsonl".into()
    }
}
