// --- File: crates/autoservice_config/src/models.rs ---

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

// --- Backend Config ---
// The spreadsheet script backend is reached over a single URL; the action is a query parameter.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    pub url: String, // Mandatory, e.g. the deployed script "exec" URL
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Content type used for POST bodies. `text/plain` keeps the request CORS-simple.
    #[serde(default = "default_post_content_type")]
    pub post_content_type: String,
}

// --- Booking Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// IANA name of the workshop time zone, used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Number of days after today that can still be booked (inclusive).
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_opening_time")]
    pub opening_time: String, // "HH:MM"
    #[serde(default = "default_closing_time")]
    pub closing_time: String, // "HH:MM", exclusive
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    #[serde(default = "default_services")]
    pub services: Vec<String>,
    /// Whether the form collects a time slot in addition to the date.
    #[serde(default = "default_true")]
    pub collect_time: bool,
}

// --- Submission Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SubmissionConfig {
    #[serde(default = "default_submit_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for every following one.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StatusConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BannerConfig {
    #[serde(default = "default_success_secs")]
    pub success_secs: u64,
    #[serde(default = "default_error_secs")]
    pub error_secs: u64,
}

// --- Admin Config ---
// Holds the shared secret of the admin page. Usually "secret_from_env" -> ADMIN_SHARED_SECRET.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AdminConfig {
    pub shared_secret: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Backend config is mandatory
    pub backend: BackendConfig,

    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub banners: BannerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A configuration value that is present but unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidConfig(pub String);

impl std::fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl std::error::Error for InvalidConfig {}

impl AppConfig {
    /// Builds a configuration with defaults for everything but the backend URL.
    pub fn with_backend_url(url: impl Into<String>) -> Self {
        Self {
            backend: BackendConfig {
                url: url.into(),
                request_timeout_secs: default_request_timeout_secs(),
                post_content_type: default_post_content_type(),
            },
            booking: BookingConfig::default(),
            submission: SubmissionConfig::default(),
            status: StatusConfig::default(),
            banners: BannerConfig::default(),
            admin: AdminConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Checks the values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.backend.url.trim().is_empty() {
            return Err(InvalidConfig("backend.url must not be empty".into()));
        }
        self.booking.time_zone()?;
        let opening = self.booking.opening()?;
        let closing = self.booking.closing()?;
        if closing <= opening {
            return Err(InvalidConfig(format!(
                "booking.closing_time ({}) must be after booking.opening_time ({})",
                self.booking.closing_time, self.booking.opening_time
            )));
        }
        if self.booking.slot_minutes == 0 {
            return Err(InvalidConfig("booking.slot_minutes must be positive".into()));
        }
        if self.submission.max_attempts == 0 {
            return Err(InvalidConfig("submission.max_attempts must be at least 1".into()));
        }
        // The per-attempt submission bound has to fire before the transport's own timeout.
        if self.submission.timeout_secs >= self.backend.request_timeout_secs {
            return Err(InvalidConfig(format!(
                "submission.timeout_secs ({}) must be below backend.request_timeout_secs ({})",
                self.submission.timeout_secs, self.backend.request_timeout_secs
            )));
        }
        Ok(())
    }
}

impl BookingConfig {
    pub fn time_zone(&self) -> Result<Tz, InvalidConfig> {
        Tz::from_str(&self.timezone)
            .map_err(|_| InvalidConfig(format!("unknown time zone '{}'", self.timezone)))
    }

    pub fn opening(&self) -> Result<NaiveTime, InvalidConfig> {
        parse_clock_time("booking.opening_time", &self.opening_time)
    }

    pub fn closing(&self) -> Result<NaiveTime, InvalidConfig> {
        parse_clock_time("booking.closing_time", &self.closing_time)
    }
}

impl SubmissionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

fn parse_clock_time(key: &str, value: &str) -> Result<NaiveTime, InvalidConfig> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| InvalidConfig(format!("{key} must be HH:MM, got '{value}'")))
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            horizon_days: default_horizon_days(),
            opening_time: default_opening_time(),
            closing_time: default_closing_time(),
            slot_minutes: default_slot_minutes(),
            services: default_services(),
            collect_time: true,
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_submit_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            success_secs: default_success_secs(),
            error_secs: default_error_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    20
}
fn default_post_content_type() -> String {
    "text/plain;charset=utf-8".to_string()
}
fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}
fn default_horizon_days() -> u32 {
    28
}
fn default_opening_time() -> String {
    "09:00".to_string()
}
fn default_closing_time() -> String {
    "20:00".to_string()
}
fn default_slot_minutes() -> u32 {
    30
}
fn default_services() -> Vec<String> {
    [
        "Замена масла",
        "Диагностика",
        "Шиномонтаж",
        "Ремонт подвески",
        "Ремонт тормозной системы",
        "Компьютерная диагностика",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_true() -> bool {
    true
}
fn default_submit_timeout_secs() -> u64 {
    15
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_poll_interval_secs() -> u64 {
    300
}
fn default_success_secs() -> u64 {
    8
}
fn default_error_secs() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}
