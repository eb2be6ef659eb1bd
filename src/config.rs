use std::time::Duration;

use crate::errors::ConfigError;
use crate::models::CameraPosition;

/// Camera the map opens on (Times Square).
pub const INITIAL_CAMERA: CameraPosition = CameraPosition {
    longitude: -73.9855,
    latitude: 40.7580,
    zoom: 11.0,
};

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Endpoint the report request is POSTed to.
    pub report_api_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Whether to look up a place photo after each selection.
    pub photo_lookup: bool,
    pub wikipedia_base_url: String,
    /// Directory downloaded reports are written to.
    pub download_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let report_api_url =
            std::env::var("REPORT_API_URL").map_err(|_| ConfigError::Missing("REPORT_API_URL"))?;

        let timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                message: format!("{}", e),
            })?;

        let photo_lookup = match std::env::var("PHOTO_LOOKUP") {
            Ok(v) => parse_flag(&v).ok_or_else(|| ConfigError::Invalid {
                name: "PHOTO_LOOKUP",
                message: format!("expected true/false, got '{}'", v),
            })?,
            Err(_) => true,
        };

        Ok(Self {
            report_api_url,
            user_agent: std::env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| "WeatherAtlas/0.1".to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            photo_lookup,
            wikipedia_base_url: std::env::var("WIKIPEDIA_BASE_URL")
                .unwrap_or_else(|_| "https://en.wikipedia.org".to_string()),
            download_dir: std::env::var("DOWNLOAD_DIR").unwrap_or_else(|_| ".".to_string()),
        })
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
