//! Application-level configuration constants and runtime-overridable settings.

use crate::http::{HttpClient, HttpRequest};
use crate::timer::{with_timeout, Sleeper};
use log::{debug, info, warn};
use serde::Deserialize;

// Remote rating service
pub const GRAPHQL_URL: &str = "https://www.ratemyprofessors.com/graphql";
pub const PROFILE_BASE_URL: &str = "https://www.ratemyprofessors.com/professor";
pub const AUTH_HEADER: &str = "Basic dGVzdDp0ZXN0";
/// Institution scope used by the structured search.
pub const SCHOOL_ID: &str = "U2Nob29sLTg3Nw==";
/// Numeric form of the same institution, used in profile page URLs.
pub const LEGACY_SCHOOL_ID: u32 = 877;
pub const REQUEST_TIMEOUT_MS: u32 = 10_000;
/// Optional lookup overrides, fetched by the worker relative to its script.
pub const LOOKUP_CONFIG_URL: &str = "lookup.json";

// Page behaviour
pub const INITIAL_SCAN_DELAY_MS: u32 = 2_000;
pub const OBSERVER_ATTACH_DELAY_MS: u32 = 3_000;
pub const MUTATION_QUIET_MS: u32 = 400;
pub const WORKER_SCRIPT: &str = "worker.js";
/// Upper bound on one page-to-worker round trip. Covers all three lookup tiers.
pub const TRANSPORT_TIMEOUT_MS: u32 = 35_000;
pub const PLACEHOLDER_NAME: &str = "TBA";

// Persistence and rendering
pub const STORAGE_PREFIX: &str = "rmp:";
pub const BADGE_CLASS: &str = "rmp-badge";
pub const NAME_ATTRIBUTE: &str = "data-rmp-name";

/// Selectors tried in order when locating instructor cells.
pub const INSTRUCTOR_SELECTORS: &[&str] = &[
    r#"td[headers*="Instructor"]"#,
    r#"td[headers*="INSTRUCTOR"]"#,
    "td.Instructor",
    r#"[class*="Instructor"]"#,
    "td:nth-child(8)",
];

/// Endpoints and limits used by the lookup chain.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub graphql_url: String,
    pub profile_base_url: String,
    pub auth_header: String,
    pub school_id: String,
    pub legacy_school_id: u32,
    pub request_timeout_ms: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            graphql_url: GRAPHQL_URL.to_string(),
            profile_base_url: PROFILE_BASE_URL.to_string(),
            auth_header: AUTH_HEADER.to_string(),
            school_id: SCHOOL_ID.to_string(),
            legacy_school_id: LEGACY_SCHOOL_ID,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
        }
    }
}

impl LookupConfig {
    /// Build a config from a JSON object. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Fetch overrides from `url`. A missing, slow or malformed file leaves
    /// the defaults in place.
    pub async fn load(http: &dyn HttpClient, sleeper: &dyn Sleeper, url: &str) -> Self {
        let sent = with_timeout(sleeper, REQUEST_TIMEOUT_MS, http.send(HttpRequest::get(url))).await;
        let response = match sent {
            Some(Ok(response)) if response.is_success() => response,
            Some(Ok(response)) => {
                debug!("No lookup overrides at {} ({})", url, response.status);
                return Self::default();
            }
            Some(Err(e)) => {
                debug!("No lookup overrides at {}: {}", url, e);
                return Self::default();
            }
            None => {
                warn!("Timed out loading lookup overrides from {}", url);
                return Self::default();
            }
        };

        match Self::from_json(&response.body) {
            Ok(config) => {
                info!("Loaded lookup overrides from {}", url);
                config
            }
            Err(e) => {
                warn!("Ignoring malformed lookup overrides at {}: {}", url, e);
                Self::default()
            }
        }
    }
}

/// Timing of the page change watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchPolicy {
    /// Delay before the first scan after start.
    pub initial_scan_ms: u32,
    /// Delay before mutations start being honoured.
    pub attach_ms: u32,
    /// Quiet window a burst of mutations must settle for before a re-scan.
    pub quiet_ms: u32,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            initial_scan_ms: INITIAL_SCAN_DELAY_MS,
            attach_ms: OBSERVER_ATTACH_DELAY_MS,
            quiet_ms: MUTATION_QUIET_MS,
        }
    }
}
