//! Runtime settings consumed by the pipeline.
//!
//! Everything has a default so an absent or partial JSON file still yields a
//! complete configuration. Command-line overrides are applied on top by
//! [`crate::cli::Cli::apply`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub headless: bool,
    pub delay_between_profiles_secs: u64,
    pub delay_jitter_secs: u64,
    pub max_profiles: usize,
    pub lookup_timeout_ms: u64,
    pub navigation_timeout_secs: u64,
    pub proxy_server: Option<String>,
    pub scroll_steps: u32,
    pub scroll_settle_ms: u64,
    pub auth_wall_backoff_secs: u64,
    pub max_challenge_dismissals: u32,
    pub landing_url: String,
    pub auth_cookie: String,
    pub follow_detail_pages: bool,
    pub resume: bool,
    pub capture_dir: Option<PathBuf>,
    pub log_level: String,
    pub gate: GateRules,
    pub challenge_dismiss_selectors: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        ScraperConfig {
            headless: true,
            delay_between_profiles_secs: 5,
            delay_jitter_secs: 0,
            max_profiles: 100,
            lookup_timeout_ms: 2000,
            navigation_timeout_secs: 30,
            proxy_server: None,
            scroll_steps: 5,
            scroll_settle_ms: 1000,
            auth_wall_backoff_secs: 3,
            max_challenge_dismissals: 2,
            landing_url: "https://www.linkedin.com/feed/".to_string(),
            auth_cookie: "li_at".to_string(),
            follow_detail_pages: true,
            resume: true,
            capture_dir: None,
            log_level: "info".to_string(),
            gate: GateRules::default(),
            challenge_dismiss_selectors: vec![
                "button[data-test-id=\"consent-accept\"]".to_string(),
                "button.artdeco-global-alert-action".to_string(),
                "button[aria-label=\"Continue\"]".to_string(),
                "button.artdeco-button--primary".to_string(),
            ],
        }
    }
}

impl ScraperConfig {
    /// Reads `path` if given and present; otherwise returns defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let Some(path) = path else {
            return Ok(ScraperConfig::default());
        };
        if !path.exists() {
            warn!("Config file {:?} not found. Using defaults.", path);
            return Ok(ScraperConfig::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| LoadError::Json {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn auth_wall_backoff(&self) -> Duration {
        Duration::from_secs(self.auth_wall_backoff_secs)
    }

    pub fn inter_target_delay(&self) -> Duration {
        Duration::from_secs(self.delay_between_profiles_secs)
    }

    pub fn delay_jitter(&self) -> Duration {
        Duration::from_secs(self.delay_jitter_secs)
    }
}

/// URL and content markers used to tell real content from login pages,
/// interstitials and per-page gates. URL markers are path prefixes, content
/// markers are plain substrings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateRules {
    pub login_url: Vec<String>,
    pub login_content: Vec<String>,
    pub challenge_url: Vec<String>,
    pub challenge_content: Vec<String>,
    pub auth_wall_url: Vec<String>,
    pub auth_wall_content: Vec<String>,
}

impl Default for GateRules {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        GateRules {
            login_url: owned(&["/login", "/uas/login", "/checkpoint/lg/", "/signup"]),
            login_content: owned(&["id=\"session_key\"", "name=\"session_password\""]),
            challenge_url: owned(&["/checkpoint/challenge", "/checkpoint/rp/", "/consent"]),
            challenge_content: owned(&["captcha-internal", "consent-interstitial"]),
            auth_wall_url: owned(&["/authwall"]),
            auth_wall_content: owned(&["authwall-join-form", "join-form__form-body"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = ScraperConfig::load(Some(Path::new("/definitely/not/here.json"))).unwrap();
        assert_eq!(config, ScraperConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_profiles": 3, "headless": false, "gate": {{"auth_wall_url": ["/gate"]}}}}"#).unwrap();

        let config = ScraperConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_profiles, 3);
        assert!(!config.headless);
        assert_eq!(config.lookup_timeout(), Duration::from_millis(2000));
        assert_eq!(config.gate.auth_wall_url, vec!["/gate".to_string()]);
        assert_eq!(config.gate.login_url, GateRules::default().login_url);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            ScraperConfig::load(Some(file.path())),
            Err(LoadError::Json { .. })
        ));
    }
}
