//! Command-line surface. Flags override the JSON configuration.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::config::ScraperConfig;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "profile-scraper",
    version,
    about = "Extracts structured profile records over a cookie-authenticated browser session"
)]
#[command(group(ArgGroup::new("targets").required(true).args(["url", "input"])))]
pub struct Cli {
    /// Single profile URL to scrape
    #[arg(long, env = "PROFILE_SCRAPER_URL")]
    pub url: Option<String>,

    /// Target list (.csv, .xlsx, .json or one URL per line)
    #[arg(long, short, env = "PROFILE_SCRAPER_INPUT")]
    pub input: Option<PathBuf>,

    /// Cookie export (JSON array)
    #[arg(long, short, env = "PROFILE_SCRAPER_COOKIES", default_value = "cookies.json")]
    pub cookies: PathBuf,

    /// Batch result document
    #[arg(long, short, env = "PROFILE_SCRAPER_OUTPUT", default_value = "profiles.json")]
    pub output: PathBuf,

    /// JSON configuration file
    #[arg(long, env = "PROFILE_SCRAPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, env = "PROFILE_SCRAPER_VISIBLE")]
    pub visible: bool,

    /// Minimum seconds between profiles
    #[arg(long, env = "PROFILE_SCRAPER_DELAY")]
    pub delay: Option<u64>,

    /// Maximum number of profiles in this run
    #[arg(long, env = "PROFILE_SCRAPER_MAX_PROFILES")]
    pub max_profiles: Option<usize>,

    /// Per-strategy element lookup budget
    #[arg(long, env = "PROFILE_SCRAPER_LOOKUP_TIMEOUT_MS")]
    pub lookup_timeout_ms: Option<u64>,

    /// Proxy endpoint, e.g. http://127.0.0.1:8080
    #[arg(long, env = "PROFILE_SCRAPER_PROXY")]
    pub proxy: Option<String>,

    /// Re-scrape targets that already succeeded in the output file
    #[arg(long, env = "PROFILE_SCRAPER_NO_RESUME")]
    pub no_resume: bool,

    /// Keep the inline lists instead of visiting "show all" pages
    #[arg(long, env = "PROFILE_SCRAPER_NO_DETAIL_PAGES")]
    pub no_detail_pages: bool,

    /// Directory for page captures of failed targets
    #[arg(long, env = "PROFILE_SCRAPER_CAPTURE_DIR")]
    pub capture_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn apply(&self, config: &mut ScraperConfig) {
        if self.visible {
            config.headless = false;
        }
        if let Some(delay) = self.delay {
            config.delay_between_profiles_secs = delay;
        }
        if let Some(max) = self.max_profiles {
            config.max_profiles = max;
        }
        if let Some(ms) = self.lookup_timeout_ms {
            config.lookup_timeout_ms = ms;
        }
        if let Some(proxy) = &self.proxy {
            config.proxy_server = Some(proxy.clone());
        }
        if self.no_resume {
            config.resume = false;
        }
        if self.no_detail_pages {
            config.follow_detail_pages = false;
        }
        if let Some(dir) = &self.capture_dir {
            config.capture_dir = Some(dir.clone());
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_target_source_is_required() {
        assert!(Cli::try_parse_from(["profile-scraper"]).is_err());
        assert!(Cli::try_parse_from(["profile-scraper", "--url", "https://www.linkedin.com/in/a"]).is_ok());
    }

    #[test]
    fn flags_override_the_config() {
        let cli = Cli::try_parse_from([
            "profile-scraper",
            "--input",
            "targets.csv",
            "--visible",
            "--delay",
            "9",
            "--max-profiles",
            "3",
            "--proxy",
            "http://127.0.0.1:8080",
            "--no-detail-pages",
            "-v",
        ])
        .unwrap();

        let mut config = ScraperConfig::default();
        cli.apply(&mut config);
        assert!(!config.headless);
        assert_eq!(config.delay_between_profiles_secs, 9);
        assert_eq!(config.max_profiles, 3);
        assert_eq!(config.proxy_server.as_deref(), Some("http://127.0.0.1:8080"));
        assert!(!config.follow_detail_pages);
        assert!(config.resume);
        assert_eq!(config.log_level, "debug");
        assert_eq!(cli.output, PathBuf::from("profiles.json"));
    }
}
