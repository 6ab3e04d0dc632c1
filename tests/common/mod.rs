#![allow(dead_code)]

use std::sync::Arc;

use profile_scraper_lib::cookie_loader::{Cookie, CredentialSet};
use profile_scraper_lib::delay_manager::RecordingSleeper;
use profile_scraper_lib::{ProfileAssembler, ReplaySite, ScraperConfig};

pub const FEED: &str = "https://www.linkedin.com/feed/";
pub const JANE: &str = "https://www.linkedin.com/in/jane-van-doe";

pub const FEED_HTML: &str = include_str!("../fixtures/feed.html");
pub const PROFILE_HTML: &str = include_str!("../fixtures/profile_jane.html");
pub const PRIVATE_HTML: &str = include_str!("../fixtures/profile_private.html");
pub const SKILLS_DETAILS_HTML: &str = include_str!("../fixtures/skills_details.html");
pub const CONTACT_HTML: &str = include_str!("../fixtures/contact_overlay.html");

pub fn profile_url(id: &str) -> String {
    format!("https://www.linkedin.com/in/{}", id)
}

/// A site whose landing page is a logged-in feed.
pub fn site() -> ReplaySite {
    let site = ReplaySite::new();
    site.page(FEED, FEED_HTML);
    site
}

fn cookie(name: &str, value: &str) -> Cookie {
    Cookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: ".linkedin.com".to_string(),
        path: "/".to_string(),
        secure: true,
        http_only: true,
        same_site: None,
        expires: None,
    }
}

pub fn valid_credentials() -> CredentialSet {
    CredentialSet::new(vec![cookie("li_at", "AQEDAT-token"), cookie("JSESSIONID", "ajax:1")])
}

pub fn credentials_without_token() -> CredentialSet {
    CredentialSet::new(vec![cookie("JSESSIONID", "ajax:1"), cookie("lang", "v=2&lang=en-us")])
}

/// Defaults minus the detail-page pass, so a target costs one navigation.
pub fn config() -> ScraperConfig {
    ScraperConfig {
        follow_detail_pages: false,
        ..ScraperConfig::default()
    }
}

pub fn assembler(
    site: &ReplaySite,
    credentials: CredentialSet,
    config: &ScraperConfig,
) -> (ProfileAssembler, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let assembler = ProfileAssembler::new(
        Box::new(site.factory()),
        credentials,
        config,
        sleeper.clone(),
    );
    (assembler, sleeper)
}
