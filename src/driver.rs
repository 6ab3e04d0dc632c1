//! Seam to the browser runtime.
//!
//! The pipeline only ever talks to a [`Driver`]: a single browsing context that
//! can load a URL, report where it ended up and hand back the rendered markup.
//! All extraction happens on that markup, so the runtime stays swappable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;
use scraper::{Html, Selector};

use crate::cookie_loader::Cookie;
use crate::error::DriverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    Top,
    Bottom,
    To(u32),
}

pub trait Driver {
    fn set_cookies(&mut self, cookies: &[Cookie]) -> Result<(), DriverError>;

    /// Loads `url` and waits (at most `timeout`) for the navigation to settle.
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    fn current_url(&self) -> Result<String, DriverError>;

    /// Rendered markup of the current page.
    fn content(&self) -> Result<String, DriverError>;

    /// Scrolls and returns the document height afterwards.
    fn scroll(&mut self, to: Scroll) -> Result<u64, DriverError>;

    /// Waits up to `timeout` for `css` and clicks the first match.
    /// `Ok(false)` when nothing matched in time.
    fn click(&mut self, css: &str, timeout: Duration) -> Result<bool, DriverError>;

    /// Clicks every current match of `css`; returns how many were clicked.
    fn click_all(&mut self, css: &str) -> Result<usize, DriverError>;

    fn capture_png(&self) -> Result<Vec<u8>, DriverError> {
        Err(DriverError::Unsupported("screenshot capture"))
    }
}

/// Creates fresh, cookie-less browsing contexts.
pub trait DriverFactory {
    fn launch(&self) -> Result<Box<dyn Driver>, DriverError>;
}

const BLANK_PAGE: &str = "<html><head></head><body></body></html>";
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Page(String),
    Redirect(String),
    Timeout,
}

/// What a [`ReplaySite`] observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayLog {
    pub launches: usize,
    pub navigations: Vec<String>,
    pub cookies_injected: usize,
    pub clicks: Vec<String>,
}

#[derive(Default)]
struct SiteState {
    routes: HashMap<String, Route>,
    click_effects: HashMap<String, Vec<(String, Route)>>,
    log: ReplayLog,
}

/// An offline site made of pre-captured pages, shared by every
/// [`ReplayDriver`] it launches. Routes can be rewritten by clicks, which is
/// enough to script interstitials and gated pages.
#[derive(Clone, Default)]
pub struct ReplaySite {
    state: Arc<Mutex<SiteState>>,
}

fn route_key(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.trim_end_matches('/').to_string()
}

impl ReplaySite {
    pub fn new() -> Self {
        ReplaySite::default()
    }

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn page(&self, url: &str, html: impl Into<String>) -> &Self {
        self.lock().routes.insert(route_key(url), Route::Page(html.into()));
        self
    }

    pub fn redirect(&self, from: &str, to: &str) -> &Self {
        self.lock().routes.insert(route_key(from), Route::Redirect(to.to_string()));
        self
    }

    pub fn timeout(&self, url: &str) -> &Self {
        self.lock().routes.insert(route_key(url), Route::Timeout);
        self
    }

    /// Clicking an element matching `css` replaces the route for `url`.
    pub fn on_click(&self, css: &str, url: &str, route: Route) -> &Self {
        self.lock()
            .click_effects
            .entry(css.to_string())
            .or_default()
            .push((route_key(url), route));
        self
    }

    pub fn log(&self) -> ReplayLog {
        self.lock().log.clone()
    }

    pub fn factory(&self) -> ReplayFactory {
        ReplayFactory { site: self.clone() }
    }

    fn resolve(&self, url: &str, timeout: Duration) -> Result<(String, String), DriverError> {
        let mut state = self.lock();
        state.log.navigations.push(url.to_string());

        let mut current = url.to_string();
        for _ in 0..MAX_REDIRECTS {
            match state.routes.get(&route_key(&current)) {
                Some(Route::Page(html)) => return Ok((current, html.clone())),
                Some(Route::Redirect(to)) => current = to.clone(),
                Some(Route::Timeout) => return Err(DriverError::Timeout(timeout, current)),
                None => return Ok((current, BLANK_PAGE.to_string())),
            }
        }
        Err(DriverError::Browser(format!("redirect loop at {}", url)))
    }

    fn apply_click(&self, css: &str) {
        let mut state = self.lock();
        state.log.clicks.push(css.to_string());
        if let Some(effects) = state.click_effects.get(css).cloned() {
            for (url, route) in effects {
                state.routes.insert(url, route);
            }
        }
    }
}

pub struct ReplayFactory {
    site: ReplaySite,
}

impl DriverFactory for ReplayFactory {
    fn launch(&self) -> Result<Box<dyn Driver>, DriverError> {
        self.site.lock().log.launches += 1;
        Ok(Box::new(ReplayDriver {
            site: self.site.clone(),
            current: "about:blank".to_string(),
            html: BLANK_PAGE.to_string(),
        }))
    }
}

pub struct ReplayDriver {
    site: ReplaySite,
    current: String,
    html: String,
}

impl ReplayDriver {
    fn count_matches(&self, css: &str) -> usize {
        match Selector::parse(css) {
            Ok(selector) => Html::parse_document(&self.html).select(&selector).count(),
            Err(_) => 0,
        }
    }
}

impl Driver for ReplayDriver {
    fn set_cookies(&mut self, cookies: &[Cookie]) -> Result<(), DriverError> {
        self.site.lock().log.cookies_injected += cookies.len();
        Ok(())
    }

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        let (landed, html) = self.site.resolve(url, timeout)?;
        debug!("replay: {} -> {}", url, landed);
        self.current = landed;
        self.html = html;
        Ok(())
    }

    fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.current.clone())
    }

    fn content(&self) -> Result<String, DriverError> {
        Ok(self.html.clone())
    }

    fn scroll(&mut self, _to: Scroll) -> Result<u64, DriverError> {
        Ok(self.html.len() as u64)
    }

    fn click(&mut self, css: &str, _timeout: Duration) -> Result<bool, DriverError> {
        if self.count_matches(css) == 0 {
            return Ok(false);
        }
        self.site.apply_click(css);
        Ok(true)
    }

    fn click_all(&mut self, css: &str) -> Result<usize, DriverError> {
        let count = self.count_matches(css);
        if count > 0 {
            self.site.apply_click(css);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_secs(1);

    #[test]
    fn follows_redirects_and_logs_navigations() {
        let site = ReplaySite::new();
        site.redirect("https://x.test/feed/", "https://x.test/login")
            .page("https://x.test/login", "<form id=login></form>");

        let mut driver = site.factory().launch().unwrap();
        driver.navigate("https://x.test/feed", T).unwrap();
        assert_eq!(driver.current_url().unwrap(), "https://x.test/login");
        assert!(driver.content().unwrap().contains("login"));

        let log = site.log();
        assert_eq!(log.launches, 1);
        assert_eq!(log.navigations, vec!["https://x.test/feed".to_string()]);
    }

    #[test]
    fn scripted_timeouts_and_click_effects() {
        let site = ReplaySite::new();
        site.timeout("https://x.test/slow")
            .page("https://x.test/gate", "<button class=go>Continue</button>")
            .redirect("https://x.test/home", "https://x.test/gate")
            .on_click("button.go", "https://x.test/home", Route::Page("<h1>home</h1>".into()));

        let mut driver = site.factory().launch().unwrap();
        assert!(driver.navigate("https://x.test/slow", T).unwrap_err().is_timeout());

        driver.navigate("https://x.test/home", T).unwrap();
        assert!(!driver.click("button.missing", T).unwrap());
        assert!(driver.click("button.go", T).unwrap());
        driver.navigate("https://x.test/home", T).unwrap();
        assert_eq!(driver.current_url().unwrap(), "https://x.test/home");
        assert_eq!(site.log().clicks, vec!["button.go".to_string()]);
    }

    #[test]
    fn unknown_urls_serve_a_blank_page() {
        let site = ReplaySite::new();
        let mut driver = site.factory().launch().unwrap();
        driver.navigate("https://x.test/nothing", T).unwrap();
        assert_eq!(driver.content().unwrap(), BLANK_PAGE);
        assert_eq!(driver.click_all("button").unwrap(), 0);
    }
}
