//! [`Driver`] over a real Chrome instance.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::protocol::cdp::Network::CookieParam;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use log::{debug, info};
use serde_json::json;

use crate::config::ScraperConfig;
use crate::cookie_loader::Cookie;
use crate::driver::{Driver, DriverFactory, Scroll};
use crate::error::DriverError;

const WINDOW: (u32, u32) = (1366, 900);

fn browser_err(e: impl Display) -> DriverError {
    DriverError::Browser(e.to_string())
}

fn is_timeout_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("timeout") || lower.contains("timed out") || lower.contains("never came")
}

pub struct ChromeFactory {
    headless: bool,
    proxy_server: Option<String>,
    default_timeout: Duration,
}

impl ChromeFactory {
    pub fn new(config: &ScraperConfig) -> Self {
        ChromeFactory {
            headless: config.headless,
            proxy_server: config.proxy_server.clone(),
            default_timeout: config.navigation_timeout(),
        }
    }
}

impl DriverFactory for ChromeFactory {
    fn launch(&self) -> Result<Box<dyn Driver>, DriverError> {
        let options = LaunchOptions::default_builder()
            .headless(self.headless)
            .window_size(Some(WINDOW))
            .proxy_server(self.proxy_server.as_deref())
            .build()
            .map_err(browser_err)?;
        let browser = Browser::new(options).map_err(browser_err)?;
        let tab = browser.new_tab().map_err(browser_err)?;
        tab.set_default_timeout(self.default_timeout);
        info!(
            "Launched Chrome ({})",
            if self.headless { "headless" } else { "visible" }
        );
        Ok(Box::new(ChromeDriver {
            _browser: browser,
            tab,
        }))
    }
}

pub struct ChromeDriver {
    // Dropping the browser closes the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    fn eval(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        let remote = self.tab.evaluate(script, false).map_err(browser_err)?;
        Ok(remote.value.unwrap_or(serde_json::Value::Null))
    }
}

fn cookie_param(cookie: &Cookie) -> Result<CookieParam, DriverError> {
    let mut value = json!({
        "name": cookie.name,
        "value": cookie.value,
        "domain": cookie.domain,
        "path": cookie.path,
        "secure": cookie.secure,
        "httpOnly": cookie.http_only,
    });
    if let Some(same_site) = cookie.same_site {
        value["sameSite"] = json!(same_site.as_str());
    }
    if let Some(expires) = cookie.expires {
        value["expires"] = json!(expires);
    }
    serde_json::from_value(value).map_err(browser_err)
}

impl Driver for ChromeDriver {
    fn set_cookies(&mut self, cookies: &[Cookie]) -> Result<(), DriverError> {
        let params = cookies.iter().map(cookie_param).collect::<Result<Vec<_>, _>>()?;
        self.tab.set_cookies(params).map_err(browser_err)
    }

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        self.tab.set_default_timeout(timeout);
        let loaded = self
            .tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ());
        loaded.map_err(|e| {
            let message = e.to_string();
            if is_timeout_message(&message) {
                DriverError::Timeout(timeout, url.to_string())
            } else {
                DriverError::Browser(message)
            }
        })
    }

    fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.tab.get_url())
    }

    fn content(&self) -> Result<String, DriverError> {
        self.tab.get_content().map_err(browser_err)
    }

    fn scroll(&mut self, to: Scroll) -> Result<u64, DriverError> {
        let target = match to {
            Scroll::Top => "0".to_string(),
            Scroll::Bottom => "document.body.scrollHeight".to_string(),
            Scroll::To(y) => y.to_string(),
        };
        let script = format!(
            "window.scrollTo(0, {}); document.body.scrollHeight",
            target
        );
        Ok(self.eval(&script)?.as_u64().unwrap_or(0))
    }

    fn click(&mut self, css: &str, timeout: Duration) -> Result<bool, DriverError> {
        let element = match self.tab.wait_for_element_with_custom_timeout(css, timeout) {
            Ok(element) => element,
            Err(e) => {
                debug!("{} not clickable: {}", css, e);
                return Ok(false);
            }
        };
        element.click().map_err(browser_err)?;
        Ok(true)
    }

    fn click_all(&mut self, css: &str) -> Result<usize, DriverError> {
        let selector = serde_json::to_string(css).map_err(browser_err)?;
        let script = format!(
            "(() => {{ const els = document.querySelectorAll({}); els.forEach(e => e.click()); return els.length; }})()",
            selector
        );
        Ok(self.eval(&script)?.as_u64().unwrap_or(0) as usize)
    }

    fn capture_png(&self) -> Result<Vec<u8>, DriverError> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(browser_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_timeout_messages() {
        assert!(is_timeout_message("The event waited for never came"));
        assert!(is_timeout_message("Navigate timed out"));
        assert!(!is_timeout_message("net::ERR_NAME_NOT_RESOLVED"));
    }

    #[test]
    fn cookies_convert_to_protocol_params() {
        let cookie = Cookie {
            name: "li_at".into(),
            value: "token".into(),
            domain: ".linkedin.com".into(),
            path: "/".into(),
            secure: true,
            http_only: true,
            same_site: Some(crate::cookie_loader::SameSite::Lax),
            expires: Some(1767225600.0),
        };
        let param = cookie_param(&cookie).unwrap();
        assert_eq!(param.name, "li_at");
        assert_eq!(param.domain.as_deref(), Some(".linkedin.com"));
        assert_eq!(param.http_only, Some(true));
    }
}
