//! Cookie-based session setup and page classification.

use std::time::Duration;

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use url::Url;

use crate::config::{GateRules, ScraperConfig};
use crate::cookie_loader::CredentialSet;
use crate::driver::{Driver, DriverFactory};
use crate::error::{DriverError, FailureKind, TargetFailure};

/// What a loaded page turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Content,
    /// Sign-in or verification form: the session is not (or no longer) valid.
    Login,
    /// Interstitial (consent, security check) that can sometimes be dismissed.
    Challenge,
    /// The session is fine but this particular page is gated.
    AuthWall,
}

/// Decides what kind of page the browser landed on.
pub trait GateDetector {
    fn classify(&self, url: &str, html: &str) -> PageKind;
}

/// Path-prefix matching on the landed URL plus substring matching on the
/// page markup.
pub struct PatternGate {
    rules: GateRules,
}

impl PatternGate {
    pub fn new(rules: GateRules) -> Self {
        PatternGate { rules }
    }
}

fn any_in(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| !n.is_empty() && haystack.contains(n.as_str()))
}

// A profile slug such as `/in/login-expert` must not look like `/login`.
fn path_starts_with(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| !p.is_empty() && path.starts_with(p.as_str()))
}

impl GateDetector for PatternGate {
    fn classify(&self, url: &str, html: &str) -> PageKind {
        let r = &self.rules;
        let parsed = Url::parse(url).ok();
        let path = parsed.as_ref().map(Url::path).unwrap_or("");
        if path_starts_with(path, &r.login_url) || any_in(html, &r.login_content) {
            PageKind::Login
        } else if path_starts_with(path, &r.challenge_url) || any_in(html, &r.challenge_content) {
            PageKind::Challenge
        } else if path_starts_with(path, &r.auth_wall_url) || any_in(html, &r.auth_wall_content) {
            PageKind::AuthWall
        } else {
            PageKind::Content
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Expired,
    Challenged,
}

/// A single browsing context carrying the injected credentials.
pub struct Session {
    driver: Box<dyn Driver>,
    state: SessionState,
    established_at: DateTime<Local>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("established_at", &self.established_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    fn new(driver: Box<dyn Driver>) -> Self {
        Session {
            driver,
            state: SessionState::Unauthenticated,
            established_at: Local::now(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_usable(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn mark(&mut self, state: SessionState) {
        if self.state != state {
            debug!("session {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn established_at(&self) -> DateTime<Local> {
        self.established_at
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn driver_mut(&mut self) -> &mut dyn Driver {
        self.driver.as_mut()
    }
}

/// A session stuck on an interstitial, kept so the caller can try to
/// dismiss it.
pub struct Challenge {
    session: Session,
    pub url: String,
}

pub enum SessionOutcome {
    Authenticated(Session),
    Challenged(Challenge),
    Invalid(String),
}

/// Turns a credential set into a live [`Session`].
pub struct Authenticator {
    factory: Box<dyn DriverFactory>,
    gate: Box<dyn GateDetector>,
    landing_url: String,
    auth_cookie: String,
    navigation_timeout: Duration,
    click_timeout: Duration,
    dismiss_selectors: Vec<String>,
    max_dismissals: u32,
}

impl Authenticator {
    pub fn new(factory: Box<dyn DriverFactory>, config: &ScraperConfig) -> Self {
        Authenticator {
            factory,
            gate: Box::new(PatternGate::new(config.gate.clone())),
            landing_url: config.landing_url.clone(),
            auth_cookie: config.auth_cookie.clone(),
            navigation_timeout: config.navigation_timeout(),
            click_timeout: config.lookup_timeout(),
            dismiss_selectors: config.challenge_dismiss_selectors.clone(),
            max_dismissals: config.max_challenge_dismissals,
        }
    }

    pub fn with_gate(mut self, gate: Box<dyn GateDetector>) -> Self {
        self.gate = gate;
        self
    }

    pub fn max_dismissals(&self) -> u32 {
        self.max_dismissals
    }

    pub fn gate(&self) -> &dyn GateDetector {
        self.gate.as_ref()
    }

    pub fn classify(&self, driver: &dyn Driver) -> Result<(String, PageKind), DriverError> {
        let url = driver.current_url()?;
        let html = driver.content()?;
        let kind = self.gate.classify(&url, &html);
        debug!("{} classified as {:?}", url, kind);
        Ok((url, kind))
    }

    /// Injects `credentials` into a fresh context and checks where the
    /// landing page ends up. A set without the auth token is rejected before
    /// any browser is launched.
    pub fn authenticate(&self, credentials: &CredentialSet) -> Result<SessionOutcome, DriverError> {
        if credentials.auth_token(&self.auth_cookie).is_none() {
            return Ok(SessionOutcome::Invalid(format!(
                "credential set has no `{}` cookie",
                self.auth_cookie
            )));
        }

        let mut session = Session::new(self.factory.launch()?);
        session.driver_mut().set_cookies(&credentials.for_injection())?;
        session
            .driver_mut()
            .navigate(&self.landing_url, self.navigation_timeout)?;
        self.check_landing(session)
    }

    /// Clicks the first dismiss control that is present and re-checks the
    /// landing page.
    pub fn dismiss(&self, challenge: Challenge) -> Result<SessionOutcome, DriverError> {
        let mut session = challenge.session;
        self.clear_challenge(&mut session)?;
        session
            .driver_mut()
            .navigate(&self.landing_url, self.navigation_timeout)?;
        self.check_landing(session)
    }

    /// Tries each dismiss control in turn on the current page. `Ok(true)` when
    /// one was clicked.
    pub fn clear_challenge(&self, session: &mut Session) -> Result<bool, DriverError> {
        for css in &self.dismiss_selectors {
            if session.driver_mut().click(css, self.click_timeout)? {
                info!("Clicked interstitial control {}", css);
                return Ok(true);
            }
        }
        warn!("No known control to dismiss the interstitial");
        Ok(false)
    }

    fn check_landing(&self, mut session: Session) -> Result<SessionOutcome, DriverError> {
        let (url, kind) = self.classify(session.driver())?;
        Ok(match kind {
            PageKind::Content => {
                session.mark(SessionState::Authenticated);
                SessionOutcome::Authenticated(session)
            }
            PageKind::Challenge => {
                session.mark(SessionState::Challenged);
                SessionOutcome::Challenged(Challenge { session, url })
            }
            PageKind::Login | PageKind::AuthWall => {
                SessionOutcome::Invalid(format!("landing page redirected to {}", url))
            }
        })
    }

    /// Authenticates and works through a bounded number of interstitial
    /// dismissals.
    pub fn establish(&self, credentials: &CredentialSet) -> Result<Session, TargetFailure> {
        let setup_failure = |e: DriverError| TargetFailure::from_driver(&e);
        let mut outcome = self.authenticate(credentials).map_err(setup_failure)?;
        let mut dismissals = 0;
        loop {
            outcome = match outcome {
                SessionOutcome::Authenticated(session) => {
                    info!("Session authenticated");
                    return Ok(session);
                }
                SessionOutcome::Invalid(reason) => {
                    return Err(TargetFailure::new(FailureKind::CredentialInvalid, reason));
                }
                SessionOutcome::Challenged(challenge) if dismissals < self.max_dismissals => {
                    dismissals += 1;
                    warn!(
                        "Session challenged at {} (dismissal {}/{})",
                        challenge.url, dismissals, self.max_dismissals
                    );
                    self.dismiss(challenge).map_err(setup_failure)?
                }
                SessionOutcome::Challenged(challenge) => {
                    return Err(TargetFailure::new(
                        FailureKind::SessionChallenged,
                        format!("still on interstitial {} after {} dismissals", challenge.url, dismissals),
                    ));
                }
            };
        }
    }
}
