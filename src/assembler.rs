//! Per-target state machine:
//! `Init -> Authenticated -> Navigated -> Expanded -> Extracted -> Assembled`.
//!
//! Only session and navigation problems fail a target. A missing field or
//! section just leaves its default in the record.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::cookie_loader::CredentialSet;
use crate::delay_manager::Sleeper;
use crate::driver::{DriverFactory, Scroll};
use crate::error::{DriverError, FailureKind, TargetFailure};
use crate::extractor::Extractor;
use crate::input_loader::{normalize_profile_url, public_identifier};
use crate::locators::Locators;
use crate::model::ProfileRecord;
use crate::sections::{
    contact, extract_inline, identity, pending_expanders, refine, Certifications, Cx, Education,
    Experience, Interests, Languages, Navigator, Page, Recommendations, Skills,
};
use crate::session::{Authenticator, GateDetector, PageKind, Session, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Authenticated,
    Navigated,
    Expanded,
    Extracted,
    Assembled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySettings {
    pub navigation_timeout: Duration,
    pub lookup_timeout: Duration,
    pub scroll_steps: u32,
    pub scroll_settle: Duration,
    pub auth_wall_backoff: Duration,
    pub max_challenge_dismissals: u32,
    pub follow_detail_pages: bool,
    pub capture_dir: Option<PathBuf>,
}

impl From<&ScraperConfig> for AssemblySettings {
    fn from(config: &ScraperConfig) -> Self {
        AssemblySettings {
            navigation_timeout: config.navigation_timeout(),
            lookup_timeout: config.lookup_timeout(),
            scroll_steps: config.scroll_steps,
            scroll_settle: config.scroll_settle(),
            auth_wall_backoff: config.auth_wall_backoff(),
            max_challenge_dismissals: config.max_challenge_dismissals,
            follow_detail_pages: config.follow_detail_pages,
            capture_dir: config.capture_dir.clone(),
        }
    }
}

fn browser_failure(err: DriverError) -> TargetFailure {
    TargetFailure::from_driver(&err)
}

/// Owns the one session of a batch and turns target URLs into records.
pub struct ProfileAssembler {
    authenticator: Authenticator,
    credentials: CredentialSet,
    session: Option<Session>,
    locators: Locators,
    extractor: Extractor,
    sleeper: Arc<dyn Sleeper>,
    settings: AssemblySettings,
}

impl ProfileAssembler {
    pub fn new(
        factory: Box<dyn DriverFactory>,
        credentials: CredentialSet,
        config: &ScraperConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        ProfileAssembler {
            authenticator: Authenticator::new(factory, config),
            credentials,
            session: None,
            locators: Locators::new(),
            extractor: Extractor::new(),
            sleeper,
            settings: AssemblySettings::from(config),
        }
    }

    pub fn with_gate(mut self, gate: Box<dyn GateDetector>) -> Self {
        self.authenticator = self.authenticator.with_gate(gate);
        self
    }

    pub fn session_state(&self) -> Option<SessionState> {
        self.session.as_ref().map(Session::state)
    }

    pub fn assemble(&mut self, target: &str) -> Result<ProfileRecord, TargetFailure> {
        let url = normalize_profile_url(target).ok_or_else(|| {
            TargetFailure::new(FailureKind::InvalidTarget, format!("not a profile URL: {}", target))
        })?;

        let mut stage = Stage::Init;
        let result = self.run(&url, &mut stage);
        if let Err(failure) = &result {
            warn!("{} failed at {:?}: {}", url, stage, failure);
            if !failure.kind.is_fatal() {
                self.capture(&url);
            }
        }
        result
    }

    fn run(&mut self, url: &str, stage: &mut Stage) -> Result<ProfileRecord, TargetFailure> {
        self.open(url, stage)?;
        let page = self.expand()?;
        advance(stage, Stage::Expanded);
        let mut record = self.extract(url, &page);
        advance(stage, Stage::Extracted);
        self.finish(&mut record);
        advance(stage, Stage::Assembled);
        Ok(record)
    }

    fn ensure_session(&mut self) -> Result<(), TargetFailure> {
        if self.session.as_ref().map_or(false, Session::is_usable) {
            return Ok(());
        }
        if let Some(stale) = self.session.take() {
            info!("Replacing {:?} session", stale.state());
        }
        self.session = Some(self.authenticator.establish(&self.credentials)?);
        Ok(())
    }

    /// Navigates to `url` until it shows content, spending each recovery
    /// (re-authentication, auth-wall backoff, timeout retry) at most once
    /// and interstitial dismissals up to their bound.
    fn open(&mut self, url: &str, stage: &mut Stage) -> Result<(), TargetFailure> {
        let mut reauthenticated = false;
        let mut backed_off = false;
        let mut retried_timeout = false;
        let mut dismissals = 0;

        loop {
            self.ensure_session()?;
            advance(stage, Stage::Authenticated);
            let session = self
                .session
                .as_mut()
                .ok_or_else(|| TargetFailure::new(FailureKind::Browser, "no session"))?;

            if let Err(e) = session.driver_mut().navigate(url, self.settings.navigation_timeout) {
                if e.is_timeout() && !retried_timeout {
                    retried_timeout = true;
                    warn!("{}; retrying once", e);
                    continue;
                }
                return Err(browser_failure(e));
            }

            let (landed, kind) = self
                .authenticator
                .classify(session.driver())
                .map_err(browser_failure)?;
            match kind {
                PageKind::Content => {
                    advance(stage, Stage::Navigated);
                    return Ok(());
                }
                PageKind::Login if !reauthenticated => {
                    warn!("Session lost at {}; re-authenticating", landed);
                    reauthenticated = true;
                    session.mark(SessionState::Expired);
                    self.session = None;
                }
                PageKind::Login => {
                    session.mark(SessionState::Expired);
                    return Err(TargetFailure::new(
                        FailureKind::SessionLost,
                        format!("redirected to {} again after re-authenticating", landed),
                    ));
                }
                PageKind::AuthWall if !backed_off => {
                    warn!(
                        "Auth wall at {}; retrying in {:.1}s",
                        landed,
                        self.settings.auth_wall_backoff.as_secs_f64()
                    );
                    backed_off = true;
                    self.sleeper.sleep(self.settings.auth_wall_backoff);
                }
                PageKind::AuthWall => {
                    return Err(TargetFailure::new(
                        FailureKind::PageAuthWall,
                        format!("{} is behind an auth wall", landed),
                    ));
                }
                PageKind::Challenge => {
                    let cleared = dismissals < self.settings.max_challenge_dismissals
                        && self
                            .authenticator
                            .clear_challenge(session)
                            .map_err(browser_failure)?;
                    if !cleared {
                        session.mark(SessionState::Challenged);
                        return Err(TargetFailure::new(
                            FailureKind::SessionChallenged,
                            format!("interstitial at {} could not be dismissed", landed),
                        ));
                    }
                    dismissals += 1;
                }
            }
        }
    }

    /// Scrolls until the document stops growing, then opens truncated text
    /// inside known sections. Failures here only cost content.
    fn expand(&mut self) -> Result<Page, TargetFailure> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| TargetFailure::new(FailureKind::Browser, "no session"))?;
        let driver = session.driver_mut();

        let mut last_height = 0;
        for step in 0..self.settings.scroll_steps {
            match driver.scroll(Scroll::Bottom) {
                Ok(height) => {
                    self.sleeper.sleep(self.settings.scroll_settle);
                    if height == last_height {
                        debug!("Page stopped growing after {} scrolls", step + 1);
                        break;
                    }
                    last_height = height;
                }
                Err(e) => {
                    warn!("Scrolling failed: {}", e);
                    break;
                }
            }
        }
        if let Err(e) = driver.scroll(Scroll::Top) {
            debug!("Could not scroll back up: {}", e);
        }

        let page = Page::capture(driver).map_err(browser_failure)?;
        let l = &self.locators;
        let anchors = [
            &l.about,
            &l.experience,
            &l.education,
            &l.skills,
            &l.certifications,
            &l.languages,
            &l.recommendations,
            &l.interests,
        ];
        let pending = pending_expanders(&page, &anchors);
        if pending.is_empty() {
            return Ok(page);
        }
        for css in pending {
            match driver.click_all(css) {
                Ok(n) => debug!("Expanded {} x {}", n, css),
                Err(e) => warn!("Could not expand {}: {}", css, e),
            }
        }
        self.sleeper.sleep(self.settings.scroll_settle);
        Page::capture(driver).map_err(browser_failure)
    }

    /// Runs every extractor in a fixed order, then the detail-page passes.
    fn extract(&mut self, url: &str, page: &Page) -> ProfileRecord {
        let cx = Cx::new(&self.locators, &self.extractor, self.settings.lookup_timeout);
        let mut record = ProfileRecord {
            linkedin_url: url.to_string(),
            public_identifier: public_identifier(url).unwrap_or_default(),
            ..ProfileRecord::default()
        };

        identity::extract(page, &cx, &mut record);
        let d = &mut record.diagnostics;
        let about = identity::extract_about(page, &cx, d);
        let overlay = contact::overlay_url(page, &cx, d);
        let experiences = extract_inline(&Experience, page, &cx, d);
        let educations = extract_inline(&Education, page, &cx, d);
        let skills = extract_inline(&Skills, page, &cx, d);
        let certifications = extract_inline(&Certifications, page, &cx, d);
        let languages = extract_inline(&Languages, page, &cx, d);
        let recommendations = extract_inline(&Recommendations, page, &cx, d);
        let interests = extract_inline(&Interests, page, &cx, d);
        record.about = about;

        let driver = match self.session.as_mut() {
            Some(session) if self.settings.follow_detail_pages => session.driver_mut(),
            _ => {
                record.experiences = experiences.items;
                record.educations = educations.items;
                record.skills = skills.items;
                record.license_and_certificates = certifications.items;
                record.languages = languages.items;
                record.recommendations = recommendations.items;
                record.interests = interests.items;
                return record;
            }
        };

        let nav = Navigator {
            gate: self.authenticator.gate(),
            timeout: self.settings.navigation_timeout,
        };
        let d = &mut record.diagnostics;
        record.experiences = refine(&Experience, experiences, url, driver, &nav, &cx, d);
        record.educations = refine(&Education, educations, url, driver, &nav, &cx, d);
        record.skills = refine(&Skills, skills, url, driver, &nav, &cx, d);
        record.license_and_certificates = refine(&Certifications, certifications, url, driver, &nav, &cx, d);
        record.languages = refine(&Languages, languages, url, driver, &nav, &cx, d);
        record.recommendations = refine(&Recommendations, recommendations, url, driver, &nav, &cx, d);
        record.interests = refine(&Interests, interests, url, driver, &nav, &cx, d);

        if let Some(overlay) = overlay {
            if let Some(overlay_page) = nav.open(driver, &overlay) {
                let info = contact::parse_overlay(&overlay_page, &cx);
                record.email = info.email;
                record.mobile_number = info.phone;
                record.websites = info.websites;
            }
        }
        record
    }

    /// Fields derived from the extracted sections.
    fn finish(&self, record: &mut ProfileRecord) {
        if let Some(current) = record.experiences.first() {
            record.job_title = current.title.clone();
            record.company_name = current.company.clone();
            record.company_linkedin = current.company_link.clone();
            record.current_job_duration = current.duration.clone();
            record.current_job_duration_in_yrs = current.duration_in_yrs;
        }
        record.top_skills_by_endorsements = crate::sections::skills::top_by_endorsements(&record.skills);
        info!(
            "Assembled {} ({} experiences, {} educations, {} skills)",
            record.full_name,
            record.experiences.len(),
            record.educations.len(),
            record.skills.len()
        );
    }

    /// Saves the current page for a failed target when a capture directory
    /// is configured.
    fn capture(&self, url: &str) {
        let (Some(dir), Some(session)) = (&self.settings.capture_dir, &self.session) else {
            return;
        };
        if let Err(e) = fs::create_dir_all(dir) {
            warn!("Could not create capture directory {:?}: {}", dir, e);
            return;
        }
        let stem = format!(
            "{}_{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            public_identifier(url).unwrap_or_else(|| "target".to_string())
        );

        let driver = session.driver();
        match driver.content() {
            Ok(html) => {
                let path = dir.join(format!("{}.html", stem));
                match fs::write(&path, html) {
                    Ok(()) => info!("Saved page capture to {:?}", path),
                    Err(e) => warn!("Could not write {:?}: {}", path, e),
                }
            }
            Err(e) => warn!("Could not read page for capture: {}", e),
        }
        match driver.capture_png() {
            Ok(png) => {
                let path = dir.join(format!("{}.png", stem));
                if let Err(e) = fs::write(&path, png) {
                    warn!("Could not write {:?}: {}", path, e);
                }
            }
            Err(DriverError::Unsupported(_)) => {}
            Err(e) => warn!("Screenshot failed: {}", e),
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    if *stage != next {
        debug!("{:?} -> {:?}", stage, next);
        *stage = next;
    }
}
