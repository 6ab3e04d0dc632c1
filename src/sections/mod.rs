//! Per-section extraction.
//!
//! Every list section follows the same shape: find the section anchor (a
//! miss is flagged as an unexpected page shape and yields the empty list),
//! enumerate its top-level items, and parse each item with field
//! resolution. Sections that carry a "show all" link can later be
//! re-extracted from their dedicated detail pages.

use std::time::Duration;

use log::{debug, warn};
use scraper::{ElementRef, Html};

use crate::driver::Driver;
use crate::error::DriverError;
use crate::extractor::Extractor;
use crate::locators::{Locators, EXPANDERS};
use crate::model::{Diagnostics, SectionName};
use crate::resolver::{css, resolve, resolve_all, ElementLocator, LocatorSpec};
use crate::session::{GateDetector, PageKind};

pub mod accomplishments;
pub mod contact;
pub mod education;
pub mod experience;
pub mod identity;
pub mod interests;
pub mod recommendations;
pub mod skills;

pub use accomplishments::{Certifications, Languages};
pub use education::Education;
pub use experience::Experience;
pub use interests::Interests;
pub use recommendations::Recommendations;
pub use skills::Skills;

/// A parsed snapshot of the page the driver is showing.
pub struct Page {
    url: String,
    html: Html,
}

impl Page {
    pub fn capture(driver: &dyn Driver) -> Result<Page, DriverError> {
        Ok(Page::parse(&driver.current_url()?, &driver.content()?))
    }

    pub fn parse(url: &str, markup: &str) -> Page {
        Page {
            url: url.to_string(),
            html: Html::parse_document(markup),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

/// Read-only state shared by every extractor of one run.
pub struct Cx<'a> {
    pub locators: &'a Locators,
    pub extractor: &'a Extractor,
    pub budget: Duration,
}

impl<'a> Cx<'a> {
    pub fn new(locators: &'a Locators, extractor: &'a Extractor, budget: Duration) -> Self {
        Cx {
            locators,
            extractor,
            budget,
        }
    }

    /// Resolved value or the empty default.
    pub fn text(&self, scope: ElementRef<'_>, spec: &LocatorSpec) -> String {
        let value = resolve(scope, spec, self.budget).into_value();
        if value.is_none() {
            debug!("{} unresolved", spec.field());
        }
        value.unwrap_or_default()
    }

    pub fn all(&self, scope: ElementRef<'_>, spec: &LocatorSpec) -> Vec<String> {
        resolve_all(scope, spec, self.budget)
    }
}

/// A dedicated page listing every entry of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailPage {
    /// Appended to `<profile>/details/`.
    pub path: &'static str,
    /// Tag carried into entries that come from this page.
    pub label: &'static str,
}

/// Where an item was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Inline,
    Detail(DetailPage),
}

pub trait ListSection {
    type Item;

    fn name(&self) -> SectionName;

    fn anchor<'l>(&self, locators: &'l Locators) -> &'l ElementLocator;

    fn detail_pages(&self) -> &'static [DetailPage] {
        &[]
    }

    /// Sections whose profile-page list is only ever a preview, so the
    /// detail pages are worth visiting even without a "show all" link.
    fn preview_only(&self) -> bool {
        false
    }

    /// One item usually yields one entry; grouped layouts yield several.
    fn parse_item(&self, item: ElementRef<'_>, cx: &Cx<'_>, origin: Origin) -> Vec<Self::Item>;

    /// Whether `page`, once it delivered entries, supersedes the inline
    /// `item`. Sections split over several pages narrow this to the page
    /// the item belongs to.
    fn covered_by(&self, _item: &Self::Item, _page: &DetailPage) -> bool {
        true
    }
}

/// Result of extracting a list section from the profile page.
#[derive(Debug, Clone, PartialEq)]
pub struct Inline<T> {
    pub items: Vec<T>,
    pub anchored: bool,
    pub has_more: bool,
}

fn parse_items<S: ListSection>(section: &S, scope: ElementRef<'_>, cx: &Cx<'_>, origin: Origin) -> Vec<S::Item> {
    cx.locators
        .list_items
        .all(scope)
        .into_iter()
        .flat_map(|item| section.parse_item(item, cx, origin))
        .collect()
}

/// Extracts `section` from the profile page, flagging a missing anchor.
pub fn extract_inline<S: ListSection>(
    section: &S,
    page: &Page,
    cx: &Cx<'_>,
    diagnostics: &mut Diagnostics,
) -> Inline<S::Item> {
    let Some((anchor, strategy)) = section.anchor(cx.locators).first(page.root()) else {
        warn!("{}: no anchor matched on {}", section.name(), page.url());
        diagnostics.flag_shape(section.name());
        return Inline {
            items: Vec::new(),
            anchored: false,
            has_more: false,
        };
    };
    debug!("{}: anchored by strategy #{}", section.name(), strategy);

    let items = parse_items(section, anchor, cx, Origin::Inline);
    let has_more = resolve(anchor, &cx.locators.show_all, cx.budget).is_found();
    debug!("{}: {} inline entries (more: {})", section.name(), items.len(), has_more);
    Inline {
        items,
        anchored: true,
        has_more,
    }
}

/// Expander controls present inside any of `anchors` on `page`.
pub fn pending_expanders(page: &Page, anchors: &[&ElementLocator]) -> Vec<&'static str> {
    let mut pending = Vec::new();
    for anchor in anchors {
        let Some((section, _)) = anchor.first(page.root()) else {
            continue;
        };
        for expander in EXPANDERS {
            if !pending.contains(expander) && section.select(&css(expander)).next().is_some() {
                pending.push(*expander);
            }
        }
    }
    pending
}

/// Navigation settings for detail-page passes.
pub struct Navigator<'a> {
    pub gate: &'a dyn GateDetector,
    pub timeout: Duration,
}

impl Navigator<'_> {
    /// Loads `url` and snapshots it; `None` when the page failed or is gated.
    pub fn open(&self, driver: &mut dyn Driver, url: &str) -> Option<Page> {
        let loaded = driver
            .navigate(url, self.timeout)
            .and_then(|_| Ok((driver.current_url()?, driver.content()?)));
        let (landed, markup) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Could not open {}: {}", url, e);
                return None;
            }
        };
        match self.gate.classify(&landed, &markup) {
            PageKind::Content => Some(Page::parse(&landed, &markup)),
            kind => {
                warn!("{} is gated ({:?}); keeping inline data", url, kind);
                None
            }
        }
    }
}

/// Entries gathered from the detail pages that loaded and delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Detailed<T> {
    pub items: Vec<T>,
    pub delivered: Vec<DetailPage>,
}

/// Re-extracts `section` from its detail pages. Pages that fail, are gated
/// or come back empty are skipped; `None` when none of them delivered.
pub fn extract_details<S: ListSection>(
    section: &S,
    profile_url: &str,
    driver: &mut dyn Driver,
    nav: &Navigator<'_>,
    cx: &Cx<'_>,
) -> Option<Detailed<S::Item>> {
    let mut items = Vec::new();
    let mut delivered = Vec::new();
    for detail in section.detail_pages() {
        let url = format!("{}/details/{}", profile_url.trim_end_matches('/'), detail.path);
        let Some(page) = nav.open(driver, &url) else {
            continue;
        };
        let root = cx
            .locators
            .detail_root
            .first(page.root())
            .map(|(el, _)| el)
            .unwrap_or_else(|| page.root());
        let found = parse_items(section, root, cx, Origin::Detail(*detail));
        if found.is_empty() {
            debug!("{}: {} yielded nothing", section.name(), url);
            continue;
        }
        items.extend(found);
        delivered.push(*detail);
    }
    if delivered.is_empty() {
        None
    } else {
        Some(Detailed { items, delivered })
    }
}

/// Detail entries followed by the inline entries no delivered page covers.
fn merge<S: ListSection>(section: &S, inline: Vec<S::Item>, detailed: Detailed<S::Item>) -> Vec<S::Item> {
    let Detailed { mut items, delivered } = detailed;
    items.extend(
        inline
            .into_iter()
            .filter(|item| !delivered.iter().any(|page| section.covered_by(item, page))),
    );
    items
}

/// Swaps the inline list for the detail-page list when the section has
/// more to show and the detail pages deliver.
pub fn refine<S: ListSection>(
    section: &S,
    inline: Inline<S::Item>,
    profile_url: &str,
    driver: &mut dyn Driver,
    nav: &Navigator<'_>,
    cx: &Cx<'_>,
    diagnostics: &mut Diagnostics,
) -> Vec<S::Item> {
    let wanted = inline.has_more || (inline.anchored && section.preview_only());
    if !wanted {
        return inline.items;
    }
    match extract_details(section, profile_url, driver, nav, cx) {
        Some(detailed) => {
            diagnostics.detail_pages.push(section.name());
            merge(section, inline.items, detailed)
        }
        None => inline.items,
    }
}
