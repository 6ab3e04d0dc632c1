//! Contact info lives on an overlay page linked from the top card.

use url::Url;

use super::{Cx, Page};
use crate::model::{Diagnostics, SectionName};
use crate::resolver::element_text;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub websites: Vec<String>,
}

/// Absolute URL of the contact overlay, when the profile links one.
pub fn overlay_url(page: &Page, cx: &Cx<'_>, diagnostics: &mut Diagnostics) -> Option<String> {
    let href = cx.text(page.root(), &cx.locators.contact_link);
    if href.is_empty() {
        diagnostics.flag_shape(SectionName::Contact);
        return None;
    }
    Url::parse(page.url())
        .and_then(|base| base.join(&href))
        .map(|u| u.to_string())
        .ok()
}

pub fn parse_overlay(page: &Page, cx: &Cx<'_>) -> ContactInfo {
    let l = cx.locators;
    let root = l
        .contact_root
        .first(page.root())
        .map(|(el, _)| el)
        .unwrap_or_else(|| page.root());
    let text = element_text(root);

    let email = cx
        .all(root, &l.contact_emails)
        .into_iter()
        .map(|href| href.trim_start_matches("mailto:").trim().to_lowercase())
        .find(|e| e.contains('@'))
        .or_else(|| cx.extractor.extract_emails(&text).into_iter().next());

    let phone = Some(cx.text(root, &l.contact_phones))
        .filter(|p| !p.is_empty())
        .or_else(|| cx.extractor.extract_phones(&text).into_iter().next());

    let mut websites = Vec::new();
    for site in cx.all(root, &l.contact_websites) {
        if !websites.contains(&site) {
            websites.push(site);
        }
    }

    ContactInfo {
        email,
        phone,
        websites,
    }
}
