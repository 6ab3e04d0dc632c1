//! Licenses & certifications, and languages.

use scraper::ElementRef;

use super::{Cx, DetailPage, ListSection, Origin};
use crate::extractor::clean_url;
use crate::locators::Locators;
use crate::model::{CertificationEntry, LanguageEntry, SectionName};
use crate::resolver::ElementLocator;

pub struct Certifications;

const CERT_DETAIL: &[DetailPage] = &[DetailPage {
    path: "certifications/",
    label: "certifications",
}];

impl ListSection for Certifications {
    type Item = CertificationEntry;

    fn name(&self) -> SectionName {
        SectionName::Certifications
    }

    fn anchor<'l>(&self, locators: &'l Locators) -> &'l ElementLocator {
        &locators.certifications
    }

    fn detail_pages(&self) -> &'static [DetailPage] {
        CERT_DETAIL
    }

    fn parse_item(&self, item: ElementRef<'_>, cx: &Cx<'_>, _origin: Origin) -> Vec<CertificationEntry> {
        let l = cx.locators;
        let name = cx.text(item, &l.title);
        if name.is_empty() {
            return Vec::new();
        }
        let issuer_link = clean_url(&cx.text(item, &l.company_link));
        let credential = cx.text(item, &l.credential);
        let credential_id = credential
            .split_once(':')
            .map(|(_, id)| id.trim().to_string())
            .unwrap_or_else(|| credential.trim_start_matches("Credential ID").trim().to_string());

        vec![CertificationEntry {
            name,
            issuer: cx.text(item, &l.subtitle),
            issuer_id: cx.extractor.entity_id(&issuer_link),
            issuer_link,
            issued: cx.text(item, &l.dates),
            credential_id,
            logo: cx.text(item, &l.logo),
        }]
    }
}

pub struct Languages;

const LANG_DETAIL: &[DetailPage] = &[DetailPage {
    path: "languages/",
    label: "languages",
}];

impl ListSection for Languages {
    type Item = LanguageEntry;

    fn name(&self) -> SectionName {
        SectionName::Languages
    }

    fn anchor<'l>(&self, locators: &'l Locators) -> &'l ElementLocator {
        &locators.languages
    }

    fn detail_pages(&self) -> &'static [DetailPage] {
        LANG_DETAIL
    }

    fn parse_item(&self, item: ElementRef<'_>, cx: &Cx<'_>, _origin: Origin) -> Vec<LanguageEntry> {
        let name = cx.text(item, &cx.locators.title);
        if name.is_empty() {
            return Vec::new();
        }
        vec![LanguageEntry {
            name,
            proficiency: cx.text(item, &cx.locators.light),
        }]
    }
}
