use scraper::ElementRef;

use super::{Cx, DetailPage, ListSection, Origin};
use crate::extractor::clean_url;
use crate::locators::Locators;
use crate::model::{Interest, SectionName};
use crate::resolver::ElementLocator;

pub struct Interests;

const DETAIL: &[DetailPage] = &[
    DetailPage {
        path: "interests/companies/",
        label: "companies",
    },
    DetailPage {
        path: "interests/groups/",
        label: "groups",
    },
    DetailPage {
        path: "interests/schools/",
        label: "schools",
    },
];

/// The profile page mixes categories in one list; the link tells them apart.
fn category_from_link(link: &str) -> &'static str {
    if link.contains("/company/") {
        "companies"
    } else if link.contains("/school/") {
        "schools"
    } else if link.contains("/groups/") {
        "groups"
    } else if link.contains("/in/") {
        "people"
    } else if link.contains("/newsletters/") {
        "newsletters"
    } else {
        ""
    }
}

impl ListSection for Interests {
    type Item = Interest;

    fn name(&self) -> SectionName {
        SectionName::Interests
    }

    fn anchor<'l>(&self, locators: &'l Locators) -> &'l ElementLocator {
        &locators.interests
    }

    fn detail_pages(&self) -> &'static [DetailPage] {
        DETAIL
    }

    fn preview_only(&self) -> bool {
        true
    }

    fn parse_item(&self, item: ElementRef<'_>, cx: &Cx<'_>, origin: Origin) -> Vec<Interest> {
        let l = cx.locators;
        let name = cx.text(item, &l.title);
        if name.is_empty() {
            return Vec::new();
        }
        let link = clean_url(&cx.text(item, &l.any_link));
        let category = match origin {
            Origin::Detail(page) => page.label,
            Origin::Inline => category_from_link(&link),
        };
        vec![Interest {
            category: category.to_string(),
            name,
            subtitle: cx.text(item, &l.subtitle),
            caption: cx.text(item, &l.light),
            link,
        }]
    }

    fn covered_by(&self, item: &Interest, page: &DetailPage) -> bool {
        item.category == page.label
    }
}
