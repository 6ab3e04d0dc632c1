use scraper::ElementRef;

use super::{Cx, DetailPage, ListSection, Origin};
use crate::extractor::clean_url;
use crate::locators::Locators;
use crate::model::{Recommendation, SectionName};
use crate::resolver::ElementLocator;

pub struct Recommendations;

const DETAIL: &[DetailPage] = &[
    DetailPage {
        path: "recommendations/?detailScreenTabIndex=0",
        label: "received",
    },
    DetailPage {
        path: "recommendations/?detailScreenTabIndex=1",
        label: "given",
    },
];

impl ListSection for Recommendations {
    type Item = Recommendation;

    fn name(&self) -> SectionName {
        SectionName::Recommendations
    }

    fn anchor<'l>(&self, locators: &'l Locators) -> &'l ElementLocator {
        &locators.recommendations
    }

    fn detail_pages(&self) -> &'static [DetailPage] {
        DETAIL
    }

    fn preview_only(&self) -> bool {
        true
    }

    fn parse_item(&self, item: ElementRef<'_>, cx: &Cx<'_>, origin: Origin) -> Vec<Recommendation> {
        let l = cx.locators;
        let author = cx.text(item, &l.title);
        let text = cx.text(item, &l.description);
        if author.is_empty() && text.is_empty() {
            return Vec::new();
        }
        // The profile page only shows the received tab.
        let direction = match origin {
            Origin::Inline => "received",
            Origin::Detail(page) => page.label,
        };
        vec![Recommendation {
            direction: direction.to_string(),
            author,
            author_headline: cx.text(item, &l.subtitle),
            relationship: cx.text(item, &l.light),
            author_link: clean_url(&cx.text(item, &l.person_link)),
            image: cx.text(item, &l.logo),
            text,
        }]
    }

    fn covered_by(&self, item: &Recommendation, page: &DetailPage) -> bool {
        item.direction == page.label
    }
}
