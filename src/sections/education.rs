use scraper::ElementRef;

use super::{Cx, DetailPage, ListSection, Origin};
use crate::extractor::{clean_url, looks_like_place};
use crate::locators::Locators;
use crate::model::{EducationEntry, SectionName};
use crate::resolver::ElementLocator;

pub struct Education;

const DETAIL: &[DetailPage] = &[DetailPage {
    path: "education/",
    label: "education",
}];

/// Schools without a page of their own get a search link instead.
fn search_link(school: &str) -> String {
    format!(
        "https://www.linkedin.com/search/results/all/?keywords={}",
        urlencoding::encode(school)
    )
}

impl ListSection for Education {
    type Item = EducationEntry;

    fn name(&self) -> SectionName {
        SectionName::Education
    }

    fn anchor<'l>(&self, locators: &'l Locators) -> &'l ElementLocator {
        &locators.education
    }

    fn detail_pages(&self) -> &'static [DetailPage] {
        DETAIL
    }

    fn parse_item(&self, item: ElementRef<'_>, cx: &Cx<'_>, _origin: Origin) -> Vec<EducationEntry> {
        let l = cx.locators;
        let school = cx.text(item, &l.title);
        if school.is_empty() {
            return Vec::new();
        }

        let dates = cx.extractor.date_span(&cx.text(item, &l.dates));
        let link = cx.text(item, &l.school_link);
        let (school_id, school_link) = if link.is_empty() {
            (String::new(), search_link(&school))
        } else {
            (cx.extractor.entity_id(&link), clean_url(&link))
        };

        let mut details: Vec<String> = cx
            .all(item, &l.light)
            .into_iter()
            .filter(|line| looks_like_place(line))
            .collect();
        let description = cx.text(item, &l.description);
        if !description.is_empty() {
            details.push(description);
        }

        vec![EducationEntry {
            degree: cx.text(item, &l.subtitle),
            start_year: cx.extractor.year(&dates.start),
            end_year: cx.extractor.year(&dates.end),
            date_range: dates.range,
            school_id,
            school_link,
            logo: cx.text(item, &l.logo),
            details,
            school,
        }]
    }
}
