use scraper::ElementRef;

use super::{Cx, DetailPage, ListSection, Origin};
use crate::locators::Locators;
use crate::model::{SectionName, SkillEntry};
use crate::resolver::{element_text, ElementLocator};

pub struct Skills;

const DETAIL: &[DetailPage] = &[DetailPage {
    path: "skills/",
    label: "skills",
}];

impl ListSection for Skills {
    type Item = SkillEntry;

    fn name(&self) -> SectionName {
        SectionName::Skills
    }

    fn anchor<'l>(&self, locators: &'l Locators) -> &'l ElementLocator {
        &locators.skills
    }

    fn detail_pages(&self) -> &'static [DetailPage] {
        DETAIL
    }

    fn parse_item(&self, item: ElementRef<'_>, cx: &Cx<'_>, _origin: Origin) -> Vec<SkillEntry> {
        let name = cx.text(item, &cx.locators.title);
        if name.is_empty() {
            return Vec::new();
        }
        let insights: Vec<String> = cx
            .all(item, &cx.locators.insights)
            .into_iter()
            .filter(|line| *line != name)
            .collect();
        let endorsements = insights
            .iter()
            .find_map(|line| cx.extractor.endorsements(line))
            .or_else(|| cx.extractor.endorsements(&element_text(item)))
            .unwrap_or(0);
        vec![SkillEntry {
            name,
            endorsements,
            insights,
        }]
    }
}

/// Up to five skill names, most endorsed first. Ties keep page order.
pub fn top_by_endorsements(skills: &[SkillEntry]) -> String {
    let mut ranked: Vec<&SkillEntry> = skills.iter().collect();
    ranked.sort_by(|a, b| b.endorsements.cmp(&a.endorsements));
    ranked
        .into_iter()
        .take(5)
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
