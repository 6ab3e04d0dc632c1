//! Employment history.
//!
//! An item is either one role at one company, or a company header with
//! several nested roles (promotions, internal moves). Both are normalized to
//! one [`ExperienceEntry`] per role.

use scraper::ElementRef;

use super::{Cx, DetailPage, ListSection, Origin};
use crate::extractor::{clean_url, looks_like_duration, split_subtitle};
use crate::locators::Locators;
use crate::model::{ExperienceEntry, SectionName};
use crate::resolver::ElementLocator;

/// Organization-level fields shared by every role under it.
#[derive(Debug, Clone, Default, PartialEq)]
struct Company {
    name: String,
    link: String,
    logo: String,
    employment_type: String,
    location: String,
}

/// Role-level fields as they appear in the markup.
#[derive(Debug, Clone, Default, PartialEq)]
struct Role {
    title: String,
    subtitle: String,
    dates: String,
    location: String,
    description: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Layout {
    Flat { company: Company, role: Role },
    Grouped { company: Company, roles: Vec<Role> },
}

pub struct Experience;

const DETAIL: &[DetailPage] = &[DetailPage {
    path: "experience/",
    label: "experience",
}];

fn read_role(scope: ElementRef<'_>, cx: &Cx<'_>) -> Role {
    let l = cx.locators;
    Role {
        title: cx.text(scope, &l.title),
        subtitle: cx.text(scope, &l.subtitle),
        dates: cx.text(scope, &l.dates),
        location: cx.text(scope, &l.place),
        description: cx.text(scope, &l.description),
    }
}

/// Logo and company link sit on the item itself in both layouts.
fn read_company_assets(item: ElementRef<'_>, cx: &Cx<'_>) -> (String, String) {
    let l = cx.locators;
    (clean_url(&cx.text(item, &l.company_link)), cx.text(item, &l.logo))
}

fn detect(item: ElementRef<'_>, cx: &Cx<'_>) -> Layout {
    let l = cx.locators;
    let (link, logo) = read_company_assets(item, cx);
    let nested = l.roles.all(item);

    if nested.is_empty() {
        let role = read_role(item, cx);
        let (name, employment_type) = split_subtitle(&role.subtitle);
        return Layout::Flat {
            company: Company {
                name,
                link,
                logo,
                employment_type,
                location: String::new(),
            },
            role,
        };
    }

    // Header fields live in the first entity block, before the nested list.
    let header = l
        .entity_block
        .first(item)
        .map(|(el, _)| el)
        .unwrap_or(item);
    let subtitle = cx.text(header, &l.subtitle);
    let employment_type = subtitle
        .split('·')
        .map(str::trim)
        .find(|part| !part.is_empty() && !looks_like_duration(part))
        .unwrap_or_default()
        .to_string();
    Layout::Grouped {
        company: Company {
            name: cx.text(header, &l.title),
            link,
            logo,
            employment_type,
            location: cx.text(header, &l.place),
        },
        roles: nested.into_iter().map(|role| read_role(role, cx)).collect(),
    }
}

fn entry(company: &Company, role: &Role, employment_type: String, cx: &Cx<'_>) -> ExperienceEntry {
    let span = cx.extractor.date_span(&role.dates);
    let company_id = cx.extractor.entity_id(&company.link);
    ExperienceEntry {
        title: role.title.clone(),
        company: company.name.clone(),
        company_urn: if company_id.is_empty() {
            String::new()
        } else {
            format!("urn:li:fsd_company:{}", company_id)
        },
        company_id,
        company_link: company.link.clone(),
        logo: company.logo.clone(),
        employment_type,
        date_range: span.range,
        starts_at: span.start,
        ends_at: span.end,
        is_current: span.is_current,
        duration: span.duration,
        duration_in_yrs: span.years,
        location: if role.location.is_empty() {
            company.location.clone()
        } else {
            role.location.clone()
        },
        description: role.description.clone(),
    }
}

fn normalize(layout: Layout, cx: &Cx<'_>) -> Vec<ExperienceEntry> {
    match layout {
        Layout::Flat { company, role } => {
            let employment_type = company.employment_type.clone();
            vec![entry(&company, &role, employment_type, cx)]
        }
        Layout::Grouped { company, roles } => roles
            .iter()
            .map(|role| {
                // A nested role's subtitle is its own employment type, when shown.
                let (own, rest) = split_subtitle(&role.subtitle);
                let employment_type = [rest, own]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .unwrap_or_else(|| company.employment_type.clone());
                entry(&company, role, employment_type, cx)
            })
            .collect(),
    }
}

impl ListSection for Experience {
    type Item = ExperienceEntry;

    fn name(&self) -> SectionName {
        SectionName::Experience
    }

    fn anchor<'l>(&self, locators: &'l Locators) -> &'l ElementLocator {
        &locators.experience
    }

    fn detail_pages(&self) -> &'static [DetailPage] {
        DETAIL
    }

    fn parse_item(&self, item: ElementRef<'_>, cx: &Cx<'_>, _origin: Origin) -> Vec<ExperienceEntry> {
        normalize(detect(item, cx), cx)
            .into_iter()
            .filter(|e| !e.title.is_empty() || !e.company.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Extractor;
    use crate::locators::Locators;
    use crate::model::Diagnostics;
    use crate::sections::{extract_inline, Page};
    use std::time::Duration;

    fn role_li(title: &str, dates: &str) -> String {
        format!(
            r#"<li class="pvs-list__paged-list-item"><div class="display-flex flex-column full-width">
                 <div class="mr1 t-bold"><span aria-hidden="true">{title}</span></div>
                 <span class="t-14 t-normal"><span aria-hidden="true">Full-time</span></span>
                 <span class="t-14 t-normal t-black--light"><span aria-hidden="true">{dates}</span></span>
               </div></li>"#
        )
    }

    fn page(items: &str) -> Page {
        Page::parse(
            "https://www.linkedin.com/in/jane",
            &format!(
                r#"<main><section class="artdeco-card"><div id="experience"></div><h2>Experience</h2>
                   <ul>{items}</ul></section></main>"#
            ),
        )
    }

    fn extract(page: &Page) -> Vec<ExperienceEntry> {
        let locators = Locators::new();
        let extractor = Extractor::new();
        let cx = Cx::new(&locators, &extractor, Duration::from_secs(1));
        extract_inline(&Experience, page, &cx, &mut Diagnostics::default()).items
    }

    #[test]
    fn grouped_roles_inherit_company_fields() {
        let grouped = format!(
            r#"<li class="artdeco-list__item">
                 <a href="https://www.linkedin.com/company/42/?trk=x"><img src="https://cdn/acme.png"></a>
                 <div class="display-flex flex-column full-width align-items-start">
                   <div class="mr1 t-bold"><span aria-hidden="true">Acme</span></div>
                   <span class="t-14 t-normal"><span aria-hidden="true">Full-time · 6 yrs</span></span>
                   <span class="t-14 t-normal t-black--light"><span aria-hidden="true">Berlin, Germany</span></span>
                 </div>
                 <div class="pvs-entity__sub-components"><ul>{}{}</ul></div>
               </li>"#,
            role_li("Lead", "Jan 2022 - Present · 2 yrs"),
            role_li("Engineer", "Jan 2018 - Dec 2021 · 4 yrs"),
        );
        let entries = extract(&page(&grouped));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Lead");
        assert_eq!(entries[0].company, "Acme");
        assert_eq!(entries[0].company_id, "42");
        assert_eq!(entries[0].company_urn, "urn:li:fsd_company:42");
        assert_eq!(entries[0].company_link, "https://www.linkedin.com/company/42/");
        assert_eq!(entries[0].location, "Berlin, Germany");
        assert_eq!(entries[0].employment_type, "Full-time");
        assert!(entries[0].is_current);
        assert_eq!(entries[1].ends_at, "Dec 2021");
        assert_eq!(entries[1].duration_in_yrs, 4.0);
    }

    #[test]
    fn flat_role_splits_company_and_type() {
        let flat = r#"<li class="artdeco-list__item">
              <div class="display-flex flex-column full-width">
                <div class="mr1 t-bold"><span aria-hidden="true">Analyst</span></div>
                <span class="t-14 t-normal"><span aria-hidden="true">Initech · Contract</span></span>
                <span class="t-14 t-normal t-black--light"><span aria-hidden="true">2015 - 2017 · 2 yrs</span></span>
                <span class="t-14 t-normal t-black--light"><span aria-hidden="true">Austin, Texas</span></span>
              </div>
              <div class="inline-show-more-text"><span aria-hidden="true">Reports.</span></div>
            </li>"#;
        let entries = extract(&page(flat));
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!((e.title.as_str(), e.company.as_str()), ("Analyst", "Initech"));
        assert_eq!(e.employment_type, "Contract");
        assert_eq!(e.location, "Austin, Texas");
        assert_eq!(e.description, "Reports.");
        assert_eq!(e.company_id, "");
        assert!(!e.is_current);
    }
}
