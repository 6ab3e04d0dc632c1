//! Every selector the extractors know about, compiled once per run.
//!
//! Order inside each locator is the fallback order: current markup first, then
//! older or experimental layouts, then the most generic shape.

use crate::extractor::{looks_like_dates, looks_like_place};
use crate::resolver::{ElementLocator, LocatorSpec};

const BOLD_TITLE: &str = ".t-bold span[aria-hidden=\"true\"]";
const SUBTITLE: &str = "span.t-14.t-normal:not(.t-black--light) > span[aria-hidden=\"true\"]";
const LIGHT: &str = "span.t-14.t-normal.t-black--light > span[aria-hidden=\"true\"]";

/// Controls that reveal truncated text or lazily rendered list entries.
pub const EXPANDERS: &[&str] = &[
    "button.inline-show-more-text__button",
    "button#line-clamp-show-more-button",
    "a.lt-line-clamp__more",
];

fn has_comma(text: &str) -> bool {
    text.contains(',')
}

fn long_text(text: &str) -> bool {
    text.chars().count() > 20
}

fn profile_image(src: &str) -> bool {
    src.to_ascii_lowercase().contains("profile")
}

fn credential_line(text: &str) -> bool {
    text.to_ascii_lowercase().starts_with("credential id")
}

fn section(id: &'static str, data_section: &str, heading: &str) -> ElementLocator {
    ElementLocator::new(id)
        .section_by_id(id)
        .css(&format!("section[data-section=\"{}\"]", data_section))
        .section_by_heading(heading)
}

pub struct Locators {
    pub top_card: ElementLocator,
    pub full_name: LocatorSpec,
    pub headline: LocatorSpec,
    pub location: LocatorSpec,
    pub connections: LocatorSpec,
    pub followers: LocatorSpec,
    pub profile_pic: LocatorSpec,
    pub member_id: LocatorSpec,
    pub connect: LocatorSpec,

    pub about: ElementLocator,
    pub about_text: LocatorSpec,

    pub contact_link: LocatorSpec,
    pub contact_root: ElementLocator,
    pub contact_emails: LocatorSpec,
    pub contact_phones: LocatorSpec,
    pub contact_websites: LocatorSpec,

    pub experience: ElementLocator,
    pub education: ElementLocator,
    pub skills: ElementLocator,
    pub certifications: ElementLocator,
    pub languages: ElementLocator,
    pub recommendations: ElementLocator,
    pub interests: ElementLocator,

    pub list_items: ElementLocator,
    pub detail_root: ElementLocator,
    pub show_all: LocatorSpec,
    pub roles: ElementLocator,
    pub entity_block: ElementLocator,

    pub title: LocatorSpec,
    pub subtitle: LocatorSpec,
    pub dates: LocatorSpec,
    pub place: LocatorSpec,
    pub light: LocatorSpec,
    pub description: LocatorSpec,
    pub logo: LocatorSpec,
    pub company_link: LocatorSpec,
    pub school_link: LocatorSpec,
    pub person_link: LocatorSpec,
    pub any_link: LocatorSpec,
    pub credential: LocatorSpec,
    pub insights: LocatorSpec,
}

impl Default for Locators {
    fn default() -> Self {
        Self::new()
    }
}

impl Locators {
    pub fn new() -> Self {
        Locators {
            top_card: ElementLocator::new("top card")
                .css("section.pv-top-card")
                .css("div[data-section=\"profile-top-card\"]")
                .css("section.artdeco-card.pv-profile-card")
                .css("main"),
            full_name: LocatorSpec::new("fullName")
                .text("h1.text-heading-xlarge")
                .text("h1[class*=\"text-heading\"]")
                .text(".pv-text-details__left-panel h1")
                .text("h1.inline.t-24")
                .text("h1"),
            headline: LocatorSpec::new("headline")
                .text("div.text-body-medium.break-words")
                .text("div[class*=\"text-body-medium\"]")
                .text(".pv-text-details__left-panel .text-body-medium"),
            location: LocatorSpec::new("location")
                .text("span.text-body-small.inline.t-black--light.break-words")
                .text_if("span[class*=\"text-body-small\"]", has_comma)
                .text_if(".pv-text-details__left-panel span", has_comma),
            connections: LocatorSpec::new("connections")
                .containing("li.text-body-small", "connection")
                .containing("li", "connection")
                .containing("span", "connection"),
            followers: LocatorSpec::new("followers")
                .containing("li.text-body-small", "follower")
                .containing("li", "follower")
                .containing("span", "follower"),
            profile_pic: LocatorSpec::new("profilePic")
                .attr("img.pv-top-card-profile-picture__image", "src")
                .attr_if("img[class*=\"profile-picture\"]", "src", profile_image)
                .attr_if("button[aria-label*=\"photo\"] img", "src", profile_image)
                .attr_if("img.pv-top-card--photo", "src", profile_image),
            member_id: LocatorSpec::new("urn")
                .attr("[data-member-id]", "data-member-id")
                .attr("[data-urn]", "data-urn"),
            connect: LocatorSpec::new("openConnection")
                .attr("button[aria-label*=\"connect\"]", "aria-label")
                .attr("button[aria-label*=\"Connect\"]", "aria-label")
                .containing("button", "connect"),

            about: section("about", "summary", "About"),
            about_text: LocatorSpec::new("about")
                .text("div.inline-show-more-text span[aria-hidden=\"true\"]")
                .text_if("div.display-flex span[aria-hidden=\"true\"]", long_text)
                .text_if("span[aria-hidden=\"true\"]", long_text),

            contact_link: LocatorSpec::new("contact")
                .attr("a[href*=\"overlay/contact-info\"]", "href")
                .attr("a#top-card-text-details-contact-info", "href"),
            contact_root: ElementLocator::new("contact overlay")
                .css("div.pv-contact-info")
                .css("section.pv-contact-info")
                .css("div[role=\"dialog\"]")
                .css("main"),
            contact_emails: LocatorSpec::new("email")
                .attr("section.ci-email a[href^=\"mailto:\"]", "href")
                .attr("a[href^=\"mailto:\"]", "href"),
            contact_phones: LocatorSpec::new("mobileNumber")
                .text("section.ci-phone li span.t-14")
                .text("section.ci-phone span"),
            contact_websites: LocatorSpec::new("websites")
                .attr("section.ci-websites a[href]", "href")
                .attr("section.pv-contact-info__contact-type--websites a[href]", "href"),

            experience: section("experience", "experience", "Experience"),
            education: section("education", "education", "Education"),
            skills: section("skills", "skills", "Skills"),
            certifications: section(
                "licenses_and_certifications",
                "certifications",
                "Licenses & certifications",
            ),
            languages: section("languages", "languages", "Languages"),
            recommendations: section("recommendations", "recommendations", "Recommendations"),
            interests: section("interests", "interests", "Interests"),

            list_items: ElementLocator::new("list items")
                .top_level("li.artdeco-list__item")
                .top_level("li.pvs-list__paged-list-item")
                .top_level("li"),
            detail_root: ElementLocator::new("detail list")
                .css("main section.artdeco-card")
                .css("main"),
            show_all: LocatorSpec::new("show all")
                .attr("a[href*=\"/details/\"]", "href")
                .attr("a.pvs-navigation__footer", "href"),
            roles: ElementLocator::new("nested roles")
                .having("div.pvs-entity__sub-components li", BOLD_TITLE)
                .having("ul li", BOLD_TITLE),
            entity_block: ElementLocator::new("entity block")
                .css("div.display-flex.flex-column.full-width")
                .css("div.flex-column"),

            title: LocatorSpec::new("title")
                .text(BOLD_TITLE)
                .text("div.display-flex.align-items-center span[aria-hidden=\"true\"]")
                .text(".t-bold"),
            subtitle: LocatorSpec::new("subtitle")
                .text(SUBTITLE)
                .text("span.t-14.t-normal:not(.t-black--light)"),
            dates: LocatorSpec::new("dates")
                .text("span.pvs-entity__caption-wrapper")
                .text_if(LIGHT, looks_like_dates),
            place: LocatorSpec::new("location").text_if(LIGHT, looks_like_place),
            light: LocatorSpec::new("caption")
                .text(LIGHT)
                .text("span.t-black--light"),
            description: LocatorSpec::new("description")
                .text("div.inline-show-more-text span[aria-hidden=\"true\"]")
                .text("div.pv-shared-text-with-see-more span[aria-hidden=\"true\"]"),
            logo: LocatorSpec::new("logo").attr("img", "src"),
            company_link: LocatorSpec::new("company link").attr("a[href*=\"/company/\"]", "href"),
            school_link: LocatorSpec::new("school link").attr("a[href*=\"/school/\"]", "href"),
            person_link: LocatorSpec::new("profile link").attr("a[href*=\"/in/\"]", "href"),
            any_link: LocatorSpec::new("link").attr("a[href]", "href"),
            credential: LocatorSpec::new("credential id")
                .text_if(LIGHT, credential_line)
                .text_if("span", credential_line),
            insights: LocatorSpec::new("insights")
                .text("div.pvs-entity__sub-components span[aria-hidden=\"true\"]")
                .text(LIGHT),
        }
    }
}
