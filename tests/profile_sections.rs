mod common;

use common::*;
use profile_scraper_lib::model::SectionName;
use profile_scraper_lib::ScraperConfig;

#[test]
fn inline_profile_is_fully_assembled() {
    let site = site();
    site.page(JANE, PROFILE_HTML);
    let (mut assembler, _) = assembler(&site, valid_credentials(), &config());

    let record = assembler.assemble("http://www.linkedin.com/in/jane-van-doe/en_US/?trk=abc").unwrap();

    assert_eq!(record.linkedin_url, JANE);
    assert_eq!(record.public_identifier, "jane-van-doe");
    assert_eq!(record.urn, "ACoAAB12345");
    assert_eq!(record.full_name, "Jane van Doe");
    assert_eq!(record.first_name, "Jane");
    assert_eq!(record.last_name, "van Doe");
    assert_eq!(record.headline, "Staff Engineer at Acme | Data pipelines");
    assert_eq!(record.address_with_country, "Berlin, Berlin, Germany");
    assert_eq!(record.address_country_only, "Germany");
    assert_eq!(record.connections, 500);
    assert_eq!(record.followers, 2310);
    assert!(record.open_connection);
    assert_eq!(record.profile_pic_all_dimensions.len(), 4);
    assert!(record.profile_pic_high_quality.contains("shrink_800_800"));
    assert_eq!(
        record.about,
        "I build resilient data pipelines and the teams that run them."
    );

    assert_eq!(record.experiences.len(), 4);
    assert_eq!(record.job_title, "Staff Engineer");
    assert_eq!(record.company_name, "Acme");
    assert_eq!(record.company_linkedin, "https://www.linkedin.com/company/1441/");
    assert_eq!(record.current_job_duration, "2 yrs 10 mos");
    assert_eq!(record.current_job_duration_in_yrs, 2.83);
    let intern = &record.experiences[3];
    assert_eq!(intern.company, "Initech");
    assert_eq!(intern.employment_type, "Internship");
    assert_eq!(intern.location, "Austin, Texas, United States");

    let school = &record.educations[0];
    assert_eq!(school.school_id, "tu-berlin");
    assert_eq!((school.start_year, school.end_year), (Some(2014), Some(2016)));

    assert_eq!(record.skills.len(), 2);
    assert_eq!(record.top_skills_by_endorsements, "Distributed Systems, Rust");
    assert_eq!(record.license_and_certificates[0].credential_id, "AWS-99");
    assert_eq!(record.license_and_certificates[0].issuer_id, "amazon-web-services");
    assert_eq!(record.languages[0].proficiency, "Native or bilingual proficiency");

    // Without the detail pass the overlay is never opened.
    assert_eq!(record.email, None);
    assert_eq!(
        record.diagnostics.unexpected_shape,
        vec![SectionName::Recommendations, SectionName::Interests]
    );
    assert!(record.diagnostics.unresolved_fields.is_empty());
    assert!(record.diagnostics.detail_pages.is_empty());

    // The truncated About text was expanded before extraction.
    assert!(site
        .log()
        .clicks
        .contains(&"button.inline-show-more-text__button".to_string()));
}

#[test]
fn detail_pages_and_contact_overlay_are_followed() {
    let site = site();
    site.page(JANE, PROFILE_HTML)
        .page(&format!("{}/details/skills/", JANE), SKILLS_DETAILS_HTML)
        .page(&format!("{}/overlay/contact-info/", JANE), CONTACT_HTML);
    let (mut assembler, _) = assembler(&site, valid_credentials(), &ScraperConfig::default());

    let record = assembler.assemble(JANE).unwrap();

    let names: Vec<&str> = record.skills.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Rust", "Distributed Systems", "Kafka", "PostgreSQL"]);
    assert_eq!(
        record.top_skills_by_endorsements,
        "Distributed Systems, Rust, Kafka, PostgreSQL"
    );
    assert_eq!(record.diagnostics.detail_pages, vec![SectionName::Skills]);

    assert_eq!(record.email.as_deref(), Some("jane.vandoe@example.org"));
    assert_eq!(record.mobile_number.as_deref(), Some("+49 151 2345 6789"));
    assert_eq!(
        record.websites,
        vec!["https://janevandoe.dev".to_string(), "https://github.com/janevd".to_string()]
    );
}

#[test]
fn gated_detail_page_keeps_the_inline_list() {
    let site = site();
    site.page(JANE, PROFILE_HTML)
        .redirect(&format!("{}/details/skills/", JANE), "https://www.linkedin.com/authwall");
    let (mut assembler, _) = assembler(&site, valid_credentials(), &ScraperConfig::default());

    let record = assembler.assemble(JANE).unwrap();

    assert_eq!(record.skills.len(), 2);
    assert!(record.diagnostics.detail_pages.is_empty());
    // The overlay was not registered, so it renders blank and yields nothing.
    assert_eq!(record.email, None);
    assert!(record.websites.is_empty());
}

#[test]
fn failed_targets_leave_a_page_capture() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.capture_dir = Some(dir.path().to_path_buf());

    let site = site();
    site.redirect(JANE, "https://www.linkedin.com/authwall?trk=x");
    let (mut assembler, _) = assembler(&site, valid_credentials(), &config);

    assert!(assembler.assemble(JANE).is_err());
    let captures: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(captures.len(), 1);
    assert!(captures[0].ends_with("_jane-van-doe.html"));
}

fn interest_item(name: &str, href: &str) -> String {
    format!(
        r#"<li class="artdeco-list__item"><a href="{href}"></a>
             <div class="mr1 t-bold"><span aria-hidden="true">{name}</span></div></li>"#
    )
}

fn interests_page(items: &[String]) -> String {
    format!(
        r#"<html><body><main><section class="artdeco-card pv-profile-card">
             <div id="interests" class="pv-profile-card__anchor"></div>
             <div class="pvs-header__container"><h2><span aria-hidden="true">Interests</span></h2></div>
             <ul>{}</ul></section></main></body></html>"#,
        items.concat()
    )
}

#[test]
fn interests_keep_categories_no_detail_page_delivered() {
    let profile = interests_page(&[
        interest_item("Acme", "https://www.linkedin.com/company/acme/"),
        interest_item("Bob Smith", "https://www.linkedin.com/in/bob"),
        interest_item("Rustaceans", "https://www.linkedin.com/groups/42/"),
        interest_item("Weekly Data", "https://www.linkedin.com/newsletters/weekly-7/"),
    ]);
    let companies = interests_page(&[
        interest_item("Acme", "https://www.linkedin.com/company/acme/"),
        interest_item("Initech", "https://www.linkedin.com/company/initech/"),
    ]);
    let site = site();
    site.page(JANE, &profile)
        .page(&format!("{}/details/interests/companies/", JANE), &companies)
        .redirect(
            &format!("{}/details/interests/groups/", JANE),
            "https://www.linkedin.com/authwall",
        );
    // The schools page is not registered and renders blank.
    let (mut assembler, _) = assembler(&site, valid_credentials(), &ScraperConfig::default());

    let record = assembler.assemble(JANE).unwrap();

    let got: Vec<(&str, &str)> = record
        .interests
        .iter()
        .map(|i| (i.category.as_str(), i.name.as_str()))
        .collect();
    assert_eq!(
        got,
        [
            ("companies", "Acme"),
            ("companies", "Initech"),
            ("people", "Bob Smith"),
            ("groups", "Rustaceans"),
            ("newsletters", "Weekly Data"),
        ]
    );
    assert_eq!(record.diagnostics.detail_pages, vec![SectionName::Interests]);
}
