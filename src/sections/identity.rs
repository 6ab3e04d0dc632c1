//! Top card and About.

use log::debug;

use super::{Cx, Page};
use crate::extractor::{split_location, split_name};
use crate::model::{Diagnostics, ProfileRecord, SectionName};
use crate::resolver::{resolve, LocatorSpec};

/// Fills the identity block of `record`. Fields that no strategy resolves
/// keep their defaults and are listed in the diagnostics.
pub fn extract(page: &Page, cx: &Cx<'_>, record: &mut ProfileRecord) {
    let l = cx.locators;
    let scope = match l.top_card.first(page.root()) {
        Some((card, _)) => card,
        None => {
            record.diagnostics.flag_shape(SectionName::Identity);
            page.root()
        }
    };

    let field = |spec: &LocatorSpec, diagnostics: &mut Diagnostics| -> String {
        match resolve(scope, spec, cx.budget).into_value() {
            Some(value) => value,
            None => {
                debug!("{} unresolved on {}", spec.field(), page.url());
                diagnostics.unresolved_fields.push(spec.field().to_string());
                String::new()
            }
        }
    };

    let d = &mut record.diagnostics;
    let full_name = field(&l.full_name, d);
    let headline = field(&l.headline, d);
    let location = field(&l.location, d);
    let connections = field(&l.connections, d);
    let followers = field(&l.followers, d);
    let picture = field(&l.profile_pic, d);

    let (first, last) = split_name(&full_name);
    let (locality, country) = split_location(&location);
    let sizes = cx.extractor.picture_variants(&picture);

    record.first_name = first;
    record.last_name = last;
    record.full_name = full_name;
    record.headline = headline;
    record.address_without_country = locality;
    record.address_country_only = country;
    record.address_with_country = location;
    record.connections = cx.extractor.parse_count(&connections);
    record.followers = cx.extractor.parse_count(&followers);
    record.profile_pic_high_quality = sizes
        .iter()
        .max_by_key(|s| s.width)
        .map(|s| s.url.clone())
        .unwrap_or_else(|| picture.clone());
    record.profile_pic = picture;
    record.profile_pic_all_dimensions = sizes;
    record.urn = cx.text(page.root(), &l.member_id);
    record.open_connection = resolve(scope, &l.connect, cx.budget).is_found();
}

/// About text, expanded beforehand when a "see more" control was present.
pub fn extract_about(page: &Page, cx: &Cx<'_>, diagnostics: &mut Diagnostics) -> String {
    match cx.locators.about.first(page.root()) {
        Some((section, _)) => cx.text(section, &cx.locators.about_text),
        None => {
            diagnostics.flag_shape(SectionName::About);
            String::new()
        }
    }
}
