//! Output schema. Every field is always serialized; absent data shows up as
//! an empty string, empty list, zero, `false` or `null`, never a missing key.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Identity,
    About,
    Contact,
    Experience,
    Education,
    Skills,
    Certifications,
    Languages,
    Recommendations,
    Interests,
}

impl SectionName {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionName::Identity => "identity",
            SectionName::About => "about",
            SectionName::Contact => "contact",
            SectionName::Experience => "experience",
            SectionName::Education => "education",
            SectionName::Skills => "skills",
            SectionName::Certifications => "certifications",
            SectionName::Languages => "languages",
            SectionName::Recommendations => "recommendations",
            SectionName::Interests => "interests",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureSize {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

/// One role. Grouped and flat source layouts both normalize to this shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub company_id: String,
    pub company_urn: String,
    pub company_link: String,
    pub logo: String,
    pub employment_type: String,
    pub date_range: String,
    pub starts_at: String,
    pub ends_at: String,
    pub is_current: bool,
    pub duration: String,
    pub duration_in_yrs: f64,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub date_range: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub school_id: String,
    pub school_link: String,
    pub logo: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEntry {
    pub name: String,
    pub endorsements: u32,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationEntry {
    pub name: String,
    pub issuer: String,
    pub issuer_id: String,
    pub issuer_link: String,
    pub issued: String,
    pub credential_id: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub name: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub direction: String,
    pub author: String,
    pub author_headline: String,
    pub relationship: String,
    pub author_link: String,
    pub image: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub category: String,
    pub name: String,
    pub subtitle: String,
    pub caption: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Sections where none of the anchor strategies matched anything.
    pub unexpected_shape: Vec<SectionName>,
    /// Identity fields that fell back to their defaults.
    pub unresolved_fields: Vec<String>,
    /// Sections whose list came from a dedicated detail page.
    pub detail_pages: Vec<SectionName>,
}

impl Diagnostics {
    pub fn flag_shape(&mut self, section: SectionName) {
        if !self.unexpected_shape.contains(&section) {
            self.unexpected_shape.push(section);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub linkedin_url: String,
    pub public_identifier: String,
    pub urn: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub headline: String,
    pub about: String,
    pub address_with_country: String,
    pub address_without_country: String,
    pub address_country_only: String,
    pub connections: u32,
    pub followers: u32,
    pub open_connection: bool,
    pub profile_pic: String,
    pub profile_pic_high_quality: String,
    pub profile_pic_all_dimensions: Vec<PictureSize>,

    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub websites: Vec<String>,

    pub job_title: String,
    pub company_name: String,
    pub company_linkedin: String,
    pub current_job_duration: String,
    pub current_job_duration_in_yrs: f64,

    pub experiences: Vec<ExperienceEntry>,
    pub educations: Vec<EducationEntry>,
    pub skills: Vec<SkillEntry>,
    pub top_skills_by_endorsements: String,
    pub license_and_certificates: Vec<CertificationEntry>,
    pub languages: Vec<LanguageEntry>,
    pub recommendations: Vec<Recommendation>,
    pub interests: Vec<Interest>,

    pub diagnostics: Diagnostics,
}
