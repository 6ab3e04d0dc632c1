use std::collections::BTreeSet;

use regex::Regex;

use crate::model::PictureSize;

/// Dates and duration pulled from a caption such as
/// `Jan 2020 - Present · 3 yrs 2 mos`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DateSpan {
    pub range: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub years: f64,
    pub is_current: bool,
}

/// Regex-backed parsing of the free text that field resolution returns.
pub struct Extractor {
    email_regex: Regex,
    phone_regex: Regex,
    count_regex: Regex,
    years_regex: Regex,
    months_regex: Regex,
    year_regex: Regex,
    range_split_regex: Regex,
    entity_id_regex: Regex,
    endorsement_regex: Regex,
    shrink_regex: Regex,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Extractor {
            email_regex: Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").unwrap(),
            phone_regex: Regex::new(r"(?:\+?\d{1,4}[-.\s]?)?(?:\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}").unwrap(),
            count_regex: Regex::new(r"(\d[\d,.]*)\s?([kKmM]\b)?").unwrap(),
            years_regex: Regex::new(r"(\d+)\s*yr").unwrap(),
            months_regex: Regex::new(r"(\d+)\s*mo").unwrap(),
            year_regex: Regex::new(r"\b(19|20)\d{2}\b").unwrap(),
            range_split_regex: Regex::new(r"\s+[-–—]\s+").unwrap(),
            entity_id_regex: Regex::new(r"/(?:company|school)/([^/?#]+)").unwrap(),
            endorsement_regex: Regex::new(r"(?i)(\d[\d,]*)\s+endorsement").unwrap(),
            shrink_regex: Regex::new(r"shrink_\d+_\d+").unwrap(),
        }
    }

    /// Distinct e-mail addresses in sorted order; image file names that look
    /// like addresses are dropped.
    pub fn extract_emails(&self, text: &str) -> Vec<String> {
        let mut emails = BTreeSet::new();
        for m in self.email_regex.find_iter(text) {
            let email = m.as_str().to_lowercase();
            let is_image = [".png", ".jpg", ".jpeg", ".gif", ".webp"]
                .iter()
                .any(|ext| email.ends_with(ext));
            if !is_image {
                emails.insert(email);
            }
        }
        emails.into_iter().collect()
    }

    /// Phone-looking runs with 10 to 13 digits, in order of appearance.
    pub fn extract_phones(&self, text: &str) -> Vec<String> {
        let mut phones: Vec<String> = Vec::new();
        for m in self.phone_regex.find_iter(text) {
            let p = m.as_str().trim().to_string();
            let digits = p.chars().filter(|c| c.is_ascii_digit()).count();
            if (10..=13).contains(&digits) && !phones.contains(&p) {
                phones.push(p);
            }
        }
        phones
    }

    /// `10,219 connections` → 10219, `500+` → 500, `1.2K followers` → 1200.
    pub fn parse_count(&self, text: &str) -> u32 {
        let Some(caps) = self.count_regex.captures(text) else {
            return 0;
        };
        let number = caps[1].replace(',', "");
        let multiplier = match caps.get(2).map(|m| m.as_str()) {
            Some("k") | Some("K") => 1_000.0,
            Some("m") | Some("M") => 1_000_000.0,
            _ => 1.0,
        };
        number
            .parse::<f64>()
            .map(|n| (n * multiplier).round() as u32)
            .unwrap_or(0)
    }

    /// `1 yr 2 mos` → 1.17
    pub fn duration_years(&self, text: &str) -> f64 {
        let years = self
            .years_regex
            .captures(text)
            .and_then(|c| c[1].parse::<f64>().ok())
            .unwrap_or(0.0);
        let months = self
            .months_regex
            .captures(text)
            .and_then(|c| c[1].parse::<f64>().ok())
            .unwrap_or(0.0);
        ((years + months / 12.0) * 100.0).round() / 100.0
    }

    pub fn date_span(&self, caption: &str) -> DateSpan {
        let mut span = DateSpan::default();
        for part in caption.split('·').map(str::trim).filter(|p| !p.is_empty()) {
            let has_year = self.year_regex.is_match(part) || part.contains("Present");
            if span.range.is_empty() && has_year {
                span.range = part.to_string();
            } else if span.duration.is_empty() && (part.contains("yr") || part.contains("mo")) {
                span.duration = part.to_string();
            }
        }

        if !span.range.is_empty() {
            let mut ends = self.range_split_regex.splitn(&span.range, 2);
            span.start = ends.next().unwrap_or_default().trim().to_string();
            span.end = ends.next().unwrap_or_default().trim().to_string();
            span.is_current = span.end.eq_ignore_ascii_case("present");
        }
        span.years = self.duration_years(&span.duration);
        span
    }

    pub fn year(&self, text: &str) -> Option<i32> {
        self.year_regex
            .find(text)
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Id segment of a `/company/<id>` or `/school/<id>` link.
    pub fn entity_id(&self, link: &str) -> String {
        self.entity_id_regex
            .captures(link)
            .map(|c| c[1].to_string())
            .unwrap_or_default()
    }

    pub fn endorsements(&self, text: &str) -> Option<u32> {
        self.endorsement_regex
            .captures(text)
            .and_then(|c| c[1].replace(',', "").parse().ok())
    }

    /// Size variants of a profile picture URL. Only `shrink_W_H` URLs can be
    /// resized; anything else is reported as a single 200x200 image.
    pub fn picture_variants(&self, src: &str) -> Vec<PictureSize> {
        if src.is_empty() {
            return Vec::new();
        }
        if !self.shrink_regex.is_match(src) {
            return vec![PictureSize {
                width: 200,
                height: 200,
                url: src.to_string(),
            }];
        }
        [(200, 200), (800, 800), (400, 400), (100, 100)]
            .iter()
            .map(|&(width, height)| PictureSize {
                width,
                height,
                url: self
                    .shrink_regex
                    .replace(src, format!("shrink_{}_{}", width, height).as_str())
                    .into_owned(),
            })
            .collect()
    }
}

/// `Acme Corp · Full-time` → ("Acme Corp", "Full-time")
pub fn split_subtitle(text: &str) -> (String, String) {
    match text.split_once('·') {
        Some((head, tail)) => (head.trim().to_string(), tail.trim().to_string()),
        None => (text.trim().to_string(), String::new()),
    }
}

/// Drops query string and fragment.
pub fn clean_url(url: &str) -> String {
    url.split(['?', '#']).next().unwrap_or_default().trim().to_string()
}

pub fn split_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// `Berlin, Berlin, Germany` → ("Berlin, Berlin", "Germany"). A single
/// component is taken to be the country.
pub fn split_location(location: &str) -> (String, String) {
    let parts: Vec<&str> = location
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    match parts.split_last() {
        Some((country, rest)) if !rest.is_empty() => (rest.join(", "), country.to_string()),
        Some((country, _)) => (String::new(), country.to_string()),
        None => (String::new(), String::new()),
    }
}

/// True for captions carrying a year or "Present".
pub fn looks_like_dates(text: &str) -> bool {
    if text.contains("Present") {
        return true;
    }
    let bytes = text.as_bytes();
    bytes.windows(4).enumerate().any(|(i, w)| {
        let boundary_before = i == 0 || !bytes[i - 1].is_ascii_digit();
        let boundary_after = bytes.get(i + 4).map_or(true, |b| !b.is_ascii_digit());
        boundary_before
            && boundary_after
            && w.iter().all(u8::is_ascii_digit)
            && (w.starts_with(b"19") || w.starts_with(b"20"))
    })
}

/// `3 yrs 2 mos`, `6 mos`, `1 yr`.
pub fn looks_like_duration(text: &str) -> bool {
    let mut saw_unit = false;
    for word in text.split_whitespace() {
        let word = word.to_ascii_lowercase();
        if word.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if matches!(word.as_str(), "yr" | "yrs" | "mo" | "mos" | "year" | "years" | "month" | "months") {
            saw_unit = true;
            continue;
        }
        return false;
    }
    saw_unit
}

/// Light captions that are neither dates nor a bare duration.
pub fn looks_like_place(text: &str) -> bool {
    !looks_like_dates(text) && !looks_like_duration(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        let ex = Extractor::new();
        assert_eq!(ex.parse_count("10,219 connections"), 10219);
        assert_eq!(ex.parse_count("500+ connections"), 500);
        assert_eq!(ex.parse_count("1.2K followers"), 1200);
        assert_eq!(ex.parse_count("no digits"), 0);
    }

    #[test]
    fn durations() {
        let ex = Extractor::new();
        assert_eq!(ex.duration_years("1 yr 2 mos"), 1.17);
        assert_eq!(ex.duration_years("3 yrs"), 3.0);
        assert_eq!(ex.duration_years("6 mos"), 0.5);
        assert_eq!(ex.duration_years(""), 0.0);
    }

    #[test]
    fn date_captions() {
        let ex = Extractor::new();
        let span = ex.date_span("Jan 2020 - Present · 3 yrs 2 mos");
        assert_eq!(span.range, "Jan 2020 - Present");
        assert_eq!(span.start, "Jan 2020");
        assert_eq!(span.end, "Present");
        assert!(span.is_current);
        assert_eq!(span.duration, "3 yrs 2 mos");
        assert_eq!(span.years, 3.17);

        let edu = ex.date_span("2012 – 2016");
        assert_eq!((edu.start.as_str(), edu.end.as_str()), ("2012", "2016"));
        assert!(!edu.is_current);

        let header_only = ex.date_span("Full-time · 6 yrs");
        assert_eq!(header_only.range, "");
        assert_eq!(header_only.duration, "6 yrs");
    }

    #[test]
    fn ids_years_and_endorsements() {
        let ex = Extractor::new();
        assert_eq!(ex.entity_id("https://www.linkedin.com/company/1234/?trk=x"), "1234");
        assert_eq!(ex.entity_id("https://www.linkedin.com/school/mit/"), "mit");
        assert_eq!(ex.entity_id("https://example.com"), "");
        assert_eq!(ex.year("Class of 2016, honours"), Some(2016));
        assert_eq!(ex.year("none"), None);
        assert_eq!(ex.endorsements("Endorsed by 3 colleagues · 12 endorsements"), Some(12));
        assert_eq!(ex.endorsements("Endorsed by Jane"), None);
    }

    #[test]
    fn contact_text() {
        let ex = Extractor::new();
        let text = "Email jane@Example.com or JANE@example.com, logo icon@2x.png. Phone +1 415-555-0100";
        assert_eq!(ex.extract_emails(text), vec!["jane@example.com".to_string()]);
        assert_eq!(ex.extract_phones(text), vec!["+1 415-555-0100".to_string()]);
    }

    #[test]
    fn picture_sizes() {
        let ex = Extractor::new();
        let src = "https://media.licdn.com/dms/image/profile-displayphoto-shrink_100_100/0/1?e=1";
        let sizes = ex.picture_variants(src);
        assert_eq!(sizes.len(), 4);
        assert_eq!(sizes[1].width, 800);
        assert!(sizes[1].url.contains("shrink_800_800"));
        assert_eq!(ex.picture_variants("https://x/p.jpg")[0].url, "https://x/p.jpg");
        assert!(ex.picture_variants("").is_empty());
    }

    #[test]
    fn free_helpers() {
        assert_eq!(split_subtitle("Acme Corp · Full-time"), ("Acme Corp".into(), "Full-time".into()));
        assert_eq!(split_subtitle("Acme Corp"), ("Acme Corp".into(), String::new()));
        assert_eq!(clean_url("https://x.com/company/1/?a=b#c"), "https://x.com/company/1/");
        assert_eq!(split_name("Jane van Doe"), ("Jane".into(), "van Doe".into()));
        assert_eq!(split_name(""), (String::new(), String::new()));
        assert_eq!(split_location("Berlin, Berlin, Germany"), ("Berlin, Berlin".into(), "Germany".into()));
        assert_eq!(split_location("Germany"), (String::new(), "Germany".into()));
        assert!(looks_like_dates("Jan 2020 - Present"));
        assert!(looks_like_dates("2012 - 2016"));
        assert!(!looks_like_dates("Berlin, Germany"));
        assert!(!looks_like_dates("Room 12016"));
        assert!(looks_like_duration("3 yrs 2 mos"));
        assert!(!looks_like_duration("Berlin"));
        assert!(!looks_like_duration("12"));
        assert!(looks_like_place("Remote"));
        assert!(!looks_like_place("6 yrs"));
    }
}
