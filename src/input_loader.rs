use std::fs::{self, File};
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use log::{error, info, warn};
use serde::Deserialize;
use url::Url;

use crate::error::LoadError;

/// One profile to scrape, in input order.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TargetRecord {
    #[serde(
        rename = "url",
        alias = "URL",
        alias = "Url",
        alias = "profile",
        alias = "Profile",
        alias = "linkedinUrl",
        alias = "linkedin_url"
    )]
    pub url: String,
    #[serde(default, alias = "Name", alias = "label")]
    pub name: Option<String>,
}

impl TargetRecord {
    pub fn new(url: impl Into<String>) -> Self {
        TargetRecord {
            url: url.into(),
            name: None,
        }
    }
}

/// Loads targets from `.csv`, `.xlsx`/`.xls`, `.json` or a plain list of URLs.
pub fn load_targets<P: AsRef<Path>>(filename: P) -> Result<Vec<TargetRecord>, LoadError> {
    let path_ref = filename.as_ref();
    let ext = path_ref
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let records = match ext.as_str() {
        "xlsx" | "xls" => load_excel(path_ref)?,
        "csv" => load_csv(path_ref)?,
        "json" => load_json(path_ref)?,
        _ => load_lines(path_ref)?,
    };

    if records.is_empty() {
        return Err(LoadError::Empty(path_ref.display().to_string()));
    }
    info!("Loaded {} targets from {:?}", records.len(), path_ref);
    Ok(records)
}

fn io_err(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn load_csv(path: &Path) -> Result<Vec<TargetRecord>, LoadError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = Vec::new();
    for result in rdr.deserialize::<TargetRecord>() {
        match result {
            Ok(record) if !record.url.is_empty() => records.push(record),
            Ok(_) => {}
            Err(e) if records.is_empty() && e.is_io_error() => {
                return Err(LoadError::Csv {
                    path: path.display().to_string(),
                    source: e,
                })
            }
            Err(e) => error!("Error parsing CSV record: {}", e),
        }
    }
    Ok(records)
}

fn load_json(path: &Path) -> Result<Vec<TargetRecord>, LoadError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Bare(String),
        Record(TargetRecord),
    }

    let raw = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let entries: Vec<Entry> = serde_json::from_str(&raw).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Bare(url) => TargetRecord::new(url),
            Entry::Record(record) => record,
        })
        .filter(|r| !r.url.trim().is_empty())
        .collect())
}

fn load_lines(path: &Path) -> Result<Vec<TargetRecord>, LoadError> {
    let raw = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(TargetRecord::new)
        .collect())
}

fn load_excel(path: &Path) -> Result<Vec<TargetRecord>, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::Excel {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let mut records = Vec::new();
    let worksheets = workbook.worksheets();
    let Some((_name, range)) = worksheets.first() else {
        return Ok(records);
    };

    let mut url_idx = None;
    let mut name_idx = None;
    for (row_idx, row) in range.rows().enumerate() {
        if row_idx == 0 {
            for (col_idx, cell) in row.iter().enumerate() {
                let header = cell.to_string().to_lowercase();
                if header.contains("url") || header.contains("profile") || header.contains("link") {
                    url_idx.get_or_insert(col_idx);
                } else if header.contains("name") {
                    name_idx.get_or_insert(col_idx);
                }
            }
            if url_idx.is_none() {
                warn!("Workbook header has no URL column; using the first column.");
                url_idx = Some(0);
            }
            continue;
        }

        let url = url_idx
            .and_then(|i| row.get(i))
            .map(|c| c.to_string().trim().to_string())
            .unwrap_or_default();
        let name = name_idx
            .and_then(|i| row.get(i))
            .map(|c| c.to_string())
            .filter(|s| !s.is_empty());

        if !url.is_empty() {
            records.push(TargetRecord { url, name });
        }
    }
    Ok(records)
}

fn is_locale_segment(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 5
        && bytes[0].is_ascii_lowercase()
        && bytes[1].is_ascii_lowercase()
        && bytes[2] == b'_'
        && bytes[3].is_ascii_uppercase()
        && bytes[4].is_ascii_uppercase()
}

/// Canonical form of a profile URL: https, no locale segment, no query,
/// fragment or trailing slash. `None` when the input is not a usable URL or
/// has no `/in/<id>` segment.
pub fn normalize_profile_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    if !host.contains('.') {
        return None;
    }
    url.set_scheme("https").ok()?;
    url.set_query(None);
    url.set_fragment(None);

    let segments: Vec<String> = url
        .path_segments()
        .map(|segs| {
            segs.filter(|s| !s.is_empty() && !is_locale_segment(s))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();
    url.set_path(&segments.join("/"));

    let canonical = url.as_str().trim_end_matches('/').to_string();
    public_identifier(&canonical)?;
    Some(canonical)
}

/// The `/in/<id>` slug of a profile URL.
pub fn public_identifier(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "in" {
            return segments.next().filter(|s| !s.is_empty()).map(|s| s.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn normalizes_profile_urls() {
        assert_eq!(
            normalize_profile_url("http://www.linkedin.com/in/jane-doe/en_US/?trk=abc#top").as_deref(),
            Some("https://www.linkedin.com/in/jane-doe")
        );
        assert_eq!(
            normalize_profile_url("www.linkedin.com/in/jane-doe/").as_deref(),
            Some("https://www.linkedin.com/in/jane-doe")
        );
        assert_eq!(normalize_profile_url("   "), None);
        assert_eq!(normalize_profile_url("not a url at all"), None);
    }

    #[test]
    fn non_profile_pages_are_rejected() {
        assert_eq!(normalize_profile_url("https://www.linkedin.com/company/acme"), None);
        assert_eq!(normalize_profile_url("https://www.linkedin.com/in/"), None);
        assert_eq!(normalize_profile_url("https://www.linkedin.com/feed/"), None);
        assert_eq!(
            normalize_profile_url("linkedin.com/in/jane-doe/en_US").as_deref(),
            Some("https://linkedin.com/in/jane-doe")
        );
    }

    #[test]
    fn extracts_public_identifier() {
        assert_eq!(
            public_identifier("https://www.linkedin.com/in/jane-doe/details/skills").as_deref(),
            Some("jane-doe")
        );
        assert_eq!(public_identifier("https://www.linkedin.com/company/acme"), None);
    }

    #[test]
    fn loads_csv_with_header_aliases() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "linkedinUrl,Name").unwrap();
        writeln!(file, "https://www.linkedin.com/in/a , Ann").unwrap();
        writeln!(file, "https://www.linkedin.com/in/b,").unwrap();

        let targets = load_targets(file.path()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].url, "https://www.linkedin.com/in/a");
        assert_eq!(targets[0].name.as_deref(), Some("Ann"));
    }

    #[test]
    fn loads_json_strings_and_objects() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"["https://x.com/in/a", {{"url": "https://x.com/in/b", "name": "B"}}]"#).unwrap();

        let targets = load_targets(file.path()).unwrap();
        assert_eq!(targets, vec![
            TargetRecord::new("https://x.com/in/a"),
            TargetRecord { url: "https://x.com/in/b".into(), name: Some("B".into()) },
        ]);
    }

    #[test]
    fn loads_plain_lists_and_rejects_empty_files() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "# batch one\n\nhttps://x.com/in/a\n  https://x.com/in/b  ").unwrap();
        let targets = load_targets(file.path()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].url, "https://x.com/in/b");

        let empty = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(load_targets(empty.path()), Err(LoadError::Empty(_))));
    }
}
