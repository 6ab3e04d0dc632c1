use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie editors export `no_restriction` / `unspecified` and friends;
/// anything unrecognised is treated as "not set".
fn lenient_same_site<'de, D>(deserializer: D) -> Result<Option<SameSite>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.to_ascii_lowercase().as_str() {
        "strict" => Some(SameSite::Strict),
        "lax" => Some(SameSite::Lax),
        "none" | "no_restriction" => Some(SameSite::None),
        _ => None,
    }))
}

/// One record of the credential set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default, deserialize_with = "lenient_same_site")]
    pub same_site: Option<SameSite>,
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
}

fn default_path() -> String {
    "/".to_string()
}

/// Ordered cookie jar handed to the authenticator. Never mutated by the
/// pipeline once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialSet {
    cookies: Vec<Cookie>,
}

impl CredentialSet {
    pub fn new(cookies: Vec<Cookie>) -> Self {
        CredentialSet { cookies }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref).map_err(|source| LoadError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        let set = Self::from_json(&raw).map_err(|source| LoadError::Json {
            path: path_ref.display().to_string(),
            source,
        })?;
        info!("Loaded {} cookies from {:?}", set.len(), path_ref);
        Ok(set)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let cookies: Vec<Cookie> = serde_json::from_str(raw)?;
        Ok(CredentialSet { cookies })
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// The primary authentication token, if present with a non-empty value.
    pub fn auth_token(&self, name: &str) -> Option<&Cookie> {
        self.cookies
            .iter()
            .find(|c| c.name == name && !c.value.trim().is_empty())
    }

    /// Cookies ready for injection: each `.linkedin.com` cookie is mirrored
    /// onto `.www.linkedin.com` (and back) so both hosts see the session.
    pub fn for_injection(&self) -> Vec<Cookie> {
        let mut out = Vec::with_capacity(self.cookies.len() * 2);
        for cookie in &self.cookies {
            out.push(cookie.clone());
            let mirror = match cookie.domain.to_ascii_lowercase().as_str() {
                ".linkedin.com" => Some(".www.linkedin.com"),
                ".www.linkedin.com" => Some(".linkedin.com"),
                _ => None,
            };
            if let Some(domain) = mirror {
                let exists = self
                    .cookies
                    .iter()
                    .any(|c| c.name == cookie.name && c.domain.eq_ignore_ascii_case(domain));
                if !exists {
                    let mut dup = cookie.clone();
                    dup.domain = domain.to_string();
                    out.push(dup);
                }
            }
        }
        if out.iter().any(|c| c.domain.is_empty()) {
            warn!("Some cookies carry no domain; the browser may reject them.");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {"name": "li_at", "value": "AQEDAT", "domain": ".linkedin.com", "path": "/",
         "httpOnly": true, "secure": true, "sameSite": "no_restriction", "expirationDate": 1767225600.5},
        {"name": "JSESSIONID", "value": "ajax:123", "domain": ".www.linkedin.com", "secure": true,
         "sameSite": "unspecified"},
        {"name": "lang", "value": "v=2&lang=en-us", "domain": ".linkedin.com", "sameSite": "Lax"}
    ]"#;

    #[test]
    fn parses_cookie_editor_export() {
        let set = CredentialSet::from_json(EXPORT).unwrap();
        assert_eq!(set.len(), 3);

        let li_at = &set.cookies()[0];
        assert!(li_at.http_only);
        assert_eq!(li_at.same_site, Some(SameSite::None));
        assert_eq!(li_at.expires, Some(1767225600.5));

        let session = &set.cookies()[1];
        assert_eq!(session.path, "/");
        assert_eq!(session.same_site, None);
        assert_eq!(set.cookies()[2].same_site, Some(SameSite::Lax));
    }

    #[test]
    fn auth_token_requires_a_value() {
        let set = CredentialSet::from_json(EXPORT).unwrap();
        assert!(set.auth_token("li_at").is_some());
        assert!(set.auth_token("missing").is_none());

        let blank = CredentialSet::from_json(r#"[{"name": "li_at", "value": "  "}]"#).unwrap();
        assert!(blank.auth_token("li_at").is_none());
    }

    #[test]
    fn injection_mirrors_linkedin_domains() {
        let set = CredentialSet::from_json(EXPORT).unwrap();
        let injected = set.for_injection();
        let domains: Vec<(&str, &str)> = injected
            .iter()
            .map(|c| (c.name.as_str(), c.domain.as_str()))
            .collect();

        assert!(domains.contains(&("li_at", ".www.linkedin.com")));
        assert!(domains.contains(&("JSESSIONID", ".linkedin.com")));
        assert_eq!(injected.len(), 6);
        // the original jar is left untouched
        assert_eq!(set.len(), 3);
    }
}
