use serde::{Deserialize, Serialize};
use url::Url;

/// Display name the network substitutes for profiles hidden from the viewer.
pub const PLACEHOLDER_NAME: &str = "LinkedIn Member";
pub const PROFILE_BASE_URL: &str = "https://www.linkedin.com";
pub const PRIMARY_COUNTRY: &str = "AU";
pub const SECONDARY_COUNTRY: &str = "NZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadCandidate {
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub company_name: String,
    pub profile_url: String,
    pub location_city: String,
    pub location_state: String,
    pub location_country: String,
}

impl Default for LeadCandidate {
    fn default() -> Self {
        LeadCandidate {
            first_name: String::new(),
            last_name: String::new(),
            job_title: String::new(),
            company_name: String::new(),
            profile_url: String::new(),
            location_city: String::new(),
            location_state: String::new(),
            location_country: PRIMARY_COUNTRY.to_string(),
        }
    }
}

impl LeadCandidate {
    /// Builds a candidate from a display name. Returns `None` for names that
    /// can never identify a person: empty, a single character, or the
    /// anonymized-profile placeholder.
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        let full_name = full_name.trim();
        if full_name.chars().count() < 2 || is_placeholder_name(full_name) {
            return None;
        }

        let (first_name, last_name) = split_full_name(full_name);
        if first_name.is_empty() {
            return None;
        }

        Some(LeadCandidate {
            first_name,
            last_name,
            ..Default::default()
        })
    }

    pub fn full_name(&self) -> String {
        match self.last_name.is_empty() {
            true => self.first_name.clone(),
            false => format!("{} {}", self.first_name, self.last_name),
        }
    }

    pub fn name_key(&self) -> String {
        format!("{}_{}", self.first_name, self.last_name).to_lowercase()
    }

    pub fn dedup_key(&self) -> String {
        match self.profile_url.is_empty() {
            true => self.name_key(),
            false => self.profile_url.clone(),
        }
    }

    /// A candidate is admissible once its first name survives trimming and it
    /// is not the anonymized placeholder.
    pub fn is_admissible(&self) -> bool {
        !self.first_name.trim().is_empty() && !is_placeholder_name(&self.full_name())
    }

    pub fn with_location(self, location: Location) -> Self {
        LeadCandidate {
            location_city: location.city,
            location_state: location.state,
            location_country: location.country,
            ..self
        }
    }

    /// Returns a new candidate holding every non-empty field of `self` and,
    /// for the empty ones, the values of `other`. Location moves as a unit.
    pub fn fill_missing_from(&self, other: &LeadCandidate) -> LeadCandidate {
        let pick = |own: &str, theirs: &str| match own.is_empty() {
            true => theirs.to_string(),
            false => own.to_string(),
        };

        let take_location = self.location_city.is_empty() && !other.location_city.is_empty();
        let (location_city, location_state, location_country) = match take_location {
            true => (
                other.location_city.clone(),
                other.location_state.clone(),
                match other.location_country.is_empty() {
                    true => PRIMARY_COUNTRY.to_string(),
                    false => other.location_country.clone(),
                },
            ),
            false => (
                self.location_city.clone(),
                self.location_state.clone(),
                self.location_country.clone(),
            ),
        };

        LeadCandidate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            job_title: pick(&self.job_title, &other.job_title),
            company_name: pick(&self.company_name, &other.company_name),
            profile_url: self.profile_url.clone(),
            location_city,
            location_state,
            location_country,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Location {
    /// Decomposes free-text location such as "Greater Perth Area" or
    /// "Auckland, Auckland, New Zealand" into city, state and country.
    pub fn parse(text: &str) -> Location {
        let text = text.trim();
        let text = text.strip_prefix("Greater ").unwrap_or(text).trim_start();
        let text = text.strip_suffix(" Area").unwrap_or(text).trim_end();

        let mut parts = text.split(',').map(|p| p.trim().to_string());
        let city = parts.next().unwrap_or_default();
        let state = parts.next().unwrap_or_default();

        let country = match text.contains("New Zealand") || text.contains(SECONDARY_COUNTRY) {
            true => SECONDARY_COUNTRY,
            false => PRIMARY_COUNTRY,
        };

        Location {
            city,
            state,
            country: country.to_string(),
        }
    }
}

pub fn is_placeholder_name(name: &str) -> bool {
    name.trim() == PLACEHOLDER_NAME
}

/// Splits on the first space: "Mary Jane Watson" -> ("Mary", "Jane Watson").
pub fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.trim().split_once(' ') {
        Some((first, last)) => (first.trim().to_string(), last.trim().to_string()),
        None => (full_name.trim().to_string(), String::new()),
    }
}

/// Splits "Title at Company" (or "Title @ Company") on the first separator.
pub fn split_title_company(headline: &str, separator: &str) -> Option<(String, String)> {
    headline
        .split_once(separator)
        .map(|(title, company)| (title.trim().to_string(), company.trim().to_string()))
}

/// Strips query string and fragment and resolves relative profile links
/// against the site root.
pub fn canonical_profile_url(href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    let parsed = match Url::parse(href) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(PROFILE_BASE_URL).and_then(|base| base.join(href))
        }
        Err(e) => Err(e),
    };

    match parsed {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
