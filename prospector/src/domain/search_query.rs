use url::form_urlencoded;

const SEARCH_URL: &str = "https://www.linkedin.com/search/results/people/";

const AUSTRALIA: &str = "101452733";
const NEW_ZEALAND: &str = "104107862";
const WESTERN_AUSTRALIA: &str = "106164952";
const VICTORIA: &str = "100803684";
const NEW_SOUTH_WALES: &str = "104769905";
const QUEENSLAND: &str = "104166042";

/// Known geographic filters, keyed by the exact location strings the
/// dashboard offers.
const GEO_URNS: &[(&str, &[&str])] = &[
    ("Australia", &[AUSTRALIA]),
    ("New Zealand", &[NEW_ZEALAND]),
    ("Western Australia, Australia", &[WESTERN_AUSTRALIA]),
    ("Victoria, Australia", &[VICTORIA]),
    ("New South Wales, Australia", &[NEW_SOUTH_WALES]),
    ("Queensland, Australia", &[QUEENSLAND]),
    ("AU", &[AUSTRALIA]),
    ("NZ", &[NEW_ZEALAND]),
    ("AU+NZ", &[AUSTRALIA, NEW_ZEALAND]),
];

const COMBINED_REGION: &[&str] = &[AUSTRALIA, NEW_ZEALAND];
const AUSTRALIA_ONLY: &[&str] = &[AUSTRALIA];
const NEW_ZEALAND_ONLY: &[&str] = &[NEW_ZEALAND];
const WESTERN_AUSTRALIA_ONLY: &[&str] = &[WESTERN_AUSTRALIA];
const VICTORIA_ONLY: &[&str] = &[VICTORIA];
const NEW_SOUTH_WALES_ONLY: &[&str] = &[NEW_SOUTH_WALES];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoFilter {
    pub urns: Vec<String>,
}

impl GeoFilter {
    /// Resolves free text to a filter: exact table match, then keyword
    /// matching, then the combined AU+NZ region.
    pub fn resolve(location: &str) -> GeoFilter {
        let urns = GEO_URNS
            .iter()
            .find(|(name, _)| *name == location)
            .map(|(_, urns)| *urns)
            .or_else(|| fuzzy_geo_urns(location))
            .unwrap_or(COMBINED_REGION);

        GeoFilter {
            urns: urns.iter().map(|u| u.to_string()).collect(),
        }
    }

    /// Renders `&geoUrn=["id1","id2"]`, percent-encoded the way the site's
    /// own search form does.
    pub fn to_query_param(&self) -> String {
        let urn_list = self
            .urns
            .iter()
            .map(|u| format!("%22{}%22", u))
            .collect::<Vec<String>>()
            .join("%2C");
        format!("&geoUrn=%5B{}%5D", urn_list)
    }
}

fn fuzzy_geo_urns(location: &str) -> Option<&'static [&'static str]> {
    let loc = location.trim().to_lowercase();

    if (loc.contains("australia") && loc.contains("new zealand"))
        || loc.contains("au+nz")
        || loc.contains("au & nz")
    {
        Some(COMBINED_REGION)
    } else if loc.contains("western australia") || loc == "wa" {
        Some(WESTERN_AUSTRALIA_ONLY)
    } else if loc.contains("victoria") || loc == "vic" {
        Some(VICTORIA_ONLY)
    } else if loc.contains("new south wales") || loc == "nsw" {
        Some(NEW_SOUTH_WALES_ONLY)
    } else if loc.contains("new zealand") || loc == "nz" {
        Some(NEW_ZEALAND_ONLY)
    } else if loc.contains("australia") || loc == "au" {
        Some(AUSTRALIA_ONLY)
    } else {
        None
    }
}

/// Fans a keyword list out into search queries.
///
/// The platform collapses results to almost nothing when many terms are
/// combined, so every keyword gets its own query first and a few two-term
/// pairs follow.
pub fn build_search_queries(keywords: &[String]) -> Vec<String> {
    let keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.len() <= 2 {
        return match keywords.is_empty() {
            true => vec![],
            false => vec![keywords.join(" ")],
        };
    }

    let mut queries: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();

    let last_pair = match keywords.len() > 3 {
        true => (1, 3),
        false => (1, 2),
    };
    for (a, b) in [(0, 1), (0, 2), last_pair] {
        let query = format!("{} {}", keywords[a], keywords[b]);
        if !queries.contains(&query) {
            queries.push(query);
        }
    }

    queries
}

/// A position inside one query's paginated results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursor {
    pub query_text: String,
    pub page_number: u32,
}

impl SearchCursor {
    pub fn new(query_text: &str) -> Self {
        SearchCursor {
            query_text: query_text.to_string(),
            page_number: 1,
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.page_number == 1
    }

    /// Moves to the next page only when the page just read produced new
    /// leads, or it was the first page. Returns whether the cursor moved.
    pub fn advance(&mut self, new_on_page: usize) -> bool {
        match new_on_page > 0 || self.is_first_page() {
            true => {
                self.page_number += 1;
                true
            }
            false => false,
        }
    }

    pub fn url(&self, geo: &GeoFilter) -> String {
        let keywords: String =
            form_urlencoded::byte_serialize(self.query_text.as_bytes()).collect();
        let base = format!(
            "{}?keywords={}&origin=GLOBAL_SEARCH_HEADER{}",
            SEARCH_URL,
            keywords,
            geo.to_query_param()
        );

        match self.page_number {
            1 => base,
            page => format!("{}&page={}", base, page),
        }
    }
}
