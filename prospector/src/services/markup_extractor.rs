use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::domain::lead::{canonical_profile_url, split_title_company, LeadCandidate, Location};

const MAX_CARD_LINES: usize = 6;

const NOISE_LINES: [&str; 11] = [
    "Connect",
    "Message",
    "Follow",
    "Pending",
    "View",
    "View profile",
    "Send InMail",
    "More",
    "…",
    "Promoted",
    "Premium",
];

const NOISE_PREFIXES: [&str; 2] = ["Are these results", "Try Premium"];

static CARD: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-view-name="people-search-result"]"#));
static PROFILE_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href*="/in/"]"#));
static TITLE_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"a[data-view-name="search-result-lockup-title"]"#));
static VISIBLE_NAME: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[aria-hidden="true"]"#));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector(r#"[role="listitem"]"#));

static DEGREE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| regex(r"\s*[•·]\s*(1st|2nd|3rd)\+?\s*$"));
static DEGREE_ONLY: LazyLock<Regex> = LazyLock::new(|| regex(r"^[•·]?\s*(1st|2nd|3rd)\+?$"));
static LOCATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    regex(concat!(
        r"\b(Australia|New Zealand|Victoria|Queensland|Western Australia|",
        r"New South Wales|South Australia|Tasmania|Northern Territory|",
        r"NSW|WA|VIC|QLD|SA|TAS|NT|ACT|",
        r"Auckland|Wellington|Canterbury|Waikato|Greater .+ Area)\b",
    ))
});
static TRAILING_PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| regex(r"\s*\(.*?\)\s*$"));
static CURRENT_LINE: LazyLock<Regex> = LazyLock::new(|| regex(r"Current:\s*(.+?)(?:\n|$)"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex must compile")
}

/// Text content of one result card, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCard {
    pub name: String,
    pub url: String,
    pub lines: Vec<String>,
    pub full_text: String,
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().join(" "))
}

fn card_name(card: &ElementRef) -> String {
    let Some(title) = card.select(&TITLE_LINK).next() else {
        return String::new();
    };

    // The link also carries a visually-hidden "View X's profile" label.
    match title.select(&VISIBLE_NAME).next() {
        Some(visible) => element_text(&visible),
        None => element_text(&title),
    }
}

fn read_card(card: ElementRef) -> RawCard {
    let name = card_name(&card);

    let url = card
        .select(&PROFILE_LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(canonical_profile_url)
        .unwrap_or_default();

    let lines = card
        .select(&PARAGRAPH)
        .map(|p| element_text(&p))
        .filter(|text| text.chars().count() >= 2)
        .filter(|text| name.is_empty() || !text.contains(&name))
        .filter(|text| !DEGREE_ONLY.is_match(text))
        .take(MAX_CARD_LINES)
        .collect();

    let full_text = card
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .join("\n");

    RawCard {
        name,
        url,
        lines,
        full_text,
    }
}

/// Reads every result card on a search page.
pub fn read_cards(page_html: &str) -> Vec<RawCard> {
    let document = Html::parse_document(page_html);
    document.select(&CARD).map(read_card).collect()
}

fn is_noise(line: &str) -> bool {
    NOISE_LINES.contains(&line) || NOISE_PREFIXES.iter().any(|p| line.starts_with(p))
}

fn company_from_current_line(line: &str) -> Option<String> {
    split_title_company(line, " at ")
        .map(|(_, company)| TRAILING_PARENTHETICAL.replace(&company, "").trim().to_string())
        .filter(|company| !company.is_empty())
}

/// Interprets a card. Returns `None` when the name cannot identify a person.
pub fn parse_card(card: &RawCard) -> Option<LeadCandidate> {
    let full_name = DEGREE_SUFFIX.replace(card.name.trim(), "").trim().to_string();
    let lead = LeadCandidate::from_full_name(&full_name)?;

    let mut job_title = String::new();
    let mut location_text = String::new();
    let mut company_name = String::new();

    for line in card.lines.iter().map(|l| l.trim()) {
        if line.is_empty() || is_noise(line) {
            continue;
        }

        if location_text.is_empty() && LOCATION_LINE.is_match(line) {
            location_text = line.to_string();
            continue;
        }

        if line.starts_with("Current:") || line.starts_with("Past:") {
            if let Some(company) = company_from_current_line(line) {
                company_name = company;
            }
            continue;
        }

        if job_title.is_empty() && line.chars().count() > 2 {
            job_title = line.to_string();
        }
    }

    for separator in [" at ", " @ "] {
        if !company_name.is_empty() {
            break;
        }
        if let Some((title, company)) = split_title_company(&job_title, separator) {
            job_title = title;
            company_name = company;
        }
    }

    if company_name.is_empty() {
        if let Some(current) = CURRENT_LINE.captures(&card.full_text).and_then(|c| c.get(1)) {
            company_name = company_from_current_line(current.as_str().trim()).unwrap_or_default();
        }
    }

    let lead = LeadCandidate {
        job_title,
        company_name,
        profile_url: card.url.clone(),
        ..lead
    };

    Some(match location_text.is_empty() {
        true => lead,
        false => lead.with_location(Location::parse(&location_text)),
    })
}

/// Extracts leads from a rendered search page, skipping cards that do not
/// name a person.
pub fn extract_from_markup(page_html: &str) -> Vec<LeadCandidate> {
    read_cards(page_html)
        .iter()
        .filter_map(|card| {
            let lead = parse_card(card);
            if lead.is_none() {
                log::debug!("Skipping card without a usable name: {:?}", card.name);
            }
            lead
        })
        .collect()
}

/// Element counts that explain an empty extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDiagnostics {
    pub search_cards: usize,
    pub profile_links: usize,
    pub title_links: usize,
    pub list_items: usize,
}

impl PageDiagnostics {
    pub fn from_html(page_html: &str) -> Self {
        let document = Html::parse_document(page_html);
        PageDiagnostics {
            search_cards: document.select(&CARD).count(),
            profile_links: document.select(&PROFILE_LINK).count(),
            title_links: document.select(&TITLE_LINK).count(),
            list_items: document.select(&LIST_ITEM).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_from_markup, parse_card, read_cards, PageDiagnostics, RawCard};

    fn card_html(name: &str, href: &str, lines: &[&str]) -> String {
        let paragraphs: String = lines.iter().map(|l| format!("<p>{}</p>", l)).collect();
        format!(
            r#"<li role="listitem"><div data-view-name="people-search-result">
                <a href="{href}"><img alt=""></a>
                <p><a data-view-name="search-result-lockup-title" href="{href}">
                    <span aria-hidden="true">{name}</span>
                    <span class="visually-hidden">View {name}'s profile</span>
                </a> • 2nd</p>
                {paragraphs}
                <button>Connect</button>
            </div></li>"#
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body><ul>{}</ul></body></html>", cards.join(""))
    }

    #[test]
    fn extract_from_markup_valid() {
        let html = page(&[card_html(
            "Jennifer Walsh",
            "https://www.linkedin.com/in/jennifer-walsh?miniProfileUrn=urn%3Ali%3Afs",
            &[
                "Corrosion Engineer at AusCoat Solutions",
                "Melbourne, Victoria, Australia",
                "Message",
            ],
        )]);

        let leads = extract_from_markup(&html);

        assert_eq!(leads.len(), 1);
        let lead = &leads[0];
        assert_eq!(lead.first_name, "Jennifer");
        assert_eq!(lead.last_name, "Walsh");
        assert_eq!(lead.job_title, "Corrosion Engineer");
        assert_eq!(lead.company_name, "AusCoat Solutions");
        assert_eq!(lead.profile_url, "https://www.linkedin.com/in/jennifer-walsh");
        assert_eq!(lead.location_city, "Melbourne");
        assert_eq!(lead.location_state, "Victoria");
        assert_eq!(lead.location_country, "AU");
    }

    #[test]
    fn extract_from_markup_drops_placeholder() {
        let html = page(&[
            card_html("LinkedIn Member", "/in/hidden", &["Plant Manager"]),
            card_html("Wayne Barrett", "/in/wayne-barrett", &["Plant Manager @ Tasman Steel NZ"]),
        ]);

        let leads = extract_from_markup(&html);

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].full_name(), "Wayne Barrett");
        assert_eq!(leads[0].job_title, "Plant Manager");
        assert_eq!(leads[0].company_name, "Tasman Steel NZ");
        assert_eq!(leads[0].profile_url, "https://www.linkedin.com/in/wayne-barrett");
    }

    #[test]
    fn read_cards_skips_name_and_degree_lines() {
        let html = page(&[card_html(
            "Grace Lee",
            "/in/grace-lee",
            &["• 3rd+", "Coatings Inspector"],
        )]);

        let cards = read_cards(&html);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Grace Lee");
        assert_eq!(cards[0].lines, vec!["Coatings Inspector"]);
    }

    #[test]
    fn parse_card_current_line_company() {
        let card = RawCard {
            name: "Craig McDonald • 1st".to_string(),
            url: String::new(),
            lines: vec![
                "Rust Prevention Specialist".to_string(),
                "Greater Perth Area".to_string(),
                "Current: Specialist at Coastal Engineering (Contract)".to_string(),
            ],
            full_text: String::new(),
        };

        let lead = parse_card(&card).unwrap();

        assert_eq!(lead.last_name, "McDonald");
        assert_eq!(lead.job_title, "Rust Prevention Specialist");
        assert_eq!(lead.company_name, "Coastal Engineering");
        assert_eq!(lead.location_city, "Perth");
    }

    #[test]
    fn parse_card_past_line_company() {
        let card = RawCard {
            name: "Trevor Watts".to_string(),
            url: String::new(),
            lines: vec![
                "Shipyard Operations Manager".to_string(),
                "Past: Foreman at Murray Steel Works (2019 - 2022)".to_string(),
            ],
            full_text: String::new(),
        };

        let lead = parse_card(&card).unwrap();

        assert_eq!(lead.job_title, "Shipyard Operations Manager");
        assert_eq!(lead.company_name, "Murray Steel Works");
    }

    #[test]
    fn parse_card_company_from_full_text() {
        let card = RawCard {
            name: "Linda Foster".to_string(),
            url: String::new(),
            lines: vec!["Site Engineer".to_string()],
            full_text: [
                "Linda Foster",
                "Site Engineer",
                "Current: Engineer at Fortescue Metals Group",
                "Connect",
            ]
            .join("\n"),
        };

        let lead = parse_card(&card).unwrap();

        assert_eq!(lead.job_title, "Site Engineer");
        assert_eq!(lead.company_name, "Fortescue Metals Group");
    }

    #[test]
    fn parse_card_first_location_wins() {
        let card = RawCard {
            name: "Tane Wiremu".to_string(),
            url: String::new(),
            lines: vec![
                "Wellington, Wellington, New Zealand".to_string(),
                "Shipyard Operations Manager".to_string(),
                "Auckland, New Zealand".to_string(),
            ],
            full_text: String::new(),
        };

        let lead = parse_card(&card).unwrap();

        assert_eq!(lead.location_city, "Wellington");
        assert_eq!(lead.location_country, "NZ");
        assert_eq!(lead.job_title, "Shipyard Operations Manager");
    }

    #[test]
    fn parse_card_rejects_short_name() {
        let card = RawCard {
            name: "J • 2nd".to_string(),
            ..Default::default()
        };

        assert!(parse_card(&card).is_none());
    }

    #[test]
    fn page_diagnostics_counts() {
        let html = page(&[
            card_html("Grace Lee", "/in/grace-lee", &[]),
            card_html("Ian Campbell", "/in/ian-campbell", &[]),
        ]);

        let diagnostics = PageDiagnostics::from_html(&html);

        assert_eq!(diagnostics.search_cards, 2);
        assert_eq!(diagnostics.title_links, 2);
        assert_eq!(diagnostics.profile_links, 4);
        assert_eq!(diagnostics.list_items, 2);
    }
}
