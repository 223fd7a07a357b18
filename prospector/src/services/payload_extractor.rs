use itertools::Itertools;
use serde_json::{Map, Value};

use crate::domain::lead::{
    canonical_profile_url, is_placeholder_name, split_title_company, LeadCandidate, Location,
    PROFILE_BASE_URL,
};

/// Deepest nesting the walk descends into. Real search responses sit well
/// within this; anything deeper is not worth the stack.
const MAX_DEPTH: usize = 15;

type Object = Map<String, Value>;

/// A string, or an object carrying its string under `text`.
fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(o) => o.get("text").and_then(Value::as_str),
        _ => None,
    }
}

fn str_field<'a>(object: &'a Object, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn navigation_url(object: &Object) -> String {
    let from_context = match object.get("navigationContext") {
        Some(Value::Object(context)) => str_field(context, "url"),
        Some(Value::String(url)) => Some(url.as_str()),
        _ => None,
    };

    from_context
        .filter(|url| !url.is_empty())
        .or_else(|| str_field(object, "navigationUrl"))
        .unwrap_or_default()
        .to_string()
}

fn is_type_metadata(object: &Object) -> bool {
    match str_field(object, "$type") {
        Some(kind) => {
            let kind = kind.to_lowercase();
            kind.contains("schema") || kind.contains("metadata")
        }
        None => false,
    }
}

/// Title usable as a display name: a `{text}` object, or a string longer
/// than `min_len` characters that is not the placeholder.
fn has_usable_title(object: &Object, min_len: usize) -> bool {
    match object.get("title") {
        Some(Value::Object(title)) => title.contains_key("text"),
        Some(Value::String(title)) => {
            title.chars().count() > min_len && !is_placeholder_name(title)
        }
        _ => false,
    }
}

/// Recognises the three shapes person records take in search responses.
fn looks_like_person(object: &Object) -> bool {
    if is_type_metadata(object) {
        return false;
    }

    let explicit_name = matches!(
        (str_field(object, "firstName"), str_field(object, "lastName")),
        (Some(first), Some(last)) if !first.is_empty() && !last.is_empty()
    );
    let has_identity = object.contains_key("entityUrn") || object.contains_key("publicIdentifier");
    if explicit_name && has_identity {
        return true;
    }

    if object.contains_key("primarySubtitle") && has_usable_title(object, 1) {
        return true;
    }

    navigation_url(object).contains("/in/") && has_usable_title(object, 2)
}

fn is_person_urn(urn: &str) -> bool {
    let urn = urn.to_lowercase();
    urn.contains("member") || urn.contains("profile")
}

fn profile_url(object: &Object) -> String {
    let url = navigation_url(object);
    if !url.is_empty() {
        return canonical_profile_url(&url);
    }

    if let Some(public_id) = str_field(object, "publicIdentifier").filter(|id| !id.is_empty()) {
        return format!("{}/in/{}", PROFILE_BASE_URL, public_id);
    }

    match str_field(object, "entityUrn") {
        Some(urn) if is_person_urn(urn) => match urn.rsplit(':').next() {
            Some(id) if !id.is_empty() => format!("{}/in/{}", PROFILE_BASE_URL, id),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

fn headline(object: &Object) -> String {
    ["primarySubtitle", "headline", "occupation"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(text_of))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn location_text(object: &Object) -> String {
    if let Some(subtitle) = object.get("secondarySubtitle") {
        return text_of(subtitle).unwrap_or_default().to_string();
    }

    match object.get("location") {
        Some(Value::Object(location)) => str_field(location, "name")
            .filter(|name| !name.is_empty())
            .or_else(|| str_field(location, "text"))
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn parse_person(object: &Object) -> Option<LeadCandidate> {
    let lead = match (str_field(object, "firstName"), str_field(object, "lastName")) {
        (Some(first), Some(last)) if !first.trim().is_empty() => LeadCandidate {
            first_name: first.trim().to_string(),
            last_name: last.trim().to_string(),
            ..Default::default()
        },
        _ => LeadCandidate::from_full_name(object.get("title").and_then(text_of)?)?,
    };
    if !lead.is_admissible() {
        return None;
    }

    let headline = headline(object);
    let (job_title, company_name) = split_title_company(&headline, " at ")
        .unwrap_or((headline.trim().to_string(), String::new()));

    let location = location_text(object);
    let lead = LeadCandidate {
        job_title,
        company_name,
        profile_url: profile_url(object),
        ..lead
    };

    Some(match location.trim().is_empty() {
        true => lead,
        false => lead.with_location(Location::parse(&location)),
    })
}

fn walk(value: &Value, depth: usize, found: &mut Vec<LeadCandidate>) {
    if depth > MAX_DEPTH {
        return;
    }

    match value {
        Value::Object(object) => {
            if looks_like_person(object) {
                // A person record's children are its own fields, never
                // further people.
                if let Some(lead) = parse_person(object) {
                    found.push(lead);
                }
                return;
            }
            for child in object.values() {
                walk(child, depth + 1, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, depth + 1, found);
            }
        }
        _ => {}
    }
}

/// Collects people from intercepted search responses, deduplicated by
/// dedup key in first-seen order.
pub fn extract_from_payloads(payloads: &[Value]) -> Vec<LeadCandidate> {
    let mut found = vec![];
    for payload in payloads {
        walk(payload, 0, &mut found);
    }

    found.into_iter().unique_by(LeadCandidate::dedup_key).collect()
}
