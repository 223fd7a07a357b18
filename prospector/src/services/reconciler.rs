use std::collections::{HashMap, HashSet};

use crate::domain::lead::LeadCandidate;

/// Fills gaps in markup-derived leads from payload-derived ones.
///
/// A markup lead is matched by profile URL first, then by lowercase name.
/// Only its empty fields are filled; the inputs are left untouched and new
/// leads are returned in the markup order.
pub fn merge(dom_leads: &[LeadCandidate], api_leads: &[LeadCandidate]) -> Vec<LeadCandidate> {
    let mut by_url: HashMap<&str, &LeadCandidate> = HashMap::new();
    let mut by_name: HashMap<String, &LeadCandidate> = HashMap::new();
    for lead in api_leads {
        if !lead.profile_url.is_empty() {
            by_url.insert(&lead.profile_url, lead);
        }
        by_name.insert(lead.name_key(), lead);
    }

    dom_leads
        .iter()
        .map(|dom| {
            let matched = by_url
                .get(dom.profile_url.as_str())
                .filter(|_| !dom.profile_url.is_empty())
                .or_else(|| by_name.get(&dom.name_key()));

            match matched {
                Some(api) => dom.fill_missing_from(api),
                None => dom.clone(),
            }
        })
        .collect()
}

/// Dedup keys accepted so far in one scrape run.
#[derive(Debug, Default)]
pub struct SeenLeads {
    keys: HashSet<String>,
}

impl SeenLeads {
    /// Records the lead's key. Returns `false` if it was already present.
    pub fn admit(&mut self, lead: &LeadCandidate) -> bool {
        self.keys.insert(lead.dedup_key())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
