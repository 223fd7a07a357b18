use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::domain::lead::{LeadCandidate, PROFILE_BASE_URL};

const MAX_DRAW_ATTEMPTS: usize = 50;

const FIRST_NAMES: [&str; 30] = [
    "Michael", "Jennifer", "Robert", "Tane", "Karen", "Steven", "Linda", "Rawiri", "Craig", "Priya",
    "Daniel", "Grace", "Wayne", "Sophie", "Ian", "Hannah", "Liam", "Aroha", "Peter", "Megan",
    "Nathan", "Olivia", "Scott", "Mere", "Andrew", "Chloe", "Brendan", "Leah", "Trevor", "Ngaio",
];

const LAST_NAMES: [&str; 30] = [
    "Anderson", "Walsh", "Hughes", "Wiremu", "Mitchell", "Park", "Foster", "Henare", "McDonald",
    "Sharma", "O'Sullivan", "Lee", "Barrett", "Turner", "Campbell", "Nguyen", "Kelly", "Parata",
    "Thompson", "Ryan", "Fraser", "Chen", "Bennett", "Tipene", "Morrison", "Gill", "Doyle", "Watts",
    "Kaur", "Sinclair",
];

const JOB_TITLES: [&str; 16] = [
    "Steel Fabrication Manager",
    "Corrosion Engineer",
    "Maintenance Director",
    "Shipyard Operations Manager",
    "Procurement Specialist - Coatings",
    "Quality Control Manager",
    "Site Engineer",
    "Workshop Foreman",
    "Rust Prevention Specialist",
    "Materials Engineer",
    "Fabrication Supervisor",
    "Protective Coatings Inspector",
    "Plant Manager",
    "Supply Chain Manager",
    "Underground Mining Engineer",
    "Asset Integrity Lead",
];

/// (company, city, state, country)
const COMPANY_SITES: [(&str, &str, &str, &str); 15] = [
    ("Precision Steel WA", "Perth", "WA", "AU"),
    ("AusCoat Solutions", "Melbourne", "VIC", "AU"),
    ("Iron Range Mining", "Kalgoorlie", "WA", "AU"),
    ("Pacific Dockyard NZ", "Wellington", "Wellington", "NZ"),
    ("BHP Nickel West", "Perth", "WA", "AU"),
    ("Steel Blue Fabrications", "Geelong", "VIC", "AU"),
    ("Fortescue Metals Group", "Port Hedland", "WA", "AU"),
    ("Kiwi Steel Structures", "Auckland", "Auckland", "NZ"),
    ("Coastal Engineering VIC", "Frankston", "VIC", "AU"),
    ("Rio Tinto Iron Ore", "Newman", "WA", "AU"),
    ("Murray Steel Works", "Ballarat", "VIC", "AU"),
    ("Downer Group", "Perth", "WA", "AU"),
    ("Tasman Steel NZ", "Christchurch", "Canterbury", "NZ"),
    ("BlueScope Steel", "Melbourne", "VIC", "AU"),
    ("Newmont Boddington", "Boddington", "WA", "AU"),
];

/// Most synthetic leads one keyword set can produce.
pub const NAME_POOL_SIZE: usize = FIRST_NAMES.len() * LAST_NAMES.len();

/// Stable seed for a keyword set: order, case and repeats do not matter.
pub fn keyword_seed(keywords: &[String]) -> u64 {
    let normalized: BTreeSet<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    let digest = Sha256::digest(normalized.iter().join("\n").as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(seed)
}

fn pick<'a, T>(rng: &mut StdRng, pool: &'a [T]) -> &'a T {
    &pool[rng.gen_range(0..pool.len())]
}

type NamePair = (&'static str, &'static str);

fn draw_name(rng: &mut StdRng, used: &HashSet<NamePair>) -> Option<NamePair> {
    for _ in 0..MAX_DRAW_ATTEMPTS {
        let pair = (*pick(rng, &FIRST_NAMES), *pick(rng, &LAST_NAMES));
        if !used.contains(&pair) {
            return Some(pair);
        }
    }

    // Crowded pool: take the first free pair in a fixed order.
    FIRST_NAMES
        .iter()
        .cartesian_product(LAST_NAMES.iter())
        .map(|(first, last)| (*first, *last))
        .find(|pair| !used.contains(pair))
}

fn profile_slug(first: &str, last: &str, suffix: u32) -> String {
    let slug: String = format!("{}-{}", first, last)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    format!("{}/in/{}-{}", PROFILE_BASE_URL, slug, suffix)
}

/// Produces `max_results` synthetic leads (capped at [`NAME_POOL_SIZE`]),
/// identical for identical keyword sets. `on_record` observes each lead as
/// it is generated, with the running count.
pub fn generate_leads(
    keywords: &[String],
    max_results: usize,
    mut on_record: impl FnMut(usize, &LeadCandidate),
) -> Vec<LeadCandidate> {
    let mut rng = StdRng::seed_from_u64(keyword_seed(keywords));
    let target = max_results.min(NAME_POOL_SIZE);

    let mut used = HashSet::new();
    let mut leads = Vec::with_capacity(target);

    while leads.len() < target {
        let Some((first, last)) = draw_name(&mut rng, &used) else {
            break;
        };
        used.insert((first, last));

        let job_title = *pick(&mut rng, &JOB_TITLES);
        let (company, city, state, country) = *pick(&mut rng, &COMPANY_SITES);
        let suffix = rng.gen_range(1000..10000);

        let lead = LeadCandidate {
            first_name: first.to_string(),
            last_name: last.to_string(),
            job_title: job_title.to_string(),
            company_name: company.to_string(),
            profile_url: profile_slug(first, last, suffix),
            location_city: city.to_string(),
            location_state: state.to_string(),
            location_country: country.to_string(),
        };

        leads.push(lead);
        on_record(leads.len(), &leads[leads.len() - 1]);
    }

    leads
}
