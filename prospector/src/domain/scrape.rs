use std::fmt;

use serde::{Deserialize, Serialize};

use super::lead::LeadCandidate;

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Treats blank values as "not configured".
    pub fn from_parts(email: Option<String>, password: Option<String>) -> Option<Self> {
        match (email, password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(Credentials {
                    email: email.trim().to_string(),
                    password,
                })
            }
            _ => None,
        }
    }

    /// `abc***@example.com`, safe to put in logs.
    pub fn masked_email(&self) -> String {
        let prefix: String = self.email.chars().take(3).collect();
        match self.email.split_once('@') {
            Some((_, domain)) => format!("{}***@{}", prefix, domain),
            None => format!("{}***@***", prefix),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.masked_email())
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub keywords: Vec<String>,
    pub location: String,
    pub max_results: usize,
    /// Takes precedence over the configured default credentials.
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Live,
    Synthetic,
}

/// What a finished scrape hands to whoever persists the leads.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub leads: Vec<LeadCandidate>,
    pub source: LeadSource,
    pub message: String,
}

impl ScrapeOutcome {
    pub fn completed(leads: Vec<LeadCandidate>, source: LeadSource) -> Self {
        let message = completion_message(leads.len());
        ScrapeOutcome {
            leads,
            source,
            message,
        }
    }

    pub fn found(&self) -> usize {
        self.leads.len()
    }
}

pub fn completion_message(found: usize) -> String {
    format!("Complete. Found {} leads.", found)
}

/// A point-in-time view of a job, as a polling caller sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeProgress {
    pub state: JobState,
    pub found: usize,
    pub message: String,
    pub source: Option<LeadSource>,
    pub leads: Vec<LeadCandidate>,
}

impl Default for ScrapeProgress {
    fn default() -> Self {
        ScrapeProgress {
            state: JobState::Idle,
            found: 0,
            message: "Idle".to_string(),
            source: None,
            leads: vec![],
        }
    }
}
