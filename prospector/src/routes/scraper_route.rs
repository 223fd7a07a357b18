use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    configuration::ScraperSettings,
    domain::scrape::{Credentials, ScrapeProgress, ScrapeRequest},
    services::{DroidLauncher, LeadScraper, ScrapeJob},
};

const DEFAULT_LOCATION: &str = "Australia";
const DEFAULT_KEYWORD_COUNT: usize = 5;
/// How long a finished job stays pollable, counted from its start.
const FINISHED_JOB_RETENTION: Duration = Duration::from_secs(60 * 60);

struct TrackedJob {
    job: ScrapeJob,
    started: Instant,
}

/// Handles of recent jobs, keyed by job id. Finished jobs older than the
/// retention window are dropped whenever a new job is registered; running
/// jobs are never dropped.
pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, TrackedJob>>,
    retention: Duration,
}

impl Default for JobRegistry {
    fn default() -> Self {
        JobRegistry::with_retention(FINISHED_JOB_RETENTION)
    }
}

impl JobRegistry {
    pub fn with_retention(retention: Duration) -> Self {
        JobRegistry {
            jobs: Mutex::new(HashMap::new()),
            retention,
        }
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<Uuid, TrackedJob>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prune(&self, jobs: &mut HashMap<Uuid, TrackedJob>) {
        jobs.retain(|id, tracked| {
            let expired =
                tracked.started.elapsed() >= self.retention && tracked.job.is_finished();
            if expired {
                log::info!("Dropping finished scrape job {}", id);
            }
            !expired
        });
    }

    pub fn insert(&self, job: ScrapeJob) -> Uuid {
        let id = job.id;
        let mut jobs = self.jobs();
        self.prune(&mut jobs);
        jobs.insert(
            id,
            TrackedJob {
                job,
                started: Instant::now(),
            },
        );
        id
    }

    pub fn progress(&self, id: &Uuid) -> Option<ScrapeProgress> {
        self.jobs().get(id).map(|tracked| tracked.job.progress())
    }

    pub fn len(&self) -> usize {
        self.jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs().is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StartScrapeBody {
    /// Comma-separated.
    #[serde(default)]
    keywords: String,
    location: Option<String>,
    max_results: Option<usize>,
    email: Option<String>,
    password: Option<String>,
}

impl StartScrapeBody {
    fn into_request(self, settings: &ScraperSettings) -> ScrapeRequest {
        let mut keywords: Vec<String> = self
            .keywords
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            keywords = settings
                .industry_keywords
                .iter()
                .take(DEFAULT_KEYWORD_COUNT)
                .cloned()
                .collect();
        }

        let location = self
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCATION.to_string());

        ScrapeRequest {
            keywords,
            location,
            max_results: self.max_results.unwrap_or(settings.max_results).max(1),
            credentials: Credentials::from_parts(self.email, self.password),
        }
    }
}

#[post("/start")]
pub async fn start_scrape(
    body: web::Json<StartScrapeBody>,
    scraper: web::Data<LeadScraper<DroidLauncher>>,
    registry: web::Data<JobRegistry>,
) -> HttpResponse {
    let request = body.into_inner().into_request(scraper.settings());
    if let Some(credentials) = &request.credentials {
        log::info!("Scrape will log in as {}", credentials.masked_email());
    }

    let job = ScrapeJob::spawn(scraper.into_inner(), request);
    let job_id = registry.insert(job);
    log::info!("Started scrape job {}", job_id);

    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

#[get("/status/{job_id}")]
pub async fn scrape_status(
    path: web::Path<Uuid>,
    registry: web::Data<JobRegistry>,
) -> HttpResponse {
    let job_id = path.into_inner();
    match registry.progress(&job_id) {
        Some(progress) => HttpResponse::Ok().json(progress),
        None => HttpResponse::NotFound().body(format!("No scrape job with id {}", job_id)),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use actix_web::{web, App};
    use uuid::Uuid;

    use crate::{
        configuration::test_scraper_settings,
        domain::scrape::{JobState, ScrapeRequest},
        services::{fakes::FakeLauncher, LeadScraper, ScrapeJob},
    };

    use super::{scrape_status, JobRegistry, StartScrapeBody};

    async fn finished_job(max_results: usize) -> ScrapeJob {
        let scraper = Arc::new(LeadScraper::new(FakeLauncher::new(5), test_scraper_settings()));
        let mut job = ScrapeJob::spawn(
            scraper,
            ScrapeRequest {
                keywords: vec!["zinc".to_string()],
                location: "NZ".to_string(),
                max_results,
                credentials: None,
            },
        );
        job.wait().await;
        job
    }

    #[test]
    fn into_request_defaults() {
        let settings = test_scraper_settings();
        let body = StartScrapeBody {
            keywords: " , ".to_string(),
            ..Default::default()
        };

        let request = body.into_request(&settings);

        assert_eq!(request.keywords, settings.industry_keywords[..5].to_vec());
        assert_eq!(request.location, "Australia");
        assert_eq!(request.max_results, settings.max_results);
        assert!(request.credentials.is_none());
    }

    #[test]
    fn into_request_overrides() {
        let body = StartScrapeBody {
            keywords: "steel, galvanising ,rust".to_string(),
            location: Some("Western Australia, Australia".to_string()),
            max_results: Some(0),
            email: Some("ops@forge.com.au".to_string()),
            password: Some("hunter2".to_string()),
        };

        let request = body.into_request(&test_scraper_settings());

        assert_eq!(request.keywords, vec!["steel", "galvanising", "rust"]);
        assert_eq!(request.location, "Western Australia, Australia");
        assert_eq!(request.max_results, 1);
        assert_eq!(request.credentials.unwrap().email, "ops@forge.com.au");
    }

    #[tokio::test]
    async fn job_registry_drops_expired_finished_jobs() {
        let registry = JobRegistry::with_retention(Duration::ZERO);

        let first = registry.insert(finished_job(2).await);
        assert!(registry.progress(&first).is_some());

        let second = registry.insert(finished_job(3).await);

        assert_eq!(registry.len(), 1);
        assert!(registry.progress(&first).is_none());
        assert_eq!(registry.progress(&second).map(|p| p.found), Some(3));
    }

    #[tokio::test]
    async fn job_registry_keeps_recent_jobs() {
        let registry = JobRegistry::default();

        let first = registry.insert(finished_job(2).await);
        registry.insert(finished_job(3).await);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.progress(&first).map(|p| p.state), Some(JobState::Completed));
    }

    #[actix_web::test]
    async fn scrape_status_unknown_job() {
        let registry = web::Data::new(JobRegistry::default());
        let app = App::new().app_data(registry).service(scrape_status);
        let app = actix_web::test::init_service(app).await;

        let req = actix_web::test::TestRequest::get()
            .uri(&format!("/status/{}", Uuid::new_v4()))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;

        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn scrape_status_known_job() {
        let registry = web::Data::new(JobRegistry::default());
        let job_id = registry.insert(finished_job(3).await);
        let app = App::new().app_data(registry).service(scrape_status);
        let app = actix_web::test::init_service(app).await;

        let req = actix_web::test::TestRequest::get()
            .uri(&format!("/status/{}", job_id))
            .to_request();
        let body: serde_json::Value = actix_web::test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["state"], serde_json::json!(JobState::Completed));
        assert_eq!(body["found"], 3);
        assert_eq!(body["message"], "Complete. Found 3 leads.");
        assert_eq!(body["leads"].as_array().map(Vec::len), Some(3));
    }
}
