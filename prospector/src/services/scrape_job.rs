use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::scrape::{JobState, ScrapeOutcome, ScrapeProgress, ScrapeRequest};

use super::{LeadScraper, SessionLauncher};

/// Write side of one job's progress cell.
#[derive(Clone)]
pub struct ProgressReporter {
    sender: Arc<watch::Sender<ScrapeProgress>>,
}

impl ProgressReporter {
    pub fn new() -> (Self, watch::Receiver<ScrapeProgress>) {
        let (sender, receiver) = watch::channel(ScrapeProgress::default());
        (
            ProgressReporter {
                sender: Arc::new(sender),
            },
            receiver,
        )
    }

    pub fn running(&self, message: &str) {
        self.sender.send_modify(|p| {
            p.state = JobState::Running;
            p.message = message.to_string();
        });
    }

    pub fn found(&self, found: usize) {
        self.sender.send_modify(|p| p.found = found);
    }

    pub fn finish(&self, outcome: &ScrapeOutcome) {
        self.sender.send_modify(|p| {
            p.state = JobState::Completed;
            p.found = outcome.found();
            p.message = outcome.message.clone();
            p.source = Some(outcome.source);
            p.leads = outcome.leads.clone();
        });
    }

    pub fn fail(&self, message: String) {
        self.sender.send_modify(|p| {
            p.state = JobState::Failed;
            p.found = 0;
            p.message = message;
        });
    }

    pub fn snapshot(&self) -> ScrapeProgress {
        self.sender.borrow().clone()
    }
}

/// Handle to a scrape running on its own task. Polling never blocks the job.
pub struct ScrapeJob {
    pub id: Uuid,
    progress: watch::Receiver<ScrapeProgress>,
}

impl ScrapeJob {
    pub fn spawn<L>(scraper: Arc<LeadScraper<L>>, request: ScrapeRequest) -> ScrapeJob
    where
        L: SessionLauncher + 'static,
    {
        let id = Uuid::new_v4();
        let (reporter, progress) = ProgressReporter::new();

        let worker_reporter = reporter.clone();
        let worker = tokio::spawn(async move {
            let outcome = scraper.run(&request, &worker_reporter).await;
            worker_reporter.finish(&outcome);
        });

        tokio::spawn(async move {
            if let Err(e) = worker.await {
                log::error!("Scrape job {} died: {:?}", id, e);
                reporter.fail(format!("Error: {}", e));
            }
        });

        ScrapeJob { id, progress }
    }

    pub fn progress(&self) -> ScrapeProgress {
        self.progress.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.progress.borrow().state.is_terminal()
    }

    /// Resolves once the job reaches a terminal state.
    pub async fn wait(&mut self) -> ScrapeProgress {
        loop {
            {
                let current = self.progress.borrow_and_update();
                if current.state.is_terminal() {
                    return current.clone();
                }
            }
            if self.progress.changed().await.is_err() {
                return self.progress.borrow().clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        configuration::test_scraper_settings,
        domain::scrape::{JobState, LeadSource, ScrapeRequest},
        services::{fakes::FakeLauncher, LeadScraper},
    };

    use super::{ProgressReporter, ScrapeJob};

    #[test]
    fn progress_reporter_tracks_found() {
        let (reporter, receiver) = ProgressReporter::new();
        assert_eq!(receiver.borrow().state, JobState::Idle);

        reporter.running("Starting scrape...");
        reporter.found(7);

        let snapshot = reporter.snapshot();
        assert_eq!(snapshot.state, JobState::Running);
        assert_eq!(snapshot.found, 7);
        assert_eq!(receiver.borrow().found, 7);
    }

    #[tokio::test]
    async fn scrape_job_completes_with_synthetic_leads() {
        let launcher = FakeLauncher::new(10);
        let scraper = Arc::new(LeadScraper::new(launcher, test_scraper_settings()));
        let request = ScrapeRequest {
            keywords: vec!["steel".to_string(), "rust".to_string()],
            location: "Australia".to_string(),
            max_results: 6,
            credentials: None,
        };

        let mut job = ScrapeJob::spawn(scraper, request);
        let done = job.wait().await;

        assert_eq!(done.state, JobState::Completed);
        assert_eq!(done.found, 6);
        assert_eq!(done.leads.len(), 6);
        assert_eq!(done.source, Some(LeadSource::Synthetic));
        assert_eq!(done.message, "Complete. Found 6 leads.");
        assert_eq!(job.progress().found, 6);
        assert!(job.is_finished());
    }
}
