use crate::{
    configuration::ScraperSettings,
    domain::{
        lead::LeadCandidate,
        scrape::{Credentials, LeadSource, ScrapeOutcome, ScrapeRequest},
        search_query::{build_search_queries, GeoFilter, SearchCursor},
    },
};

use super::{
    extract_from_markup, extract_from_payloads, generate_leads, merge, PageDiagnostics,
    ProgressReporter, ScrapeError, SearchSession, SeenLeads, SessionLauncher,
};

/// Consecutive pages without a new lead before a query is abandoned.
const MAX_EMPTY_PAGES: u8 = 2;

pub struct LeadScraper<L: SessionLauncher> {
    launcher: L,
    settings: ScraperSettings,
}

impl<L: SessionLauncher> LeadScraper<L> {
    pub fn new(launcher: L, settings: ScraperSettings) -> Self {
        LeadScraper { launcher, settings }
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    /// Runs one scrape to completion. Never fails: without credentials, or
    /// when the live path errors, the result comes from the synthetic
    /// generator instead.
    pub async fn run(&self, request: &ScrapeRequest, progress: &ProgressReporter) -> ScrapeOutcome {
        progress.running("Starting scrape...");
        log::info!(
            "Scrape requested | keywords={:?} location={} max={}",
            request.keywords,
            request.location,
            request.max_results
        );

        let credentials = request
            .credentials
            .clone()
            .or_else(|| self.settings.default_credentials());

        let Some(credentials) = credentials else {
            log::info!("No credentials configured, generating demo leads");
            return self.synthesize(request, progress);
        };

        match self.scrape_live(request, &credentials, progress).await {
            Ok(leads) => {
                let outcome = ScrapeOutcome::completed(leads, LeadSource::Live);
                log::info!("Scrape finished: {}", outcome.message);
                outcome
            }
            Err(e) => {
                log::error!("Live scrape failed, falling back to demo leads: {}", e);
                self.synthesize(request, progress)
            }
        }
    }

    fn synthesize(&self, request: &ScrapeRequest, progress: &ProgressReporter) -> ScrapeOutcome {
        progress.found(0);
        let max_results = request.max_results;

        let leads = generate_leads(&request.keywords, max_results, |count, lead| {
            log::info!("[{}/{}] {} - {}", count, max_results, lead.full_name(), lead.job_title);
            progress.found(count);
        });

        ScrapeOutcome::completed(leads, LeadSource::Synthetic)
    }

    async fn scrape_live(
        &self,
        request: &ScrapeRequest,
        credentials: &Credentials,
        progress: &ProgressReporter,
    ) -> Result<Vec<LeadCandidate>, ScrapeError> {
        let mut session = self.launcher.launch().await?;

        let result = self
            .drive(session.as_mut(), request, credentials, progress)
            .await;

        if let Err(e) = session.close().await {
            log::warn!("Browser did not close cleanly: {}", e);
        }

        result
    }

    async fn login(
        &self,
        session: &mut dyn SearchSession,
        credentials: &Credentials,
    ) -> Result<(), ScrapeError> {
        let attempts = self.settings.max_login_attempts.max(1);
        let mut attempt = 1;

        loop {
            match session.login(credentials).await {
                Err(ScrapeError::Auth(failure)) if failure.is_retryable() && attempt < attempts => {
                    log::warn!(
                        "Login attempt {}/{} failed ({}), retrying",
                        attempt,
                        attempts,
                        failure
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn drive(
        &self,
        session: &mut dyn SearchSession,
        request: &ScrapeRequest,
        credentials: &Credentials,
        progress: &ProgressReporter,
    ) -> Result<Vec<LeadCandidate>, ScrapeError> {
        self.login(session, credentials).await?;

        let max_results = request.max_results;
        let queries = build_search_queries(&request.keywords);
        let geo = GeoFilter::resolve(&request.location);
        log::info!("Search queries: {:?} | geo filter: {}", queries, geo.to_query_param());

        let mut seen = SeenLeads::default();
        let mut leads: Vec<LeadCandidate> = vec![];
        let mut dumped_first_page = false;

        for (q_idx, query) in queries.iter().enumerate() {
            if leads.len() >= max_results {
                break;
            }
            log::info!("Search {}/{}: \"{}\"", q_idx + 1, queries.len(), query);

            let mut cursor = SearchCursor::new(query);
            let mut empty_pages = 0;

            while leads.len() < max_results {
                let label = format!("search_q{}_page_{}", q_idx + 1, cursor.page_number);
                session.navigate(&cursor.url(&geo), &label).await?;

                let page_html = session.current_page_snapshot().await?;
                let payloads = session.intercepted_payloads().await?;

                if !dumped_first_page {
                    dumped_first_page = true;
                    if let Err(e) = session.dump_debug_artifacts(&page_html, &payloads).await {
                        log::warn!("Failed to save first page artifacts: {}", e);
                    }
                }

                let dom_leads = extract_from_markup(&page_html);
                let api_leads = extract_from_payloads(&payloads);
                log::info!(
                    "Page {}: {} from markup, {} from {} intercepted payloads",
                    cursor.page_number,
                    dom_leads.len(),
                    api_leads.len(),
                    payloads.len()
                );
                let page_leads = match api_leads.is_empty() {
                    true => dom_leads,
                    false => merge(&dom_leads, &api_leads),
                };

                let mut new_count = 0;
                for lead in page_leads {
                    if leads.len() >= max_results {
                        break;
                    }
                    if !seen.admit(&lead) {
                        continue;
                    }
                    log::info!(
                        "[{}/{}] {} - {}",
                        leads.len() + 1,
                        max_results,
                        lead.full_name(),
                        lead.job_title
                    );
                    leads.push(lead);
                    new_count += 1;
                    progress.found(leads.len());
                }

                if leads.len() >= max_results {
                    break;
                }

                match new_count {
                    0 => {
                        empty_pages += 1;
                        log::warn!(
                            "No new leads on page {} ({} in a row)",
                            cursor.page_number,
                            empty_pages
                        );
                        if empty_pages >= MAX_EMPTY_PAGES {
                            self.log_page_diagnostics(session, &page_html).await;
                            break;
                        }
                    }
                    _ => empty_pages = 0,
                }

                if !session.has_next_page().await? {
                    log::info!("No more pages for \"{}\"", query);
                    break;
                }

                cursor.advance(new_count);
            }

            if leads.len() < max_results && q_idx + 1 < queries.len() {
                session.pause("between searches").await;
            }
        }

        log::info!("Complete. Found {} leads.", leads.len());
        Ok(leads)
    }

    async fn log_page_diagnostics(&self, session: &dyn SearchSession, page_html: &str) {
        let diagnostics = PageDiagnostics::from_html(page_html);
        let url = session.current_url().await.unwrap_or_default();
        log::info!(
            "Abandoning query at {} | cards={} profile_links={} title_links={} list_items={}",
            url,
            diagnostics.search_cards,
            diagnostics.profile_links,
            diagnostics.title_links,
            diagnostics.list_items
        );
    }
}
