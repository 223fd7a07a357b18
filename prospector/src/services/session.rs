use async_trait::async_trait;
use serde_json::Value;

use crate::domain::scrape::Credentials;

use super::ScrapeError;

/// One authenticated browser session. Calls are strictly sequential: the
/// orchestrator owns the session for the whole job and never shares it.
#[async_trait]
pub trait SearchSession: Send + Sync {
    async fn login(&mut self, credentials: &Credentials) -> Result<(), ScrapeError>;

    /// Paces, loads `url`, and captures a screenshot named after `label`.
    /// Clears the intercepted payload buffer.
    async fn navigate(&mut self, url: &str, label: &str) -> Result<(), ScrapeError>;

    async fn current_url(&self) -> Result<String, ScrapeError>;

    /// Rendered markup of the current page.
    async fn current_page_snapshot(&self) -> Result<String, ScrapeError>;

    /// Search-API JSON bodies captured since the last navigation.
    async fn intercepted_payloads(&self) -> Result<Vec<Value>, ScrapeError>;

    async fn has_next_page(&self) -> Result<bool, ScrapeError>;

    async fn pause(&mut self, label: &str);

    async fn dump_debug_artifacts(
        &self,
        page_html: &str,
        payloads: &[Value],
    ) -> Result<(), ScrapeError>;

    async fn close(&mut self) -> Result<(), ScrapeError>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn SearchSession>, ScrapeError>;
}
