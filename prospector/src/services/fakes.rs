use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::scrape::Credentials;

use super::{AuthFailure, ScrapeError, SearchSession, SessionLauncher};

/// Counters shared between a fake launcher, its sessions, and the test.
#[derive(Default)]
pub struct FakeStats {
    pub launches: AtomicUsize,
    pub logins: AtomicUsize,
    pub navigations: AtomicUsize,
    pub closes: AtomicUsize,
    pub dumps: AtomicUsize,
}

/// Serves search pages with `per_page` people each. Unless `repeat_page` is
/// set, every navigation returns people not seen before.
pub struct FakeLauncher {
    pub per_page: usize,
    pub repeat_page: bool,
    pub login_failures: Vec<AuthFailure>,
    pub page_html: Option<String>,
    pub payloads: Vec<Value>,
    pub stats: Arc<FakeStats>,
}

impl FakeLauncher {
    pub fn new(per_page: usize) -> Self {
        FakeLauncher {
            per_page,
            repeat_page: false,
            login_failures: vec![],
            page_html: None,
            payloads: vec![],
            stats: Arc::new(FakeStats::default()),
        }
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn SearchSession>, ScrapeError> {
        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            per_page: self.per_page,
            repeat_page: self.repeat_page,
            login_failures: Mutex::new(self.login_failures.clone()),
            page_html: self.page_html.clone(),
            payloads: self.payloads.clone(),
            page: 0,
            stats: self.stats.clone(),
        }))
    }
}

struct FakeSession {
    per_page: usize,
    repeat_page: bool,
    login_failures: Mutex<Vec<AuthFailure>>,
    page_html: Option<String>,
    payloads: Vec<Value>,
    page: usize,
    stats: Arc<FakeStats>,
}

pub fn card_html(name: &str, href: &str, lines: &[&str]) -> String {
    let paragraphs: String = lines.iter().map(|l| format!("<p>{}</p>", l)).collect();
    format!(
        r#"<li role="listitem"><div data-view-name="people-search-result">
            <a href="{href}"><img alt=""></a>
            <p><a data-view-name="search-result-lockup-title" href="{href}">
                <span aria-hidden="true">{name}</span>
            </a> • 2nd</p>
            {paragraphs}
        </div></li>"#
    )
}

pub fn page_html(cards: &[String]) -> String {
    format!("<html><body><ul>{}</ul></body></html>", cards.join(""))
}

#[async_trait]
impl SearchSession for FakeSession {
    async fn login(&mut self, _credentials: &Credentials) -> Result<(), ScrapeError> {
        self.stats.logins.fetch_add(1, Ordering::SeqCst);
        let mut failures = self.login_failures.lock().unwrap();
        match failures.is_empty() {
            true => Ok(()),
            false => Err(failures.remove(0).into()),
        }
    }

    async fn navigate(&mut self, _url: &str, _label: &str) -> Result<(), ScrapeError> {
        self.stats.navigations.fetch_add(1, Ordering::SeqCst);
        if !self.repeat_page {
            self.page += 1;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ScrapeError> {
        Ok("https://www.linkedin.com/search/results/people/".to_string())
    }

    async fn current_page_snapshot(&self) -> Result<String, ScrapeError> {
        if let Some(html) = &self.page_html {
            return Ok(html.clone());
        }

        let cards: Vec<String> = (0..self.per_page)
            .map(|i| {
                let slug = format!("page{}-lead{}", self.page, i);
                card_html(
                    &format!("Alex P{}L{}", self.page, i),
                    &format!("/in/{}?trk=search", slug),
                    &["Welding Inspector at Forge Co", "Perth, Western Australia, Australia"],
                )
            })
            .collect();
        Ok(page_html(&cards))
    }

    async fn intercepted_payloads(&self) -> Result<Vec<Value>, ScrapeError> {
        Ok(self.payloads.clone())
    }

    async fn has_next_page(&self) -> Result<bool, ScrapeError> {
        Ok(true)
    }

    async fn pause(&mut self, _label: &str) {}

    async fn dump_debug_artifacts(
        &self,
        _page_html: &str,
        _payloads: &[Value],
    ) -> Result<(), ScrapeError> {
        self.stats.dumps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
