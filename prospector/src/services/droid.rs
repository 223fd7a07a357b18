use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use thirtyfour::{
    extensions::cdp::ChromeDevTools, By, ChromiumLikeCapabilities, DesiredCapabilities,
    WebDriver,
};

use crate::{configuration::ScraperSettings, domain::scrape::Credentials};

use super::{AuthFailure, ScrapeError, SearchSession, SessionLauncher};

const LOGIN_URL: &str = "https://www.linkedin.com/login";
const CAPTURE_SCRIPT: &str = include_str!("capture_payloads.js");
const NEXT_BUTTON: &str = r#"button[aria-label="Next"]"#;
const PAGE_HTML_DUMP: &str = "search_page_debug.html";
const PAYLOAD_DUMP: &str = "api_response_debug.json";

#[derive(Debug, Clone, Copy)]
enum Locator {
    Css(&'static str),
    XPath(&'static str),
}

impl Locator {
    fn by(&self) -> By {
        match self {
            Locator::Css(selector) => By::Css(*selector),
            Locator::XPath(path) => By::XPath(*path),
        }
    }
}

// Login markup shifts between variants (desktop, mobile, redesigns), so each
// field is tried through several locators in order.
const EMAIL_LOCATORS: &[Locator] = &[
    Locator::Css("#username"),
    Locator::Css(r#"input[name="session_key"]"#),
    Locator::Css(r#"input[autocomplete="username"]"#),
    Locator::XPath(r#"//input[@id=//label[contains(normalize-space(.), "Email or phone")]/@for]"#),
];

const PASSWORD_LOCATORS: &[Locator] = &[
    Locator::Css("#password"),
    Locator::Css(r#"input[name="session_password"]"#),
    Locator::Css(r#"input[autocomplete="current-password"]"#),
    Locator::XPath(r#"//input[@id=//label[contains(normalize-space(.), "Password")]/@for]"#),
];

const SUBMIT_LOCATORS: &[Locator] = &[
    Locator::Css(r#"button[type="submit"]"#),
    Locator::XPath(r#"//button[contains(normalize-space(.), "Sign in")]"#),
    Locator::Css("button.btn__primary--large"),
];

/// A network response recorded by the capture script.
#[derive(Debug, Deserialize)]
struct CapturedResponse {
    url: String,
    status: u16,
    body: Value,
}

/// Endpoints that carry people-search data.
pub fn is_search_api(url: &str) -> bool {
    let url = url.to_lowercase();
    (url.contains("voyager/api")
        && (url.contains("search") || url.contains("typeahead") || url.contains("cluster")))
        || url.contains("graphql")
        || (url.contains("voyager") && url.contains("people"))
}

/// Draws a pause uniformly from `[min_ms, max_ms]`.
pub fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    let (low, high) = match min_ms <= max_ms {
        true => (min_ms, max_ms),
        false => (max_ms, min_ms),
    };
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}

pub struct Droid {
    pub driver: WebDriver,
    settings: ScraperSettings,
    closed: bool,
}

impl Droid {
    pub async fn new(settings: ScraperSettings) -> Result<Self, ScrapeError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()?;
        }
        caps.add_arg("--window-size=1280,900")?;
        caps.add_arg(&format!("--user-agent={}", settings.user_agent))?;

        log::info!("Launching browser via {}", settings.webdriver_url);
        let driver = WebDriver::new(settings.webdriver_url.as_str(), caps).await?;

        // Registered before any page script runs so background API calls made
        // during the initial render are captured too.
        let dev_tools = ChromeDevTools::new(driver.handle.clone());
        dev_tools
            .execute_cdp_with_params(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": CAPTURE_SCRIPT }),
            )
            .await?;

        tokio::fs::create_dir_all(&settings.output_dir).await?;

        Ok(Droid {
            driver,
            settings,
            closed: false,
        })
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.settings.output_dir.join(name)
    }

    async fn screenshot(&self, label: &str) {
        let path = self.artifact_path(&format!("{}.png", label));
        match self.driver.screenshot(&path).await {
            Ok(()) => log::info!("Screenshot saved: {}", path.display()),
            Err(e) => log::warn!("Screenshot {} failed: {:?}", label, e),
        }
    }

    async fn fill_first(
        &self,
        locators: &[Locator],
        field: &'static str,
        value: &str,
    ) -> Result<(), ScrapeError> {
        for locator in locators {
            let Ok(element) = self.driver.find(locator.by()).await else {
                continue;
            };
            _ = element.clear().await;
            if element.send_keys(value).await.is_ok() {
                log::info!("Filled {} via {:?}", field, locator);
                return Ok(());
            }
        }

        Err(ScrapeError::LocatorExhausted(field))
    }

    async fn click_first(
        &self,
        locators: &[Locator],
        field: &'static str,
    ) -> Result<(), ScrapeError> {
        for locator in locators {
            let Ok(element) = self.driver.find(locator.by()).await else {
                continue;
            };
            if element.click().await.is_ok() {
                log::info!("Clicked {} via {:?}", field, locator);
                return Ok(());
            }
        }

        Err(ScrapeError::LocatorExhausted(field))
    }

    /// Polls the current URL until it reaches the feed or the login timeout
    /// runs out. Returns the last URL seen when it never got there.
    async fn wait_for_feed(&self) -> Result<Result<(), String>, ScrapeError> {
        let timeout = Duration::from_secs(self.settings.login_timeout_secs);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let url = self.driver.current_url().await?.to_string();
            if url.contains("/feed") {
                return Ok(Ok(()));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(Err(url));
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    async fn submit_credentials(&self, credentials: &Credentials) -> Result<(), ScrapeError> {
        self.fill_first(EMAIL_LOCATORS, "email", &credentials.email)
            .await?;
        self.fill_first(PASSWORD_LOCATORS, "password", &credentials.password)
            .await?;
        self.click_first(SUBMIT_LOCATORS, "submit").await
    }
}

#[async_trait]
impl SearchSession for Droid {
    async fn login(&mut self, credentials: &Credentials) -> Result<(), ScrapeError> {
        log::info!("Starting login as {}", credentials.masked_email());

        self.navigate(LOGIN_URL, "login_page").await?;
        if let Err(e) = self.submit_credentials(credentials).await {
            // The form is missing when /login bounced somewhere else.
            self.screenshot("login_error").await;
            let url = self.driver.current_url().await?.to_string();
            return Err(e.during_login(&url));
        }
        self.pause("login submit").await;

        match self.wait_for_feed().await? {
            Ok(()) => {
                log::info!("Login succeeded, landed on feed");
                Ok(())
            }
            Err(url) => {
                let failure = AuthFailure::from_landing_url(&url);
                log::error!("Login failed at {}: {}", url, failure);
                self.screenshot("login_error").await;
                Err(failure.into())
            }
        }
    }

    async fn navigate(&mut self, url: &str, label: &str) -> Result<(), ScrapeError> {
        self.pause(label).await;

        _ = self
            .driver
            .execute("window.__prospectorCaptured = [];", vec![])
            .await;
        self.driver.goto(url).await?;

        let settle = Duration::from_millis(self.settings.settle_ms);
        tokio::time::sleep(settle).await;

        // Result cards render lazily as the page scrolls.
        self.driver
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await?;
        tokio::time::sleep(settle / 2).await;

        self.screenshot(label).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ScrapeError> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn current_page_snapshot(&self) -> Result<String, ScrapeError> {
        Ok(self.driver.source().await?)
    }

    async fn intercepted_payloads(&self) -> Result<Vec<Value>, ScrapeError> {
        let ret = self
            .driver
            .execute("return window.__prospectorCaptured || [];", vec![])
            .await?;

        let captured: Vec<CapturedResponse> = match serde_json::from_value(ret.json().clone()) {
            Ok(captured) => captured,
            Err(e) => {
                log::warn!("Captured payload buffer was malformed: {:?}", e);
                return Ok(vec![]);
            }
        };

        Ok(captured
            .into_iter()
            .filter(|c| c.status == 200 && is_search_api(&c.url))
            .map(|c| {
                log::info!("Intercepted API: {}", c.url.split('?').next().unwrap_or_default());
                c.body
            })
            .collect())
    }

    async fn has_next_page(&self) -> Result<bool, ScrapeError> {
        for button in self.driver.find_all(By::Css(NEXT_BUTTON)).await? {
            if button.is_enabled().await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn pause(&mut self, label: &str) {
        let (min_ms, max_ms) = self.settings.delay_range_ms();
        let delay = random_delay(min_ms, max_ms);
        log::info!("[{}] waiting {:.1}s...", label, delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }

    async fn dump_debug_artifacts(
        &self,
        page_html: &str,
        payloads: &[Value],
    ) -> Result<(), ScrapeError> {
        let html_path = self.artifact_path(PAGE_HTML_DUMP);
        tokio::fs::write(&html_path, page_html).await?;
        log::info!("Page HTML saved: {}", html_path.display());

        if !payloads.is_empty() {
            let json_path = self.artifact_path(PAYLOAD_DUMP);
            tokio::fs::write(&json_path, serde_json::to_string_pretty(payloads)?).await?;
            log::info!("API JSON saved: {}", json_path.display());
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        log::info!("Closing browser...");
        self.driver.clone().quit().await?;
        Ok(())
    }
}

pub struct DroidLauncher {
    pub settings: ScraperSettings,
}

#[async_trait]
impl SessionLauncher for DroidLauncher {
    async fn launch(&self) -> Result<Box<dyn SearchSession>, ScrapeError> {
        let droid = Droid::new(self.settings.clone()).await?;
        Ok(Box::new(droid))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{is_search_api, random_delay};

    #[test]
    fn is_search_api_valid() {
        let urls = [
            "https://www.linkedin.com/voyager/api/search/dash/clusters?q=all",
            "https://www.linkedin.com/voyager/api/graphql?queryId=voyagerSearchDashClusters.123",
            "https://www.linkedin.com/voyager/api/voyagerSearchDashTypeahead?keywords=steel",
            "https://www.linkedin.com/voyager/api/identity/dash/people?q=memberIdentity",
            "https://www.linkedin.com/Voyager/API/SearchDashClusters?q=all",
        ];

        for url in urls {
            assert!(is_search_api(url), "{}", url);
        }
    }

    #[test]
    fn is_search_api_invalid() {
        let urls = [
            "https://www.linkedin.com/voyager/api/me",
            "https://static.licdn.com/aero-v1/sc/h/abc.js",
            "https://www.linkedin.com/li/track",
        ];

        assert!(!urls.iter().any(|u| is_search_api(u)));
    }

    #[test]
    fn random_delay_within_bounds() {
        for _ in 0..200 {
            let delay = random_delay(20, 50);
            assert!(delay >= Duration::from_millis(20));
            assert!(delay <= Duration::from_millis(50));
        }
        assert_eq!(random_delay(7, 7), Duration::from_millis(7));
        assert!(random_delay(50, 20) <= Duration::from_millis(50));
    }
}
