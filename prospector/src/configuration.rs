use std::path::PathBuf;

use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::scrape::Credentials;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub scraper: ScraperSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct ScraperSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub linkedin_email: Option<String>,
    pub linkedin_password: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub delay_min_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub delay_max_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub settle_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub login_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_login_attempts: u8,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_results: usize,
    pub output_dir: PathBuf,
    pub industry_keywords: Vec<String>,
}

impl ScraperSettings {
    pub fn default_credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(self.linkedin_email.clone(), self.linkedin_password.clone())
    }

    /// Pacing bounds in milliseconds, tolerating a swapped min/max.
    pub fn delay_range_ms(&self) -> (u64, u64) {
        match self.delay_min_ms <= self.delay_max_ms {
            true => (self.delay_min_ms, self.delay_max_ms),
            false => (self.delay_max_ms, self.delay_min_ms),
        }
    }
}

impl std::fmt::Debug for ScraperSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperSettings")
            .field("webdriver_url", &self.webdriver_url)
            .field("headless", &self.headless)
            .field("credentials", &self.default_credentials())
            .field("delay_min_ms", &self.delay_min_ms)
            .field("delay_max_ms", &self.delay_max_ms)
            .field("max_results", &self.max_results)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to read current dir: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    // APP_SCRAPER__LINKEDIN_EMAIL=... overrides scraper.linkedin_email
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
pub(crate) fn test_scraper_settings() -> ScraperSettings {
    ScraperSettings {
        webdriver_url: "http://localhost:4444".to_string(),
        headless: true,
        user_agent: "test-agent".to_string(),
        linkedin_email: None,
        linkedin_password: None,
        delay_min_ms: 0,
        delay_max_ms: 0,
        settle_ms: 0,
        login_timeout_secs: 1,
        max_login_attempts: 2,
        max_results: 20,
        output_dir: std::env::temp_dir().join("prospector-test-output"),
        industry_keywords: vec![
            "steel".to_string(),
            "corrosion".to_string(),
            "rust".to_string(),
            "protection".to_string(),
            "coating".to_string(),
            "zinc".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::test_scraper_settings;

    #[test]
    fn default_credentials_absent_when_blank() {
        let mut settings = test_scraper_settings();
        settings.linkedin_email = Some("".to_string());
        settings.linkedin_password = Some("secret".to_string());

        assert!(settings.default_credentials().is_none());
    }

    #[test]
    fn delay_range_swapped() {
        let mut settings = test_scraper_settings();
        settings.delay_min_ms = 5000;
        settings.delay_max_ms = 2000;

        assert_eq!(settings.delay_range_ms(), (2000, 5000));
    }
}
