use thiserror::Error;
use thirtyfour::error::WebDriverError;

/// Why a login did not reach the feed, judged by where the browser ended up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("security checkpoint requires manual verification (at {0})")]
    Checkpoint(String),
    #[error("credentials rejected or account locked (at {0})")]
    RejectedCredentials(String),
    #[error("unexpected redirect to {0}")]
    UnexpectedRedirect(String),
}

impl AuthFailure {
    pub fn from_landing_url(url: &str) -> AuthFailure {
        if url.contains("checkpoint") {
            AuthFailure::Checkpoint(url.to_string())
        } else if url.contains("login") {
            AuthFailure::RejectedCredentials(url.to_string())
        } else {
            AuthFailure::UnexpectedRedirect(url.to_string())
        }
    }

    /// A checkpoint needs a human and bad credentials stay bad; only a stray
    /// redirect is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthFailure::UnexpectedRedirect(_))
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("login failed: {0}")]
    Auth(#[from] AuthFailure),
    #[error("browser automation failed: {0}")]
    WebDriver(#[from] WebDriverError),
    #[error("could not write diagnostics: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize payload dump: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no usable field for locator group '{0}'")]
    LocatorExhausted(&'static str),
}

impl ScrapeError {
    /// A login form that cannot be filled is a login failure, classified by
    /// where the browser actually is.
    pub fn during_login(self, landing_url: &str) -> ScrapeError {
        match self {
            ScrapeError::LocatorExhausted(field) => {
                let failure = AuthFailure::from_landing_url(landing_url);
                log::error!("Login form has no {} field at {}: {}", field, landing_url, failure);
                failure.into()
            }
            other => other,
        }
    }
}
