pub mod droid;
pub mod fallback_generator;
pub mod lead_scraper;
pub mod markup_extractor;
pub mod payload_extractor;
pub mod reconciler;
pub mod scrape_error;
pub mod scrape_job;
pub mod session;

#[cfg(test)]
pub(crate) mod fakes;

pub use droid::*;
pub use fallback_generator::*;
pub use lead_scraper::*;
pub use markup_extractor::*;
pub use payload_extractor::*;
pub use reconciler::*;
pub use scrape_error::*;
pub use scrape_job::*;
pub use session::*;
