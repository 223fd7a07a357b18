use std::net::TcpListener;

use anyhow::Context;
use env_logger::Env;
use prospector::{
    configuration::get_configuration,
    services::{DroidLauncher, LeadScraper},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;
    log::info!("Scraper settings: {:?}", configuration.scraper);
    if configuration.scraper.default_credentials().is_none() {
        log::warn!(
            "No LinkedIn credentials configured, jobs without their own will produce demo leads"
        );
    }

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Listening on {}", address);

    let launcher = DroidLauncher {
        settings: configuration.scraper.clone(),
    };
    let scraper = LeadScraper::new(launcher, configuration.scraper);

    run(listener, scraper)?.await?;
    Ok(())
}
