use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{
        default_route,
        scraper_route::{self, JobRegistry},
    },
    services::{DroidLauncher, LeadScraper},
};

pub fn run(
    listener: TcpListener,
    scraper: LeadScraper<DroidLauncher>,
) -> Result<Server, std::io::Error> {
    let scraper = web::Data::new(scraper);
    let registry = web::Data::new(JobRegistry::default());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(
                web::scope("/scraper")
                    .service(scraper_route::start_scrape)
                    .service(scraper_route::scrape_status),
            )
            .app_data(scraper.clone())
            .app_data(registry.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
