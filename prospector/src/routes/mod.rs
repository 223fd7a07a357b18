pub mod default_route;
pub mod scraper_route;
