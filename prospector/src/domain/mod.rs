pub mod lead;
pub mod scrape;
pub mod search_query;
