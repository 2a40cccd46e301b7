//! Remote fetchers. Every function here is best-effort: network, parse, and
//! timeout errors are logged and converted to an empty result, never raised.

pub mod api;
pub mod page;

pub use api::{fetch_model_listing, ApiModel, ApiPricing, ApiTopProvider};
pub use page::{
    fetch_apps_page, fetch_model_page, fetch_ranking_page, ScrapedAppRow, ScrapedProvider,
    ScrapedRankingRow,
};
