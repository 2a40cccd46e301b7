pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod normalize;
pub mod scrape;
pub mod service;
pub mod store;
pub mod types;
pub mod util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
