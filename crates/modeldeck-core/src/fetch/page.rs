//! Rendered-page fetch and best-effort DOM extraction.
//!
//! Model, ranking, and app pages build their tables client-side, so they are
//! loaded in a headless Chromium and given a fixed settle delay before the
//! DOM is read. If the browser cannot be launched or the navigation fails,
//! a plain GET of the same URL is tried; scripted content is simply absent
//! then and the normalizer fallbacks cover the gap.

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::types::RankingCategory;
use crate::util::{self, http};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Provider names the row scanner recognizes. Multi-word names come first so
/// "mistral ai" is not swallowed by "mistral".
const KNOWN_PROVIDERS: &[&str] = &[
    "alibaba cloud",
    "mistral ai",
    "anthropic",
    "openai",
    "google",
    "meta",
    "mistral",
    "deepseek",
    "fireworks",
    "together",
    "groq",
    "qwen",
    "amazon",
    "azure",
    "cohere",
    "perplexity",
    "novita",
    "lepton",
    "openrouter",
];

static RE_TOKEN_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[0-9][0-9.,]*\s*[kmb]?\s*tokens").unwrap());

/// One provider section of a model page: the provider name plus the raw
/// key/value cells found under it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedProvider {
    pub provider: String,
    pub cells: Vec<(String, String)>,
}

/// One leaderboard row, fields as found; the normalizer resolves gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedRankingRow {
    pub rank: Option<u32>,
    pub model_name: String,
    pub href: Option<String>,
    pub score_raw: Option<String>,
}

/// One app-showcase row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedAppRow {
    pub name: String,
    pub url: String,
    pub tokens_raw: String,
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

pub async fn fetch_model_page(config: &Config, model_id: &str) -> Vec<ScrapedProvider> {
    match fetch_rendered_html(config, model_id).await {
        Some(html) => parse_provider_rows(&html),
        None => Vec::new(),
    }
}

pub async fn fetch_ranking_page(config: &Config, category: RankingCategory) -> Vec<ScrapedRankingRow> {
    match fetch_rendered_html(config, &category.page_path()).await {
        Some(html) => parse_ranking_rows(&html),
        None => Vec::new(),
    }
}

pub async fn fetch_apps_page(config: &Config) -> Vec<ScrapedAppRow> {
    match fetch_rendered_html(config, "apps").await {
        Some(html) => parse_app_rows(&html),
        None => Vec::new(),
    }
}

async fn fetch_rendered_html(config: &Config, path: &str) -> Option<String> {
    let url = format!("{}/{}", config.site_base.trim_end_matches('/'), path);
    let budget = Duration::from_secs(config.scrape.page_timeout_secs);
    let settle = Duration::from_secs(config.scrape.settle_delay_secs);

    match render_page(&url, budget, settle).await {
        Ok(html) => Some(html),
        Err(e) => {
            warn!("Rendered fetch of {} failed ({}); trying plain GET", url, e);
            plain_fetch(&url, Duration::from_secs(config.scrape.http_timeout_secs)).await
        }
    }
}

/// Load a page in headless Chromium, wait the settle delay, return the DOM.
async fn render_page(url: &str, budget: Duration, settle: Duration) -> Result<String> {
    let browser_config = BrowserConfig::builder()
        .build()
        .map_err(CatalogError::Browser)?;
    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| CatalogError::Browser(e.to_string()))?;
    let driver = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let result = tokio::time::timeout(budget, async {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| CatalogError::Browser(e.to_string()))?;
        tokio::time::sleep(settle).await;
        page.content()
            .await
            .map_err(|e| CatalogError::Browser(e.to_string()))
    })
    .await;

    let _ = browser.close().await;
    driver.abort();

    match result {
        Ok(html) => html,
        Err(_) => Err(CatalogError::Browser(format!("page load timed out: {url}"))),
    }
}

async fn plain_fetch(url: &str, timeout: Duration) -> Option<String> {
    let response = http::client()
        .get(url)
        .header("User-Agent", USER_AGENT)
        .timeout(timeout)
        .send()
        .await;
    match response {
        Ok(r) if r.status().is_success() => match r.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Failed to read body of {}: {}", url, e);
                None
            }
        },
        Ok(r) => {
            warn!("Plain GET of {} returned {}", url, r.status());
            None
        }
        Err(e) => {
            warn!("Plain GET of {} failed: {}", url, e);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn element_text(el: &ElementRef) -> String {
    util::clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Match a cell against the known-provider list, returning the canonical
/// (lowercase) provider name.
fn match_provider(cell: &str) -> Option<&'static str> {
    let cell = cell.to_lowercase();
    KNOWN_PROVIDERS.iter().copied().find(|p| cell.contains(p))
}

/// Scan a model page for provider sections. A short row whose first cell
/// names a known provider opens a section; subsequent key/value rows belong
/// to it. Falls back to list items when the page has no table at all.
pub fn parse_provider_rows(html: &str) -> Vec<ScrapedProvider> {
    let doc = Html::parse_document(html);
    let tr = Selector::parse("tr").unwrap();
    let td = Selector::parse("td").unwrap();

    let mut sections: Vec<ScrapedProvider> = Vec::new();
    for row in doc.select(&tr) {
        let cells: Vec<String> = row.select(&td).map(|c| element_text(&c)).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() <= 2 {
            if let Some(provider) = match_provider(&cells[0]) {
                sections.push(ScrapedProvider {
                    provider: provider.to_string(),
                    cells: Vec::new(),
                });
                continue;
            }
        }
        if cells.len() >= 2 && !cells[0].is_empty() && !cells[1].is_empty() {
            if let Some(current) = sections.last_mut() {
                current.cells.push((cells[0].clone(), cells[1].clone()));
            }
        }
    }

    if sections.is_empty() {
        sections = parse_provider_items(&doc);
    }
    debug!("Extracted {} provider sections", sections.len());
    sections
}

/// List-item fallback: a bare provider name opens a section, "Key: Value"
/// items fill it.
fn parse_provider_items(doc: &Html) -> Vec<ScrapedProvider> {
    let li = Selector::parse("li").unwrap();
    let mut sections: Vec<ScrapedProvider> = Vec::new();
    for item in doc.select(&li) {
        let text = element_text(&item);
        if text.is_empty() {
            continue;
        }
        match text.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                if let Some(current) = sections.last_mut() {
                    current
                        .cells
                        .push((key.trim().to_string(), value.trim().to_string()));
                }
            }
            _ => {
                if let Some(provider) = match_provider(&text) {
                    sections.push(ScrapedProvider {
                        provider: provider.to_string(),
                        cells: Vec::new(),
                    });
                }
            }
        }
    }
    sections
}

/// A rank cell is digits, optionally decorated ("#1", "1.").
fn parse_rank(cell: &str) -> Option<u32> {
    cell.trim()
        .trim_start_matches('#')
        .trim_end_matches('.')
        .parse()
        .ok()
}

/// Scan a leaderboard page for ranked rows.
pub fn parse_ranking_rows(html: &str) -> Vec<ScrapedRankingRow> {
    let doc = Html::parse_document(html);
    let tr = Selector::parse("tr").unwrap();
    let td = Selector::parse("td").unwrap();
    let a = Selector::parse("a").unwrap();

    let mut rows = Vec::new();
    for row in doc.select(&tr) {
        let cells: Vec<String> = row.select(&td).map(|c| element_text(&c)).collect();
        if cells.len() < 2 {
            continue;
        }
        let anchor = row.select(&a).next();
        let model_name = anchor
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| cells[1].clone());
        if model_name.is_empty() {
            continue;
        }
        rows.push(ScrapedRankingRow {
            rank: parse_rank(&cells[0]),
            model_name,
            href: anchor
                .and_then(|el| el.value().attr("href"))
                .map(str::to_string),
            score_raw: (cells.len() >= 3).then(|| cells[cells.len() - 1].clone()),
        });
    }

    if rows.is_empty() {
        rows = parse_ranking_items(&doc, &a);
    }
    debug!("Extracted {} ranking rows", rows.len());
    rows
}

fn parse_ranking_items(doc: &Html, a: &Selector) -> Vec<ScrapedRankingRow> {
    let li = Selector::parse("li").unwrap();
    let mut rows = Vec::new();
    for item in doc.select(&li) {
        let Some(anchor) = item.select(a).next() else {
            continue;
        };
        let model_name = element_text(&anchor);
        if model_name.is_empty() {
            continue;
        }
        let text = element_text(&item);
        rows.push(ScrapedRankingRow {
            rank: None,
            model_name,
            href: anchor.value().attr("href").map(str::to_string),
            score_raw: RE_TOKEN_PHRASE
                .find(&text)
                .map(|m| m.as_str().to_string()),
        });
    }
    rows
}

/// Scan the app-showcase page.
pub fn parse_app_rows(html: &str) -> Vec<ScrapedAppRow> {
    let doc = Html::parse_document(html);
    let tr = Selector::parse("tr").unwrap();
    let td = Selector::parse("td").unwrap();
    let a = Selector::parse("a").unwrap();

    let mut rows = Vec::new();
    for row in doc.select(&tr) {
        let cells: Vec<String> = row.select(&td).map(|c| element_text(&c)).collect();
        if cells.len() < 2 {
            continue;
        }
        let anchor = row.select(&a).next();
        let name = anchor
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| cells[0].clone());
        if name.is_empty() {
            continue;
        }
        let tokens_raw = cells
            .iter()
            .find(|c| c.to_lowercase().contains("token"))
            .cloned()
            .unwrap_or_else(|| cells[cells.len() - 1].clone());
        rows.push(ScrapedAppRow {
            name,
            url: anchor
                .and_then(|el| el.value().attr("href"))
                .unwrap_or_default()
                .to_string(),
            tokens_raw,
        });
    }

    if rows.is_empty() {
        for item in doc.select(&Selector::parse("li").unwrap()) {
            let Some(anchor) = item.select(&a).next() else {
                continue;
            };
            let name = element_text(&anchor);
            if name.is_empty() {
                continue;
            }
            let text = element_text(&item);
            rows.push(ScrapedAppRow {
                name,
                url: anchor
                    .value()
                    .attr("href")
                    .unwrap_or_default()
                    .to_string(),
                tokens_raw: RE_TOKEN_PHRASE
                    .find(&text)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            });
        }
    }
    debug!("Extracted {} app rows", rows.len());
    rows
}
