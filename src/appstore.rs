use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::models::{ProjectMetadata, MAX_SCREENSHOTS};
use crate::preview::PreviewError;

// ── Constants ────────────────────────────────────────────────────────────────

const LOOKUP_ENDPOINT: &str = "https://itunes.apple.com/lookup";
const MIN_SCREENSHOT_DIM: u64 = 200;
const EXCLUDED_MARKERS: &[&str] = &["Placeholder", "AppIcon", "icon"];

// ── Lazy static regexes ──────────────────────────────────────────────────────

static ID_PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/id(\d+)").unwrap());

static APP_PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/app/(\d+)").unwrap());

static ICON_CONTAINER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<div[^>]*class=["'][^"']*app-icon[^"']*["'][^>]*>.*?</div>\s*</div>\s*</div>"#)
        .unwrap()
});

static SRCSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)srcset=["']([^"']+)["']"#).unwrap());

static DIMENSIONS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)x(\d+)").unwrap());

static CDN_SCREENSHOT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://is\d-ssl\.mzstatic\.com/image/thumb/[^"'\s<>]+\.(?:jpg|jpeg|png|webp)"#)
        .unwrap()
});

static BASE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+/[^/]+\.(?:png|jpg|jpeg|webp))/\d+x\d+").unwrap());

// ── App id extraction ────────────────────────────────────────────────────────

/// Listing URLs carry the numeric id either as `/id<digits>` or `/app/<digits>`.
pub fn app_id(url: &str) -> Result<u64, PreviewError> {
    ID_PATH_RE
        .captures(url)
        .or_else(|| APP_PATH_RE.captures(url))
        .and_then(|cap| cap[1].parse().ok())
        .ok_or(PreviewError::InvalidId)
}

// ── Lookup API client ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<AppRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppRecord {
    track_name: Option<String>,
    description: Option<String>,
    #[serde(rename = "artworkUrl512")]
    artwork_url_512: Option<String>,
    #[serde(rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
    screenshot_urls: Option<Vec<String>>,
    ipad_screenshot_urls: Option<Vec<String>>,
}

/// Resolve a listing URL through the public lookup endpoint instead of
/// parsing the listing page itself.
pub async fn lookup_app(client: &Client, url: &str) -> Result<ProjectMetadata, PreviewError> {
    let id = app_id(url)?;

    let response = client
        .get(LOOKUP_ENDPOINT)
        .query(&[("id", id.to_string())])
        .send()
        .await
        .map_err(|e| PreviewError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PreviewError::LookupFailed(response.status().as_u16()));
    }

    let payload: LookupResponse = response
        .json()
        .await
        .map_err(|e| PreviewError::Request(e.to_string()))?;

    let record = payload
        .results
        .into_iter()
        .next()
        .ok_or(PreviewError::NotFound(id))?;

    Ok(map_record(record))
}

fn map_record(record: AppRecord) -> ProjectMetadata {
    let mut screenshots = record.screenshot_urls.unwrap_or_default();
    if screenshots.is_empty() {
        screenshots = record.ipad_screenshot_urls.unwrap_or_default();
    }
    screenshots.truncate(MAX_SCREENSHOTS);

    ProjectMetadata {
        title: record.track_name.unwrap_or_default(),
        description: record.description.unwrap_or_default(),
        image: record
            .artwork_url_512
            .or(record.artwork_url_100)
            .unwrap_or_default(),
        screenshots,
    }
}

// ── Listing-page fallback scanners ───────────────────────────────────────────

/// Scan the icon container block for `srcset` candidates and pick the URL
/// whose embedded `WIDTHxHEIGHT` token declares the largest width.
pub fn icon_from_markup(html: &str) -> Option<String> {
    for container in ICON_CONTAINER_RE.find_iter(html) {
        for srcset in SRCSET_RE.captures_iter(container.as_str()) {
            let mut best_url: Option<String> = None;
            let mut best_width: u64 = 0;

            for part in srcset[1].split(',') {
                let url = match part.trim().split_whitespace().next() {
                    Some(u) => u,
                    None => continue,
                };
                if !url.starts_with("http") {
                    continue;
                }
                if let Some(dims) = DIMENSIONS_RE.captures(url) {
                    let width: u64 = dims[1].parse().unwrap_or(0);
                    if width > best_width {
                        best_width = width;
                        best_url = Some(url.to_string());
                    }
                }
            }

            if let Some(url) = best_url {
                return Some(url);
            }
        }
    }
    None
}

/// Collect screenshot URLs from the platform CDN out of raw listing markup.
///
/// Candidates carrying a placeholder/icon marker are excluded; variants of
/// the same base path are deduplicated keeping the largest pixel area;
/// anything under 200x200 is dropped. First-seen base-path order is kept
/// and the result is capped at five entries.
pub fn screenshots_from_markup(html: &str) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, (String, u64)> = HashMap::new();

    for m in CDN_SCREENSHOT_RE.find_iter(html) {
        let url = m.as_str();
        if EXCLUDED_MARKERS.iter().any(|marker| url.contains(marker)) {
            continue;
        }

        let dims = DIMENSIONS_RE.captures(url);
        let area = match &dims {
            Some(d) => {
                let width: u64 = d[1].parse().unwrap_or(0);
                let height: u64 = d[2].parse().unwrap_or(0);
                if width < MIN_SCREENSHOT_DIM || height < MIN_SCREENSHOT_DIM {
                    continue;
                }
                width * height
            }
            None => 0,
        };

        let base = BASE_PATH_RE
            .captures(url)
            .map(|cap| cap[1].to_string())
            .unwrap_or_else(|| url.to_string());

        match best.get(&base) {
            Some((_, seen)) if *seen >= area => {}
            Some(_) => {
                best.insert(base, (url.to_string(), area));
            }
            None => {
                order.push(base.clone());
                best.insert(base, (url.to_string(), area));
            }
        }
    }

    order
        .iter()
        .take(MAX_SCREENSHOTS)
        .filter_map(|base| best.get(base).map(|(url, _)| url.clone()))
        .collect()
}
