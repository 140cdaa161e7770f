use reqwest::Client;
use scraper::Html;
use url::Url;

use crate::appstore;
use crate::models::{ProjectMetadata, MAX_SCREENSHOTS};
use crate::normalize::normalize;
use crate::scan;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const PAGE_CACHE_HINT: &str = "max-age=86400";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("no numeric app id in URL")]
    InvalidId,
    #[error("lookup API returned status {0}")]
    LookupFailed(u16),
    #[error("lookup API returned no results for id {0}")]
    NotFound(u64),
    #[error("page fetch returned status {0}")]
    FetchFailed(u16),
    #[error("{0}")]
    Request(String),
}

// ── URL classification ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceClassification {
    AppStoreListing,
    GenericWebsite,
}

pub fn classify(url: &str) -> SourceClassification {
    if url.contains("apps.apple.com") || url.contains("itunes.apple.com") {
        SourceClassification::AppStoreListing
    } else {
        SourceClassification::GenericWebsite
    }
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Fetch and assemble the metadata record for one URL.
///
/// Only an unparseable or non-http(s) input URL is surfaced as an error;
/// every downstream failure degrades into a record carrying the URL's
/// hostname as title and nothing else, so one broken source cannot fail a
/// page rendering many cards.
pub async fn fetch_project_metadata(url: &str) -> Result<ProjectMetadata, PreviewError> {
    let base = validate_url(url)?;
    match extract_metadata(url, &base).await {
        Ok(meta) => Ok(meta),
        Err(e) => {
            tracing::warn!("extraction failed for {}: {}; returning degraded record", url, e);
            Ok(degraded_record(&base))
        }
    }
}

fn degraded_record(base: &Url) -> ProjectMetadata {
    ProjectMetadata {
        title: base.host_str().unwrap_or_default().to_string(),
        description: String::new(),
        image: String::new(),
        screenshots: Vec::new(),
    }
}

// ── URL validation ───────────────────────────────────────────────────────────

fn validate_url(url: &str) -> Result<Url, PreviewError> {
    let parsed =
        Url::parse(url).map_err(|_| PreviewError::InvalidUrl("Invalid URL".to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(PreviewError::InvalidUrl(format!(
            "Unsupported URL scheme: {}",
            scheme
        ))),
    }
}

// ── Strict extraction core ───────────────────────────────────────────────────

async fn extract_metadata(url: &str, base: &Url) -> Result<ProjectMetadata, PreviewError> {
    let client = build_client()?;

    if classify(url) == SourceClassification::AppStoreListing {
        match appstore::lookup_app(&client, url).await {
            Ok(meta) => return Ok(meta),
            Err(e) => {
                tracing::warn!("lookup failed for {}: {}; scanning the listing page", url, e)
            }
        }
        let html = fetch_html(&client, url).await?;
        return Ok(assemble_app_store(&html, base));
    }

    let html = fetch_html(&client, url).await?;
    Ok(assemble_generic(&html, base))
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

fn build_client() -> Result<Client, PreviewError> {
    let timeout_secs: u64 = std::env::var("LINK_PREVIEW_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
            .parse()
            .unwrap(),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        "en-US,en;q=0.9".parse().unwrap(),
    );

    reqwest::ClientBuilder::new()
        .connect_timeout(std::time::Duration::from_secs(5))
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| PreviewError::Request(e.to_string()))
}

async fn fetch_html(client: &Client, url: &str) -> Result<String, PreviewError> {
    let response = client
        .get(url)
        .header(reqwest::header::CACHE_CONTROL, PAGE_CACHE_HINT)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                PreviewError::Request(format!("TimeoutError: {}", e))
            } else if e.is_connect() {
                PreviewError::Request(format!("ConnectError: {}", e))
            } else {
                PreviewError::Request(format!("RequestError: {}", e))
            }
        })?;

    if !response.status().is_success() {
        return Err(PreviewError::FetchFailed(response.status().as_u16()));
    }

    response
        .text()
        .await
        .map_err(|e| PreviewError::Request(e.to_string()))
}

// ── Record assembly ──────────────────────────────────────────────────────────

/// Generic website mode: per field, structured data beats social preview
/// tags beats plain HTML; the image falls back further to the favicon.
/// Screenshots come from structured data alone.
pub fn assemble_generic(html: &str, base: &Url) -> ProjectMetadata {
    let document = Html::parse_document(html);
    let app = scan::structured_app(&document);

    let title = app
        .as_ref()
        .and_then(|a| a.name.clone())
        .or_else(|| scan::social_title(&document))
        .or_else(|| scan::html_title(&document))
        .unwrap_or_default();

    let description = app
        .as_ref()
        .and_then(|a| a.description.clone())
        .or_else(|| scan::social_description(&document))
        .or_else(|| scan::meta_description(&document))
        .unwrap_or_default();

    let image = app
        .as_ref()
        .and_then(|a| a.image.clone())
        .or_else(|| scan::social_image(&document))
        .or_else(|| scan::favicon(&document))
        .map(|u| normalize(&u, base))
        .unwrap_or_default();

    let screenshots = app
        .map(|a| a.screenshots)
        .unwrap_or_default()
        .iter()
        .take(MAX_SCREENSHOTS)
        .map(|u| normalize(u, base))
        .collect();

    ProjectMetadata {
        title,
        description,
        image,
        screenshots,
    }
}

/// Listing-page mode, used only when the lookup API path did not succeed.
/// The icon container scan outranks the structured-data image, and the
/// structured-data screenshot list outranks the CDN scan.
pub fn assemble_app_store(html: &str, base: &Url) -> ProjectMetadata {
    let document = Html::parse_document(html);
    let app = scan::structured_app(&document);

    let title = app
        .as_ref()
        .and_then(|a| a.name.clone())
        .or_else(|| scan::social_title(&document))
        .or_else(|| scan::html_title(&document))
        .unwrap_or_default();

    let description = app
        .as_ref()
        .and_then(|a| a.description.clone())
        .or_else(|| scan::social_description(&document))
        .or_else(|| scan::meta_description(&document))
        .unwrap_or_default();

    let image = appstore::icon_from_markup(html)
        .or_else(|| app.as_ref().and_then(|a| a.image.clone()))
        .or_else(|| scan::social_image(&document))
        .map(|u| normalize(&u, base))
        .unwrap_or_default();

    let structured_shots = app.map(|a| a.screenshots).unwrap_or_default();
    let screenshots = if structured_shots.is_empty() {
        appstore::screenshots_from_markup(html)
    } else {
        structured_shots
    }
    .iter()
    .take(MAX_SCREENSHOTS)
    .map(|u| normalize(u, base))
    .collect();

    ProjectMetadata {
        title,
        description,
        image,
        screenshots,
    }
}
