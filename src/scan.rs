use scraper::{Html, Selector};
use serde_json::Value;

// ── Structured data ──────────────────────────────────────────────────────────

const TARGET_TYPE: &str = "SoftwareApplication";

/// Fields pulled from the first matching JSON-LD block on a page.
#[derive(Debug, Default)]
pub struct StructuredApp {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub screenshots: Vec<String>,
}

/// Scan every `application/ld+json` script block in document order and
/// return the first entry whose `@type` is `SoftwareApplication`.
/// Malformed JSON in a block is skipped; scanning continues with the next
/// block. A top-level array stands for its first element.
pub fn structured_app(document: &Html) -> Option<StructuredApp> {
    let sel = Selector::parse("script[type=\"application/ld+json\"]").unwrap();
    for script in document.select(&sel) {
        let text = script.text().collect::<String>();
        let value = match serde_json::from_str::<Value>(text.trim()) {
            Ok(v) => v,
            Err(_) => continue,
        };

        let item = match &value {
            Value::Array(arr) => match arr.first() {
                Some(first) => first,
                None => continue,
            },
            other => other,
        };

        if item.get("@type").and_then(Value::as_str) != Some(TARGET_TYPE) {
            continue;
        }

        return Some(StructuredApp {
            name: string_field(item, "name"),
            description: string_field(item, "description"),
            image: image_field(item),
            screenshots: screenshot_list(item),
        });
    }
    None
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn image_field(item: &Value) -> Option<String> {
    match item.get("image")? {
        Value::String(s) => non_empty(s),
        Value::Array(arr) => arr.iter().find_map(image_entry),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str).and_then(non_empty),
        _ => None,
    }
}

fn image_entry(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str).and_then(non_empty),
        _ => None,
    }
}

/// Screenshot entries appear under `screenshot` or `screenshots`, each
/// either a plain URL string or an object with a `url` key.
fn screenshot_list(item: &Value) -> Vec<String> {
    let list = item.get("screenshot").or_else(|| item.get("screenshots"));
    let arr = match list {
        Some(Value::Array(arr)) => arr,
        _ => return Vec::new(),
    };
    arr.iter().filter_map(image_entry).collect()
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ── Social preview tags ──────────────────────────────────────────────────────

pub fn social_title(document: &Html) -> Option<String> {
    first_meta_content(
        document,
        &[("property", "og:title"), ("name", "twitter:title")],
    )
}

pub fn social_description(document: &Html) -> Option<String> {
    first_meta_content(
        document,
        &[
            ("property", "og:description"),
            ("name", "twitter:description"),
        ],
    )
}

pub fn social_image(document: &Html) -> Option<String> {
    first_meta_content(
        document,
        &[
            ("property", "og:image"),
            ("property", "og:image:secure_url"),
            ("name", "twitter:image"),
            ("name", "twitter:image:src"),
        ],
    )
}

fn first_meta_content(document: &Html, checks: &[(&str, &str)]) -> Option<String> {
    for (attr, value) in checks {
        let sel_str = format!("meta[{}=\"{}\"]", attr, value);
        // Use .ok() immediately to drop SelectorErrorKind<'_> before sel_str is dropped.
        let sel = Selector::parse(&sel_str).ok();
        if let Some(sel) = sel {
            if let Some(el) = document.select(&sel).next() {
                if let Some(content) = el.value().attr("content") {
                    let trimmed = content.trim().to_string();
                    if !trimmed.is_empty() {
                        return Some(trimmed);
                    }
                }
            }
        }
    }
    None
}

// ── Plain HTML fallbacks ─────────────────────────────────────────────────────

pub fn html_title(document: &Html) -> Option<String> {
    let sel = Selector::parse("title").unwrap();
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn meta_description(document: &Html) -> Option<String> {
    first_meta_content(document, &[("name", "description")])
}

/// High-resolution touch icon preferred over a generic favicon link.
pub fn favicon(document: &Html) -> Option<String> {
    let checks = [
        "link[rel=\"apple-touch-icon\"]",
        "link[rel=\"icon\"]",
        "link[rel=\"shortcut icon\"]",
    ];
    for sel_str in &checks {
        let sel = Selector::parse(sel_str).unwrap();
        if let Some(el) = document.select(&sel).next() {
            if let Some(href) = el.value().attr("href") {
                let trimmed = href.trim().to_string();
                if !trimmed.is_empty() {
                    return Some(trimmed);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_app_extracted() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@type":"SoftwareApplication","name":"My App","description":"Does things",
             "image":"https://example.com/icon.png",
             "screenshot":["https://example.com/s1.png",{"url":"https://example.com/s2.png"}]}
            </script>
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        let app = structured_app(&document).unwrap();
        assert_eq!(app.name.as_deref(), Some("My App"));
        assert_eq!(app.description.as_deref(), Some("Does things"));
        assert_eq!(app.image.as_deref(), Some("https://example.com/icon.png"));
        assert_eq!(
            app.screenshots,
            vec![
                "https://example.com/s1.png".to_string(),
                "https://example.com/s2.png".to_string()
            ]
        );
    }

    #[test]
    fn test_malformed_block_does_not_stop_scanning() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not json at all</script>
            <script type="application/ld+json">
            {"@type":"SoftwareApplication","name":"Second Block"}
            </script>
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        let app = structured_app(&document).unwrap();
        assert_eq!(app.name.as_deref(), Some("Second Block"));
    }

    #[test]
    fn test_non_matching_type_skipped() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"WebSite","name":"Site"}</script>
            <script type="application/ld+json">{"@type":"SoftwareApplication","name":"App"}</script>
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        let app = structured_app(&document).unwrap();
        assert_eq!(app.name.as_deref(), Some("App"));
    }

    #[test]
    fn test_array_payload_takes_first_element() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            [{"@type":"SoftwareApplication","name":"First"},{"@type":"SoftwareApplication","name":"Second"}]
            </script>
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        let app = structured_app(&document).unwrap();
        assert_eq!(app.name.as_deref(), Some("First"));
    }

    #[test]
    fn test_social_tags_over_twitter_fallback() {
        let html = r#"<html><head>
            <meta name="twitter:title" content="Tweet Title">
            <meta property="og:title" content="OG Title">
            <meta name="twitter:description" content="Tweet desc">
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(social_title(&document).as_deref(), Some("OG Title"));
        assert_eq!(social_description(&document).as_deref(), Some("Tweet desc"));
    }

    #[test]
    fn test_html_title_and_meta_description() {
        let html = r#"<html><head>
            <title>  Plain Title  </title>
            <meta name="description" content="Plain description">
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(html_title(&document).as_deref(), Some("Plain Title"));
        assert_eq!(
            meta_description(&document).as_deref(),
            Some("Plain description")
        );
    }

    #[test]
    fn test_favicon_prefers_touch_icon() {
        let html = r#"<html><head>
            <link rel="icon" href="/favicon.ico">
            <link rel="apple-touch-icon" href="/touch-icon.png">
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(favicon(&document).as_deref(), Some("/touch-icon.png"));
    }

    #[test]
    fn test_favicon_shortcut_fallback() {
        let html = r#"<html><head>
            <link rel="shortcut icon" href="/old.ico">
        </head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(favicon(&document).as_deref(), Some("/old.ico"));
    }
}
