use url::Url;

/// Resolve an asset URL candidate found in markup against the page URL.
///
/// Rules, checked in order: absolute http(s) URLs pass through unchanged;
/// protocol-relative `//host/...` gets an https scheme; root-relative
/// `/path` is resolved against the base's scheme and host; anything else
/// is resolved relative to the base URL's path.
pub fn normalize(candidate: &str, base: &Url) -> String {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        candidate.to_string()
    } else if candidate.starts_with("//") {
        format!("https:{}", candidate)
    } else if candidate.starts_with('/') {
        format!(
            "{}://{}{}",
            base.scheme(),
            base.host_str().unwrap_or_default(),
            candidate
        )
    } else {
        base.join(candidate)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| candidate.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/a/b").unwrap()
    }

    #[test]
    fn test_absolute_unchanged() {
        assert_eq!(
            normalize("https://cdn.example.com/x.png", &base()),
            "https://cdn.example.com/x.png"
        );
        assert_eq!(
            normalize("http://example.org/y.png", &base()),
            "http://example.org/y.png"
        );
    }

    #[test]
    fn test_protocol_relative_gets_https() {
        assert_eq!(
            normalize("//cdn.example.com/x.png", &base()),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn test_root_relative_uses_scheme_and_host() {
        assert_eq!(
            normalize("/favicon.ico", &base()),
            "https://example.com/favicon.ico"
        );
    }

    #[test]
    fn test_relative_resolves_against_base_path() {
        assert_eq!(normalize("icon.png", &base()), "https://example.com/a/icon.png");
    }
}
