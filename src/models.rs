use serde::{Deserialize, Serialize};

/// Screenshot lists are capped at this length everywhere they are built.
pub const MAX_SCREENSHOTS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub url: String,
}

/// The assembled record for one URL. Always fully populated: missing
/// fields are empty strings / an empty list, never absent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectMetadata {
    pub title: String,
    pub description: String,
    pub image: String,
    pub screenshots: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub title: String,
    pub description: String,
    pub image: String,
    pub screenshots: Vec<String>,
    pub source_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serialization() {
        let response = PreviewResponse {
            title: "Example".to_string(),
            description: "An example website".to_string(),
            image: "https://example.com/icon.png".to_string(),
            screenshots: vec!["https://example.com/shot.png".to_string()],
            source_url: "https://example.com".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"source_url\":\"https://example.com\""));
        assert!(json.contains("shot.png"));
    }
}
