use crate::error::SearchError;
use serde::{Deserialize, Deserializer, Serialize};

/// Marker the scraping API uses for "field not available".
pub const NOT_AVAILABLE: &str = "N/A";

pub const EMPTY_KEYWORD_MESSAGE: &str = "Please enter a keyword to search.";
pub const ZERO_LIMIT_MESSAGE: &str = "The number of products must be at least 1.";

/// A validated search request: trimmed non-empty keyword, positive limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    keyword: String,
    max_results: u32,
}

impl SearchQuery {
    pub fn new(keyword: &str, max_results: u32) -> Result<Self, SearchError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::Validation(EMPTY_KEYWORD_MESSAGE.to_string()));
        }
        if max_results == 0 {
            return Err(SearchError::Validation(ZERO_LIMIT_MESSAGE.to_string()));
        }
        Ok(Self {
            keyword: keyword.to_string(),
            max_results,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn max_results(&self) -> u32 {
        self.max_results
    }
}

/// One product as returned by the API. `"N/A"` values arrive here as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "available")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "available")]
    pub rating: Option<String>,
    #[serde(default = "zero_reviews", deserialize_with = "reviews")]
    pub reviews_count: String,
    #[serde(default, deserialize_with = "available")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "available")]
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub success: bool,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total_products: Option<u32>,
    #[serde(default, rename = "execution_time")]
    pub execution_time_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_url: Option<String>,
}

impl SearchResult {
    /// Count reported by the server, or the number of products received.
    pub fn total(&self) -> u32 {
        self.total_products
            .unwrap_or_else(|| u32::try_from(self.products.len()).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// The scraper sends numerals as strings, but accept bare numbers too.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Text(String),
    Number(serde_json::Number),
}

impl RawField {
    fn into_string(self) -> String {
        match self {
            RawField::Text(s) => s,
            RawField::Number(n) => n.to_string(),
        }
    }
}

fn available<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawField>::deserialize(deserializer)?;
    Ok(raw
        .map(RawField::into_string)
        .filter(|s| s.trim() != NOT_AVAILABLE && !s.trim().is_empty()))
}

fn reviews<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(available(deserializer)?.unwrap_or_else(zero_reviews))
}

fn zero_reviews() -> String {
    "0".to_string()
}
