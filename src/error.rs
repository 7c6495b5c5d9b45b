use serde::Serialize;
use thiserror::Error;

pub const UNKNOWN_SCRAPE_ERROR: &str = "Unknown scraping error";

/// Everything that can go wrong between a submitted search and its outcome.
///
/// `Display` is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SearchError {
    #[error("{0}")]
    Validation(String),

    #[error("The search took too long to respond. Please try again.")]
    Timeout,

    #[error("Could not connect to the server. Check your connection.")]
    Transport(String),

    #[error("HTTP error: {status} - {reason}{}", format_detail(.detail))]
    Http {
        status: u16,
        reason: String,
        detail: Option<String>,
    },

    #[error("{0}")]
    Application(String),

    #[error("The server sent a response that could not be read: {0}")]
    InvalidResponse(String),

    #[error("A search is already in progress")]
    Busy,

    #[error("The search was cancelled before it finished")]
    Cancelled,
}

impl SearchError {
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_decode() {
            SearchError::InvalidResponse(e.to_string())
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}

fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_mentions_status() {
        let err = SearchError::Http {
            status: 500,
            reason: "Internal Server Error".to_string(),
            detail: None,
        };
        assert_eq!(err.to_string(), "HTTP error: 500 - Internal Server Error");
    }

    #[test]
    fn http_error_appends_server_detail() {
        let err = SearchError::Http {
            status: 400,
            reason: "Bad Request".to_string(),
            detail: Some("max_products out of range".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "HTTP error: 400 - Bad Request (max_products out of range)"
        );
    }

    #[test]
    fn application_error_is_server_message_verbatim() {
        assert_eq!(SearchError::Application("boom".into()).to_string(), "boom");
    }
}
