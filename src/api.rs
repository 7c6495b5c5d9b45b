use crate::error::SearchError;
use crate::model::{HealthStatus, SearchQuery, SearchResult};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP access to the scraping API rooted at `base_url` (e.g. `http://localhost:5001/api`).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn scrape_url(&self, query: &SearchQuery) -> Result<Url, SearchError> {
        let max_products = query.max_results().to_string();
        Url::parse_with_params(
            &format!("{}/scrape", self.base_url),
            &[
                ("keyword", query.keyword()),
                ("max_products", max_products.as_str()),
            ],
        )
        .map_err(|e| SearchError::Transport(format!("Invalid API URL {}: {}", self.base_url, e)))
    }

    pub async fn scrape(
        &self,
        query: &SearchQuery,
        timeout: Duration,
    ) -> Result<SearchResult, SearchError> {
        let url = self.scrape_url(query)?;
        tracing::debug!("GET {}", url);

        let response = self.get(url, timeout).await?;
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::from_reqwest(&e))?;

        serde_json::from_str(&body).map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    pub async fn health(&self, timeout: Duration) -> Result<HealthStatus, SearchError> {
        let url = Url::parse(&format!("{}/health", self.base_url))
            .map_err(|e| SearchError::Transport(format!("Invalid API URL {}: {}", self.base_url, e)))?;
        tracing::debug!("GET {}", url);

        self.get(url, timeout)
            .await?
            .json()
            .await
            .map_err(|e| SearchError::from_reqwest(&e))
    }

    async fn get(&self, url: Url, timeout: Duration) -> Result<Response, SearchError> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| SearchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            // The body may carry the server's own explanation; it does not
            // change the classification.
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
            return Err(http_error(status, detail));
        }

        Ok(response)
    }
}

fn http_error(status: StatusCode, detail: Option<String>) -> SearchError {
    SearchError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query(keyword: &str, max: u32) -> SearchQuery {
        SearchQuery::new(keyword, max).unwrap()
    }

    #[test]
    fn scrape_url_encodes_keyword() {
        let client = ApiClient::new("http://localhost:5001/api/");
        let url = client.scrape_url(&query("café & tea", 10)).unwrap();
        assert_eq!(url.path(), "/api/scrape");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("keyword".to_string(), "café & tea".to_string()),
                ("max_products".to_string(), "10".to_string()),
            ]
        );
        assert!(url.as_str().contains("caf%C3%A9"));
        assert!(!url.query().unwrap().contains(" & "));
    }

    #[test]
    fn bad_base_url_is_transport_error() {
        let client = ApiClient::new("not a url");
        assert!(matches!(
            client.scrape_url(&query("x", 1)),
            Err(SearchError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn scrape_decodes_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/scrape"))
            .and(query_param("keyword", "notebook"))
            .and(query_param("max_products", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "total_products": 1,
                "execution_time": 1.2,
                "products": [{"title": "Notebook", "rating": "4.1", "reviews_count": "10",
                              "image_url": "N/A", "price": "3.499"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/api", server.uri()));
        let result = client
            .scrape(&query("notebook", 5), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].image_url, None);
    }

    #[tokio::test]
    async fn non_2xx_is_http_error_even_with_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "success": false,
                "error": "Erro interno do servidor"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let err = client
            .scrape(&query("x", 1), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SearchError::Http {
                status: 500,
                reason: "Internal Server Error".to_string(),
                detail: Some("Erro interno do servidor".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let err = client
            .scrape(&query("x", 1), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidResponse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scrape"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "products": []}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let err = client
            .scrape(&query("x", 1), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::Timeout);
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Bind then drop a listener so the port is known to be closed.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = ApiClient::new(&format!("http://{}", addr));
        let err = client
            .scrape(&query("x", 1), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn health_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "healthy",
                "service": "Amazon Scraper API",
                "timestamp": 1700000000.5
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let health = client.health(HEALTH_TIMEOUT).await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.service.as_deref(), Some("Amazon Scraper API"));
    }
}
