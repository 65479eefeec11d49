//! Content API client.
//!
//! Fetches a single content document by model and id. The client performs
//! exactly one request per call and never retries; callers decide what a
//! failure means for them.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;
use variantscope_shared::{ContentApiConfig, ContentRef, Result, VariantScopeError};

/// Path prefix of the content-by-model-and-id endpoint.
const CONTENT_PATH: [&str; 3] = ["api", "v3", "content"];

/// Default timeout in seconds for content fetches.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum response size we accept (50 MB).
const MAX_RESPONSE_SIZE: u64 = 50 * 1024 * 1024;

/// User-Agent string for content requests.
const USER_AGENT: &str = concat!("VariantScope/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Client options
// ---------------------------------------------------------------------------

/// Configuration for [`ContentClient`].
#[derive(Debug, Clone)]
pub struct ContentClientOptions {
    /// Origin of the content API, e.g. `https://cdn.builder.io`.
    pub base_url: Url,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl ContentClientOptions {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TryFrom<&ContentApiConfig> for ContentClientOptions {
    type Error = VariantScopeError;

    fn try_from(config: &ContentApiConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url()?,
            timeout_secs: config.timeout_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// ContentClient
// ---------------------------------------------------------------------------

/// HTTP client for the content API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ContentClient {
    client: Client,
    base_url: Url,
}

impl ContentClient {
    /// Build a client with the given options.
    pub fn new(opts: &ContentClientOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| VariantScopeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: opts.base_url.clone(),
        })
    }

    /// Build a client from the `[content_api]` config section.
    pub fn from_config(config: &ContentApiConfig) -> Result<Self> {
        Self::new(&ContentClientOptions::try_from(config)?)
    }

    /// URL of the content endpoint for `content`, without credentials.
    pub fn content_url(&self, content: &ContentRef) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| {
                VariantScopeError::config(format!("base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(CONTENT_PATH)
            .push(content.model())
            .push(&content.id);
        Ok(url)
    }

    /// Fetch the full content document for `content`.
    ///
    /// Sends `apiKey` and a cache-busting flag as query parameters and
    /// expects a JSON body. Non-success statuses, transport failures and
    /// undecodable bodies are all errors.
    #[instrument(skip_all, fields(model = %content.model(), id = %content.id))]
    pub async fn fetch_content(&self, content: &ContentRef, api_key: &str) -> Result<Value> {
        let endpoint = self.content_url(content)?;
        let mut request_url = endpoint.clone();
        request_url
            .query_pairs_mut()
            .append_pair("apiKey", api_key)
            .append_pair("cachebust", "true");

        debug!(%endpoint, "fetching content document");

        // reqwest errors embed the request URL, which carries the API key.
        let response = self
            .client
            .get(request_url)
            .send()
            .await
            .map_err(|e| VariantScopeError::Network(format!("{endpoint}: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VariantScopeError::Status {
                status: status.as_u16(),
                url: endpoint.to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(VariantScopeError::validation(format!(
                    "{endpoint}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
                )));
            }
        }

        let body = response.text().await.map_err(|e| {
            VariantScopeError::Network(format!("{endpoint}: failed to read body: {}", e.without_url()))
        })?;

        serde_json::from_str(&body)
            .map_err(|e| VariantScopeError::parse(format!("{endpoint}: body is not JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ContentClient {
        let base = Url::parse(&server.uri()).unwrap();
        ContentClient::new(&ContentClientOptions::new(base)).unwrap()
    }

    #[test]
    fn test_content_url_resolves_model() {
        let base = Url::parse("https://cdn.example.com").unwrap();
        let client = ContentClient::new(&ContentClientOptions::new(base)).unwrap();

        let url = client.content_url(&ContentRef::new("abc123")).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/api/v3/content/page/abc123");

        let url = client
            .content_url(&ContentRef::new("abc123").with_model_id("m-1"))
            .unwrap();
        assert_eq!(url.path(), "/api/v3/content/m-1/abc123");
    }

    #[test]
    fn test_content_url_escapes_segments() {
        let base = Url::parse("https://cdn.example.com/proxy/").unwrap();
        let client = ContentClient::new(&ContentClientOptions::new(base)).unwrap();

        let url = client
            .content_url(&ContentRef::new("a/b c").with_model_name("blog"))
            .unwrap();
        assert_eq!(url.path(), "/proxy/api/v3/content/blog/a%2Fb%20c");
    }

    #[tokio::test]
    async fn test_fetch_sends_key_and_cachebust() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/content/page/abc123"))
            .and(query_param("apiKey", "secret"))
            .and(query_param("cachebust", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "abc123", "data": {"blocks": []}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let doc = client
            .fetch_content(&ContentRef::new("abc123"), "secret")
            .await
            .unwrap();
        assert_eq!(doc["id"], "abc123");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/content/page/abc123"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .fetch_content(&ContentRef::new("abc123"), "secret")
            .await
            .unwrap_err();

        match err {
            VariantScopeError::Status { status, url } => {
                assert_eq!(status, 500);
                assert!(!url.contains("secret"), "credentials leaked into error: {url}");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_non_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/content/page/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .fetch_content(&ContentRef::new("abc123"), "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, VariantScopeError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        // Nothing listens on this port once the listener is dropped.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
        let client = ContentClient::new(&ContentClientOptions::new(base)).unwrap();

        let err = client
            .fetch_content(&ContentRef::new("abc123"), "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, VariantScopeError::Network(_)));
        assert!(!err.to_string().contains("secret"));
    }
}
