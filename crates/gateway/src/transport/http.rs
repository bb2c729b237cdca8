use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::HttpConfig;
use crate::error::TransportError;

/// Path the relay serves its forwarding endpoint on
const RELAY_PATH: &str = "/api/proxy";

/// How requests reach the venue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Direct,
    /// Forward through `{base_url}/api/proxy?url=<upstream>`
    Relay { base_url: String },
}

/// Build the shared HTTP client with an explicit request timeout
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()
}

/// REST client for one venue endpoint (one market of one exchange)
/// Infrastructure component - handles HTTP communication
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    route: Route,
}

impl RestClient {
    pub fn new(client: Client, base_url: impl Into<String>, route: Route) -> Self {
        RestClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            route,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Venue URL for a path and query, before any relay wrapping
    pub fn upstream_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, TransportError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// URL actually requested, after applying the route
    pub fn request_url(&self, upstream: &Url) -> Result<Url, TransportError> {
        match &self.route {
            Route::Direct => Ok(upstream.clone()),
            Route::Relay { base_url } => {
                let mut url = Url::parse(&format!(
                    "{}{}",
                    base_url.trim_end_matches('/'),
                    RELAY_PATH
                ))?;
                url.query_pairs_mut().append_pair("url", upstream.as_str());
                Ok(url)
            }
        }
    }

    /// GET a JSON document
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, TransportError> {
        let upstream = self.upstream_url(path, query)?;
        let url = self.request_url(&upstream)?;
        tracing::debug!(url = %upstream, relayed = matches!(self.route, Route::Relay { .. }), "GET");

        let resp = self.client.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, TransportError> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            if matches!(self.route, Route::Relay { .. }) {
                if let Ok(err) = serde_json::from_str::<RelayError>(&text) {
                    return Err(TransportError::Relay {
                        status: err.status.unwrap_or(status.as_u16()),
                        message: err.error,
                    });
                }
            }
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&text, 256),
            });
        }

        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Failure body returned by the relay
#[derive(Deserialize)]
struct RelayError {
    error: String,
    #[serde(default)]
    status: Option<u16>,
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
