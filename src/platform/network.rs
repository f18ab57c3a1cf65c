// Upstream network client
// Author: kelexine (https://github.com/kelexine)

use super::Network;
use crate::config::UpstreamConfig;
use crate::error::{OfflineError, Result};
use crate::metrics;
use crate::models::{FetchResponse, InterceptedRequest, ResponseType};
use async_trait::async_trait;
use http::header::{self, HeaderMap};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::{Origin, Url};

/// Hop-by-hop headers are connection-scoped and never forwarded.
const HOP_BY_HOP: [header::HeaderName; 6] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::TE,
    header::TRAILER,
    header::PROXY_AUTHORIZATION,
];

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// reqwest-backed [`Network`] talking to the upstream dashboard server.
///
/// Responses from the upstream origin that were not redirected are `basic`;
/// anything from another origin (CDN assets in the manifest) is `cors`.
pub struct HttpNetwork {
    http_client: Client,
    origin: Origin,
}

impl HttpNetwork {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| OfflineError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created upstream HTTP client for {}", config.base_url);

        Ok(Self {
            http_client,
            origin: base.origin(),
        })
    }

    fn response_type(&self, final_url: &Url, redirected: bool) -> ResponseType {
        if final_url.origin() == self.origin && !redirected {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<FetchResponse> {
        let mut headers = request.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        debug!("Fetching {} {}", request.method, request.url);

        let response = self
            .http_client
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| {
                metrics::record_network_fetch("failed");
                debug!("{} {} failed: {}", request.method, request.url, e);
                OfflineError::Http(e)
            })?;

        let status = response.status();
        let final_url = response.url().clone();
        let redirected = final_url != request.url;
        let mut response_headers = response.headers().clone();
        strip_hop_by_hop(&mut response_headers);

        let body = response.bytes().await.map_err(|e| {
            metrics::record_network_fetch("failed");
            debug!("Reading body of {} failed: {}", request.url, e);
            OfflineError::Http(e)
        })?;

        metrics::record_network_fetch(if status.is_success() { "ok" } else { "http_error" });

        Ok(FetchResponse {
            status,
            headers: response_headers,
            body,
            response_type: self.response_type(&final_url, redirected),
            redirected,
        })
    }
}
