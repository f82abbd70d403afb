//! JSON-over-HTTP target.

use crate::core::{LoadError, OperationDescriptor, TargetOperation};
use anyhow::{Context, Result, bail};
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// POSTs each descriptor's payload as JSON to a fixed URL.
///
/// A 2xx response is a success whose payload is the response body parsed as
/// JSON, or `{"bytes": n}` when the body is not JSON. Any other status fails
/// the invocation with `HTTP <status>: <body>`. Timeouts are left to the
/// invocation budget; the request is dropped when it is abandoned.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    client: Client,
    url: Url,
}

impl HttpTarget {
    /// Build a target for `url`, sending `headers` with every request.
    pub fn new(url: &str, headers: &BTreeMap<String, String>) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| LoadError::TargetError {
            reason: format!("invalid URL '{url}': {e}"),
        })?;

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| LoadError::TargetError {
                    reason: format!("invalid header name '{name}': {e}"),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| LoadError::TargetError {
                reason: format!("invalid value for header '{name}': {e}"),
            })?;
            header_map.insert(header_name, header_value);
        }

        let client = Client::builder()
            .default_headers(header_map)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
        })
    }

    /// Endpoint this target posts to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl TargetOperation for HttpTarget {
    fn call(&self, descriptor: &OperationDescriptor) -> BoxFuture<'static, Result<Value>> {
        let client = self.client.clone();
        let url = self.url.clone();
        let payload = descriptor.payload().clone();

        async move {
            let response = client
                .post(url.clone())
                .json(&payload)
                .send()
                .await
                .with_context(|| format!("Request to {url} failed"))?;

            let status = response.status();
            let body = response.text().await.context("Failed to read response body")?;

            if !status.is_success() {
                bail!("HTTP {}: {}", status.as_u16(), body.trim());
            }

            Ok(serde_json::from_str(&body).unwrap_or_else(|_| json!({ "bytes": body.len() })))
        }
        .boxed()
    }
}
