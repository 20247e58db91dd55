//! Image lookup service client.
//!
//! The service takes an article URL and answers with the URL of that article's
//! lead image, minus its scheme.
//!
//! # Wire format
//!
//! ```text
//! POST <endpoint>
//! {"wikiURL": "https://en.wikipedia.org/wiki/Some_Album"}
//!
//! 200 OK
//! {"imageURL": "//upload.wikimedia.org/.../cover.jpg"}
//! ```
//!
//! # Architecture
//!
//! - [`ImageLookup`]: core trait, one lookup per call
//! - [`HttpImageLookup`]: talks to the real service over `reqwest`
//! - [`ThrottledLookup`]: decorator that takes a permit from a
//!   [`RateLimiter`] before delegating and releases it afterwards

use crate::error::LookupError;
use crate::throttle::RateLimiter;
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Resolves an article URL to an image URL.
pub trait ImageLookup {
    /// Look up the image for `wiki_url` and return it as an absolute URL.
    async fn lookup(&self, wiki_url: &str) -> Result<String, LookupError>;
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    #[serde(rename = "wikiURL")]
    wiki_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "imageURL")]
    image_url: String,
}

/// Turn the service's `imageURL` into an absolute URL.
///
/// The service strips the scheme but leaves the two leading characters of a
/// protocol-relative URL (`//host/...`) in place, so the first two characters
/// are dropped and `https://` is prefixed.
///
/// ```ignore
/// assert_eq!(image_url_from_response("xyAB12.jpg"), "https://AB12.jpg");
/// ```
pub fn image_url_from_response(raw: &str) -> String {
    format!("https://{}", raw.chars().skip(2).collect::<String>())
}

/// [`ImageLookup`] backed by the HTTP image service.
#[derive(Debug, Clone)]
pub struct HttpImageLookup {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpImageLookup {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl ImageLookup for HttpImageLookup {
    #[instrument(level = "debug", skip(self), fields(endpoint = %self.endpoint))]
    async fn lookup(&self, wiki_url: &str) -> Result<String, LookupError> {
        let t0 = Instant::now();
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&LookupRequest { wiki_url })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), %wiki_url, "Image service returned an error status");
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        let parsed: LookupResponse = serde_json::from_str(&body).map_err(|e| LookupError::Body {
            reason: e.to_string(),
            body: truncate_for_log(&body, 200),
        })?;

        let image = image_url_from_response(&parsed.image_url);
        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Image lookup finished");
        info!(%wiki_url, %image, "Resolved image URL");
        Ok(image)
    }
}

/// Decorator that waits for a [`RateLimiter`] permit before each lookup and
/// releases it when the lookup returns, whether it succeeded or not.
pub struct ThrottledLookup<T, R> {
    inner: T,
    limiter: R,
}

impl<T, R> ThrottledLookup<T, R>
where
    T: ImageLookup,
    R: RateLimiter,
{
    pub fn new(inner: T, limiter: R) -> Self {
        Self { inner, limiter }
    }
}

impl<T: fmt::Debug, R: fmt::Debug> fmt::Debug for ThrottledLookup<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledLookup")
            .field("inner", &self.inner)
            .field("limiter", &self.limiter)
            .finish()
    }
}

impl<T, R> ImageLookup for ThrottledLookup<T, R>
where
    T: ImageLookup,
    R: RateLimiter,
{
    async fn lookup(&self, wiki_url: &str) -> Result<String, LookupError> {
        self.limiter.acquire().await;
        let result = self.inner.lookup(wiki_url).await;
        self.limiter.release().await;
        result
    }
}
