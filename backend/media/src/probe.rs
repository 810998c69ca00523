//! HTTP image probe.
//!
//! A link counts as an image when a `HEAD` request succeeds and the server
//! labels the body `image/*`. Servers that omit `Content-Type` fall back to
//! the URL's extension.

use std::time::Duration;

use argot_core::{ArgotError, LinkProbe};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::mime_detect::{is_image, mime_from_url};

pub struct HttpImageProbe {
    client: Client,
}

impl HttpImageProbe {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ArgotError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ArgotError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Only absolute http(s) URLs are probed.
    fn parse(url: &str) -> Option<Url> {
        Url::parse(url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
    }

    /// Probe `url`. `Ok(false)` means the server answered and it is not an
    /// image, or the URL is not worth asking about.
    pub async fn check(&self, url: &str) -> Result<bool, ArgotError> {
        let Some(parsed) = Self::parse(url) else {
            return Ok(false);
        };

        let response = self
            .client
            .head(parsed.clone())
            .send()
            .await
            .map_err(|e| ArgotError::Probe { url: url.to_string(), message: e.to_string() })?;

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "probe got non-success status");
            return Ok(false);
        }

        let verdict = match response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            Some(content_type) => is_image(content_type),
            None => mime_from_url(&parsed).is_some(),
        };
        Ok(verdict)
    }
}

#[async_trait]
impl LinkProbe for HttpImageProbe {
    async fn is_image(&self, url: &str) -> bool {
        match self.check(url).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(error = %e, "image probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe() -> HttpImageProbe {
        HttpImageProbe::new(Duration::from_secs(1), "argot-test").unwrap()
    }

    #[test]
    fn only_http_urls_are_probed() {
        assert!(HttpImageProbe::parse("https://cdn.example/a.png").is_some());
        assert!(HttpImageProbe::parse("http://cdn.example/a.png").is_some());
        assert!(HttpImageProbe::parse("ftp://cdn.example/a.png").is_none());
        assert!(HttpImageProbe::parse("file:///etc/passwd").is_none());
        assert!(HttpImageProbe::parse("a.png").is_none());
    }

    #[tokio::test]
    async fn rejects_without_network_for_bad_urls() {
        let probe = probe();
        assert!(!probe.check("not a url").await.unwrap());
        assert!(!probe.is_image("javascript:alert(1)").await);
    }
}
