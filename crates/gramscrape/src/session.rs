//! Per-engine request session.
//!
//! Owns the HTTP client, the current [`RequestIdentity`], the pacer and the
//! random source. Every outbound call goes through [`Session::get`], which
//! paces, rotates the identity, and attaches its headers.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::ScraperConfig;
use crate::http_client::{HttpClient, HttpResponse};
use crate::identity::RequestIdentity;
use crate::pacing::{CallKind, Pacer};
use crate::types::{AcquisitionError, AcquisitionResult};

/// Request state owned by one engine instance.
pub struct Session {
    config: ScraperConfig,
    client: HttpClient,
    identity: RequestIdentity,
    pacer: Pacer,
    rng: StdRng,
    requests_sent: usize,
}

impl Session {
    pub fn new(config: ScraperConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Build a session with a caller-supplied random source.
    pub fn with_rng(config: ScraperConfig, mut rng: StdRng) -> Self {
        let identity = RequestIdentity::generate(&mut rng);
        let pacer = Pacer::new(config.pacing.clone());
        Self {
            config,
            client: HttpClient::new(),
            identity,
            pacer,
            rng,
            requests_sent: 0,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn identity(&self) -> &RequestIdentity {
        &self.identity
    }

    /// Number of requests issued over the lifetime of this session.
    pub fn requests_sent(&self) -> usize {
        self.requests_sent
    }

    /// Absolute URL for a fixed provider path such as `/graphql/query/`.
    pub fn endpoint(&self, path: &str) -> AcquisitionResult<String> {
        let joined = self
            .base_url()?
            .join(path)
            .map_err(|e| AcquisitionError::InvalidUrl(format!("bad path {path}: {e}")))?;
        Ok(joined.to_string())
    }

    /// Profile page URL, `/{username}/`. The username is percent-encoded
    /// as a single path segment.
    pub fn profile_url(&self, username: &str) -> AcquisitionResult<String> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| AcquisitionError::InvalidUrl("base url cannot have a path".into()))?
            .pop_if_empty()
            .push(username)
            .push("");
        Ok(url.to_string())
    }

    fn base_url(&self) -> AcquisitionResult<url::Url> {
        url::Url::parse(&self.config.base_url)
            .map_err(|e| AcquisitionError::InvalidUrl(format!("bad base url: {e}")))
    }

    /// Timeout for a call class.
    pub fn timeout_for(&self, kind: CallKind) -> Duration {
        if kind.is_continuation() {
            Duration::from_millis(self.config.continuation_timeout_ms)
        } else {
            Duration::from_millis(self.config.page_timeout_ms)
        }
    }

    /// Pace, rotate identity, and issue one GET.
    ///
    /// Non-2xx statuses are returned as [`AcquisitionError::Status`].
    pub async fn get(
        &mut self,
        kind: CallKind,
        url: &str,
        query: &[(&str, &str)],
        extra_headers: &[(&'static str, String)],
    ) -> AcquisitionResult<HttpResponse> {
        let delay = self.pacer.delay_for(kind, &mut self.rng);
        self.pacer.pause(delay).await;

        self.identity.rotate(&mut self.rng);
        let mut headers: HeaderMap = self.identity.headers();
        for (name, value) in extra_headers {
            if let Ok(v) = HeaderValue::from_str(value) {
                headers.insert(HeaderName::from_static(*name), v);
            }
        }

        let timeout = self.timeout_for(kind);
        self.requests_sent += 1;
        tracing::debug!(?kind, url, "GET");

        let resp = self.client.get(url, query, headers, timeout).await;
        match &resp {
            Ok(r) => tracing::debug!(?kind, status = r.status, "Response received"),
            Err(e) => tracing::debug!(?kind, error = %e, "Request failed"),
        }
        resp?.require_success()
    }

    /// Headers for the JSON endpoints that expect an XHR from the web app.
    pub fn app_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("x-ig-app-id", self.config.app_id.clone()),
            ("x-requested-with", "XMLHttpRequest".to_string()),
            ("x-csrftoken", self.identity.tokens().csrf_token.clone()),
        ]
    }
}
