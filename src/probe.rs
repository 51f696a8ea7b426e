//! Target probing and classification
//!
//! One outbound HTTP request per check target, classified into a
//! [`CheckReport`] that renders straight to the reply line shown to the
//! user. Transport failures never escape this module as errors; they
//! collapse into the `Error`/`Dead` outcomes.

use crate::config::{
    API_PROBE_TIMEOUT_SECS, BEARER_CHECK_URL, IP_ECHO_URL, PROXY_PROBE_TIMEOUT_SECS,
};
use reqwest::{redirect, Client, Proxy, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure markers scanned for in 200-status response bodies
const ERROR_MARKERS: &[&str] = &[
    "error",
    "invalid",
    "forbidden",
    "unauthorized",
    "not found",
    "failed",
];

/// What shape a check target has, deciding which probe runs
///
/// Precedence: an explicit scheme wins over a colon, a colon wins over the
/// bare-credential fallback. Note that a credential which itself contains a
/// colon classifies as a proxy, so re-checking such a stored target routes
/// it through the proxy probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// `http://` or `https://` endpoint, fetched directly
    Url,
    /// `host:port` pair, used as an HTTP proxy
    Proxy,
    /// Opaque bearer credential, sent to the bearer-check endpoint
    Credential,
}

impl TargetKind {
    /// Classify a raw target string
    #[must_use]
    pub fn classify(target: &str) -> Self {
        if target.starts_with("http://") || target.starts_with("https://") {
            Self::Url
        } else if target.contains(':') {
            Self::Proxy
        } else {
            Self::Credential
        }
    }
}

/// Transport-level probe failure
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Proxy address or client could not be constructed
    #[error("Bad proxy: {0}")]
    BadProxy(String),
    /// Network failure: timeout, DNS, refused connection, broken body read
    #[error("Network error: {0}")]
    Network(String),
}

/// Classified outcome of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// URL answered 200 with a clean body
    UrlValid,
    /// URL answered something other than 200
    UrlInvalidStatus(u16),
    /// URL answered 200 but the body carries a failure marker
    UrlInvalidBody,
    /// Bearer credential accepted by the check endpoint
    KeyValid,
    /// Bearer credential rejected (401)
    KeyInvalid,
    /// Bearer check endpoint answered an unexpected status
    UnknownStatus(u16),
    /// Proxy relayed the probe; carries the observed egress IP
    ProxyLive(String),
    /// Proxy never relayed a response within the timeout
    ProxyDead,
    /// The probe itself failed before anything could be classified
    TransportError(String),
}

/// Outcome of probing one target, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// The string that was probed
    pub target: String,
    /// What the probe concluded
    pub outcome: CheckOutcome,
}

impl CheckReport {
    /// Reply line for this report, HTML-escaped for Telegram
    #[must_use]
    pub fn render(&self) -> String {
        let target = html_escape::encode_text(&self.target);
        match &self.outcome {
            CheckOutcome::UrlValid => "🟢 VALID URL".to_string(),
            CheckOutcome::UrlInvalidStatus(code) => format!("🔴 INVALID URL → Status {code}"),
            CheckOutcome::UrlInvalidBody => {
                "🔴 INVALID URL → Error detected in response".to_string()
            }
            CheckOutcome::KeyValid => "🟢 VALID API KEY".to_string(),
            CheckOutcome::KeyInvalid => "🔴 INVALID API KEY".to_string(),
            CheckOutcome::UnknownStatus(code) => format!("⚠ UNKNOWN STATUS {code}"),
            CheckOutcome::ProxyLive(ip) => {
                format!("🟢 LIVE → {target}\nIP: {}", html_escape::encode_text(ip))
            }
            CheckOutcome::ProxyDead => format!("🔴 DEAD → {target}"),
            CheckOutcome::TransportError(message) => {
                format!("❌ ERROR → {}", html_escape::encode_text(message))
            }
        }
    }
}

/// Issues single-shot HTTP probes and classifies their outcomes
///
/// Holds one shared client for API/URL checks; proxy checks build a
/// throwaway client per target because the proxy differs every time.
#[derive(Clone)]
pub struct ProbeEngine {
    http: Client,
    proxy_timeout: Duration,
    bearer_endpoint: String,
    ip_echo_endpoint: String,
}

impl ProbeEngine {
    /// Engine wired to the production check endpoints
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoints(BEARER_CHECK_URL, IP_ECHO_URL)
    }

    /// Engine with custom check endpoints, used by tests with a local server
    #[must_use]
    pub fn with_endpoints(
        bearer_endpoint: impl Into<String>,
        ip_echo_endpoint: impl Into<String>,
    ) -> Self {
        // A 3xx answer classifies as its own status; redirects are never followed
        let http = Client::builder()
            .timeout(Duration::from_secs(API_PROBE_TIMEOUT_SECS))
            .redirect(redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            proxy_timeout: Duration::from_secs(PROXY_PROBE_TIMEOUT_SECS),
            bearer_endpoint: bearer_endpoint.into(),
            ip_echo_endpoint: ip_echo_endpoint.into(),
        }
    }

    /// Probe a URL or bearer credential, one attempt, 8s bound
    pub async fn check_api(&self, target: &str) -> CheckReport {
        let result = match TargetKind::classify(target) {
            TargetKind::Url => self.probe_url(target).await,
            TargetKind::Proxy | TargetKind::Credential => self.probe_bearer(target).await,
        };

        let outcome = result.unwrap_or_else(|err| {
            debug!("API probe for {target} failed in transport: {err}");
            CheckOutcome::TransportError(err.to_string())
        });

        CheckReport {
            target: target.to_string(),
            outcome,
        }
    }

    /// Probe a `host:port` pair as an HTTP proxy, one attempt, 6s bound
    pub async fn check_proxy(&self, target: &str) -> CheckReport {
        let outcome = match self.relay_through(target).await {
            Ok(ip) => CheckOutcome::ProxyLive(ip),
            Err(err) => {
                debug!("Proxy {target} failed to relay: {err}");
                CheckOutcome::ProxyDead
            }
        };

        CheckReport {
            target: target.to_string(),
            outcome,
        }
    }

    /// Re-probe a stored target, routing by its classified shape
    pub async fn recheck(&self, target: &str) -> CheckReport {
        match TargetKind::classify(target) {
            TargetKind::Proxy => self.check_proxy(target).await,
            TargetKind::Url | TargetKind::Credential => self.check_api(target).await,
        }
    }

    async fn probe_url(&self, url: &str) -> Result<CheckOutcome, ProbeError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(CheckOutcome::UrlInvalidStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        if contains_error_marker(&body) {
            Ok(CheckOutcome::UrlInvalidBody)
        } else {
            Ok(CheckOutcome::UrlValid)
        }
    }

    async fn probe_bearer(&self, credential: &str) -> Result<CheckOutcome, ProbeError> {
        let response = self
            .http
            .get(&self.bearer_endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {credential}"))
            .send()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        Ok(match response.status().as_u16() {
            200 => CheckOutcome::KeyValid,
            401 => CheckOutcome::KeyInvalid,
            other => CheckOutcome::UnknownStatus(other),
        })
    }

    /// Fetch the IP echo endpoint through `target`; any completed response
    /// counts as a relay, any failure collapses to `Dead` at the caller
    async fn relay_through(&self, target: &str) -> Result<String, ProbeError> {
        let proxy = Proxy::all(format!("http://{target}"))
            .map_err(|e| ProbeError::BadProxy(e.to_string()))?;

        let client = Client::builder()
            .proxy(proxy)
            .timeout(self.proxy_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ProbeError::BadProxy(e.to_string()))?;

        let body = client
            .get(&self.ip_echo_endpoint)
            .send()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?
            .text()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        Ok(body.trim().to_string())
    }
}

impl Default for ProbeEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_error_marker(body: &str) -> bool {
    if body.is_empty() {
        return false;
    }
    let lowered = body.to_lowercase();
    ERROR_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_scheme_beats_colon() {
        // URLs carry colons; the scheme check must run first
        assert_eq!(TargetKind::classify("http://host:8080/path"), TargetKind::Url);
        assert_eq!(TargetKind::classify("https://api.example.com"), TargetKind::Url);
    }

    #[test]
    fn test_classify_colon_means_proxy() {
        assert_eq!(TargetKind::classify("1.2.3.4:8080"), TargetKind::Proxy);
        assert_eq!(TargetKind::classify("user:pass@host:3128"), TargetKind::Proxy);
        // Compound credentials with a colon land here too; inherited behavior
        assert_eq!(TargetKind::classify("sk:secret"), TargetKind::Proxy);
    }

    #[test]
    fn test_classify_bare_string_is_credential() {
        assert_eq!(TargetKind::classify("sk-abcdef123456"), TargetKind::Credential);
        // A scheme-ish prefix without the separator is not a URL
        assert_eq!(TargetKind::classify("httpkey"), TargetKind::Credential);
    }

    #[test]
    fn test_error_marker_detection_is_case_insensitive() {
        assert!(contains_error_marker("{\"status\": \"ERROR\"}"));
        assert!(contains_error_marker("Access FORBIDDEN for this key"));
        assert!(contains_error_marker("resource Not Found"));
        assert!(contains_error_marker("request failed"));
    }

    #[test]
    fn test_error_marker_clean_bodies_pass() {
        assert!(!contains_error_marker(""));
        assert!(!contains_error_marker("{\"ok\": true}"));
        assert!(!contains_error_marker("all systems nominal"));
    }

    #[test]
    fn test_render_proxy_lines() {
        let live = CheckReport {
            target: "1.2.3.4:8080".to_string(),
            outcome: CheckOutcome::ProxyLive("5.6.7.8".to_string()),
        };
        assert_eq!(live.render(), "🟢 LIVE → 1.2.3.4:8080\nIP: 5.6.7.8");

        let dead = CheckReport {
            target: "1.2.3.4:8080".to_string(),
            outcome: CheckOutcome::ProxyDead,
        };
        assert_eq!(dead.render(), "🔴 DEAD → 1.2.3.4:8080");
    }

    #[test]
    fn test_render_api_lines() {
        let report = |outcome| CheckReport {
            target: "https://api.example.com".to_string(),
            outcome,
        };
        assert_eq!(report(CheckOutcome::UrlValid).render(), "🟢 VALID URL");
        assert_eq!(
            report(CheckOutcome::UrlInvalidStatus(503)).render(),
            "🔴 INVALID URL → Status 503"
        );
        assert_eq!(
            report(CheckOutcome::UrlInvalidBody).render(),
            "🔴 INVALID URL → Error detected in response"
        );
        assert_eq!(report(CheckOutcome::KeyValid).render(), "🟢 VALID API KEY");
        assert_eq!(report(CheckOutcome::KeyInvalid).render(), "🔴 INVALID API KEY");
        assert_eq!(
            report(CheckOutcome::UnknownStatus(429)).render(),
            "⚠ UNKNOWN STATUS 429"
        );
    }

    #[test]
    fn test_render_escapes_html_in_dynamic_parts() {
        let report = CheckReport {
            target: "bad&<host>:8080".to_string(),
            outcome: CheckOutcome::ProxyDead,
        };
        assert_eq!(report.render(), "🔴 DEAD → bad&amp;&lt;host&gt;:8080");

        let err = CheckReport {
            target: "key".to_string(),
            outcome: CheckOutcome::TransportError("dns <lookup> failed".to_string()),
        };
        assert_eq!(err.render(), "❌ ERROR → dns &lt;lookup&gt; failed");
    }
}
