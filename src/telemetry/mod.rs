//! Error-tracking client.
//!
//! Server-side failures are forwarded to an external error tracker as small JSON
//! events. Reporting is fire-and-forget: a failed delivery is logged and dropped.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::config;

static REPORTER: OnceLock<Option<ErrorReporter>> = OnceLock::new();

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub source: String,
    pub message: String,
    pub environment: &'static str,
    pub release: &'static str,
    pub timestamp: chrono::DateTime<Utc>,
}

#[derive(Clone)]
pub struct ErrorReporter {
    endpoint: String,
    client: reqwest::Client,
}

impl ErrorReporter {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub async fn send(&self, event: &ErrorEvent) -> Result<(), reqwest::Error> {
        self.client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Initialise the global reporter from configuration. Safe to call more than once.
pub fn init() {
    REPORTER.get_or_init(|| {
        let endpoint = config::config().telemetry.error_tracking_url.clone()?;
        match ErrorReporter::new(endpoint) {
            Ok(reporter) => {
                tracing::info!("Error tracking enabled");
                Some(reporter)
            }
            Err(e) => {
                tracing::warn!("Error tracking disabled, client setup failed: {}", e);
                None
            }
        }
    });
}

pub fn build_event(source: &str, message: &str) -> ErrorEvent {
    ErrorEvent {
        source: source.to_string(),
        message: message.to_string(),
        environment: config::config().environment.as_str(),
        release: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    }
}

/// Report a server-side failure. No-op when tracking is not configured or when
/// called outside a Tokio runtime.
pub fn capture_message(source: &str, message: &str) {
    let Some(Some(reporter)) = REPORTER.get() else {
        return;
    };
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return;
    };

    let reporter = reporter.clone();
    let event = build_event(source, message);
    handle.spawn(async move {
        if let Err(e) = reporter.send(&event).await {
            tracing::warn!("Failed to deliver error event: {}", e);
        }
    });
}
