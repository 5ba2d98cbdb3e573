//! Storefront collection sync
//!
//! Derives one collection per distinct product tag and creates them through a
//! remote admin API, one call at a time with a fixed pause between calls to
//! stay inside the store's rate limit. A failed item is logged and counted;
//! the remaining items are still sent.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::images::slugify;
use crate::models::{Dataset, fields};

/// Errors from a collection client
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} creating '{handle}': {body}")]
    Http {
        status: u16,
        handle: String,
        body: String,
    },

    #[error("Collection '{0}' already exists")]
    AlreadyExists(String),
}

/// A collection to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub title: String,
    pub handle: String,
}

impl CollectionSpec {
    pub fn from_tag(tag: &str) -> Self {
        Self {
            title: tag.trim().to_string(),
            handle: slugify(tag),
        }
    }

    /// One spec per distinct tag on primary rows, in first-seen order.
    pub fn from_dataset(dataset: &Dataset) -> Vec<Self> {
        let mut specs: Vec<Self> = Vec::new();
        for record in dataset.records.iter().filter(|r| r.is_primary()) {
            for tag in record.get(fields::TAGS).split(',') {
                let spec = Self::from_tag(tag);
                if spec.handle.is_empty() || specs.iter().any(|s| s.handle == spec.handle) {
                    continue;
                }
                specs.push(spec);
            }
        }
        specs
    }
}

/// Remote endpoint that creates collections
pub trait CollectionClient {
    fn create(&self, spec: &CollectionSpec) -> Result<(), CollectionError>;
}

/// Outcome of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub created: usize,
    pub existing: usize,
    pub failed: Vec<String>,
}

/// Sequential, paced collection creation
#[derive(Debug, Clone)]
pub struct CollectionSync {
    delay: Duration,
}

impl Default for CollectionSync {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl CollectionSync {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Create every spec in order, pausing between successive calls.
    pub fn run(&self, client: &dyn CollectionClient, specs: &[CollectionSpec]) -> SyncReport {
        let mut report = SyncReport::default();
        for (idx, spec) in specs.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            match client.create(spec) {
                Ok(()) => {
                    debug!(handle = %spec.handle, "Collection created");
                    report.created += 1;
                }
                Err(CollectionError::AlreadyExists(handle)) => {
                    debug!(handle = %handle, "Collection already exists");
                    report.existing += 1;
                }
                Err(e) => {
                    warn!(handle = %spec.handle, error = %e, "Collection create failed");
                    report.failed.push(spec.handle.clone());
                }
            }
        }
        info!(
            created = report.created,
            existing = report.existing,
            failed = report.failed.len(),
            "Collection sync finished"
        );
        report
    }
}

/// Admin REST client for a hosted store
#[cfg(feature = "admin-api")]
pub struct AdminApiClient {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "admin-api")]
impl AdminApiClient {
    pub const API_VERSION: &'static str = "2024-01";

    /// `store` is a shop domain (`example.myshopify.com`) or a full base URL.
    pub fn new(store: &str, token: impl Into<String>) -> Result<Self, CollectionError> {
        let store = store.trim_end_matches('/');
        let base_url = if store.starts_with("http://") || store.starts_with("https://") {
            store.to_string()
        } else {
            format!("https://{}", store)
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CollectionError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            base_url,
            token: token.into(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/admin/api/{}/custom_collections.json",
            self.base_url,
            Self::API_VERSION
        )
    }
}

#[cfg(feature = "admin-api")]
impl CollectionClient for AdminApiClient {
    fn create(&self, spec: &CollectionSpec) -> Result<(), CollectionError> {
        let body = serde_json::json!({
            "custom_collection": {
                "title": spec.title,
                "handle": spec.handle,
                "published": true,
            }
        });
        let response = self
            .client
            .post(self.endpoint())
            .header("X-Shopify-Access-Token", &self.token)
            .json(&body)
            .send()
            .map_err(|e| CollectionError::Network(format!("Failed to reach store: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().unwrap_or_default();
        if status.as_u16() == 422 && text.contains("already been taken") {
            return Err(CollectionError::AlreadyExists(spec.handle.clone()));
        }
        Err(CollectionError::Http {
            status: status.as_u16(),
            handle: spec.handle.clone(),
            body: text,
        })
    }
}
