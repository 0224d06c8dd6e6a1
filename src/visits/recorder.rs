//! Visit recording
//!
//! Turns a resolved [`IpInfo`] plus request metadata into exactly one
//! `record_visit` call against the store and reports a typed outcome.

use axum::http::{header, HeaderMap};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::ip_resolver::header_value;
use crate::models::{IpInfo, NewVisit, Visit};
use crate::storage::Storage;

/// User agents longer than this are cut in responses
pub const USER_AGENT_SUMMARY_CHARS: usize = 100;

const UNKNOWN_USER_AGENT: &str = "unknown";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("No slug provided")]
    InvalidRequest,
    #[error("failed to record visit for '{slug}': {details}")]
    PersistenceFailure { slug: String, details: String },
}

/// Request metadata persisted alongside the resolved IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitMetadata {
    pub user_agent: String,
    pub referer: Option<String>,
    pub language: Option<String>,
}

impl VisitMetadata {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: header::HeaderName| {
            let value = header_value(headers, name.as_str());
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Self {
            user_agent: get(header::USER_AGENT).unwrap_or_else(|| UNKNOWN_USER_AGENT.to_string()),
            referer: get(header::REFERER),
            language: get(header::ACCEPT_LANGUAGE),
        }
    }
}

/// Successful recording, echoed back to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub success: bool,
    pub message: &'static str,
    pub slug: String,
    pub ip_info: IpInfo,
    pub user_agent: String,
    #[serde(skip)]
    pub visit: Visit,
}

pub struct Recorder {
    storage: Arc<dyn Storage>,
}

impl Recorder {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Persist one visit for `slug`.
    ///
    /// An empty slug fails with `InvalidRequest` before the store is touched.
    /// Store failures are reported once and never retried.
    pub async fn record(
        &self,
        slug: &str,
        ip_info: IpInfo,
        metadata: VisitMetadata,
    ) -> Result<RecordOutcome, RecordError> {
        if slug.is_empty() {
            return Err(RecordError::InvalidRequest);
        }

        let new_visit = NewVisit {
            slug: slug.to_string(),
            ip_address: ip_info.ip.clone(),
            is_private_ip: ip_info.is_private,
            ip_source: ip_info.source.clone(),
            user_agent: metadata.user_agent,
            referer: metadata.referer,
            language: metadata.language,
            visit_time: chrono::Utc::now().timestamp(),
        };

        match self.storage.record_visit(&new_visit).await {
            Ok(visit) => {
                debug!(
                    slug = %slug,
                    ip = %ip_info.ip,
                    ip_source = %ip_info.source,
                    visit_id = visit.id,
                    "recorded visit"
                );
                Ok(RecordOutcome {
                    success: true,
                    message: "IP recorded successfully",
                    slug: slug.to_string(),
                    user_agent: summarize_user_agent(&visit.user_agent),
                    ip_info,
                    visit,
                })
            }
            Err(err) => {
                warn!(slug = %slug, error = %err, "failed to record visit");
                Err(RecordError::PersistenceFailure {
                    slug: slug.to_string(),
                    details: err.to_string(),
                })
            }
        }
    }
}

/// First `USER_AGENT_SUMMARY_CHARS` characters, with `...` appended when cut
pub fn summarize_user_agent(user_agent: &str) -> String {
    match user_agent.char_indices().nth(USER_AGENT_SUMMARY_CHARS) {
        Some((cut, _)) => format!("{}...", &user_agent[..cut]),
        None => user_agent.to_string(),
    }
}
