//! Shared state for one create/update preparation pass.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::formats;
use crate::error::ValidationIssue;
use crate::types::Dialect;

/// External encryption primitive used by encrypted-text fields
#[async_trait]
pub trait TextEncryptor: Send + Sync {
    async fn encrypt(&self, plain: &str) -> Result<String, String>;
}

/// Error sink and timestamp shared by every field of one top-level operation.
///
/// Nested sub-models reuse the parent's context, so a document and all of its
/// sub-documents see the same timestamp.
pub struct PrepareContext {
    dialect: Dialect,
    timestamp: DateTime<Utc>,
    encryptor: Option<Arc<dyn TextEncryptor>>,
    issues: Vec<ValidationIssue>,
}

impl PrepareContext {
    pub fn with_timestamp(
        dialect: Dialect,
        encryptor: Option<Arc<dyn TextEncryptor>>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            dialect,
            timestamp,
            encryptor,
            issues: Vec::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Operation timestamp in the dialect's wire form
    pub fn timestamp_value(&self) -> Value {
        formats::encode_datetime(self.timestamp, self.dialect)
    }

    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn take_issues(&mut self) -> Vec<ValidationIssue> {
        std::mem::take(&mut self.issues)
    }

    pub(crate) async fn encrypt(&self, plain: &str) -> Result<String, String> {
        match &self.encryptor {
            Some(encryptor) => encryptor.encrypt(plain).await,
            None => Err("no encryptor configured".to_string()),
        }
    }
}
