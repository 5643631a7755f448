//! Shared types used across the codebase

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a variant's video asset at the hosting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantStatus {
    Pending,
    Uploading,
    Processing,
    Ready,
    Errored,
}

impl VariantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantStatus::Pending => "pending",
            VariantStatus::Uploading => "uploading",
            VariantStatus::Processing => "processing",
            VariantStatus::Ready => "ready",
            VariantStatus::Errored => "errored",
        }
    }
}

/// One entry of a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: Uuid,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    #[error("items must not be empty")]
    Empty,
    #[error("id {0} appears more than once")]
    DuplicateId(Uuid),
    #[error("sort_order for {0} must be >= 0")]
    NegativeOrder(Uuid),
}

pub fn validate_reorder(items: &[ReorderItem]) -> Result<(), ReorderError> {
    if items.is_empty() {
        return Err(ReorderError::Empty);
    }
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.sort_order < 0 {
            return Err(ReorderError::NegativeOrder(item.id));
        }
        if !seen.insert(item.id) {
            return Err(ReorderError::DuplicateId(item.id));
        }
    }
    Ok(())
}

/// Loose BCP-47 check: a 2-3 letter primary subtag followed by 2-8 char alphanumeric subtags.
pub fn is_language_tag(tag: &str) -> bool {
    let mut subtags = tag.split('-');
    let primary = match subtags.next() {
        Some(p) => p,
        None => return false,
    };
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_lowercase()) {
        return false;
    }
    subtags.all(|s| (2..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()))
}
