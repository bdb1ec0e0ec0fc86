// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

/// Errors returned by CRM operations.
#[derive(Debug, Error)]
pub enum CrmError {
    /// One or more field complaints, reported together.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// A unique field is already taken by another record.
    #[error("{0}")]
    Conflict(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The import envelope is not usable.
    #[error("invalid import data: {0}")]
    InvalidImport(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CrmError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }
}

/// Result type for CRM operations.
pub type CrmResult<T> = Result<T, CrmError>;
