//! Error types for kinship graph operations.

use std::fmt;

use thiserror::Error;

/// Kinds of nodes that can be looked up by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Legacy,
    Family,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Person => f.write_str("person"),
            EntityKind::Legacy => f.write_str("legacy member"),
            EntityKind::Family => f.write_str("family"),
        }
    }
}

/// Errors from kinship graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Referenced person, legacy member or family does not exist.
    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: String },

    /// Relation kind outside FATHER, MOTHER, SPOUSE, CHILD.
    #[error("invalid relation type: {0}")]
    InvalidRelationType(String),

    /// Traversal filter that is not a canonical edge label.
    #[error("invalid filter label: {0}")]
    InvalidFilterLabel(String),

    #[error("invalid gender: {0}")]
    InvalidGender(String),

    /// The store could not complete the operation. Not retried here.
    #[error("graph store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

impl GraphError {
    pub fn person_not_found(uid: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind: EntityKind::Person,
            key: uid.into(),
        }
    }

    pub fn legacy_not_found(uid: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind: EntityKind::Legacy,
            key: uid.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
