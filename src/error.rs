//! Error types for the ACL engine.
//!
//! Every failure surfaced to the business layer is an [`AclError`]. None of
//! them are retried inside the engine.

use thiserror::Error;

/// Kind of record a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Product,
    Package,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Product => f.write_str("product"),
            RecordKind::Package => f.write_str("package"),
        }
    }
}

/// Main error type of the ACL engine.
#[derive(Debug, Error)]
pub enum AclError {
    /// The owning product or package does not exist.
    #[error("{kind} '{code}' not found")]
    NotFound { kind: RecordKind, code: String },

    /// The catalog service failed or answered with a non-success envelope.
    #[error("Catalog service error: {message}")]
    UpstreamCatalog { message: String },

    /// API-granularity operation against a package environment in `apiGroup` mode.
    #[error("Package '{package}' is not in granular mode for environment '{env}'")]
    NotGranular { package: String, env: String },

    /// A preview entry references something the catalog does not offer.
    #[error("Invalid identity '{identity}': {reason}")]
    InvalidIdentity { identity: String, reason: String },

    /// A stored document does not match the ACL tree schema.
    #[error("Malformed stored document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AclError {
    pub fn not_found(kind: RecordKind, code: impl Into<String>) -> Self {
        AclError::NotFound {
            kind,
            code: code.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        AclError::UpstreamCatalog {
            message: message.into(),
        }
    }

    pub fn invalid_identity(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        AclError::InvalidIdentity {
            identity: identity.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code for callers mapping errors onto responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::UpstreamCatalog { .. } => "UPSTREAM_CATALOG",
            Self::NotGranular { .. } => "NOT_GRANULAR",
            Self::InvalidIdentity { .. } => "INVALID_IDENTITY",
            Self::MalformedDocument(_) => "MALFORMED_DOCUMENT",
            Self::Config(_) => "CONFIG",
        }
    }
}

pub type Result<T> = std::result::Result<T, AclError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_codes() {
        let err = AclError::not_found(RecordKind::Package, "gold");
        assert_eq!(err.to_string(), "package 'gold' not found");
        assert_eq!(err.code(), "NOT_FOUND");

        let err = AclError::NotGranular {
            package: "gold".into(),
            env: "prod".into(),
        };
        assert_eq!(err.code(), "NOT_GRANULAR");
        assert!(err.to_string().contains("prod"));
    }
}
