//! Error types for WDX.

use thiserror::Error;

/// Top-level result type for WDX operations.
pub type Result<T> = std::result::Result<T, WdxError>;

/// Stage of the retrieval pipeline an upstream call belongs to.
///
/// Every surfaced failure names its stage so callers can tell which
/// collaborator broke without seeing connection internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    VectorSearch,
    KeywordSearch,
    LabelLookup,
    StatementLookup,
    QueryService,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::VectorSearch => "vector search backend",
            Stage::KeywordSearch => "keyword search backend",
            Stage::LabelLookup => "label lookup",
            Stage::StatementLookup => "statement lookup",
            Stage::QueryService => "query service",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for WDX.
///
/// "Valid request, no matching data" is not an error: empty results are
/// reported as explicit success payloads so they stay distinguishable from
/// failures.
#[derive(Debug, Error)]
pub enum WdxError {
    /// Bad input shape: malformed id, non-positive row cap, or a query the
    /// backend rejected as syntactically invalid.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The requested entity or property does not exist upstream.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// An upstream call exceeded its deadline.
    #[error("{stage} timed out")]
    Timeout { stage: Stage },

    /// An upstream service was reachable but returned an error or an
    /// unparseable response.
    #[error("{stage} error: {message}")]
    Backend { stage: Stage, message: String },

    /// Both search backends failed; nothing left to fall back to.
    #[error("all search backends failed; vector search: {vector}; keyword search: {keyword}")]
    SearchExhausted {
        vector: Box<WdxError>,
        keyword: Box<WdxError>,
    },
}

impl WdxError {
    /// Unknown entity id.
    #[must_use]
    pub fn entity_not_found(id: impl Into<String>) -> Self {
        WdxError::NotFound {
            kind: "entity",
            id: id.into(),
        }
    }

    /// Unknown property id.
    #[must_use]
    pub fn property_not_found(id: impl Into<String>) -> Self {
        WdxError::NotFound {
            kind: "property",
            id: id.into(),
        }
    }

    /// Upstream error at the given stage.
    #[must_use]
    pub fn backend(stage: Stage, message: impl Into<String>) -> Self {
        WdxError::Backend {
            stage,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_human_readable_messages() {
        let err = WdxError::entity_not_found("Q999999999");
        assert_eq!(err.to_string(), "entity Q999999999 not found");

        let err = WdxError::property_not_found("P999999");
        assert_eq!(err.to_string(), "property P999999 not found");

        let err = WdxError::Timeout {
            stage: Stage::QueryService,
        };
        assert!(err.to_string().contains("query service"));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn exhausted_search_names_both_causes() {
        let err = WdxError::SearchExhausted {
            vector: Box::new(WdxError::Timeout {
                stage: Stage::VectorSearch,
            }),
            keyword: Box::new(WdxError::backend(
                Stage::KeywordSearch,
                "HTTP 503 Service Unavailable",
            )),
        };
        let msg = err.to_string();
        assert!(msg.contains("vector search backend timed out"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn stage_names_are_stable() {
        assert_eq!(Stage::VectorSearch.as_str(), "vector search backend");
        assert_eq!(Stage::StatementLookup.as_str(), "statement lookup");
    }
}
