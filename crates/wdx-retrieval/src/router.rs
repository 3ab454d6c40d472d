//! Search routing: semantic search first, keyword search as the fallback.
//!
//! The policy is strict either/or. Vector results are returned as-is when
//! the backend yields at least one hit; only a failure or an empty result
//! set routes the query to the keyword backend. The two result sets are
//! never merged or re-ranked, and backend-provided order is preserved.

use tracing::{debug, warn};

use wdx_client::{KeywordSearch, VectorSearch};
use wdx_core::{EntityKind, Result, SearchHit, SearchSource, WdxError};

/// Which backend answered, with its hits. Tagged so callers and tests can
/// assert which path fired.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Vector(Vec<SearchHit>),
    Keyword(Vec<SearchHit>),
}

impl SearchOutcome {
    #[must_use]
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Vector(hits) | SearchOutcome::Keyword(hits) => hits,
        }
    }

    #[must_use]
    pub fn into_hits(self) -> Vec<SearchHit> {
        match self {
            SearchOutcome::Vector(hits) | SearchOutcome::Keyword(hits) => hits,
        }
    }

    #[must_use]
    pub fn source(&self) -> SearchSource {
        match self {
            SearchOutcome::Vector(_) => SearchSource::Vector,
            SearchOutcome::Keyword(_) => SearchSource::Keyword,
        }
    }
}

/// Route a free-text query: vector backend first, keyword backend when the
/// vector call fails or comes back empty.
///
/// # Errors
///
/// Returns [`WdxError::SearchExhausted`] naming both causes when the vector
/// backend failed and the keyword fallback failed too. A keyword failure
/// after an *empty* (but successful) vector response surfaces on its own.
pub async fn search<V, K>(
    vector: &V,
    keyword: &K,
    query: &str,
    kind: EntityKind,
    lang: &str,
) -> Result<SearchOutcome>
where
    V: VectorSearch + ?Sized,
    K: KeywordSearch + ?Sized,
{
    match vector.vector_search(query, kind, lang).await {
        Ok(hits) if !hits.is_empty() => Ok(SearchOutcome::Vector(hits)),
        Ok(_) => {
            debug!(query, kind = %kind, "vector search empty, falling back to keyword");
            let hits = keyword.keyword_search(query, kind, lang).await?;
            Ok(SearchOutcome::Keyword(hits))
        }
        Err(vector_err) => {
            warn!(query, kind = %kind, error = %vector_err, "vector search failed, falling back to keyword");
            match keyword.keyword_search(query, kind, lang).await {
                Ok(hits) => Ok(SearchOutcome::Keyword(hits)),
                Err(keyword_err) => Err(WdxError::SearchExhausted {
                    vector: Box::new(vector_err),
                    keyword: Box::new(keyword_err),
                }),
            }
        }
    }
}

/// Render hits one per line as `ID: label — description`.
#[must_use]
pub fn render_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "{}: {} — {}",
                hit.target.id(),
                hit.target.label(),
                hit.target.description()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
