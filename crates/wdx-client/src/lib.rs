//! # wdx-client
//!
//! Upstream collaborators for WDX, behind async trait seams:
//! - [`VectorSearch`] — semantic search over the vector index
//! - [`KeywordSearch`] — label/alias text search
//! - [`LabelLookup`] — id to label/description resolution
//! - [`ClaimLookup`] — statement fetch for one or more subjects
//! - [`SparqlBackend`] — structured query execution
//!
//! [`WikidataClient`] implements all five against the public Wikidata
//! deployment; tests substitute in-memory fakes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use wdx_core::{EntityClaims, EntityKind, QueryResultSet, Result, SearchHit};

mod client;

pub use client::WikidataClient;

/// Upstream endpoint set. Defaults point at the public Wikidata deployment;
/// every field can be overridden through the environment.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Vector index base URL (`WDX_VECTOR_URL`).
    pub vector_url: String,
    /// MediaWiki API URL (`WDX_API_URL`).
    pub api_url: String,
    /// Claim textify service URL (`WDX_TEXTIFY_URL`).
    pub textify_url: String,
    /// SPARQL endpoint URL (`WDX_QUERY_URL`).
    pub query_url: String,
    /// Vector index API secret (`WD_VECTORDB_API_SECRET`). Without it the
    /// vector backend rejects requests and search falls back to keyword.
    pub vector_secret: Option<String>,
    /// Per-request deadline (`WDX_TIMEOUT_SECS`).
    pub timeout: Duration,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            vector_url: "https://wd-vectordb.wmcloud.org".to_string(),
            api_url: "https://www.wikidata.org/w/api.php".to_string(),
            textify_url: "https://wd-textify.toolforge.org".to_string(),
            query_url: "https://query.wikidata.org/sparql".to_string(),
            vector_secret: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Endpoints {
    /// Build the endpoint set from the environment, falling back to the
    /// public deployment defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, fallback: String| {
            std::env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or(fallback)
        };
        Self {
            vector_url: var("WDX_VECTOR_URL", defaults.vector_url),
            api_url: var("WDX_API_URL", defaults.api_url),
            textify_url: var("WDX_TEXTIFY_URL", defaults.textify_url),
            query_url: var("WDX_QUERY_URL", defaults.query_url),
            vector_secret: std::env::var("WD_VECTORDB_API_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),
            timeout: std::env::var("WDX_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }
}

/// Parameters of a statement fetch, mirroring the textify service.
#[derive(Debug, Clone)]
pub struct ClaimQuery {
    /// Restrict to these properties; empty means all.
    pub pids: Vec<String>,
    /// Keep statements on external-identifier properties.
    pub include_external_ids: bool,
    /// Include deprecated-rank statements.
    pub all_ranks: bool,
    /// Fetch reference groups.
    pub references: bool,
    /// Language for labels.
    pub lang: String,
}

impl ClaimQuery {
    #[must_use]
    pub fn new(lang: &str) -> Self {
        Self {
            pids: Vec::new(),
            include_external_ids: false,
            all_ranks: false,
            references: false,
            lang: lang.to_string(),
        }
    }
}

/// Semantic search over the vector index, label-resolved.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn vector_search(
        &self,
        query: &str,
        kind: EntityKind,
        lang: &str,
    ) -> Result<Vec<SearchHit>>;
}

/// Label/alias text search.
#[async_trait]
pub trait KeywordSearch: Send + Sync {
    async fn keyword_search(
        &self,
        query: &str,
        kind: EntityKind,
        lang: &str,
    ) -> Result<Vec<SearchHit>>;
}

/// Resolve ids to `(label, description)` pairs. Unknown ids are absent from
/// the returned map.
#[async_trait]
pub trait LabelLookup: Send + Sync {
    async fn resolve_labels(
        &self,
        ids: &[String],
        lang: &str,
    ) -> Result<HashMap<String, (String, String)>>;
}

/// Fetch normalized statements for one or more subject entities. Subjects
/// unknown upstream are absent from the result.
#[async_trait]
pub trait ClaimLookup: Send + Sync {
    async fn fetch_claims_batch(
        &self,
        ids: &[String],
        query: &ClaimQuery,
    ) -> Result<HashMap<String, EntityClaims>>;

    /// Single-subject convenience over [`fetch_claims_batch`].
    ///
    /// [`fetch_claims_batch`]: ClaimLookup::fetch_claims_batch
    async fn fetch_claims(&self, id: &str, query: &ClaimQuery) -> Result<Option<EntityClaims>> {
        let ids = vec![id.to_string()];
        let mut map = self.fetch_claims_batch(&ids, query).await?;
        Ok(map.remove(id))
    }
}

/// Execute a structured query and return the normalized result table.
#[async_trait]
pub trait SparqlBackend: Send + Sync {
    async fn run_query(&self, query: &str) -> Result<QueryResultSet>;
}
