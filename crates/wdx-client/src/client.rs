//! Reqwest-backed implementation of the upstream trait seams.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use wdx_core::normalize::{self, ShapeError};
use wdx_core::{
    EntityClaims, EntityKind, QueryResultSet, Result, SearchHit, SearchSource, Stage, WdxError,
};

use crate::{
    ClaimLookup, ClaimQuery, Endpoints, KeywordSearch, LabelLookup, SparqlBackend, VectorSearch,
};

/// Sent on every upstream request.
pub const USER_AGENT: &str = concat!("wdx/", env!("CARGO_PKG_VERSION"));

/// Result count requested from both search backends.
const SEARCH_LIMIT: usize = 10;

/// The MediaWiki API caps `wbgetentities` at 50 ids per request.
const LABEL_CHUNK: usize = 50;

/// HTTP client for the Wikidata deployment described by [`Endpoints`].
///
/// Cheap to share: the inner reqwest client pools connections and every
/// request is bounded by the configured timeout, so dropping an in-flight
/// call aborts it.
#[derive(Debug, Clone)]
pub struct WikidataClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl WikidataClient {
    /// Build a client for the given endpoint set.
    ///
    /// # Errors
    ///
    /// Returns [`WdxError::Validation`] if the HTTP client cannot be
    /// constructed from the configuration.
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        if endpoints.vector_secret.is_none() {
            warn!("WD_VECTORDB_API_SECRET is not set; searches will fall back to keyword matching");
        }
        let http = reqwest::Client::builder()
            .timeout(endpoints.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WdxError::Validation(format!("failed to initialize HTTP client: {e}")))?;
        Ok(Self { http, endpoints })
    }

    async fn get_json(&self, stage: Stage, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| request_error(stage, &e))?;
        response.json().await.map_err(|e| request_error(stage, &e))
    }
}

/// Map a transport failure onto the error taxonomy: deadline overruns are
/// `Timeout`, everything else is a backend failure at the given stage.
fn request_error(stage: Stage, err: &reqwest::Error) -> WdxError {
    if err.is_timeout() {
        WdxError::Timeout { stage }
    } else {
        WdxError::backend(stage, err.to_string())
    }
}

fn malformed(stage: Stage, err: ShapeError) -> WdxError {
    WdxError::backend(stage, format!("malformed response: {err}"))
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[async_trait]
impl VectorSearch for WikidataClient {
    async fn vector_search(
        &self,
        query: &str,
        kind: EntityKind,
        lang: &str,
    ) -> Result<Vec<SearchHit>> {
        let url = format!("{}/{}/query/", self.endpoints.vector_url, kind.as_str());
        let k = SEARCH_LIMIT.to_string();
        let mut request = self
            .http
            .get(&url)
            .query(&[("query", query), ("k", k.as_str())]);
        if let Some(secret) = &self.endpoints.vector_secret {
            request = request.header("x-api-secret", secret);
        }

        let raw = self.get_json(Stage::VectorSearch, request).await?;
        let ids = normalize::vector_ids(&raw, kind).map_err(|e| malformed(Stage::VectorSearch, e))?;
        debug!(query, kind = kind.as_str(), hits = ids.len(), "vector search");
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Ids alone are useless to an agent; resolve labels before returning.
        let id_list: Vec<String> = ids.iter().map(|v| v.id.clone()).collect();
        let labels = self.resolve_labels(&id_list, lang).await?;
        Ok(ids
            .into_iter()
            .map(|hit| {
                let (label, description) = labels.get(&hit.id).cloned().unwrap_or_default();
                SearchHit {
                    target: normalize::search_target(kind, &hit.id, label, description),
                    score: hit.score,
                    source: SearchSource::Vector,
                }
            })
            .collect())
    }
}

#[async_trait]
impl KeywordSearch for WikidataClient {
    async fn keyword_search(
        &self,
        query: &str,
        kind: EntityKind,
        lang: &str,
    ) -> Result<Vec<SearchHit>> {
        let limit = SEARCH_LIMIT.to_string();
        let request = self.http.get(&self.endpoints.api_url).query(&[
            ("action", "wbsearchentities"),
            ("type", kind.as_str()),
            ("search", query),
            ("limit", limit.as_str()),
            ("language", lang),
            ("format", "json"),
            ("origin", "*"),
        ]);

        let raw = self.get_json(Stage::KeywordSearch, request).await?;
        let hits =
            normalize::keyword_hits(&raw, kind).map_err(|e| malformed(Stage::KeywordSearch, e))?;
        debug!(query, kind = kind.as_str(), hits = hits.len(), "keyword search");
        Ok(hits)
    }
}

#[async_trait]
impl LabelLookup for WikidataClient {
    async fn resolve_labels(
        &self,
        ids: &[String],
        lang: &str,
    ) -> Result<HashMap<String, (String, String)>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let languages = format!("{lang}|mul|en");
        let mut map = HashMap::new();
        for chunk in ids.chunks(LABEL_CHUNK) {
            let batch = chunk.join("|");
            let request = self.http.get(&self.endpoints.api_url).query(&[
                ("action", "wbgetentities"),
                ("ids", batch.as_str()),
                ("languages", languages.as_str()),
                ("props", "labels|descriptions"),
                ("format", "json"),
                ("origin", "*"),
            ]);
            let raw = self.get_json(Stage::LabelLookup, request).await?;
            map.extend(normalize::label_map(&raw, lang).map_err(|e| malformed(Stage::LabelLookup, e))?);
        }
        Ok(map)
    }
}

#[async_trait]
impl ClaimLookup for WikidataClient {
    async fn fetch_claims_batch(
        &self,
        ids: &[String],
        query: &ClaimQuery,
    ) -> Result<HashMap<String, EntityClaims>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let id_param = ids.join(",");
        let pid_param = query.pids.join(",");
        let request = self.http.get(&self.endpoints.textify_url).query(&[
            ("id", id_param.as_str()),
            ("external_ids", bool_param(query.include_external_ids)),
            ("all_ranks", bool_param(query.all_ranks)),
            ("references", bool_param(query.references)),
            ("lang", query.lang.as_str()),
            ("pid", pid_param.as_str()),
            ("format", "json"),
        ]);

        let raw = self.get_json(Stage::StatementLookup, request).await?;
        normalize::claims_by_id(&raw, ids).map_err(|e| malformed(Stage::StatementLookup, e))
    }
}

#[async_trait]
impl SparqlBackend for WikidataClient {
    async fn run_query(&self, query: &str) -> Result<QueryResultSet> {
        let url = format!(
            "{}?query={}&format=json",
            self.endpoints.query_url,
            urlencoding::encode(query)
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error(Stage::QueryService, &e))?;

        // The query service answers 400 with a plain-text parse error
        // followed by a Java stack trace; keep the message, drop the trace.
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            let message = body.split("\tat ").next().unwrap_or_default().trim();
            return Err(WdxError::Validation(if message.is_empty() {
                "query rejected by the query service".to_string()
            } else {
                message.to_string()
            }));
        }

        let response = response
            .error_for_status()
            .map_err(|e| request_error(Stage::QueryService, &e))?;
        let raw: Value = response
            .json()
            .await
            .map_err(|e| request_error(Stage::QueryService, &e))?;
        normalize::sparql_result(&raw).map_err(|e| malformed(Stage::QueryService, e))
    }
}
