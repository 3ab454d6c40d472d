//! MCP tool definitions for WDX graph exploration (read-only).

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::Deserialize;

use wdx_client::WikidataClient;
use wdx_core::EntityKind;
use wdx_retrieval::{executor, formatter, hierarchy, router};

const DEFAULT_LANG: &str = "en";
const DEFAULT_MAX_DEPTH: u32 = 5;
const DEFAULT_ROW_CAP: i64 = 10;

/// WDX MCP server exposing knowledge-graph exploration tools.
#[derive(Clone)]
pub struct WdxService {
    client: Arc<WikidataClient>,
    tool_router: ToolRouter<Self>,
}

impl WdxService {
    /// Create a new WDX MCP server over the given client.
    pub fn new(client: Arc<WikidataClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }
}

fn lang_or_default(lang: Option<String>) -> String {
    lang.filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

// === Tool request types ===

/// Request for entity search.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Natural-language description or name of what to find
    pub query: String,
    /// Language code for labels and descriptions (default: "en")
    pub lang: Option<String>,
}

/// Request for the compact statement listing of an entity.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StatementsRequest {
    /// A QID or PID such as "Q42" or "P31"
    pub entity_id: String,
    /// Include external identifiers linking to other databases (default: false)
    pub include_external_ids: Option<bool>,
    /// Language code for labels and descriptions (default: "en")
    pub lang: Option<String>,
}

/// Request for the full values of one entity/property pair.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StatementValuesRequest {
    /// A QID or PID such as "Q42" or "P31"
    pub entity_id: String,
    /// A PID such as "P106"
    pub property_id: String,
    /// Language code for labels and descriptions (default: "en")
    pub lang: Option<String>,
}

/// Request for a classification hierarchy walk.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HierarchyRequest {
    /// The QID to start from, such as "Q42"
    pub entity_id: String,
    /// Maximum traversal depth (default: 5)
    pub max_depth: Option<u32>,
    /// Language code for labels (default: "en")
    pub lang: Option<String>,
}

/// Request for SPARQL execution.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SparqlRequest {
    /// A valid SPARQL query string
    pub query: String,
    /// Maximum number of result rows to return (default: 10)
    pub k: Option<i64>,
}

#[tool_router]
impl WdxService {
    /// Search items by meaning, with keyword fallback.
    #[tool(
        description = "Search Wikidata items (QIDs) from a natural-language query. Tries semantic \
                       vector search first and falls back to keyword matching; returns one \
                       'QID: label — description' line per hit"
    )]
    async fn search_items(&self, Parameters(req): Parameters<SearchRequest>) -> String {
        self.search(req, EntityKind::Item).await
    }

    /// Search properties by meaning, with keyword fallback.
    #[tool(
        description = "Search Wikidata properties (PIDs) from a natural-language description of a \
                       relationship, e.g. 'birthplace'. Tries semantic vector search first and \
                       falls back to keyword matching; returns one 'PID: label — description' \
                       line per hit. Use this to discover properties for SPARQL queries"
    )]
    async fn search_properties(&self, Parameters(req): Parameters<SearchRequest>) -> String {
        self.search(req, EntityKind::Property).await
    }

    /// Compact triplet listing of an entity's statements.
    #[tool(
        description = "Return the direct statements of an entity as 'subject: property: value' \
                       triplet lines. Deprecated values, qualifiers, and references are omitted \
                       (use get_statement_values for those)"
    )]
    async fn get_statements(&self, Parameters(req): Parameters<StatementsRequest>) -> String {
        let lang = lang_or_default(req.lang);
        let include_external_ids = req.include_external_ids.unwrap_or(false);
        match formatter::format_compact(&*self.client, &req.entity_id, include_external_ids, &lang)
            .await
        {
            Ok(text) => text,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Full values for one entity/property pair.
    #[tool(
        description = "Return every value of one entity/property pair, including deprecated \
                       values, ranks, qualifiers, and references. This is the only tool that \
                       surfaces provenance"
    )]
    async fn get_statement_values(
        &self,
        Parameters(req): Parameters<StatementValuesRequest>,
    ) -> String {
        let lang = lang_or_default(req.lang);
        match formatter::format_full(&*self.client, &req.entity_id, &req.property_id, &lang).await {
            Ok(text) => text,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Bounded instance-of/subclass-of hierarchy walk.
    #[tool(
        description = "Walk the instance-of (P31) and subclass-of (P279) hierarchy above an \
                       entity up to max_depth levels and return it as nested JSON. Cycles in \
                       the class graph are handled"
    )]
    async fn get_instance_and_subclass_hierarchy(
        &self,
        Parameters(req): Parameters<HierarchyRequest>,
    ) -> String {
        let lang = lang_or_default(req.lang);
        let max_depth = req.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        match hierarchy::walk(&*self.client, &req.entity_id, max_depth, &lang).await {
            Ok(graph) => {
                let nested = hierarchy::to_nested_json(&graph, max_depth);
                serde_json::to_string_pretty(&nested).unwrap_or_else(|_| "{}".to_string())
            }
            Err(e) => format!("Error: {e}"),
        }
    }

    /// SPARQL execution with row capping.
    #[tool(
        description = "Execute a SPARQL query against Wikidata and return up to K rows as \
                       semicolon-delimited text with a header row and a row-index column. \
                       On error, returns the error message"
    )]
    async fn execute_sparql(&self, Parameters(req): Parameters<SparqlRequest>) -> String {
        let k = req.k.unwrap_or(DEFAULT_ROW_CAP);
        match executor::execute(&*self.client, &req.query, k).await {
            Ok(result) => executor::encode_delimited(&result),
            Err(e) => format!("Error: {e}"),
        }
    }
}

impl WdxService {
    async fn search(&self, req: SearchRequest, kind: EntityKind) -> String {
        let lang = lang_or_default(req.lang);
        let plural = match kind {
            EntityKind::Item => "items",
            EntityKind::Property => "properties",
        };
        match router::search(&*self.client, &*self.client, &req.query, kind, &lang).await {
            Ok(outcome) if outcome.hits().is_empty() => {
                format!("No matching {plural} found for '{}'", req.query)
            }
            Ok(outcome) => router::render_hits(outcome.hits()),
            Err(e) => format!("Error: {e}"),
        }
    }
}

#[tool_handler]
impl ServerHandler for WdxService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "WDX explores Wikidata without assuming any prior knowledge of its \
                 identifiers. Start with search_items or search_properties to find QIDs \
                 and PIDs, inspect candidates with get_statements, pull qualifiers, \
                 references, or deprecated values with get_statement_values, situate an \
                 entity with get_instance_and_subclass_hierarchy, and only then write \
                 and validate SPARQL with execute_sparql."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
