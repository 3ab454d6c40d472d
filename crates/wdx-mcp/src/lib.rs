//! # wdx-mcp
//!
//! MCP (Model Context Protocol) server for WDX.
//!
//! Exposes the exploration tools an agent needs to work a knowledge graph
//! whose identifiers it cannot guess:
//! - `search_items` / `search_properties`: semantic search with keyword
//!   fallback
//! - `get_statements`: compact triplet listing of an entity's statements
//! - `get_statement_values`: full values for one entity/property pair,
//!   with ranks, qualifiers, and references
//! - `get_instance_and_subclass_hierarchy`: bounded classification walk
//! - `execute_sparql`: SPARQL with row capping and delimited output

pub mod tools;

pub use tools::WdxService;
