//! Classification hierarchy traversal.
//!
//! Breadth-first walk over the instance-of and subclass-of relations,
//! level by level: the whole frontier is fetched in one batched statement
//! lookup per depth. The underlying relation graph may contain cycles (an
//! entity can be declared a subclass of its own descendant); the visited
//! set is kept separate from the output map and checked before any node is
//! recorded, so traversal never revisits an id and always terminates.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use wdx_client::{ClaimLookup, ClaimQuery};
use wdx_core::record::validate_entity_id;
use wdx_core::{HierarchyNode, Result, WdxError};

/// Property id of the instance-of relation.
pub const INSTANCE_OF: &str = "P31";
/// Property id of the subclass-of relation.
pub const SUBCLASS_OF: &str = "P279";

/// A DAG snapshot of the classification hierarchy above one entity.
///
/// Nodes are keyed by id and keep per-relation parent lists, so a node with
/// several incoming edges appears once, at its shortest-path depth.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyGraph {
    pub root: String,
    pub nodes: HashMap<String, HierarchyNode>,
}

/// Walk the hierarchy above `start` up to `max_depth` levels.
///
/// Parents discovered at depth `max_depth` are recorded but not expanded;
/// the per-level frontier itself is unbounded, so a very wide class tree
/// costs proportionally many lookups.
///
/// # Errors
///
/// Returns [`WdxError::NotFound`] when the statement service does not know
/// the start entity, and propagates lookup failures.
pub async fn walk<L>(
    lookup: &L,
    start: &str,
    max_depth: u32,
    lang: &str,
) -> Result<HierarchyGraph>
where
    L: ClaimLookup + ?Sized,
{
    validate_entity_id(start)?;

    let mut query = ClaimQuery::new(lang);
    query.pids = vec![INSTANCE_OF.to_string(), SUBCLASS_OF.to_string()];

    let mut nodes: HashMap<String, HierarchyNode> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.to_string());
    let mut frontier = vec![start.to_string()];
    let mut depth = 0u32;

    while !frontier.is_empty() {
        let mut batch = lookup.fetch_claims_batch(&frontier, &query).await?;
        if depth == 0 && !batch.contains_key(start) {
            return Err(WdxError::entity_not_found(start));
        }
        debug!(depth, frontier = frontier.len(), "hierarchy level fetched");

        let mut next = Vec::new();
        for id in &frontier {
            let Some(claims) = batch.remove(id) else {
                continue;
            };

            let mut instance_of: Vec<String> = Vec::new();
            let mut subclass_of: Vec<String> = Vec::new();
            let mut discovered = Vec::new();
            for statement in &claims.statements {
                let Some(parent) = &statement.value_entity else {
                    continue;
                };
                let list = match statement.property.id.as_str() {
                    INSTANCE_OF => &mut instance_of,
                    SUBCLASS_OF => &mut subclass_of,
                    _ => continue,
                };
                if !list.contains(&parent.id) {
                    list.push(parent.id.clone());
                    discovered.push(parent.clone());
                }
            }

            let node = nodes.entry(id.clone()).or_insert_with(|| HierarchyNode {
                entity: claims.subject.clone(),
                depth,
                instance_of: Vec::new(),
                subclass_of: Vec::new(),
            });
            if node.entity.label.is_empty() {
                node.entity.label = claims.subject.label.clone();
            }
            node.instance_of = instance_of;
            node.subclass_of = subclass_of;

            for parent in discovered {
                // First discovery fixes the depth; revisits are rejected
                // before any node is touched.
                if !visited.insert(parent.id.clone()) {
                    continue;
                }
                let parent_depth = depth + 1;
                if parent_depth > max_depth {
                    continue;
                }
                let parent_id = parent.id.clone();
                nodes.insert(
                    parent_id.clone(),
                    HierarchyNode {
                        entity: parent,
                        depth: parent_depth,
                        instance_of: Vec::new(),
                        subclass_of: Vec::new(),
                    },
                );
                if parent_depth < max_depth {
                    next.push(parent_id);
                }
            }
        }

        frontier = next;
        depth += 1;
    }

    Ok(HierarchyGraph {
        root: start.to_string(),
        nodes,
    })
}

/// Render the graph as nested JSON rooted at the start node, with
/// relation-labelled keys and `label (QID)` node names.
///
/// Recursion is bounded by `budget` rather than the node depths, so a
/// cyclic pair of classes renders as a finite nested chain instead of
/// looping.
#[must_use]
pub fn to_nested_json(graph: &HierarchyGraph, budget: u32) -> Value {
    render_node(graph, &graph.root, budget)
}

fn render_node(graph: &HierarchyGraph, id: &str, budget: u32) -> Value {
    let Some(node) = graph.nodes.get(id) else {
        return Value::String(id.to_string());
    };
    let name = display_name(node);
    if budget == 0 || (node.instance_of.is_empty() && node.subclass_of.is_empty()) {
        return Value::String(name);
    }

    let children = |ids: &[String]| -> Value {
        Value::Array(
            ids.iter()
                .filter(|child| graph.nodes.contains_key(*child))
                .map(|child| render_node(graph, child, budget - 1))
                .collect(),
        )
    };
    let mut relations = Map::new();
    relations.insert("instance of (P31)".to_string(), children(&node.instance_of));
    relations.insert("subclass of (P279)".to_string(), children(&node.subclass_of));

    let mut wrapper = Map::new();
    wrapper.insert(name, Value::Object(relations));
    Value::Object(wrapper)
}

fn display_name(node: &HierarchyNode) -> String {
    if node.entity.label.is_empty() {
        node.entity.id.clone()
    } else {
        format!("{} ({})", node.entity.label, node.entity.id)
    }
}
