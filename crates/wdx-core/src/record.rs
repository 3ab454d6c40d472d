//! Record types — the shared data model every WDX component speaks.
//!
//! All records are built fresh from upstream responses for a single tool
//! invocation and discarded once the textual payload is produced.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WdxError};

/// Kind of entity a search targets: items (QIDs) or properties (PIDs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Item,
    Property,
}

impl EntityKind {
    /// The upstream API value for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Property => "property",
        }
    }

    /// The id field name used by the vector index for this kind.
    #[must_use]
    pub fn id_field(self) -> &'static str {
        match self {
            EntityKind::Item => "QID",
            EntityKind::Property => "PID",
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = WdxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "item" => Ok(EntityKind::Item),
            "property" => Ok(EntityKind::Property),
            other => Err(WdxError::Validation(format!(
                "unknown entity kind '{other}': expected 'item' or 'property'"
            ))),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved item reference: QID plus label and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// A resolved property reference: PID plus label and description.
///
/// Same shape as [`EntityRef`] but a distinct namespace; the two are never
/// interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRef {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// The entity a search hit points at.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchTarget {
    Item(EntityRef),
    Property(PropertyRef),
}

impl SearchTarget {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            SearchTarget::Item(r) => &r.id,
            SearchTarget::Property(r) => &r.id,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            SearchTarget::Item(r) => &r.label,
            SearchTarget::Property(r) => &r.label,
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            SearchTarget::Item(r) => &r.description,
            SearchTarget::Property(r) => &r.description,
        }
    }
}

/// Which backend produced a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    Vector,
    Keyword,
}

/// One ranked search result.
///
/// `score` is the similarity reported by the vector index; keyword hits have
/// no similarity metric and carry `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub target: SearchTarget,
    pub score: Option<f64>,
    pub source: SearchSource,
}

/// Priority marker on a statement value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rank {
    Preferred,
    #[default]
    Normal,
    Deprecated,
}

impl Rank {
    /// Parse an upstream rank string. Unknown or missing ranks are `Normal`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "preferred" => Rank::Preferred,
            "deprecated" => Rank::Deprecated,
            _ => Rank::Normal,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Preferred => "preferred",
            Rank::Normal => "normal",
            Rank::Deprecated => "deprecated",
        }
    }
}

/// A contextual property-value pair refining a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    pub property: PropertyRef,
    pub value: String,
}

/// A property-value pair inside a reference group citing a statement source.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub property: PropertyRef,
    pub value: String,
}

/// A property-value assertion on an entity.
///
/// `value` is the rendered display string (resolved label for entity-typed
/// values, raw literal otherwise). `value_entity` carries the target
/// reference when the value is itself an entity, so graph traversal can
/// follow it. References come in groups; each group is one citation.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub property: PropertyRef,
    pub value: String,
    pub value_entity: Option<EntityRef>,
    pub rank: Rank,
    pub qualifiers: Vec<Qualifier>,
    pub references: Vec<Vec<Reference>>,
    pub external_id: bool,
}

/// All statements fetched for one subject entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityClaims {
    pub subject: EntityRef,
    pub statements: Vec<Statement>,
}

/// One node of a classification hierarchy snapshot.
///
/// `depth` is the shortest-path distance from the start node. The parent id
/// lists are split by relation so output can label the edges; their union is
/// the full parent set.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyNode {
    pub entity: EntityRef,
    pub depth: u32,
    pub instance_of: Vec<String>,
    pub subclass_of: Vec<String>,
}

/// Columns and rows of a structured-query result.
///
/// Every row has exactly `columns.len()` cells; the row count never exceeds
/// the caller-specified cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Check that an id looks like a QID or PID (entities and properties both
/// carry statements, so statement lookups accept either namespace).
pub fn validate_entity_id(id: &str) -> Result<()> {
    if is_namespaced_id(id, &['Q', 'P']) {
        Ok(())
    } else {
        Err(WdxError::Validation(format!(
            "'{id}' is not a valid entity id (expected e.g. Q42 or P31)"
        )))
    }
}

/// Check that an id is in the property namespace.
pub fn validate_property_id(id: &str) -> Result<()> {
    if is_namespaced_id(id, &['P']) {
        Ok(())
    } else {
        Err(WdxError::Validation(format!(
            "'{id}' is not a valid property id (expected e.g. P31)"
        )))
    }
}

fn is_namespaced_id(id: &str, prefixes: &[char]) -> bool {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let digits = chars.as_str();
    prefixes.contains(&first)
        && !digits.is_empty()
        && !digits.starts_with('0')
        && digits.chars().all(|c| c.is_ascii_digit())
}
