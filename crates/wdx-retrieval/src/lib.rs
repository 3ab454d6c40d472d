//! # wdx-retrieval
//!
//! The retrieval orchestration core of WDX:
//! - [`router`] — search with vector-to-keyword fallback
//! - [`hierarchy`] — depth-bounded classification traversal
//! - [`formatter`] — statement rendering (compact and full modes)
//! - [`executor`] — structured query execution with row capping and
//!   delimited tabular encoding
//!
//! Components compose only through the shared record model and the backend
//! trait seams in `wdx-client`; no component holds state across invocations.

pub mod executor;
pub mod formatter;
pub mod hierarchy;
pub mod router;

pub use hierarchy::HierarchyGraph;
pub use router::SearchOutcome;

#[cfg(test)]
pub(crate) mod testutil {
    //! In-memory fakes for the backend seams.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use wdx_client::{ClaimLookup, ClaimQuery, LabelLookup};
    use wdx_core::{
        EntityClaims, EntityRef, PropertyRef, Rank, Result, Statement,
    };

    /// A canned claim graph standing in for the statement and label services.
    #[derive(Default)]
    pub struct FakeGraph {
        pub entities: HashMap<String, EntityClaims>,
        pub labels: HashMap<String, (String, String)>,
        pub claim_calls: AtomicUsize,
    }

    impl FakeGraph {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, claims: EntityClaims) {
            self.entities.insert(claims.subject.id.clone(), claims);
        }

        pub fn label(&mut self, id: &str, label: &str, description: &str) {
            self.labels
                .insert(id.to_string(), (label.to_string(), description.to_string()));
        }

        pub fn claim_calls(&self) -> usize {
            self.claim_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ClaimLookup for FakeGraph {
        async fn fetch_claims_batch(
            &self,
            ids: &[String],
            query: &ClaimQuery,
        ) -> Result<HashMap<String, EntityClaims>> {
            self.claim_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ids
                .iter()
                .filter_map(|id| self.entities.get(id))
                .map(|claims| {
                    let statements = claims
                        .statements
                        .iter()
                        .filter(|s| query.pids.is_empty() || query.pids.contains(&s.property.id))
                        .cloned()
                        .collect();
                    (
                        claims.subject.id.clone(),
                        EntityClaims {
                            subject: claims.subject.clone(),
                            statements,
                        },
                    )
                })
                .collect())
        }
    }

    #[async_trait]
    impl LabelLookup for FakeGraph {
        async fn resolve_labels(
            &self,
            ids: &[String],
            _lang: &str,
        ) -> Result<HashMap<String, (String, String)>> {
            Ok(ids
                .iter()
                .filter_map(|id| self.labels.get(id).map(|v| (id.clone(), v.clone())))
                .collect())
        }
    }

    pub fn entity(id: &str, label: &str) -> EntityRef {
        EntityRef {
            id: id.to_string(),
            label: label.to_string(),
            description: String::new(),
        }
    }

    pub fn claims(id: &str, label: &str, statements: Vec<Statement>) -> EntityClaims {
        EntityClaims {
            subject: entity(id, label),
            statements,
        }
    }

    /// A literal-valued statement at normal rank.
    pub fn literal_statement(pid: &str, property_label: &str, value: &str) -> Statement {
        Statement {
            property: PropertyRef {
                id: pid.to_string(),
                label: property_label.to_string(),
                description: String::new(),
            },
            value: value.to_string(),
            value_entity: None,
            rank: Rank::Normal,
            qualifiers: Vec::new(),
            references: Vec::new(),
            external_id: false,
        }
    }

    /// An entity-valued statement at normal rank.
    pub fn entity_statement(
        pid: &str,
        property_label: &str,
        target_id: &str,
        target_label: &str,
    ) -> Statement {
        Statement {
            value: format!("{target_label} ({target_id})"),
            value_entity: Some(entity(target_id, target_label)),
            ..literal_statement(pid, property_label, "")
        }
    }
}
