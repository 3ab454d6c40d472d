//! Statement rendering in triplet form.
//!
//! Two modes with deliberately different coverage:
//! - compact — current facts only: one `subject: property: value` line per
//!   statement, deprecated ranks dropped, no qualifiers or references.
//! - full — everything known about one entity/property pair, deprecated
//!   values included, with rank, qualifier, and reference blocks. This is
//!   the only path that surfaces provenance.

use wdx_client::{ClaimLookup, ClaimQuery, LabelLookup};
use wdx_core::record::{validate_entity_id, validate_property_id};
use wdx_core::{EntityClaims, EntityRef, Rank, Result, WdxError};

/// Fetch and render the compact statement listing for an entity.
///
/// Statements on external-identifier properties are noise for graph
/// exploration and are dropped unless `include_external_ids` is set.
///
/// # Errors
///
/// Returns [`WdxError::NotFound`] for an unknown entity id; an entity with
/// no renderable statements is an explicit empty payload, not an error.
pub async fn format_compact<L>(
    lookup: &L,
    entity_id: &str,
    include_external_ids: bool,
    lang: &str,
) -> Result<String>
where
    L: ClaimLookup + ?Sized,
{
    validate_entity_id(entity_id)?;
    let mut query = ClaimQuery::new(lang);
    query.include_external_ids = include_external_ids;
    let claims = lookup
        .fetch_claims(entity_id, &query)
        .await?
        .ok_or_else(|| WdxError::entity_not_found(entity_id))?;
    Ok(render_compact(&claims, include_external_ids))
}

/// Render the compact listing from already-fetched claims.
#[must_use]
pub fn render_compact(claims: &EntityClaims, include_external_ids: bool) -> String {
    let subject = display_ref(&claims.subject);
    let lines: Vec<String> = claims
        .statements
        .iter()
        .filter(|s| s.rank != Rank::Deprecated)
        .filter(|s| include_external_ids || !s.external_id)
        .map(|s| {
            format!(
                "{subject}: {} ({}): {}",
                s.property.label, s.property.id, s.value
            )
        })
        .collect();
    if lines.is_empty() {
        format!("No statements found for {}", claims.subject.id)
    } else {
        lines.join("\n")
    }
}

/// Fetch and render the full listing for one entity/property pair.
///
/// # Errors
///
/// Returns [`WdxError::NotFound`] for an unknown entity id, and a distinct
/// property-flavoured [`WdxError::NotFound`] when the property id itself is
/// unknown. A known property with no statements on the entity is an
/// explicit empty payload.
pub async fn format_full<L>(
    lookup: &L,
    entity_id: &str,
    property_id: &str,
    lang: &str,
) -> Result<String>
where
    L: ClaimLookup + LabelLookup + ?Sized,
{
    validate_entity_id(entity_id)?;
    validate_property_id(property_id)?;

    let mut query = ClaimQuery::new(lang);
    query.pids = vec![property_id.to_string()];
    query.include_external_ids = true;
    query.all_ranks = true;
    query.references = true;

    let claims = lookup
        .fetch_claims(entity_id, &query)
        .await?
        .ok_or_else(|| WdxError::entity_not_found(entity_id))?;

    if let Some(text) = render_full(&claims, property_id) {
        return Ok(text);
    }

    // Nothing to render: tell an unknown property apart from a true empty.
    let ids = vec![property_id.to_string()];
    let known = lookup.resolve_labels(&ids, lang).await?;
    if !known.contains_key(property_id) {
        return Err(WdxError::property_not_found(property_id));
    }
    Ok(format!(
        "No statement found for {entity_id} with property {property_id}"
    ))
}

/// Render the full listing from already-fetched claims. `None` when the
/// entity has no statements for the property.
#[must_use]
pub fn render_full(claims: &EntityClaims, property_id: &str) -> Option<String> {
    let statements: Vec<_> = claims
        .statements
        .iter()
        .filter(|s| s.property.id == property_id)
        .collect();
    if statements.is_empty() {
        return None;
    }

    let subject = display_ref(&claims.subject);
    let mut output = String::new();
    for statement in statements {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!(
            "{subject}: {} ({}): {}\n",
            statement.property.label, statement.property.id, statement.value
        ));
        output.push_str(&format!("  Rank: {}\n", statement.rank.as_str()));

        if !statement.qualifiers.is_empty() {
            output.push_str("  Qualifier:\n");
            for qualifier in &statement.qualifiers {
                output.push_str(&format!(
                    "    - {} ({}): {}\n",
                    qualifier.property.label, qualifier.property.id, qualifier.value
                ));
            }
        }

        for (i, group) in statement.references.iter().enumerate() {
            output.push_str(&format!("  Reference {}:\n", i + 1));
            for reference in group {
                output.push_str(&format!(
                    "    - {} ({}): {}\n",
                    reference.property.label, reference.property.id, reference.value
                ));
            }
        }
    }
    Some(output.trim_end().to_string())
}

fn display_ref(entity: &EntityRef) -> String {
    if entity.label.is_empty() {
        entity.id.clone()
    } else {
        format!("{} ({})", entity.label, entity.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{claims, entity_statement, literal_statement, FakeGraph};
    use wdx_core::{PropertyRef, Qualifier, Reference, Statement};

    fn deprecated(statement: Statement) -> Statement {
        Statement {
            rank: Rank::Deprecated,
            ..statement
        }
    }

    fn external(statement: Statement) -> Statement {
        Statement {
            external_id: true,
            ..statement
        }
    }

    fn douglas() -> FakeGraph {
        let mut graph = FakeGraph::new();
        graph.insert(claims(
            "Q42",
            "Douglas Adams",
            vec![
                entity_statement("P31", "instance of", "Q5", "human"),
                deprecated(entity_statement("P106", "occupation", "Q333634", "translator")),
                external(literal_statement("P4789", "Who's Who UK ID", "U4994")),
                literal_statement("P2048", "height", "+1.96 metre"),
            ],
        ));
        graph.label("P31", "instance of", "class membership");
        graph.label("P106", "occupation", "job");
        graph
    }

    #[tokio::test]
    async fn compact_drops_deprecated_and_external_ids() {
        let graph = douglas();
        let text = format_compact(&graph, "Q42", false, "en").await.unwrap();

        assert_eq!(
            text,
            "Douglas Adams (Q42): instance of (P31): human (Q5)\n\
             Douglas Adams (Q42): height (P2048): +1.96 metre"
        );
        assert!(!text.contains("translator"));
        assert!(!text.contains("U4994"));
    }

    #[tokio::test]
    async fn compact_keeps_external_ids_on_request() {
        let graph = douglas();
        let text = format_compact(&graph, "Q42", true, "en").await.unwrap();
        assert!(text.contains("Who's Who UK ID (P4789): U4994"));
    }

    #[tokio::test]
    async fn compact_reports_unknown_entities() {
        let graph = douglas();
        let err = format_compact(&graph, "Q404404", false, "en")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "entity Q404404 not found");
    }

    #[tokio::test]
    async fn compact_renders_empty_entities_as_explicit_text() {
        let mut graph = FakeGraph::new();
        graph.insert(claims("Q7", "bare", vec![]));
        let text = format_compact(&graph, "Q7", false, "en").await.unwrap();
        assert_eq!(text, "No statements found for Q7");
    }

    #[tokio::test]
    async fn full_includes_deprecated_ranks_qualifiers_and_references() {
        let mut graph = FakeGraph::new();
        let mut occupation = entity_statement("P106", "occupation", "Q6625963", "novelist");
        occupation.qualifiers.push(Qualifier {
            property: PropertyRef {
                id: "P580".to_string(),
                label: "start time".to_string(),
                description: String::new(),
            },
            value: "1979".to_string(),
        });
        occupation.references.push(vec![Reference {
            property: PropertyRef {
                id: "P248".to_string(),
                label: "stated in".to_string(),
                description: String::new(),
            },
            value: "Who's Who (Q2567271)".to_string(),
        }]);
        graph.insert(claims(
            "Q42",
            "Douglas Adams",
            vec![
                occupation,
                deprecated(entity_statement("P106", "occupation", "Q333634", "translator")),
            ],
        ));

        let text = format_full(&graph, "Q42", "P106", "en").await.unwrap();

        assert!(text.starts_with(
            "Douglas Adams (Q42): occupation (P106): novelist (Q6625963)\n  Rank: normal"
        ));
        assert!(text.contains("  Qualifier:\n    - start time (P580): 1979"));
        assert!(text.contains("  Reference 1:\n    - stated in (P248): Who's Who (Q2567271)"));
        // Deprecated values are exactly what this mode exists to surface.
        assert!(text.contains("translator (Q333634)"));
        assert!(text.contains("  Rank: deprecated"));
    }

    #[tokio::test]
    async fn full_tells_unknown_property_apart_from_empty() {
        let graph = douglas();

        // Unknown property id: no statements and no label resolution.
        let err = format_full(&graph, "Q42", "P9999999", "en")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "property P9999999 not found");

        let mut graph = douglas();
        graph.label("P569", "date of birth", "");
        let text = format_full(&graph, "Q42", "P569", "en").await.unwrap();
        assert_eq!(text, "No statement found for Q42 with property P569");
    }

    #[tokio::test]
    async fn full_validates_the_property_namespace() {
        let graph = douglas();
        let err = format_full(&graph, "Q42", "Q5", "en").await.unwrap_err();
        assert!(matches!(err, WdxError::Validation(_)));
    }
}
