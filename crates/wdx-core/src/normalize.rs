//! Response normalizer: raw upstream JSON to the internal record model.
//!
//! Upstream services return heterogeneous shapes (MediaWiki search envelopes,
//! vector-index hit lists, textify claim trees, SPARQL binding tables). All
//! defensive parsing and shape-variance handling lives here, as pure
//! functions; callers wrap [`ShapeError`] into a stage-tagged backend error.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::record::{
    EntityClaims, EntityKind, EntityRef, PropertyRef, Qualifier, QueryResultSet, Rank, Reference,
    SearchHit, SearchSource, SearchTarget, Statement,
};

/// An upstream response did not have the expected shape.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ShapeError(pub String);

type Result<T> = std::result::Result<T, ShapeError>;

const ENTITY_URI_PREFIX: &str = "http://www.wikidata.org/entity/";

/// One raw hit from the vector index: an id plus optional similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorId {
    pub id: String,
    pub score: Option<f64>,
}

/// Parse a vector-index response: a JSON array of objects keyed by `QID` or
/// `PID` depending on the search kind, each optionally carrying a `score`.
pub fn vector_ids(response: &Value, kind: EntityKind) -> Result<Vec<VectorId>> {
    let hits = response
        .as_array()
        .ok_or_else(|| ShapeError("vector response is not an array".to_string()))?;

    hits.iter()
        .map(|hit| {
            let id = hit
                .get(kind.id_field())
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ShapeError(format!("vector hit is missing the {} field", kind.id_field()))
                })?;
            Ok(VectorId {
                id: id.to_string(),
                score: hit.get("score").and_then(Value::as_f64),
            })
        })
        .collect()
}

/// Parse a `wbsearchentities` response into keyword-sourced hits, in backend
/// order. Labels and descriptions come from the `display` envelope and may be
/// empty.
pub fn keyword_hits(response: &Value, kind: EntityKind) -> Result<Vec<SearchHit>> {
    let results = response
        .get("search")
        .and_then(Value::as_array)
        .ok_or_else(|| ShapeError("search response has no 'search' list".to_string()))?;

    results
        .iter()
        .map(|entry| {
            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| ShapeError("search result is missing an id".to_string()))?;
            let display = |field: &str| -> String {
                entry
                    .get("display")
                    .and_then(|d| d.get(field))
                    .and_then(|f| f.get("value"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Ok(SearchHit {
                target: search_target(kind, id, display("label"), display("description")),
                score: None,
                source: SearchSource::Keyword,
            })
        })
        .collect()
}

/// Build a kind-appropriate search target.
#[must_use]
pub fn search_target(
    kind: EntityKind,
    id: &str,
    label: String,
    description: String,
) -> SearchTarget {
    match kind {
        EntityKind::Item => SearchTarget::Item(EntityRef {
            id: id.to_string(),
            label,
            description,
        }),
        EntityKind::Property => SearchTarget::Property(PropertyRef {
            id: id.to_string(),
            label,
            description,
        }),
    }
}

/// Parse a `wbgetentities` labels/descriptions response into a map from id
/// to `(label, description)`.
///
/// Ids the backend reports as missing are absent from the map. Labels fall
/// back through `lang`, then `mul`, then `en`.
pub fn label_map(response: &Value, lang: &str) -> Result<HashMap<String, (String, String)>> {
    let entities = response
        .get("entities")
        .and_then(Value::as_object)
        .ok_or_else(|| ShapeError("entity response has no 'entities' map".to_string()))?;

    let mut map = HashMap::new();
    for (id, entity) in entities {
        if entity.get("missing").is_some() {
            continue;
        }
        let label = lang_specific(entity.get("labels"), lang);
        let description = lang_specific(entity.get("descriptions"), lang);
        map.insert(id.clone(), (label, description));
    }
    Ok(map)
}

/// Pick a language-specific value with the `lang -> mul -> en` fallback chain.
fn lang_specific(data: Option<&Value>, lang: &str) -> String {
    let Some(data) = data else {
        return String::new();
    };
    for candidate in [lang, "mul", "en"] {
        if let Some(value) = data
            .get(candidate)
            .and_then(|v| v.get("value"))
            .and_then(Value::as_str)
        {
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    String::new()
}

/// Parse a textify claims response for a batch of subject ids.
///
/// A single-id request returns the bare entity object; multi-id requests
/// return an id-keyed map. Subjects the service does not know are absent
/// from the result.
pub fn claims_by_id(response: &Value, ids: &[String]) -> Result<HashMap<String, EntityClaims>> {
    // Single-entity responses carry the claims list at the top level.
    if response.get("claims").is_some() {
        let id = ids
            .first()
            .ok_or_else(|| ShapeError("claims response for an empty id batch".to_string()))?;
        let claims = entity_claims(response, id)?;
        return Ok(HashMap::from([(id.clone(), claims)]));
    }

    let map = response
        .as_object()
        .ok_or_else(|| ShapeError("claims response is not an object".to_string()))?;

    let mut out = HashMap::new();
    for id in ids {
        if let Some(entity) = map.get(id) {
            if entity.is_object() {
                out.insert(id.clone(), entity_claims(entity, id)?);
            }
        }
    }
    Ok(out)
}

/// Normalize one textify entity object into [`EntityClaims`].
pub fn entity_claims(entity: &Value, id: &str) -> Result<EntityClaims> {
    let label = entity
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut statements = Vec::new();
    for claim in entity
        .get("claims")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let pid = claim
            .get("PID")
            .and_then(Value::as_str)
            .ok_or_else(|| ShapeError(format!("claim on {id} is missing its PID")))?;
        let property = PropertyRef {
            id: pid.to_string(),
            label: claim
                .get("property_label")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description: String::new(),
        };
        let external_id = claim
            .get("datatype")
            .and_then(Value::as_str)
            .is_some_and(|d| d == "external-id");

        for value in claim
            .get("values")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            statements.push(statement_from_value(&property, value, external_id));
        }
    }

    Ok(EntityClaims {
        subject: EntityRef {
            id: id.to_string(),
            label,
            description: String::new(),
        },
        statements,
    })
}

fn statement_from_value(property: &PropertyRef, value: &Value, external_id: bool) -> Statement {
    let inner = value.get("value").unwrap_or(&Value::Null);

    let qualifiers = value
        .get("qualifiers")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|q| Qualifier {
            property: claim_property(q),
            value: render_value(q),
        })
        .collect();

    let references = value
        .get("references")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|group| {
            group
                .as_array()
                .into_iter()
                .flatten()
                .map(|r| Reference {
                    property: claim_property(r),
                    value: render_value(r),
                })
                .collect()
        })
        .collect();

    Statement {
        property: property.clone(),
        value: render_value(inner),
        value_entity: entity_in_value(inner),
        rank: Rank::parse(value.get("rank").and_then(Value::as_str).unwrap_or("normal")),
        qualifiers,
        references,
        external_id,
    }
}

fn claim_property(claim: &Value) -> PropertyRef {
    PropertyRef {
        id: claim
            .get("PID")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        label: claim
            .get("property_label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        description: String::new(),
    }
}

/// Render a heterogeneous statement value to its display string.
///
/// Handles nested value lists, wrapped values, plain strings, entity values
/// (`label (QID)`), and quantities (`amount unit`). The key precedence
/// matters: a qualifier object carries both a `value` and a `PID`, and must
/// render its value, not itself.
#[must_use]
pub fn render_value(value: &Value) -> String {
    if let Some(obj) = value.as_object() {
        if let Some(values) = obj.get("values").and_then(Value::as_array) {
            return values
                .iter()
                .map(|v| render_value(v.get("value").unwrap_or(&Value::Null)))
                .collect::<Vec<_>>()
                .join(", ");
        }
        if let Some(inner) = obj.get("value") {
            return render_value(inner);
        }
        if let Some(s) = obj.get("string").and_then(Value::as_str) {
            return s.to_string();
        }
        for id_key in ["QID", "PID"] {
            if let Some(id) = obj.get(id_key).and_then(Value::as_str) {
                let label = obj.get("label").and_then(Value::as_str).unwrap_or_default();
                return format!("{label} ({id})");
            }
        }
        if let Some(amount) = obj.get("amount") {
            let amount = json_scalar(amount);
            let unit = obj.get("unit").and_then(Value::as_str).unwrap_or_default();
            return format!("{amount} {unit}").trim_end().to_string();
        }
    }
    json_scalar(value)
}

/// The entity reference inside a statement value, when there is one.
#[must_use]
pub fn entity_in_value(value: &Value) -> Option<EntityRef> {
    let obj = value.as_object()?;
    if let Some(inner) = obj.get("value") {
        return entity_in_value(inner);
    }
    for id_key in ["QID", "PID"] {
        if let Some(id) = obj.get(id_key).and_then(Value::as_str) {
            return Some(EntityRef {
                id: id.to_string(),
                label: obj.get("label").and_then(Value::as_str).unwrap_or_default().to_string(),
                description: String::new(),
            });
        }
    }
    None
}

fn json_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a SPARQL JSON response into a [`QueryResultSet`].
///
/// Column order comes from `head.vars`; cells missing from a binding render
/// as empty strings; full entity URIs are shortened to bare ids.
pub fn sparql_result(response: &Value) -> Result<QueryResultSet> {
    let columns: Vec<String> = response
        .get("head")
        .and_then(|h| h.get("vars"))
        .and_then(Value::as_array)
        .ok_or_else(|| ShapeError("query response has no 'head.vars' list".to_string()))?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    let bindings = response
        .get("results")
        .and_then(|r| r.get("bindings"))
        .and_then(Value::as_array)
        .ok_or_else(|| ShapeError("query response has no 'results.bindings' list".to_string()))?;

    let rows = bindings
        .iter()
        .map(|binding| {
            columns
                .iter()
                .map(|col| {
                    let cell = binding
                        .get(col)
                        .and_then(|c| c.get("value"))
                        .map(json_scalar)
                        .unwrap_or_default();
                    shorten_entity_uri(&cell).to_string()
                })
                .collect()
        })
        .collect();

    Ok(QueryResultSet { columns, rows })
}

/// Shorten `http://www.wikidata.org/entity/<ID>` to the bare id. Anything
/// else passes through untouched.
#[must_use]
pub fn shorten_entity_uri(value: &str) -> &str {
    let Some(rest) = value.strip_prefix(ENTITY_URI_PREFIX) else {
        return value;
    };
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {
            let digits = chars.as_str();
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                rest
            } else {
                value
            }
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyword_hits_from_search_envelope() {
        let response = json!({
            "search": [
                {
                    "id": "Q42",
                    "display": {
                        "label": {"value": "Douglas Adams"},
                        "description": {"value": "English writer"}
                    }
                },
                {"id": "Q28421831", "display": {}}
            ]
        });
        let hits = keyword_hits(&response, EntityKind::Item).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].target.id(), "Q42");
        assert_eq!(hits[0].target.label(), "Douglas Adams");
        assert_eq!(hits[0].score, None);
        assert_eq!(hits[0].source, SearchSource::Keyword);
        assert_eq!(hits[1].target.label(), "");
    }

    #[test]
    fn keyword_hits_rejects_missing_envelope() {
        assert!(keyword_hits(&json!({"error": "boom"}), EntityKind::Item).is_err());
    }

    #[test]
    fn vector_ids_use_kind_specific_field() {
        let response = json!([
            {"QID": "Q627333", "score": 0.91},
            {"QID": "Q23163"}
        ]);
        let ids = vector_ids(&response, EntityKind::Item).unwrap();
        assert_eq!(ids[0].id, "Q627333");
        assert_eq!(ids[0].score, Some(0.91));
        assert_eq!(ids[1].score, None);

        let response = json!([{"PID": "P551"}]);
        let ids = vector_ids(&response, EntityKind::Property).unwrap();
        assert_eq!(ids[0].id, "P551");

        // An item response cannot satisfy a property search.
        assert!(vector_ids(&json!([{"QID": "Q1"}]), EntityKind::Property).is_err());
    }

    #[test]
    fn label_map_falls_back_through_mul_to_en() {
        let response = json!({
            "entities": {
                "Q1": {
                    "labels": {"de": {"value": "Universum"}, "mul": {"value": "universe"}},
                    "descriptions": {"en": {"value": "everything"}}
                },
                "Q2": {"missing": ""}
            }
        });
        let map = label_map(&response, "fr").unwrap();
        let (label, description) = &map["Q1"];
        assert_eq!(label, "universe");
        assert_eq!(description, "everything");
        assert!(!map.contains_key("Q2"));
    }

    fn textify_entity() -> Value {
        json!({
            "label": "Douglas Adams",
            "claims": [
                {
                    "PID": "P106",
                    "property_label": "occupation",
                    "values": [
                        {
                            "value": {"QID": "Q6625963", "label": "novelist"},
                            "rank": "normal",
                            "qualifiers": [
                                {"PID": "P580", "property_label": "start time", "value": {"string": "1979"}}
                            ],
                            "references": [
                                [
                                    {"PID": "P248", "property_label": "stated in", "value": {"QID": "Q2567271", "label": "Who's Who"}},
                                    {"PID": "P4789", "property_label": "Who's Who UK ID", "value": {"string": "U4994"}}
                                ]
                            ]
                        },
                        {
                            "value": {"QID": "Q18844224", "label": "science fiction writer"},
                            "rank": "deprecated"
                        }
                    ]
                },
                {
                    "PID": "P2048",
                    "property_label": "height",
                    "values": [
                        {"value": {"amount": "+1.96", "unit": "metre"}, "rank": "normal"}
                    ]
                }
            ]
        })
    }

    #[test]
    fn entity_claims_flattens_claim_values() {
        let claims = entity_claims(&textify_entity(), "Q42").unwrap();
        assert_eq!(claims.subject.id, "Q42");
        assert_eq!(claims.subject.label, "Douglas Adams");
        assert_eq!(claims.statements.len(), 3);

        let occupation = &claims.statements[0];
        assert_eq!(occupation.property.id, "P106");
        assert_eq!(occupation.value, "novelist (Q6625963)");
        assert_eq!(occupation.value_entity.as_ref().unwrap().id, "Q6625963");
        assert_eq!(occupation.rank, Rank::Normal);
        assert_eq!(occupation.qualifiers.len(), 1);
        assert_eq!(occupation.qualifiers[0].value, "1979");
        assert_eq!(occupation.references.len(), 1);
        assert_eq!(occupation.references[0].len(), 2);
        assert_eq!(occupation.references[0][1].value, "U4994");

        assert_eq!(claims.statements[1].rank, Rank::Deprecated);

        let height = &claims.statements[2];
        assert_eq!(height.value, "+1.96 metre");
        assert!(height.value_entity.is_none());
    }

    #[test]
    fn claims_by_id_handles_both_response_shapes() {
        let single = textify_entity();
        let ids = vec!["Q42".to_string()];
        let map = claims_by_id(&single, &ids).unwrap();
        assert!(map.contains_key("Q42"));

        let multi = json!({"Q42": textify_entity(), "Q5": {"label": "human", "claims": []}});
        let ids = vec!["Q42".to_string(), "Q5".to_string(), "Q404".to_string()];
        let map = claims_by_id(&multi, &ids).unwrap();
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key("Q404"));
    }

    #[test]
    fn render_value_prefers_wrapped_value_over_own_ids() {
        // A qualifier object has both a PID and a value; the value wins.
        let qualifier = json!({
            "PID": "P580",
            "property_label": "start time",
            "value": {"string": "1979"}
        });
        assert_eq!(render_value(&qualifier), "1979");

        assert_eq!(
            render_value(&json!({"QID": "Q5", "label": "human"})),
            "human (Q5)"
        );
        assert_eq!(render_value(&json!({"amount": "+3", "unit": ""})), "+3");
        assert_eq!(
            render_value(&json!({"values": [
                {"value": {"string": "a"}},
                {"value": {"string": "b"}}
            ]})),
            "a, b"
        );
        assert_eq!(render_value(&json!("plain")), "plain");
    }

    #[test]
    fn sparql_result_shortens_uris_and_pads_missing_cells() {
        let response = json!({
            "head": {"vars": ["human", "name"]},
            "results": {"bindings": [
                {
                    "human": {"type": "uri", "value": "http://www.wikidata.org/entity/Q42"},
                    "name": {"type": "literal", "value": "Douglas Adams"}
                },
                {
                    "human": {"type": "uri", "value": "http://www.wikidata.org/entity/Q820"}
                }
            ]}
        });
        let result = sparql_result(&response).unwrap();
        assert_eq!(result.columns, vec!["human", "name"]);
        assert_eq!(result.rows[0], vec!["Q42", "Douglas Adams"]);
        assert_eq!(result.rows[1], vec!["Q820", ""]);
    }

    #[test]
    fn shorten_entity_uri_only_matches_entity_ids() {
        assert_eq!(
            shorten_entity_uri("http://www.wikidata.org/entity/Q42"),
            "Q42"
        );
        assert_eq!(
            shorten_entity_uri("http://www.wikidata.org/entity/statement/Q42-abc"),
            "http://www.wikidata.org/entity/statement/Q42-abc"
        );
        assert_eq!(shorten_entity_uri("plain literal"), "plain literal");
        assert_eq!(
            shorten_entity_uri("http://www.wikidata.org/entity/"),
            "http://www.wikidata.org/entity/"
        );
    }
}
