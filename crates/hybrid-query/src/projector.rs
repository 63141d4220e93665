//! Reshapes backend hits onto a dataset's logical output keys.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use hybrid_core::{Hit, ProjectedHit, Result, SearchError};

/// Project each hit onto `mapping` (logical key -> backend field).
///
/// A mapped field missing from a hit fails the whole projection with
/// `MissingField`.
pub fn project_hits(hits: Vec<Hit>, mapping: &BTreeMap<String, String>) -> Result<Vec<ProjectedHit>> {
    hits.into_iter().map(|hit| project_hit(hit, mapping)).collect()
}

/// Project one hit.
pub fn project_hit(hit: Hit, mapping: &BTreeMap<String, String>) -> Result<ProjectedHit> {
    let mut fields = Map::with_capacity(mapping.len());

    for (key, backend_field) in mapping {
        let value = hit
            .fields
            .get(backend_field)
            .cloned()
            .ok_or_else(|| SearchError::missing_field(backend_field.as_str(), hit.id.as_str()))?;
        fields.insert(key.clone(), unwrap_single(value));
    }

    Ok(ProjectedHit {
        id: hit.id,
        score: hit.score,
        explanation: hit.explanation,
        fields,
    })
}

/// Backends return stored fields as arrays; unwrap the one-value case.
fn unwrap_single(value: Value) -> Value {
    match value {
        Value::Array(mut values) if values.len() == 1 => values.remove(0),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("text".to_string(), "overview".to_string()),
            ("title".to_string(), "title".to_string()),
        ])
    }

    #[test]
    fn test_project_hit() {
        let hit = Hit::new("42", Some(3.5))
            .with_field("title", json!(["Alien"]))
            .with_field("overview", json!(["In space no one can hear you scream."]))
            .with_field("keywords", json!(["horror", "space"]));

        let projected = project_hit(hit, &mapping()).unwrap();
        assert_eq!(projected.id, "42");
        assert_eq!(projected.score, Some(3.5));
        assert_eq!(projected.fields.len(), 2);
        assert_eq!(projected.fields["title"], json!("Alien"));
        assert_eq!(
            projected.fields["text"],
            json!("In space no one can hear you scream.")
        );
    }

    #[test]
    fn test_multi_value_fields_kept_as_arrays() {
        let hit = Hit::new("1", None)
            .with_field("title", json!(["A", "B"]))
            .with_field("overview", json!("plain"));

        let projected = project_hit(hit, &mapping()).unwrap();
        assert_eq!(projected.fields["title"], json!(["A", "B"]));
        assert_eq!(projected.fields["text"], json!("plain"));
    }

    #[test]
    fn test_missing_field() {
        let hits = vec![
            Hit::new("1", None)
                .with_field("title", json!(["A"]))
                .with_field("overview", json!(["a"])),
            Hit::new("2", None).with_field("title", json!(["B"])),
        ];

        let err = project_hits(hits, &mapping()).unwrap_err();
        assert!(matches!(
            err,
            SearchError::MissingField { ref field, ref hit_id } if field == "overview" && hit_id == "2"
        ));
    }

    #[test]
    fn test_explanation_carried() {
        let mut hit = Hit::new("1", Some(0.5))
            .with_field("title", json!(["A"]))
            .with_field("overview", json!(["a"]));
        hit.explanation = Some("0.5 (0.5 + 0)".to_string());

        let projected = project_hit(hit, &mapping()).unwrap();
        assert_eq!(projected.explanation.as_deref(), Some("0.5 (0.5 + 0)"));
    }
}
