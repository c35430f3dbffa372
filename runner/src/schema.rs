//! Effective input schema resolution.
//!
//! The platform stores an actor's input schema in different places depending
//! on how the actor was built. Locations are tried in a fixed order and the
//! first one that yields at least one property wins:
//!
//! 1. the default build (`inputSchema`, then `actorDefinition.input`)
//! 2. the most recent version (`inputSchema`, then its schema source file)
//! 3. the actor record itself (`inputSchema`)
//!
//! Missing or unparseable locations are skipped, never fatal. When nothing
//! matches the schema is empty, which callers treat as "run with defaults".

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;
use shared_types::{EffectiveSchema, SchemaProperty};

const SCHEMA_SOURCE_FILES: [&str; 2] = [".actor/input_schema.json", "INPUT_SCHEMA.json"];

/// Raw platform records a schema may be read from.
#[derive(Debug, Clone, Default)]
pub struct ActorMetadata {
    /// The actor record (`data` of `GET /v2/acts/{id}`).
    pub actor: Value,
    /// The default build record, when it could be fetched.
    pub default_build: Option<Value>,
}

impl ActorMetadata {
    pub fn new(actor: Value, default_build: Option<Value>) -> Self {
        Self {
            actor,
            default_build,
        }
    }
}

pub fn resolve(metadata: &ActorMetadata) -> EffectiveSchema {
    let from_build = || {
        let build = metadata.default_build.as_ref()?;
        first_schema([
            build.get("inputSchema"),
            build.get("actorDefinition").and_then(|d| d.get("input")),
        ])
    };
    let from_version = || {
        let version = latest_version(&metadata.actor)?;
        first_schema([version.get("inputSchema"), schema_source_file(version)])
    };
    let from_actor = || first_schema([metadata.actor.get("inputSchema")]);

    from_build()
        .or_else(from_version)
        .or_else(from_actor)
        .unwrap_or_default()
}

fn first_schema<'a, const N: usize>(candidates: [Option<&'a Value>; N]) -> Option<EffectiveSchema> {
    candidates
        .into_iter()
        .flatten()
        .filter_map(normalize)
        .find(|schema| !schema.is_empty())
}

/// Picks the version with the highest dotted `versionNumber`, falling back to
/// the last listed entry when none carry one.
fn latest_version(actor: &Value) -> Option<&Value> {
    let versions = actor.get("versions")?.as_array()?;
    versions
        .iter()
        .filter_map(|version| {
            let number = version.get("versionNumber")?.as_str()?;
            Some((parse_version_number(number), version))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, version)| version)
        .or_else(|| versions.last())
}

fn parse_version_number(raw: &str) -> Vec<u64> {
    raw.split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}

fn schema_source_file(version: &Value) -> Option<&Value> {
    version
        .get("sourceFiles")?
        .as_array()?
        .iter()
        .find(|file| {
            file.get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| SCHEMA_SOURCE_FILES.contains(&name))
        })?
        .get("content")
}

/// Builds a schema from a JSON object or a JSON-encoded string.
fn normalize(raw: &Value) -> Option<EffectiveSchema> {
    let parsed;
    let schema = match raw {
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text).ok()?;
            &parsed
        }
        other => other,
    };

    let properties = schema
        .get("properties")?
        .as_object()?
        .iter()
        .filter_map(|(name, spec)| {
            let spec = spec.as_object()?;
            Some((name.clone(), normalize_property(name, spec)))
        })
        .collect::<IndexMap<_, _>>();

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect::<BTreeSet<_>>()
        })
        .unwrap_or_default();

    Some(EffectiveSchema {
        properties,
        required,
    })
}

fn normalize_property(name: &str, spec: &serde_json::Map<String, Value>) -> SchemaProperty {
    let text = |key: &str| {
        spec.get(key)
            .and_then(Value::as_str)
            .map(ToString::to_string)
    };

    SchemaProperty {
        kind: text("type").unwrap_or_else(|| "string".to_string()),
        title: text("title").unwrap_or_else(|| name.to_string()),
        description: text("description").unwrap_or_default(),
        enum_values: spec.get("enum").and_then(Value::as_array).cloned(),
        enum_titles: spec.get("enumTitles").and_then(Value::as_array).map(|titles| {
            titles
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        }),
        default: spec.get("default").cloned(),
        prefill: spec.get("prefill").cloned(),
        minimum: spec.get("minimum").and_then(Value::as_f64),
        maximum: spec.get("maximum").and_then(Value::as_f64),
        editor: text("editor"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_with(field: &str) -> Value {
        json!({
            "title": "Input",
            "type": "object",
            "properties": {
                field: { "type": "string", "title": field.to_uppercase() }
            },
            "required": [field]
        })
    }

    #[test]
    fn test_default_build_schema_wins() {
        let metadata = ActorMetadata::new(
            json!({
                "inputSchema": schema_with("from_actor"),
                "versions": [{ "versionNumber": "0.1", "inputSchema": schema_with("from_version") }]
            }),
            Some(json!({ "inputSchema": schema_with("from_build").to_string() })),
        );

        let schema = resolve(&metadata);
        assert!(schema.properties.contains_key("from_build"));
        assert_eq!(schema.properties.len(), 1);
    }

    #[test]
    fn test_actor_definition_input_in_default_build() {
        let metadata = ActorMetadata::new(
            json!({}),
            Some(json!({ "actorDefinition": { "input": schema_with("url") } })),
        );
        assert!(resolve(&metadata).properties.contains_key("url"));
    }

    #[test]
    fn test_latest_version_used_when_build_has_no_schema() {
        let metadata = ActorMetadata::new(
            json!({
                "versions": [
                    { "versionNumber": "0.9", "inputSchema": schema_with("old") },
                    { "versionNumber": "0.10", "inputSchema": schema_with("new") },
                    { "versionNumber": "0.2", "inputSchema": schema_with("older") }
                ],
                "inputSchema": schema_with("from_actor")
            }),
            Some(json!({ "buildNumber": "0.10.3" })),
        );

        let schema = resolve(&metadata);
        assert!(schema.properties.contains_key("new"));
        assert!(schema.required.contains("new"));
    }

    #[test]
    fn test_version_source_file_schema() {
        let metadata = ActorMetadata::new(
            json!({
                "versions": [{
                    "versionNumber": "1.0",
                    "sourceFiles": [
                        { "name": "main.js", "content": "console.log(1)" },
                        { "name": ".actor/input_schema.json", "content": schema_with("query").to_string() }
                    ]
                }]
            }),
            None,
        );
        assert!(resolve(&metadata).properties.contains_key("query"));
    }

    #[test]
    fn test_actor_record_is_last_resort() {
        let metadata = ActorMetadata::new(
            json!({
                "versions": [{ "versionNumber": "0.1" }],
                "inputSchema": schema_with("fallback")
            }),
            None,
        );
        assert!(resolve(&metadata).properties.contains_key("fallback"));
    }

    #[test]
    fn test_empty_schema_when_nothing_declared() {
        let metadata = ActorMetadata::new(
            json!({ "name": "bare", "versions": null }),
            Some(json!({ "inputSchema": "not json at all" })),
        );
        let schema = resolve(&metadata);
        assert!(schema.is_empty());
        assert!(schema.required.is_empty());
    }

    #[test]
    fn test_schema_without_properties_does_not_match() {
        let metadata = ActorMetadata::new(
            json!({ "inputSchema": schema_with("kept") }),
            Some(json!({ "inputSchema": { "title": "Empty", "properties": {} } })),
        );
        assert!(resolve(&metadata).properties.contains_key("kept"));
    }

    #[test]
    fn test_property_normalization_and_order() {
        let raw = json!({
            "properties": {
                "zeta": { "type": "integer", "minimum": 1, "maximum": 100, "default": 10 },
                "alpha": {
                    "title": "Mode",
                    "description": "How to crawl",
                    "enum": ["fast", "deep"],
                    "enumTitles": ["Fast", "Deep"],
                    "editor": "select"
                }
            },
            "required": ["zeta", 5]
        });
        let metadata = ActorMetadata::new(json!({ "inputSchema": raw }), None);
        let schema = resolve(&metadata);

        let names: Vec<_> = schema.properties.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        let zeta = &schema.properties["zeta"];
        assert_eq!(zeta.kind, "integer");
        assert_eq!(zeta.title, "zeta");
        assert_eq!(zeta.minimum, Some(1.0));
        assert_eq!(zeta.maximum, Some(100.0));
        assert_eq!(zeta.default, Some(json!(10)));

        let alpha = &schema.properties["alpha"];
        assert_eq!(alpha.kind, "string");
        assert_eq!(alpha.enum_values, Some(vec![json!("fast"), json!("deep")]));
        assert_eq!(alpha.enum_titles.as_deref(), Some(&["Fast".to_string(), "Deep".to_string()][..]));
        assert_eq!(alpha.editor.as_deref(), Some("select"));

        assert_eq!(schema.required.len(), 1);
    }
}
