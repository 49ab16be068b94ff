//! Executes a single declarative HTTP call described by a user-defined
//! function template. Argument substitution never mutates the definition.

use reqwest::blocking::Client;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::store::{FunctionDefinition, HttpMethod};

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("network error calling {name}: {detail}")]
    Network { name: String, detail: String },
    #[error("authentication rejected for {name}; check the key in its headers")]
    Auth { name: String },
    #[error("endpoint for {name} not found (404); check the configured URL")]
    NotFound { name: String },
    #[error("rate limited calling {name} (429)")]
    RateLimited { name: String },
    #[error("{name} failed with status {status}")]
    Upstream { name: String, status: u16 },
    #[error("{name} returned a body that is not JSON")]
    BadResponseBody { name: String },
}

/// Tagged shape of a declared parameter schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaShape {
    /// `{"type": "object", "properties": ...}` -- the argument map is the body
    Object,
    /// A single primitive -- the lone argument value is the body
    Primitive,
}

impl SchemaShape {
    #[must_use]
    pub fn of(schema: &JsonValue) -> Self {
        match schema.get("type").and_then(JsonValue::as_str) {
            Some("object") | None => Self::Object,
            Some(_) => Self::Primitive,
        }
    }
}

/// Shapes the validated argument map to match the declared schema
#[must_use]
pub fn shape_body(args: &JsonValue, schema: &JsonValue) -> JsonValue {
    match SchemaShape::of(schema) {
        SchemaShape::Object => args.clone(),
        SchemaShape::Primitive => args
            .as_object()
            .and_then(|map| map.values().next().cloned())
            .unwrap_or_else(|| args.clone()),
    }
}

/// Replaces every `{param}` token with the matching argument's string form.
/// Unmatched placeholders are left in place.
#[must_use]
pub fn substitute_placeholders(template: &str, args: &JsonValue) -> String {
    let mut result = template.to_string();
    if let Some(map) = args.as_object() {
        for (key, value) in map {
            let token = format!("{{{key}}}");
            if result.contains(&token) {
                result = result.replace(&token, &argument_text(value));
            }
        }
    }
    result
}

fn argument_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Definition headers win over the JSON defaults
#[must_use]
fn merged_headers(def: &FunctionDefinition, args: &JsonValue) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    for (name, value) in &def.headers {
        headers.insert(name.clone(), substitute_placeholders(value, args));
    }
    headers
}

pub(crate) fn looks_like_auth_failure(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    ["authentication", "apikey", "api key", "access token", "unauthorized"]
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Performs the call described by the definition with the given arguments.
/// No retry: a failure surfaces immediately and the calling exchange
/// degrades to "answer without tool result".
pub fn invoke(def: &FunctionDefinition, args: &JsonValue) -> Result<JsonValue, FunctionError> {
    let network_error = |error: &dyn std::fmt::Display| {
        let detail = error.to_string();
        if looks_like_auth_failure(&detail) {
            FunctionError::Auth {
                name: def.name.clone(),
            }
        } else {
            FunctionError::Network {
                name: def.name.clone(),
                detail,
            }
        }
    };

    let url = substitute_placeholders(&def.url, args);
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|error| network_error(&error))?;

    let mut request = match def.method {
        HttpMethod::Get => client.get(&url),
        HttpMethod::Post => client.post(&url),
    };
    for (name, value) in merged_headers(def, args) {
        request = request.header(name, value);
    }
    if def.method == HttpMethod::Post {
        request = request.json(&shape_body(args, &def.parameters));
    }

    let response = request.send().map_err(|error| network_error(&error))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        if status.as_u16() == 401 || looks_like_auth_failure(&body) {
            return Err(FunctionError::Auth {
                name: def.name.clone(),
            });
        }
        return Err(match status.as_u16() {
            404 => FunctionError::NotFound {
                name: def.name.clone(),
            },
            429 => FunctionError::RateLimited {
                name: def.name.clone(),
            },
            code => FunctionError::Upstream {
                name: def.name.clone(),
                status: code,
            },
        });
    }

    response
        .json::<JsonValue>()
        .map_err(|_| FunctionError::BadResponseBody {
            name: def.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_def() -> FunctionDefinition {
        FunctionDefinition {
            id: "weather".to_string(),
            name: "get_weather".to_string(),
            description: "current weather".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string" }
                },
                "required": ["location"]
            }),
            url: "https://api.example.com/current.json?q={location}&key={key}".to_string(),
            method: HttpMethod::Get,
            headers: HashMap::from([("X-Api-Key".to_string(), "{key}".to_string())]),
        }
    }

    #[test]
    fn test_substitute_replaces_known_placeholders() {
        let url = substitute_placeholders(
            "https://api.example.com/current.json?q={location}&key={key}",
            &json!({"location": "Prague", "key": "abc123"}),
        );
        assert_eq!(url, "https://api.example.com/current.json?q=Prague&key=abc123");
    }

    #[test]
    fn test_substitute_leaves_unmatched_placeholders() {
        let url = substitute_placeholders(
            &weather_def().url,
            &json!({"location": "Prague"}),
        );
        assert_eq!(url, "https://api.example.com/current.json?q=Prague&key={key}");
    }

    #[test]
    fn test_substitute_uses_bare_string_form() {
        let url = substitute_placeholders("/items/{id}?limit={limit}", &json!({"id": 42, "limit": 5}));
        assert_eq!(url, "/items/42?limit=5");
    }

    #[test]
    fn test_schema_shape_detection() {
        assert_eq!(SchemaShape::of(&json!({"type": "object"})), SchemaShape::Object);
        assert_eq!(SchemaShape::of(&json!({"properties": {}})), SchemaShape::Object);
        assert_eq!(SchemaShape::of(&json!({"type": "string"})), SchemaShape::Primitive);
    }

    #[test]
    fn test_shape_body_object_passes_map_through() {
        let args = json!({"location": "Prague", "aqi": "no"});
        assert_eq!(shape_body(&args, &json!({"type": "object"})), args);
    }

    #[test]
    fn test_shape_body_primitive_unwraps_single_value() {
        let args = json!({"text": "hello"});
        assert_eq!(shape_body(&args, &json!({"type": "string"})), json!("hello"));
    }

    #[test]
    fn test_definition_headers_override_defaults() {
        let mut def = weather_def();
        def.headers
            .insert("Accept".to_string(), "text/plain".to_string());
        let headers = merged_headers(&def, &json!({"key": "abc123"}));
        assert_eq!(headers.get("Accept").map(String::as_str), Some("text/plain"));
        assert_eq!(
            headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(headers.get("X-Api-Key").map(String::as_str), Some("abc123"));
    }

    #[test]
    fn test_auth_failure_heuristic() {
        assert!(looks_like_auth_failure("Invalid API key supplied"));
        assert!(looks_like_auth_failure("{\"error\":\"Unauthorized\"}"));
        assert!(!looks_like_auth_failure("internal server error"));
    }
}
