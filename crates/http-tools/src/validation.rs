//! Strict per-verb argument schemas.
//!
//! Every tool accepts `path` and optional `headers`; GET adds `queryParams`, POST/PUT/PATCH add
//! `body`. Schemas are closed: any other key is a violation. Violations are reported as
//! `<field>: <message>` (dotted field path, `root` for the object itself) joined by `, `.
//!
//! Two wordings are part of the external contract and stay fixed: a missing `path` reads
//! `path: Required` and an empty one reads `path: Path cannot be empty`.

use crate::error::{HttpToolsError, Result, ToolError};
use crate::query::QueryParams;
use crate::semantics::HttpVerb;
use jsonschema::Validator;
use jsonschema::error::ValidationErrorKind;
use rmcp::model::JsonObject;
use serde_json::{Value, json};
use std::collections::HashMap;

const PATH: &str = "path";
const BODY: &str = "body";
const QUERY_PARAMS: &str = "queryParams";
const HEADERS: &str = "headers";

/// Arguments that passed validation, split into typed fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments {
    pub path: String,
    /// `Some(Value::Null)` when the caller passed an explicit `null`.
    pub body: Option<Value>,
    pub query_params: Option<QueryParams>,
    pub headers: Option<HashMap<String, String>>,
}

pub struct ArgumentSchema {
    verb: HttpVerb,
    schema: Value,
    validator: Validator,
}

impl ArgumentSchema {
    /// Build and compile the closed schema for `verb`.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated schema fails to compile.
    pub fn for_verb(verb: HttpVerb) -> Result<Self> {
        let schema = input_schema(verb);
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| HttpToolsError::Schema(format!("{verb} tool schema: {e}")))?;
        Ok(Self {
            verb,
            schema,
            validator,
        })
    }

    /// The JSON Schema advertised as the tool's `inputSchema`.
    #[must_use]
    pub fn input_schema(&self) -> &Value {
        &self.schema
    }

    #[must_use]
    pub fn allowed_keys(&self) -> Vec<&'static str> {
        allowed_keys(self.verb)
    }

    /// Validate raw tool-call arguments. Absent arguments are treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] listing every violation.
    pub fn validate(
        &self,
        arguments: Option<&JsonObject>,
    ) -> std::result::Result<ValidatedArguments, ToolError> {
        let empty = JsonObject::new();
        let args = arguments.unwrap_or(&empty);
        let mut issues: Vec<String> = Vec::new();

        match args.get(PATH) {
            None => issues.push(format!("{PATH}: Required")),
            Some(Value::String(p)) if p.is_empty() => {
                issues.push(format!("{PATH}: Path cannot be empty"));
            }
            Some(_) => {}
        }

        let instance = Value::Object(args.clone());
        for e in self.validator.iter_errors(&instance) {
            // Reported above / below with fixed wording.
            if matches!(
                e.kind(),
                ValidationErrorKind::Required { .. }
                    | ValidationErrorKind::AdditionalProperties { .. }
                    | ValidationErrorKind::MinLength { .. }
            ) {
                continue;
            }
            let field = dotted_path(&e.instance_path().to_string());
            issues.push(format!("{field}: {e}"));
        }

        let allowed = self.allowed_keys();
        let unknown: Vec<String> = args
            .keys()
            .filter(|k| !allowed.contains(&k.as_str()))
            .map(|k| format!("'{k}'"))
            .collect();
        if !unknown.is_empty() {
            issues.push(format!(
                "root: Unrecognized key(s) in object: {}",
                unknown.join(", ")
            ));
        }

        if !issues.is_empty() {
            return Err(ToolError::InvalidArguments(issues.join(", ")));
        }

        Ok(self.extract(args))
    }

    fn extract(&self, args: &JsonObject) -> ValidatedArguments {
        let path = args
            .get(PATH)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let body = if self.verb.accepts_body() {
            args.get(BODY).cloned()
        } else {
            None
        };

        let query_params = if self.verb.accepts_query_params() {
            args.get(QUERY_PARAMS)
                .and_then(Value::as_object)
                .map(|m| {
                    m.iter()
                        .map(|(k, v)| (k.clone(), v.as_str().map(str::to_string)))
                        .collect()
                })
        } else {
            None
        };

        let headers = args.get(HEADERS).and_then(Value::as_object).map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        });

        ValidatedArguments {
            path,
            body,
            query_params,
            headers,
        }
    }
}

fn allowed_keys(verb: HttpVerb) -> Vec<&'static str> {
    let mut keys = vec![PATH];
    if verb.accepts_query_params() {
        keys.push(QUERY_PARAMS);
    }
    if verb.accepts_body() {
        keys.push(BODY);
    }
    keys.push(HEADERS);
    keys
}

fn input_schema(verb: HttpVerb) -> Value {
    let mut properties = JsonObject::new();
    properties.insert(
        PATH.to_string(),
        json!({
            "type": "string",
            "minLength": 1,
            "description": "API endpoint path, relative to the base URL (e.g. '/users', '/posts/123')"
        }),
    );
    if verb.accepts_query_params() {
        properties.insert(
            QUERY_PARAMS.to_string(),
            json!({
                "type": "object",
                "additionalProperties": { "type": "string" },
                "description": "Query parameters appended to the path (values are form-encoded)"
            }),
        );
    }
    if verb.accepts_body() {
        properties.insert(
            BODY.to_string(),
            json!({ "description": "Request body, sent as JSON (any JSON value, including null)" }),
        );
    }
    properties.insert(
        HEADERS.to_string(),
        json!({
            "type": "object",
            "additionalProperties": { "type": "string" },
            "description": "Additional request headers"
        }),
    );

    json!({
        "type": "object",
        "properties": properties,
        "required": [PATH],
        "additionalProperties": false
    })
}

/// `/headers/X-Num` -> `headers.X-Num`; the empty pointer is `root`.
fn dotted_path(pointer: &str) -> String {
    if pointer.is_empty() || pointer == "/" {
        return "root".to_string();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}
