#![deny(missing_docs)]

//! # Document Shims
//!
//! Permissive serde structs for the two supported document shapes.
//!
//! Real-world documents are frequently sloppy, so the shims decouple parsing
//! from strict library types: unknown fields are ignored, optional fields
//! default, and nodes that may be `$ref`s are kept as raw
//! [`serde_json::Value`] until resolved. The raw document is retained
//! alongside the typed skeleton for JSON-pointer reference walks.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// A structural schema node, shared by both document shapes.
///
/// Immutable for the duration of one resolution pass; derived copies are
/// constructed where the synthesis rules call for rewritten nodes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Schema {
    /// `$ref` pointer string, if this node is a reference.
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Declared `type` keyword.
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    /// Declared `format`.
    pub format: Option<String>,
    /// Title (joined into field descriptions).
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Ordered property map.
    pub properties: Option<IndexMap<String, Schema>>,
    /// Required marker: a blanket flag on a property, or a name list on the
    /// enclosing object.
    pub required: Option<RequiredSpec>,
    /// Array element schema(s).
    pub items: Option<Box<SchemaItems>>,
    /// Enum literal container. Kept raw: non-array containers degrade.
    #[serde(rename = "enum")]
    pub enum_values: Option<Value>,
    /// `oneOf` members.
    #[serde(rename = "oneOf")]
    pub one_of: Option<Vec<Schema>>,
    /// `allOf` members.
    #[serde(rename = "allOf")]
    pub all_of: Option<Vec<Schema>>,
    /// Nested `schema` carried by parameter-shaped nodes that reach the
    /// synthesizer (tuple members, array carriers).
    pub schema: Option<Box<Schema>>,
}

/// Array `items`: a single element schema, or an ordered per-position list
/// (heterogeneous tuple).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaItems {
    /// Homogeneous element schema.
    One(Schema),
    /// Per-position schemas.
    Many(Vec<Schema>),
}

/// The two source shapes of a `required` marker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequiredSpec {
    /// Blanket flag, as carried by individual properties.
    Flag(bool),
    /// Required-name list, as carried by object schemas.
    List(Vec<String>),
}

impl Schema {
    /// Resolves the effective required-ness of a property: the property's own
    /// flag if present, else membership in the parent's list (or the parent's
    /// blanket flag), else false.
    pub fn field_required(&self, parent: &Schema, name: &str) -> bool {
        match &self.required {
            Some(RequiredSpec::Flag(flag)) => *flag,
            Some(RequiredSpec::List(list)) => !list.is_empty(),
            None => match &parent.required {
                Some(RequiredSpec::Flag(flag)) => *flag,
                Some(RequiredSpec::List(list)) => list.iter().any(|n| n == name),
                None => false,
            },
        }
    }

    /// Whether `name` appears in this schema's required-name list.
    pub fn requires(&self, name: &str) -> bool {
        matches!(&self.required, Some(RequiredSpec::List(list)) if list.iter().any(|n| n == name))
    }
}

/// A declared operation parameter, v3 shape (`in` ∈ path/query/cookie/header).
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterV3 {
    /// Parameter name.
    pub name: String,
    /// Location of the parameter.
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required.
    #[serde(default)]
    pub required: bool,
    /// Description.
    pub description: Option<String>,
    /// Schema definition.
    pub schema: Option<Schema>,
}

/// A declared operation parameter, v2 shape (`in` additionally allows
/// body/formData, and scalar typing lives inline on the parameter).
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterV2 {
    /// Parameter name.
    pub name: String,
    /// Location of the parameter.
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required.
    #[serde(default)]
    pub required: bool,
    /// Description.
    pub description: Option<String>,
    /// Inline scalar type (non-body parameters).
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    /// Inline format.
    pub format: Option<String>,
    /// Inline array element schema.
    pub items: Option<Schema>,
    /// Body-parameter schema.
    pub schema: Option<Schema>,
}

impl ParameterV2 {
    /// Views the parameter's inline typing as a schema node.
    pub fn as_schema(&self) -> Schema {
        Schema {
            schema_type: self.param_type.clone(),
            format: self.format.clone(),
            items: self
                .items
                .clone()
                .map(|s| Box::new(SchemaItems::One(s))),
            ..Schema::default()
        }
    }
}

/// An operation object, v3 shape. Parameter list, request body and responses
/// stay raw because each entry may itself be a `$ref`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationV3 {
    /// Operation id.
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Summary.
    pub summary: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Declared parameters (possibly `$ref` entries).
    #[serde(default)]
    pub parameters: Vec<Value>,
    /// Request body descriptor (possibly a `$ref`).
    #[serde(rename = "requestBody")]
    pub request_body: Option<Value>,
    /// Responses keyed by status (values possibly `$ref`s).
    #[serde(default)]
    pub responses: IndexMap<String, Value>,
}

/// A response object, v2 shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseV2 {
    /// Description.
    pub description: Option<String>,
    /// Inline response schema.
    pub schema: Option<Schema>,
}

/// An operation object, v2 shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationV2 {
    /// Operation id.
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Summary.
    pub summary: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Declared parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterV2>,
    /// Responses keyed by status.
    #[serde(default)]
    pub responses: IndexMap<String, ResponseV2>,
}

/// A path item with one optional operation per verb. Explicit verb fields
/// keep non-operation keys (`parameters`, `summary`) from tripping the
/// deserializer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem<Op> {
    get: Option<Op>,
    post: Option<Op>,
    put: Option<Op>,
    delete: Option<Op>,
    patch: Option<Op>,
    options: Option<Op>,
    head: Option<Op>,
    trace: Option<Op>,
}

impl<Op> PathItem<Op> {
    /// Looks up the operation for a lowercase HTTP verb.
    pub fn operation(&self, method: &str) -> Option<&Op> {
        match method {
            "get" => self.get.as_ref(),
            "post" => self.post.as_ref(),
            "put" => self.put.as_ref(),
            "delete" => self.delete.as_ref(),
            "patch" => self.patch.as_ref(),
            "options" => self.options.as_ref(),
            "head" => self.head.as_ref(),
            "trace" => self.trace.as_ref(),
            _ => None,
        }
    }
}

/// `components` table, v3 shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentsV3 {
    /// Named schema definitions.
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
}

/// An OpenAPI 3.x document skeleton.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentV3 {
    /// Path map.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem<OperationV3>>,
    /// Component table.
    #[serde(default)]
    pub components: ComponentsV3,
    /// Raw document, for JSON-pointer reference walks.
    #[serde(skip)]
    pub raw: Value,
}

impl DocumentV3 {
    /// Exact (path, method) lookup.
    pub fn operation(&self, path: &str, method: &str) -> Option<&OperationV3> {
        self.paths.get(path).and_then(|item| item.operation(method))
    }
}

/// A Swagger 2.x document skeleton.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentV2 {
    /// Path map.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem<OperationV2>>,
    /// Type-definition table.
    #[serde(default)]
    pub definitions: IndexMap<String, Schema>,
}

impl DocumentV2 {
    /// Exact (path, method) lookup.
    pub fn operation(&self, path: &str, method: &str) -> Option<&OperationV2> {
        self.paths.get(path).and_then(|item| item.operation(method))
    }
}

/// A parsed API-description document: the two-variant tagged union decided
/// once at the entry point.
#[derive(Debug, Clone)]
pub enum Document {
    /// Swagger 2.x ("definitions" table present).
    V2(DocumentV2),
    /// OpenAPI 3.x (the default when the probe fails).
    V3(DocumentV3),
}

impl Document {
    /// Probes the raw value for the v2 `definitions` table and deserializes
    /// the matching skeleton.
    pub fn from_value(value: Value) -> AppResult<Document> {
        if value.get("definitions").is_some() {
            let doc: DocumentV2 = serde_json::from_value(value)
                .map_err(|e| AppError::Document(format!("invalid v2 document: {}", e)))?;
            Ok(Document::V2(doc))
        } else {
            let mut doc: DocumentV3 = serde_json::from_value(value.clone())
                .map_err(|e| AppError::Document(format!("invalid v3 document: {}", e)))?;
            doc.raw = value;
            Ok(Document::V3(doc))
        }
    }

    /// Parses a JSON document.
    pub fn from_json(content: &str) -> AppResult<Document> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| AppError::Document(format!("invalid JSON: {}", e)))?;
        Document::from_value(value)
    }

    /// Parses a YAML document.
    pub fn from_yaml(content: &str) -> AppResult<Document> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| AppError::Document(format!("invalid YAML: {}", e)))?;
        Document::from_value(value)
    }
}

/// Extracts `{name}`-style template variable names from a path string.
pub(crate) fn path_template_vars(path: &str) -> Vec<String> {
    static PATH_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = PATH_RE.get_or_init(|| regex::Regex::new(r"\{(\w+)\}").expect("Invalid regex"));
    re.captures_iter(path)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Walks a local `#/`-prefixed JSON pointer through the raw document.
/// A missing step is fatal: the document is structurally invalid.
pub(crate) fn walk_pointer<'a>(raw: &'a Value, reference: &str) -> AppResult<&'a Value> {
    let mut segments = reference.split('/');
    if segments.next() != Some("#") {
        return Err(AppError::UnresolvedReference(reference.to_string()));
    }

    let mut node = raw;
    for segment in segments {
        node = node
            .get(segment)
            .ok_or_else(|| AppError::UnresolvedReference(reference.to_string()))?;
    }
    Ok(node)
}

/// Resolves a possibly-`$ref` node to its concrete object, carrying the
/// referencing node's `description` over the target's. Non-reference nodes
/// pass through unchanged.
pub(crate) fn deref_value(raw: &Value, node: &Value) -> AppResult<Value> {
    let Some(reference) = node.get("$ref").and_then(|r| r.as_str()) else {
        return Ok(node.clone());
    };

    // Chains of pointer references are followed; a revisited pointer means
    // the chain cannot terminate.
    let mut seen = vec![reference.to_string()];
    let mut target = walk_pointer(raw, reference)?;
    while let Some(next) = target.get("$ref").and_then(|r| r.as_str()) {
        if seen.iter().any(|s| s == next) {
            return Err(AppError::UnresolvedReference(next.to_string()));
        }
        seen.push(next.to_string());
        target = walk_pointer(raw, next)?;
    }

    let mut resolved = target.clone();
    if let Some(obj) = resolved.as_object_mut() {
        obj.shift_remove("description");
        if let Some(desc) = node.get("description") {
            obj.insert("description".to_string(), desc.clone());
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_probe_selects_v2_on_definitions() {
        let doc = Document::from_value(json!({
            "swagger": "2.0",
            "definitions": {},
            "paths": {}
        }))
        .unwrap();
        assert!(matches!(doc, Document::V2(_)));
    }

    #[test]
    fn test_probe_defaults_to_v3() {
        let doc = Document::from_value(json!({
            "openapi": "3.0.0",
            "paths": {}
        }))
        .unwrap();
        assert!(matches!(doc, Document::V3(_)));
    }

    #[test]
    fn test_walk_pointer_resolves_nested_entry() {
        let raw = json!({
            "components": { "schemas": { "Pet": { "type": "object" } } }
        });
        let node = walk_pointer(&raw, "#/components/schemas/Pet").unwrap();
        assert_eq!(node.get("type").and_then(|t| t.as_str()), Some("object"));
    }

    #[test]
    fn test_walk_pointer_missing_entry_is_fatal() {
        let raw = json!({ "components": { "schemas": {} } });
        let err = walk_pointer(&raw, "#/components/schemas/Pet").unwrap_err();
        assert!(matches!(err, AppError::UnresolvedReference(_)));
    }

    #[test]
    fn test_deref_value_overrides_description() {
        let raw = json!({
            "components": {
                "parameters": {
                    "Limit": { "name": "limit", "in": "query", "description": "target" }
                }
            }
        });
        let node = json!({ "$ref": "#/components/parameters/Limit", "description": "source" });
        let resolved = deref_value(&raw, &node).unwrap();
        assert_eq!(
            resolved.get("description").and_then(|d| d.as_str()),
            Some("source")
        );
        assert_eq!(resolved.get("name").and_then(|n| n.as_str()), Some("limit"));
    }

    #[test]
    fn test_required_spec_parses_both_shapes() {
        let parent: Schema = serde_json::from_value(json!({
            "type": "object",
            "properties": { "a": { "type": "string" }, "b": { "type": "string" } },
            "required": ["a"]
        }))
        .unwrap();
        let props = parent.properties.as_ref().unwrap();
        assert!(props["a"].field_required(&parent, "a"));
        assert!(!props["b"].field_required(&parent, "b"));

        let flagged: Schema =
            serde_json::from_value(json!({ "type": "string", "required": true })).unwrap();
        assert!(flagged.field_required(&parent, "b"));
    }
}
