#![deny(missing_docs)]

//! # OpenAPI 3.x Adapter
//!
//! Resolves an operation of a v3-shaped document into the shared output
//! contract:
//!
//! - Recursive type-expression synthesis over schema nodes.
//! - `$ref` resolution through `components.schemas` with cycle guarding.
//! - Parameter grouping, body/response extraction and multipart detection.

use crate::collector::RecordCollector;
use crate::document::{
    deref_value, path_template_vars, DocumentV3, OperationV3, ParameterV3, Schema, SchemaItems,
};
use crate::error::{AppError, AppResult};
use crate::ident::{sanitize_operation_name, sanitize_type_name, to_first_upper};
use crate::model::{Field, ParseResult, Placement, Primitive, Record, TypeExpr};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Formats coerced to the `number` keyword.
const NUMBER_FORMATS: &[&str] = &[
    "int64", "integer", "long", "float", "double", "number", "int", "int32",
];

/// Types rendered as the `Date` keyword.
const DATE_TYPES: &[&str] = &["Date", "date", "dateTime", "date-time", "datetime"];

/// Types rendered as the `string` keyword.
const STRING_TYPES: &[&str] = &["string", "email", "password", "url", "byte", "binary"];

/// Fallback schema used when a body or response carries no schema at all.
fn default_schema() -> Schema {
    serde_json::from_value(serde_json::json!({
        "type": "object",
        "properties": { "id": { "type": "number" } }
    }))
    .expect("Invalid default schema")
}

/// A detected multipart file field.
struct FileField {
    name: String,
    multiple: bool,
}

/// Parses one (path, method) operation of a v3 document.
pub(crate) fn parse(
    doc: &DocumentV3,
    path: &str,
    method: &str,
) -> AppResult<Option<ParseResult>> {
    let Some(operation) = doc.operation(path, method) else {
        return Ok(None);
    };

    let name = sanitize_operation_name(
        operation.operation_id.as_deref().unwrap_or_default(),
        method,
    );
    let comment = [&operation.summary, &operation.description]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let mut resolver = Resolver::new(doc);

    let (path_var, query) = resolver.group_parameters(operation, path, &name)?;
    let body = resolver.resolve_body(operation.request_body.as_ref(), &name)?;
    let file_fields = resolver.collect_file_fields(operation.request_body.as_ref())?;
    let res = resolver.resolve_response(operation)?;

    for field in &file_fields {
        tracing::debug!(
            "multipart file field '{}' (multiple: {})",
            field.name,
            field.multiple
        );
    }
    let is_form_data = body
        .as_ref()
        .map(|(media, _)| media.contains("form"))
        .unwrap_or(false)
        || !file_fields.is_empty();

    Ok(Some(ParseResult {
        name,
        comment,
        interfaces: resolver.collector.into_records(),
        body: body.map(|(_, ty)| ty),
        is_form_data,
        path_var,
        query,
        res,
    }))
}

/// Per-call resolution state: the record collector, the visited-reference
/// set and the placement context. Never shared across calls.
struct Resolver<'a> {
    doc: &'a DocumentV3,
    collector: RecordCollector,
    visited: HashSet<String>,
    placement: Option<Placement>,
}

impl<'a> Resolver<'a> {
    fn new(doc: &'a DocumentV3) -> Self {
        Self {
            doc,
            collector: RecordCollector::new(),
            visited: HashSet::new(),
            placement: None,
        }
    }

    /// Resolves a `$ref` into its registered record name, synthesizing the
    /// target on first visit. The visited mark is set *before* recursing into
    /// the target's fields so self-referential schemas short-circuit.
    fn resolve_ref(&mut self, reference: &str) -> AppResult<String> {
        let type_name = reference.rsplit('/').next().unwrap_or(reference);
        let name = sanitize_type_name(type_name);

        if self.visited.contains(type_name) {
            return Ok(name);
        }
        self.visited.insert(type_name.to_string());

        let Some(definition) = self.doc.components.schemas.get(type_name) else {
            return Err(AppError::UnresolvedReference(reference.to_string()));
        };
        let definition = definition.clone();

        if !self.collector.reserve(&name) {
            // A different raw reference already produced this name; the
            // first record wins.
            return Ok(name);
        }

        let fields = self.record_fields(&definition)?;
        self.collector.complete(Record {
            name: name.clone(),
            description: definition.description.clone(),
            fields,
            placement: self.placement,
        });

        Ok(name)
    }

    /// Fields of a promoted definition. Enum-, array- and reference-shaped
    /// definitions carry no fields of their own and yield an empty record.
    fn record_fields(&mut self, definition: &Schema) -> AppResult<Vec<Field>> {
        if let Some(reference) = &definition.reference {
            // Alias definitions are validated but contribute no fields.
            self.resolve_ref(reference)?;
            return Ok(Vec::new());
        }

        if definition.enum_values.is_some() {
            return Ok(Vec::new());
        }

        if let Some(all_of) = &definition.all_of {
            if !all_of.is_empty() {
                return self.merged_fields(all_of);
            }
        }

        if definition.properties.is_some() {
            return self.object_fields(definition);
        }

        Ok(Vec::new())
    }

    /// Flattens `allOf` members into one field list; later members override
    /// earlier fields of the same name.
    fn merged_fields(&mut self, members: &[Schema]) -> AppResult<Vec<Field>> {
        let mut fields: Vec<Field> = Vec::new();
        for member in members {
            let member_fields = if let Some(reference) = &member.reference {
                let target = self.deref_schema(reference)?;
                self.resolve_ref(reference)?;
                self.record_fields(&target)?
            } else {
                self.object_fields(member)?
            };

            for field in member_fields {
                if let Some(index) = fields.iter().position(|f| f.name == field.name) {
                    fields[index] = field;
                } else {
                    fields.push(field);
                }
            }
        }
        Ok(fields)
    }

    /// One field per property, in declaration order.
    fn object_fields(&mut self, schema: &Schema) -> AppResult<Vec<Field>> {
        let Some(properties) = &schema.properties else {
            return Ok(Vec::new());
        };

        let mut fields = Vec::new();
        for (prop_name, prop) in properties {
            let description = [&prop.title, &prop.description]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");

            fields.push(Field {
                name: prop_name.clone(),
                required: prop.field_required(schema, prop_name),
                ty: self.synthesize(Some(prop))?,
                description: (!description.is_empty()).then_some(description),
                format: prop.format.clone(),
            });
        }
        Ok(fields)
    }

    /// Maps a schema node to a type expression. Dispatch precedence:
    /// missing → `object`; `$ref` → registered name; coerced numeric/date/
    /// string formats; `boolean`; arrays (tuples for per-position items);
    /// enum literal unions; `oneOf` unions; `allOf` intersections; inline
    /// structural literals; verbatim fallback.
    fn synthesize(&mut self, schema: Option<&Schema>) -> AppResult<TypeExpr> {
        let Some(node) = schema else {
            return Ok(TypeExpr::Primitive(Primitive::Object));
        };

        if let Some(reference) = &node.reference {
            let reference = reference.clone();
            return Ok(TypeExpr::Named(self.resolve_ref(&reference)?));
        }

        let mut effective_type = node.schema_type.clone();
        if let Some(format) = &node.format {
            if NUMBER_FORMATS.contains(&format.as_str()) {
                effective_type = Some("number".to_string());
            }
        }
        if node.enum_values.is_some() {
            effective_type = Some("enum".to_string());
        }

        match effective_type.as_deref() {
            Some(t) if NUMBER_FORMATS.contains(&t) => {
                return Ok(TypeExpr::Primitive(Primitive::Number))
            }
            Some(t) if DATE_TYPES.contains(&t) => {
                return Ok(TypeExpr::Primitive(Primitive::Date))
            }
            Some(t) if STRING_TYPES.contains(&t) => {
                return Ok(TypeExpr::Primitive(Primitive::String))
            }
            Some("boolean") => return Ok(TypeExpr::Primitive(Primitive::Boolean)),
            Some("array") => return self.synthesize_array(node),
            Some("enum") => return Ok(self.synthesize_enum(node)?),
            _ => {}
        }

        if let Some(one_of) = &node.one_of {
            if !one_of.is_empty() {
                let members = one_of
                    .iter()
                    .map(|member| self.synthesize(Some(member)))
                    .collect::<AppResult<Vec<_>>>()?;
                return Ok(TypeExpr::Union(members));
            }
        }

        if let Some(all_of) = &node.all_of {
            if !all_of.is_empty() {
                let members = all_of
                    .iter()
                    .map(|member| self.synthesize(Some(member)))
                    .collect::<AppResult<Vec<_>>>()?;
                return Ok(TypeExpr::Intersection(members));
            }
        }

        if node.schema_type.as_deref() == Some("object") || node.properties.is_some() {
            let fields = self.object_fields(node)?;
            if fields.is_empty() {
                return Ok(TypeExpr::Primitive(Primitive::Object));
            }
            return Ok(TypeExpr::Inline(fields));
        }

        match node.schema_type.as_deref() {
            Some("file") | Some("File") => Ok(TypeExpr::Primitive(Primitive::File)),
            Some(other) => Ok(TypeExpr::Raw(other.to_string())),
            None => Ok(TypeExpr::Primitive(Primitive::Object)),
        }
    }

    /// Array synthesis: per-position item lists become tuples; element
    /// unions are parenthesized by the renderer.
    fn synthesize_array(&mut self, node: &Schema) -> AppResult<TypeExpr> {
        // Parameter-shaped nodes carry their items one level down.
        let items = match &node.schema {
            Some(inner) => inner.items.as_deref(),
            None => node.items.as_deref(),
        };

        match items {
            Some(SchemaItems::Many(members)) => {
                let rendered = members
                    .iter()
                    .map(|member| {
                        let element = member.schema.as_deref().unwrap_or(member);
                        self.synthesize(Some(element))
                    })
                    .collect::<AppResult<Vec<_>>>()?;
                Ok(TypeExpr::Tuple(rendered))
            }
            Some(SchemaItems::One(element)) => {
                let element = self.synthesize(Some(element))?;
                Ok(TypeExpr::Array(Box::new(element)))
            }
            None => Ok(TypeExpr::Array(Box::new(TypeExpr::Primitive(
                Primitive::Object,
            )))),
        }
    }

    /// Enum literal union: strings quoted, other scalars rendered verbatim,
    /// duplicates removed, order preserved. Non-array containers degrade to
    /// `string`.
    fn synthesize_enum(&mut self, node: &Schema) -> AppResult<TypeExpr> {
        let Some(values) = node.enum_values.as_ref().and_then(|v| v.as_array()) else {
            return Ok(TypeExpr::Primitive(Primitive::String));
        };

        let mut rendered: Vec<String> = Vec::new();
        for value in values {
            let literal = match value {
                Value::String(s) => format!("\"{}\"", s),
                other => other.to_string(),
            };
            if !rendered.contains(&literal) {
                rendered.push(literal);
            }
        }
        Ok(TypeExpr::LiteralUnion(rendered))
    }

    /// Clones the schema a `$ref` designates, without promoting it.
    fn deref_schema(&self, reference: &str) -> AppResult<Schema> {
        let type_name = reference.rsplit('/').next().unwrap_or(reference);
        self.doc
            .components
            .schemas
            .get(type_name)
            .cloned()
            .ok_or_else(|| AppError::UnresolvedReference(reference.to_string()))
    }

    /// Resolves a raw parameter entry (possibly a `$ref`) into its typed shim.
    fn resolve_parameter(&self, node: &Value) -> AppResult<Option<ParameterV3>> {
        let resolved = deref_value(&self.doc.raw, node)?;
        match serde_json::from_value::<ParameterV3>(resolved) {
            Ok(parameter) => Ok(Some(parameter)),
            Err(e) => {
                warn!("skipping malformed parameter: {}", e);
                Ok(None)
            }
        }
    }

    /// Groups declared parameters by location and synthesizes the PathVar
    /// and Query records. Path template variables without a declaration
    /// become synthetic required string parameters. Cookie parameters are
    /// collected but produce no record.
    fn group_parameters(
        &mut self,
        operation: &OperationV3,
        path: &str,
        op_name: &str,
    ) -> AppResult<(Option<TypeExpr>, Option<TypeExpr>)> {
        let mut path_group: Vec<ParameterV3> = Vec::new();
        let mut query_group: Vec<ParameterV3> = Vec::new();

        for node in &operation.parameters {
            let Some(parameter) = self.resolve_parameter(node)? else {
                continue;
            };
            match parameter.location.as_str() {
                "path" => path_group.push(parameter),
                "query" => query_group.push(parameter),
                _ => {}
            }
        }

        for var in path_template_vars(path) {
            if !path_group.iter().any(|p| p.name == var) {
                path_group.push(ParameterV3 {
                    name: var,
                    location: "path".to_string(),
                    required: true,
                    description: None,
                    schema: Some(Schema {
                        schema_type: Some("string".to_string()),
                        ..Schema::default()
                    }),
                });
            }
        }

        let path_var = self.parameter_group(
            &format!("{}PathVar", to_first_upper(op_name)),
            &path_group,
            Placement::Path,
        )?;
        let query = self.parameter_group(
            &format!("{}Query", to_first_upper(op_name)),
            &query_group,
            Placement::Body,
        )?;

        Ok((path_var, query))
    }

    /// Synthesizes one record for a non-empty parameter group. The group
    /// name is reserved before its fields so records discovered during field
    /// synthesis follow it in the output.
    fn parameter_group(
        &mut self,
        type_name: &str,
        group: &[ParameterV3],
        placement: Placement,
    ) -> AppResult<Option<TypeExpr>> {
        if group.is_empty() {
            return Ok(None);
        }

        self.placement = Some(placement);
        self.collector.reserve(type_name);

        let mut fields = Vec::new();
        for parameter in group {
            fields.push(Field {
                name: parameter.name.clone(),
                required: parameter.required,
                ty: self.synthesize(parameter.schema.as_ref())?,
                description: parameter.description.clone(),
                format: parameter
                    .schema
                    .as_ref()
                    .and_then(|s| s.format.clone()),
            });
        }

        self.collector.complete(Record {
            name: type_name.to_string(),
            description: None,
            fields,
            placement: Some(placement),
        });

        Ok(Some(TypeExpr::Named(type_name.to_string())))
    }

    /// Extracts the request body: the first content entry's schema. Object
    /// schemas are promoted to a `{Name}Body` record with file-format fields
    /// rewritten to `File` on a derived copy; anything else synthesizes
    /// directly. Returns the media type alongside for the form-data probe.
    fn resolve_body(
        &mut self,
        request_body: Option<&Value>,
        op_name: &str,
    ) -> AppResult<Option<(String, TypeExpr)>> {
        let Some(node) = request_body else {
            return Ok(None);
        };
        self.placement = Some(Placement::Body);

        let resolved = deref_value(&self.doc.raw, node)?;
        let Some(content) = resolved.get("content").and_then(|c| c.as_object()) else {
            return Ok(None);
        };
        let Some((media_type, media)) = content.iter().next() else {
            return Ok(None);
        };

        let schema = match media.get("schema") {
            Some(raw_schema) => serde_json::from_value::<Schema>(raw_schema.clone())
                .map_err(|e| AppError::General(format!("invalid body schema: {}", e)))?,
            None => default_schema(),
        };

        let media_type = if media_type == "*/*" {
            String::new()
        } else {
            media_type.clone()
        };

        if schema.schema_type.as_deref() == Some("object") && schema.properties.is_some() {
            let derived = mark_file_properties(&schema);
            let type_name = format!("{}Body", to_first_upper(op_name));
            self.collector.reserve(&type_name);
            let fields = self.object_fields(&derived)?;
            self.collector.complete(Record {
                name: type_name.clone(),
                description: derived.description.clone(),
                fields,
                placement: Some(Placement::Body),
            });
            return Ok(Some((media_type, TypeExpr::Named(type_name))));
        }

        let ty = self.synthesize(Some(&schema))?;
        Ok(Some((media_type, ty)))
    }

    /// Detects multipart file fields: properties with a binary/base64 format,
    /// directly or through their array items.
    fn collect_file_fields(
        &mut self,
        request_body: Option<&Value>,
    ) -> AppResult<Vec<FileField>> {
        let Some(node) = request_body else {
            return Ok(Vec::new());
        };
        let resolved = deref_value(&self.doc.raw, node)?;
        let Some(raw_schema) = resolved
            .get("content")
            .and_then(|c| c.get("multipart/form-data"))
            .and_then(|m| m.get("schema"))
        else {
            return Ok(Vec::new());
        };

        let mut schema: Schema = serde_json::from_value(raw_schema.clone())
            .map_err(|e| AppError::General(format!("invalid multipart schema: {}", e)))?;
        if let Some(reference) = &schema.reference {
            schema = self.deref_schema(reference)?;
        }

        let Some(properties) = &schema.properties else {
            return Ok(Vec::new());
        };

        let mut file_fields = Vec::new();
        for (prop_name, prop) in properties {
            if is_upload_format(prop.format.as_deref()) {
                file_fields.push(FileField {
                    name: prop_name.clone(),
                    multiple: false,
                });
                continue;
            }
            if prop.schema_type.as_deref() == Some("array") {
                if let Some(SchemaItems::One(element)) = prop.items.as_deref() {
                    if is_upload_format(element.format.as_deref()) {
                        file_fields.push(FileField {
                            name: prop_name.clone(),
                            multiple: true,
                        });
                    }
                }
            }
        }
        Ok(file_fields)
    }

    /// Selects the default/200/201 response's first content entry and
    /// synthesizes its schema. Absent responses or content produce nothing.
    fn resolve_response(&mut self, operation: &OperationV3) -> AppResult<Option<TypeExpr>> {
        self.placement = Some(Placement::Response);

        let node = ["default", "200", "201"]
            .iter()
            .find_map(|status| operation.responses.get(*status));
        let Some(node) = node else {
            return Ok(None);
        };

        let resolved = deref_value(&self.doc.raw, node)?;
        let Some(content) = resolved.get("content").and_then(|c| c.as_object()) else {
            return Ok(None);
        };
        let Some((_, media)) = content.iter().next() else {
            return Ok(None);
        };

        let schema = match media.get("schema") {
            Some(raw_schema) => serde_json::from_value::<Schema>(raw_schema.clone())
                .map_err(|e| AppError::General(format!("invalid response schema: {}", e)))?,
            None => default_schema(),
        };

        // Response object schemas receive per-field required-ness from the
        // parent list on a derived copy before synthesis.
        let schema = propagate_required(&schema);

        Ok(Some(self.synthesize(Some(&schema))?))
    }
}

fn is_upload_format(format: Option<&str>) -> bool {
    matches!(format, Some("binary") | Some("base64"))
}

/// Derived copy with binary-format properties (and array items) retyped as
/// file uploads. The input document is never mutated.
fn mark_file_properties(schema: &Schema) -> Schema {
    let mut derived = schema.clone();
    if let Some(properties) = &mut derived.properties {
        for prop in properties.values_mut() {
            if prop.format.as_deref() == Some("binary") {
                prop.schema_type = Some("File".to_string());
                continue;
            }
            let retyped = match prop.items.as_deref() {
                Some(SchemaItems::One(element))
                    if element.format.as_deref() == Some("binary") =>
                {
                    let mut element = element.clone();
                    element.schema_type = Some("File".to_string());
                    Some(element)
                }
                _ => None,
            };
            if let Some(element) = retyped {
                prop.items = Some(Box::new(SchemaItems::One(element)));
            }
        }
    }
    derived
}

/// Derived copy where each property's required flag reflects membership in
/// the parent's required-name list.
fn propagate_required(schema: &Schema) -> Schema {
    let mut derived = schema.clone();
    let parent = schema.clone();
    if let Some(properties) = &mut derived.properties {
        for (prop_name, prop) in properties.iter_mut() {
            prop.required = Some(crate::document::RequiredSpec::Flag(
                parent.requires(prop_name),
            ));
        }
    }
    derived
}
