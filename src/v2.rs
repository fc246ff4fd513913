#![deny(missing_docs)]

//! # Swagger 2.x Adapter
//!
//! Resolves an operation of a v2-shaped document into the shared output
//! contract. The v2 shape carries body/form parameters inline in the
//! parameter list and declares the response schema under
//! `responses.200.schema`; both are normalized here.

use crate::collector::RecordCollector;
use crate::document::{path_template_vars, DocumentV2, ParameterV2, Schema, SchemaItems};
use crate::error::{AppError, AppResult};
use crate::ident::{sanitize_operation_name, sanitize_type_name, to_first_upper};
use crate::model::{Field, ParseResult, Placement, Primitive, Record, TypeExpr};
use tracing::warn;

const DEFINITION_PREFIX: &str = "#/definitions/";

/// Parses one (path, method) operation of a v2 document.
pub(crate) fn parse(
    doc: &DocumentV2,
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
    let path_vars = path_template_vars(path);

    // Path group: declared path parameters plus template variables shadowing
    // other locations; undeclared template variables become synthetic
    // required string parameters.
    let mut path_group: Vec<ParameterV2> = operation
        .parameters
        .iter()
        .filter(|p| p.location == "path" || path_vars.contains(&p.name))
        .cloned()
        .collect();
    for var in &path_vars {
        if !path_group.iter().any(|p| &p.name == var) {
            path_group.push(synthetic_path_param(var));
        }
    }

    let query_group: Vec<ParameterV2> = operation
        .parameters
        .iter()
        .filter(|p| p.location == "query" && !path_vars.contains(&p.name))
        .cloned()
        .collect();

    let path_var = resolver.parameter_group(
        &format!("{}PathVar", to_first_upper(&name)),
        &path_group,
        Placement::Path,
    )?;
    let query = resolver.parameter_group(
        &format!("{}Query", to_first_upper(&name)),
        &query_group,
        Placement::Body,
    )?;

    let is_form_data = operation.parameters.iter().any(|p| p.location == "formData");
    let body = if is_form_data {
        let body_group: Vec<ParameterV2> = operation
            .parameters
            .iter()
            .filter(|p| p.location == "formData" || p.location == "body")
            .cloned()
            .collect();
        resolver.parameter_group("RequestBody", &body_group, Placement::Body)?
    } else {
        let body_schema = operation
            .parameters
            .iter()
            .find(|p| p.location == "body" && !path_vars.contains(&p.name))
            .and_then(|p| p.schema.as_ref());
        resolver.resolve_schema(body_schema, "RequestBody", Placement::Body)?
    };

    let response_schema = operation
        .responses
        .get("200")
        .and_then(|response| response.schema.as_ref());
    let res = resolver.resolve_schema(response_schema, "ResponseBody", Placement::Response)?;

    Ok(Some(ParseResult {
        name,
        comment,
        interfaces: resolver.collector.into_records(),
        body,
        is_form_data,
        path_var,
        query,
        res,
    }))
}

fn synthetic_path_param(name: &str) -> ParameterV2 {
    ParameterV2 {
        name: name.to_string(),
        location: "path".to_string(),
        required: true,
        description: None,
        param_type: None,
        format: None,
        items: None,
        schema: Some(Schema {
            schema_type: Some("string".to_string()),
            ..Schema::default()
        }),
    }
}

/// Per-call resolution state. The collector's reserved names double as the
/// visited set: a definition reachable from itself observes its own
/// reservation and short-circuits.
struct Resolver<'a> {
    doc: &'a DocumentV2,
    collector: RecordCollector,
    placement: Option<Placement>,
}

impl<'a> Resolver<'a> {
    fn new(doc: &'a DocumentV2) -> Self {
        Self {
            doc,
            collector: RecordCollector::new(),
            placement: None,
        }
    }

    /// Resolves a `#/definitions/` reference into its registered record
    /// name, synthesizing the definition on first visit. The name is
    /// registered before the definition's own fields are walked.
    fn resolve_interface(&mut self, reference: &str) -> AppResult<String> {
        let Some(remainder) = reference.strip_prefix(DEFINITION_PREFIX) else {
            return Err(AppError::UnresolvedReference(reference.to_string()));
        };

        let name = sanitize_type_name(remainder);
        if !self.collector.reserve(&name) {
            return Ok(name);
        }

        let Some(definition) = self.doc.definitions.get(remainder) else {
            return Err(AppError::UnresolvedReference(reference.to_string()));
        };
        let definition = definition.clone();

        let fields = self.definition_fields(&definition, &name)?;
        self.collector.complete(Record {
            name: name.clone(),
            description: definition.description.clone(),
            fields,
            placement: self.placement,
        });

        Ok(name)
    }

    /// One field per property. A property that yields no usable type is
    /// skipped with a diagnostic; the enclosing record is still produced.
    fn definition_fields(&mut self, definition: &Schema, owner: &str) -> AppResult<Vec<Field>> {
        let Some(properties) = &definition.properties else {
            return Ok(Vec::new());
        };

        let mut fields = Vec::new();
        for (prop_name, prop) in properties {
            let Some(ty) = self.field_type(prop)? else {
                warn!("the {} attribute of {} is ignored", prop_name, owner);
                continue;
            };
            fields.push(Field {
                name: prop_name.clone(),
                required: definition.requires(prop_name),
                ty,
                description: prop.description.clone(),
                format: prop.format.clone(),
            });
        }
        Ok(fields)
    }

    /// Type of a property: a reference resolves through the definition
    /// table; otherwise the declared scalar keyword. `None` means the
    /// property is unsynthesizable.
    fn field_type(&mut self, schema: &Schema) -> AppResult<Option<TypeExpr>> {
        if let Some(reference) = &schema.reference {
            let name = self.resolve_interface(reference)?;
            return Ok(Some(TypeExpr::Named(name)));
        }
        if schema.schema_type.is_none() {
            return Ok(None);
        }
        self.scalar_type(schema)
    }

    /// Keyword mapping for inline-typed v2 schemas: `file`/binary uploads,
    /// numbers, strings, booleans, objects and arrays thereof.
    fn scalar_type(&mut self, schema: &Schema) -> AppResult<Option<TypeExpr>> {
        let declared = schema.schema_type.as_deref().unwrap_or_default();

        if declared == "file" || schema.format.as_deref() == Some("binary") {
            return Ok(Some(TypeExpr::Primitive(Primitive::File)));
        }

        let expr = match declared {
            "number" | "integer" => Some(TypeExpr::Primitive(Primitive::Number)),
            "string" => Some(TypeExpr::Primitive(Primitive::String)),
            "boolean" => Some(TypeExpr::Primitive(Primitive::Boolean)),
            "object" => Some(TypeExpr::Primitive(Primitive::Object)),
            "array" => match schema.items.as_deref() {
                Some(SchemaItems::One(element)) => {
                    if let Some(reference) = &element.reference {
                        let name = self.resolve_interface(reference)?;
                        Some(TypeExpr::Array(Box::new(TypeExpr::Named(name))))
                    } else if element.schema_type.is_some() {
                        self.scalar_type(element)?
                            .map(|inner| TypeExpr::Array(Box::new(inner)))
                    } else {
                        None
                    }
                }
                // Per-position and absent item schemas degrade to an
                // explicit any-array.
                _ => Some(TypeExpr::Array(Box::new(TypeExpr::Primitive(
                    Primitive::Any,
                )))),
            },
            _ => None,
        };
        Ok(expr)
    }

    /// Synthesizes one record for a non-empty parameter group. Parameters
    /// carrying no usable type are skipped with a diagnostic; a group left
    /// without fields produces no record.
    fn parameter_group(
        &mut self,
        interface_name: &str,
        group: &[ParameterV2],
        placement: Placement,
    ) -> AppResult<Option<TypeExpr>> {
        if group.is_empty() {
            return Ok(None);
        }

        self.placement = Some(placement);
        self.collector.reserve(interface_name);

        let mut fields = Vec::new();
        for parameter in group {
            let ty = if let Some(schema) = &parameter.schema {
                // in: body
                if let Some(reference) = &schema.reference {
                    Some(TypeExpr::Named(self.resolve_interface(reference)?))
                } else if schema.schema_type.is_some() {
                    self.scalar_type(schema)?
                } else {
                    None
                }
            } else {
                self.field_type(&parameter.as_schema())?
            };

            let Some(ty) = ty else {
                warn!(
                    "the {} parameter of {} is ignored",
                    parameter.name, interface_name
                );
                continue;
            };

            fields.push(Field {
                name: parameter.name.clone(),
                required: parameter.required,
                ty,
                description: parameter.description.clone(),
                format: parameter.format.clone(),
            });
        }

        if fields.is_empty() {
            return Ok(None);
        }

        self.collector.complete(Record {
            name: interface_name.to_string(),
            description: None,
            fields,
            placement: Some(placement),
        });

        Ok(Some(TypeExpr::Named(interface_name.to_string())))
    }

    /// Resolves a body/response schema: arrays of references become named
    /// arrays, bare references resolve directly, scalars map to their
    /// keyword, and inline objects are promoted under `default_name`
    /// (dropped when they have no fields).
    fn resolve_schema(
        &mut self,
        schema: Option<&Schema>,
        default_name: &str,
        placement: Placement,
    ) -> AppResult<Option<TypeExpr>> {
        let Some(schema) = schema else {
            return Ok(None);
        };
        self.placement = Some(placement);

        if schema.schema_type.as_deref() == Some("array") {
            if let Some(SchemaItems::One(element)) = schema.items.as_deref() {
                if let Some(reference) = &element.reference {
                    let name = self.resolve_interface(reference)?;
                    return Ok(Some(TypeExpr::Array(Box::new(TypeExpr::Named(name)))));
                }
            }
            return self.scalar_type(schema);
        }

        if let Some(reference) = &schema.reference {
            let name = self.resolve_interface(reference)?;
            return Ok(Some(TypeExpr::Named(name)));
        }

        if let Some(declared) = schema.schema_type.as_deref() {
            if declared != "object" {
                return self.scalar_type(schema);
            }
        }

        self.collector.reserve(default_name);
        let fields = self.definition_fields(schema, default_name)?;
        if fields.is_empty() {
            return Ok(None);
        }

        self.collector.complete(Record {
            name: default_name.to_string(),
            description: schema.description.clone(),
            fields,
            placement: Some(placement),
        });
        Ok(Some(TypeExpr::Named(default_name.to_string())))
    }
}
