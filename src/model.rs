#![deny(missing_docs)]

//! # Output Data Model
//!
//! Definition of the structures produced by one parse pass:
//!
//! - **TypeExpr**: tagged type-expression tree with a textual rendering.
//! - **Field** / **Record**: named structural types, the unit of deduplication.
//! - **ParseResult**: the sole externally visible artifact.

use std::fmt;

/// Primitive type keywords of the target type syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `Date`
    Date,
    /// `File` (upload field)
    File,
    /// `object` (defaulting policy for absent or property-less schemas)
    Object,
    /// `any` (degraded-fidelity arrays)
    Any,
}

impl Primitive {
    /// The textual keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Date => "Date",
            Primitive::File => "File",
            Primitive::Object => "object",
            Primitive::Any => "any",
        }
    }
}

/// A type expression from the closed output grammar.
///
/// Explicit tagged union instead of ad-hoc strings; `Display` produces the
/// concrete syntax (`T[]`, `A | B`, `(A & B)`, `"a" | "b"`, inline
/// structural literals).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Primitive keyword.
    Primitive(Primitive),
    /// Reference to a named [`Record`].
    Named(String),
    /// Homogeneous array, rendered `T[]`.
    Array(Box<TypeExpr>),
    /// Heterogeneous per-position array, rendered `[A, B]`.
    Tuple(Vec<TypeExpr>),
    /// `oneOf` union, rendered `A | B`.
    Union(Vec<TypeExpr>),
    /// `allOf` intersection, rendered `(A & B)`.
    Intersection(Vec<TypeExpr>),
    /// Enum literal union, rendered `"a" | "b"`. Values are pre-rendered
    /// literals (strings quoted, numbers verbatim).
    LiteralUnion(Vec<String>),
    /// Inline structural literal listing each field as `name[?]: Type`.
    Inline(Vec<Field>),
    /// Verbatim passthrough of a source `type` value no rule matched.
    Raw(String),
}

impl TypeExpr {
    /// Whether the expression must be parenthesized when used as an array
    /// element (it contains a top-level union).
    fn needs_parens_in_array(&self) -> bool {
        match self {
            TypeExpr::Union(members) => members.len() > 1,
            TypeExpr::LiteralUnion(values) => values.len() > 1,
            _ => false,
        }
    }

    /// Collects every record name referenced anywhere inside the expression.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Named(name) => names.push(name),
            TypeExpr::Array(inner) => inner.collect_names(names),
            TypeExpr::Tuple(members)
            | TypeExpr::Union(members)
            | TypeExpr::Intersection(members) => {
                for member in members {
                    member.collect_names(names);
                }
            }
            TypeExpr::Inline(fields) => {
                for field in fields {
                    field.ty.collect_names(names);
                }
            }
            TypeExpr::Primitive(_) | TypeExpr::LiteralUnion(_) | TypeExpr::Raw(_) => {}
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive(p) => f.write_str(p.as_str()),
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Array(inner) => {
                if inner.needs_parens_in_array() {
                    write!(f, "({})[]", inner)
                } else {
                    write!(f, "{}[]", inner)
                }
            }
            TypeExpr::Tuple(members) => {
                let rendered: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            TypeExpr::Union(members) => {
                let rendered: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                f.write_str(&rendered.join(" | "))
            }
            TypeExpr::Intersection(members) => {
                let rendered: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "({})", rendered.join(" & "))
            }
            TypeExpr::LiteralUnion(values) => f.write_str(&values.join(" | ")),
            TypeExpr::Inline(fields) => {
                writeln!(f, "{{")?;
                for field in fields {
                    let optional = if field.required { "" } else { "?" };
                    write!(f, "{}{}: {};", field.name, optional, field.ty)?;
                    match &field.description {
                        Some(desc) if !desc.is_empty() => writeln!(f, " // {}", desc)?,
                        _ => writeln!(f)?,
                    }
                }
                write!(f, "}}")
            }
            TypeExpr::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Where a synthesized record is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Path parameters.
    Path,
    /// Request body (includes query-parameter records).
    Body,
    /// Response body.
    Response,
}

/// A single field of a [`Record`] or inline structural literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name as declared in the source schema.
    pub name: String,
    /// Whether the field is required.
    pub required: bool,
    /// Synthesized type expression.
    pub ty: TypeExpr,
    /// Field description, if any.
    pub description: Option<String>,
    /// Declared schema format (`int64`, `binary`, ...), if any.
    pub format: Option<String>,
}

/// A named structural type. Identity is the name: two records with the same
/// name are the same entity, and the collector keeps the first one discovered.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Unique name within one [`ParseResult`].
    pub name: String,
    /// Record description, if any.
    pub description: Option<String>,
    /// Fields in source declaration order.
    pub fields: Vec<Field>,
    /// Usage classification, when known.
    pub placement: Option<Placement>,
}

/// The result of parsing one (document, path, method) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// Sanitized operation identifier.
    pub name: String,
    /// Operation summary and description, joined.
    pub comment: String,
    /// Deduplicated records in first-discovery order.
    pub interfaces: Vec<Record>,
    /// Request body type, if any.
    pub body: Option<TypeExpr>,
    /// Whether the request body is a multipart/form submission.
    pub is_form_data: bool,
    /// Path-parameter record reference, if any.
    pub path_var: Option<TypeExpr>,
    /// Query-parameter record reference, if any.
    pub query: Option<TypeExpr>,
    /// Response body type, if any.
    pub res: Option<TypeExpr>,
}
