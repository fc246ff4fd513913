#![deny(missing_docs)]

//! # OpenAPI Typegen
//!
//! Schema resolution and type-synthesis engine: converts a parsed
//! API-description document (Swagger 2.x or OpenAPI 3.x) plus a selected
//! (path, method) operation into a deduplicated collection of named record
//! types and type expressions for the operation's path parameters, query
//! parameters, request body and response body.
//!
//! Document acquisition and result rendering are the caller's concern; the
//! engine is a pure, synchronous computation over an in-memory document.
//!
//! ```
//! use openapi_typegen::{parse, Document};
//!
//! let document = Document::from_json(r##"{
//!     "openapi": "3.0.0",
//!     "paths": {
//!         "/pets/{id}": {
//!             "get": {
//!                 "operationId": "getPetUsingGET",
//!                 "responses": {
//!                     "200": {
//!                         "content": {
//!                             "application/json": {
//!                                 "schema": { "$ref": "#/components/schemas/Pet" }
//!                             }
//!                         }
//!                     }
//!                 }
//!             }
//!         }
//!     },
//!     "components": {
//!         "schemas": {
//!             "Pet": {
//!                 "type": "object",
//!                 "properties": { "name": { "type": "string" } },
//!                 "required": ["name"]
//!             }
//!         }
//!     }
//! }"##).unwrap();
//!
//! let result = parse(&document, "/pets/{id}", "get").unwrap().unwrap();
//! assert_eq!(result.name, "getPet");
//! assert_eq!(result.res.unwrap().to_string(), "Pet");
//! ```

/// Shared error types.
pub mod error;

/// Identifier sanitization.
pub mod ident;

/// Output data model.
pub mod model;

/// Document shims and version probe.
pub mod document;

mod collector;
mod v2;
mod v3;

pub use document::{Document, DocumentV2, DocumentV3, Schema};
pub use error::{AppError, AppResult};
pub use ident::{sanitize_operation_name, sanitize_type_name};
pub use model::{Field, ParseResult, Placement, Primitive, Record, TypeExpr};

/// Parses one (document, path, method) triple into a [`ParseResult`].
///
/// Returns `Ok(None)` when the requested operation does not exist in the
/// document: a missing operation is a normal, expected outcome, not a
/// failure. A reference whose target is missing from the document's
/// definition table aborts the call with
/// [`AppError::UnresolvedReference`].
///
/// All resolution state is scoped to the call; invocations never share
/// state, and the input document is never mutated.
pub fn parse(document: &Document, path: &str, method: &str) -> AppResult<Option<ParseResult>> {
    match document {
        Document::V2(doc) => v2::parse(doc, path, method),
        Document::V3(doc) => v3::parse(doc, path, method),
    }
}
