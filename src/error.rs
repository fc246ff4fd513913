//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the crate.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// A `$ref` pointer whose target is missing from the document's
    /// definition table. Fatal for the whole parse: downstream records may
    /// already assume the referenced name exists.
    #[from(ignore)]
    #[display("Unresolved reference: {_0}")]
    UnresolvedReference(String),

    /// The input does not deserialize into either supported document shape.
    #[from(ignore)]
    #[display("Document Error: {_0}")]
    Document(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
