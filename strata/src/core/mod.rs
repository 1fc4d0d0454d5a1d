//! Foundation types shared by every other module.
//!
//! # Diagnostics
//! - [`Diagnostics`]: ordered accumulator of warnings and errors
//! - [`Diagnostic`]: one warning or error, optionally tied to a source range
//!   and to the graph vertex that produced it
//!
//! # Error Handling
//! - [`Error`]: crate-level error with `#[from]` conversions
//! - [`Result<T>`]: alias using [`Error`]

mod diagnostics;
mod error;

pub use diagnostics::{Diagnostic, Diagnostics, Severity, SourcePos, SourceRange};
pub use error::{Error, Result};
